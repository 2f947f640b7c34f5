/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Reader, writer and in-memory model for hierarchical configuration files.
//!
//! The text format holds named settings in nested groups:
//!
//! ```text
//! # application settings
//! version = "1.0";
//! window : {
//!   title = "Main";
//!   size = [ 640, 480 ];     // arrays hold scalars of one type
//!   flags = 0x1F;            // hex, octal and binary are kept on write
//!   panes = ( "left", { width = 200; } );  // lists hold anything
//! };
//! @include "local.cfg"
//! ```
//!
//! # Architecture
//!
//! - **Lexer** and **parser** build a setting tree from text, recording the
//!   file and line of every setting. `@include` directives are resolved
//!   through an [`IncludeResolver`].
//! - The **setting tree** is an arena of [`Setting`] nodes addressed by
//!   [`NodeId`] handles. Groups keep unique member names in insertion order;
//!   arrays only hold scalars of one [`Kind`].
//! - **Coercion** converts between numeric kinds on typed access when
//!   [`Options::AUTO_CONVERT`] is set.
//! - **Paths** such as `window.size[1]` resolve to settings directly.
//! - The **writer** renders a tree back to text that parses to the same tree.
//! - **Copy** and **merge** transplant subtrees within or between documents.
//!
//! All of it is reached through [`Config`].
//!
//! # Example
//!
//! ```
//! use hconf::{Config, Format, Kind};
//!
//! let mut config = Config::new();
//! config.read_str("window : { size = [640, 480]; };").unwrap();
//!
//! let window = config.lookup("window").unwrap();
//! let flags = config.add_value(window, "flags", 31).unwrap();
//! config.set_format(flags, Format::Hex).unwrap();
//!
//! assert_eq!(config.lookup_i32("window.size[0]").unwrap(), 640);
//! assert_eq!(config.kind(window).unwrap(), Kind::Group);
//! assert!(config.write_string().unwrap().contains("flags = 0x1F;"));
//! ```

mod coerce;
pub mod config;
mod copy;
pub mod error;
mod lexer;
pub mod options;
mod parser;
mod path;
pub mod resolver;
pub mod tree;
pub mod value;
mod writer;

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use options::Options;
pub use parser::{MAX_INCLUDE_DEPTH, MAX_NESTING_DEPTH};
pub use resolver::{FileSystemResolver, IncludeResolver, IncludeSource, MemoryResolver};
pub use tree::{Children, FatalErrorHandler, Key, NodeId, Setting, is_valid_name};
pub use value::{Format, Kind, Value};

// Diagnostics rendering
pub use hconf_error_reporting::DiagnosticMessage;
pub use hconf_source_map::{SourceContext, SourceInfo};
