//! Source tracking for hconf documents
//!
//! Every setting produced by the parser remembers where it came from: the
//! file it was read from (main document or an `@include`d file) and the
//! position of its first token. This crate holds the pieces needed for that:
//!
//! - [`SourceContext`]: registry of every file read into a document
//! - [`SourceInfo`]: a range inside one registered file
//!
//! # Example
//!
//! ```rust
//! use hconf_source_map::*;
//!
//! let mut ctx = SourceContext::new();
//! let file_id = ctx.add_file("app.cfg", Some("name = \"demo\";\nport = 80;".into()));
//!
//! let start = Location { offset: 15, row: 1, column: 0 };
//! let info = SourceInfo::point(file_id, start);
//! assert_eq!(info.line(), 2);
//! assert_eq!(ctx.path(file_id), Some("app.cfg"));
//! ```

pub mod context;
pub mod source_info;
pub mod types;

pub use context::{SourceContext, SourceFile};
pub use source_info::SourceInfo;
pub use types::{FileId, Location, Range};
