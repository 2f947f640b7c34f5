//! Diagnostic messages for hconf.
//!
//! Errors raised by the `hconf` crate are plain enums; this crate turns them
//! into structured, human-facing reports:
//!
//! - [`DiagnosticMessage`]: title, problem statement, detail bullets, hints
//!   and an optional source location
//! - [`DiagnosticMessageBuilder`]: builder for the above
//! - [`catalog`]: stable error codes (`H-<subsystem>-<number>`)
//!
//! Messages render as plain text (with an `ariadne` source snippet when the
//! location's file content is available) or as JSON.
//!
//! # Example
//!
//! ```
//! use hconf_error_reporting::DiagnosticMessageBuilder;
//!
//! let msg = DiagnosticMessageBuilder::error("Setting not found")
//!     .with_code("H-2-3")
//!     .problem("No setting at `server.port`")
//!     .add_hint("Check the spelling of the path?")
//!     .build();
//! assert!(msg.to_text(None).contains("Setting not found"));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_error_info};
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage};
