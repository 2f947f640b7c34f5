/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for reading, querying, mutating and writing documents.

use crate::value::Kind;
use hconf_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use hconf_source_map::{FileId, SourceInfo};
use thiserror::Error;

/// Errors returned by document operations.
///
/// Tree mutations that fail leave the tree exactly as it was; a failed read
/// leaves the previously loaded document in place.
#[derive(Debug, Error)]
pub enum Error {
    /// Text that could not be split into tokens.
    #[error("{file}:{line}: {message}")]
    Lexical {
        file: String,
        line: usize,
        message: String,
        location: Option<SourceInfo>,
    },

    /// Tokens that do not follow the grammar, or a failed `@include`.
    #[error("{file}:{line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
        location: Option<SourceInfo>,
    },

    /// Scalar access with a kind the setting cannot be read or written as.
    #[error("type mismatch at `{}`: expected {expected}, found {actual}", show_path(.path))]
    Type {
        path: String,
        expected: Kind,
        actual: Kind,
    },

    /// Value access on a group, array or list.
    #[error("`{}` is a {kind} and holds no scalar value", show_path(.path))]
    NotScalar { path: String, kind: Kind },

    /// Numeric conversion that does not fit the target width.
    #[error("value at `{}` does not fit in {target}", show_path(.path))]
    Range { path: String, target: Kind },

    #[error("no setting at `{path}`: `{segment}` not found")]
    NotFound { path: String, segment: String },

    /// Duplicate member name in a group.
    #[error("group `{}` already has a member named `{name}`", show_path(.path))]
    NameConflict { path: String, name: String },

    /// Array element whose kind differs from the elements already present.
    #[error(
        "array `{}` holds {} elements and cannot take a {actual}",
        show_path(.path),
        show_expected(.expected)
    )]
    ArrayKindConflict {
        path: String,
        /// Kind of the existing elements; `None` for an empty array
        expected: Option<Kind>,
        actual: Kind,
    },

    /// Child operation on a scalar setting.
    #[error("`{}` is a {kind} and cannot hold child settings", show_path(.path))]
    NotAggregate { path: String, kind: Kind },

    #[error("invalid setting name `{name}`")]
    InvalidName { name: String },

    /// Unnamed setting added or copied into a group.
    #[error("members of group `{}` must be named", show_path(.path))]
    MissingName { path: String },

    /// Copy into something other than a group or list.
    #[error("cannot copy into `{}`: it is a {kind}, not a group or list", show_path(.path))]
    InvalidDestination { path: String, kind: Kind },

    /// A `NodeId` whose setting has been removed.
    #[error("setting handle refers to a removed setting")]
    StaleNode,

    #[error("the root group cannot be removed")]
    RootRemoval,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, Error>;

fn show_path(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

fn show_expected(expected: &Option<Kind>) -> String {
    match expected {
        Some(kind) => kind.to_string(),
        None => "scalar".to_string(),
    }
}

impl Error {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable error code from the diagnostics catalog.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Lexical { .. } => "H-1-1",
            Error::Parse { .. } => "H-1-2",
            Error::Type { .. } | Error::NotScalar { .. } => "H-2-1",
            Error::Range { .. } => "H-2-2",
            Error::NotFound { .. } => "H-2-3",
            Error::NameConflict { .. } => "H-2-4",
            Error::ArrayKindConflict { .. } => "H-2-5",
            Error::NotAggregate { .. } => "H-2-6",
            Error::InvalidName { .. } => "H-2-7",
            Error::MissingName { .. } => "H-2-8",
            Error::InvalidDestination { .. } => "H-2-9",
            Error::StaleNode => "H-2-10",
            Error::RootRemoval => "H-2-11",
            Error::Io { .. } => "H-3-1",
        }
    }

    /// Source location of a lexical or parse error.
    pub fn location(&self) -> Option<&SourceInfo> {
        match self {
            Error::Lexical { location, .. } | Error::Parse { location, .. } => location.as_ref(),
            _ => None,
        }
    }

    /// Move the location `by` slots along the source registry.
    pub(crate) fn shift_file_ids(mut self, by: usize) -> Self {
        if let Error::Lexical {
            location: Some(info),
            ..
        }
        | Error::Parse {
            location: Some(info),
            ..
        } = &mut self
        {
            info.file_id = FileId(info.file_id.0 + by);
        }
        self
    }

    /// Convert into a structured diagnostic.
    ///
    /// Render it with `to_text(Some(config.sources()))` to get a source
    /// snippet for syntax errors.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let title = hconf_error_reporting::get_error_info(self.code())
            .map(|info| info.title.clone())
            .unwrap_or_else(|| "Configuration Error".to_string());

        let mut builder = DiagnosticMessageBuilder::error(title).with_code(self.code());

        match self {
            Error::Lexical {
                file,
                line,
                message,
                location,
            }
            | Error::Parse {
                file,
                line,
                message,
                location,
            } => {
                builder = builder
                    .problem(message.clone())
                    .add_info(format!("in {} at line {}", file, line));
                if let Some(location) = location {
                    builder = builder.at_location(*location);
                }
            }
            Error::Type { expected, .. } => {
                builder = builder
                    .problem(self.to_string())
                    .add_hint(format!(
                        "Enable auto-convert, or read the setting as {}?",
                        expected
                    ));
            }
            Error::NameConflict { .. } => {
                builder = builder
                    .problem(self.to_string())
                    .add_hint("Enable overrides to replace the existing member?");
            }
            Error::Io { source, .. } => {
                builder = builder
                    .problem(self.to_string())
                    .add_detail(source.to_string());
            }
            _ => {
                builder = builder.problem(self.to_string());
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_root_placeholder() {
        let err = Error::NameConflict {
            path: String::new(),
            name: "x".to_string(),
        };
        assert_eq!(err.to_string(), "group `<root>` already has a member named `x`");
    }

    #[test]
    fn test_array_conflict_display() {
        let err = Error::ArrayKindConflict {
            path: "a.b".to_string(),
            expected: Some(Kind::Int),
            actual: Kind::String,
        };
        assert_eq!(
            err.to_string(),
            "array `a.b` holds int elements and cannot take a string"
        );

        let err = Error::ArrayKindConflict {
            path: "a".to_string(),
            expected: None,
            actual: Kind::Group,
        };
        assert_eq!(
            err.to_string(),
            "array `a` holds scalar elements and cannot take a group"
        );
    }

    #[test]
    fn test_parse_error_diagnostic() {
        let err = Error::Parse {
            file: "app.cfg".to_string(),
            line: 4,
            message: "unexpected '}'".to_string(),
            location: None,
        };
        assert_eq!(err.to_string(), "app.cfg:4: unexpected '}'");

        let diag = err.to_diagnostic();
        assert_eq!(diag.code.as_deref(), Some("H-1-2"));
        assert_eq!(diag.title, "Parse Error");
        let text = diag.to_text(None);
        assert!(text.contains("unexpected '}'"));
        assert!(text.contains("in app.cfg at line 4"));
    }

    #[test]
    fn test_every_code_is_cataloged() {
        let samples = [
            Error::StaleNode,
            Error::RootRemoval,
            Error::InvalidName {
                name: "1x".to_string(),
            },
            Error::Range {
                path: "n".to_string(),
                target: Kind::Int,
            },
            Error::io("x.cfg", std::io::Error::other("boom")),
        ];
        for err in samples {
            assert!(hconf_error_reporting::get_error_info(err.code()).is_some());
        }
    }
}
