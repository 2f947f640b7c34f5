//! Builder API for diagnostic messages.

use crate::diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage};
use hconf_source_map::SourceInfo;

/// Builder for [`DiagnosticMessage`].
///
/// ```
/// use hconf_error_reporting::{DiagnosticKind, DiagnosticMessageBuilder};
///
/// let msg = DiagnosticMessageBuilder::error("Type mismatch")
///     .with_code("H-2-1")
///     .problem("`port` holds a string")
///     .add_detail("expected int")
///     .add_info("enable auto-convert only for numeric settings")
///     .build();
///
/// assert_eq!(msg.kind, DiagnosticKind::Error);
/// assert_eq!(msg.details.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    message: DiagnosticMessage,
}

impl DiagnosticMessageBuilder {
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(kind, title),
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.message.code = Some(code.into());
        self
    }

    pub fn problem(mut self, problem: impl Into<String>) -> Self {
        self.message.problem = Some(problem.into());
        self
    }

    /// Add an error (✖) bullet.
    pub fn add_detail(self, content: impl Into<String>) -> Self {
        self.push_detail(DetailKind::Error, content.into())
    }

    /// Add an info (ℹ) bullet.
    pub fn add_info(self, content: impl Into<String>) -> Self {
        self.push_detail(DetailKind::Info, content.into())
    }

    pub fn add_hint(mut self, hint: impl Into<String>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    pub fn at_location(mut self, location: SourceInfo) -> Self {
        self.message.location = Some(location);
        self
    }

    pub fn build(self) -> DiagnosticMessage {
        self.message
    }

    fn push_detail(mut self, kind: DetailKind, content: String) -> Self {
        self.message.details.push(DetailItem {
            kind,
            content,
            location: None,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_everything() {
        let msg = DiagnosticMessageBuilder::warning("Odd")
            .with_code("H-0-1")
            .problem("p")
            .add_detail("d")
            .add_info("i")
            .add_hint("h?")
            .build();

        assert_eq!(msg.kind, DiagnosticKind::Warning);
        assert_eq!(msg.code.as_deref(), Some("H-0-1"));
        assert_eq!(msg.problem.as_deref(), Some("p"));
        assert_eq!(msg.details[0].kind, DetailKind::Error);
        assert_eq!(msg.details[1].kind, DetailKind::Info);
        assert_eq!(msg.hints, vec!["h?".to_string()]);
    }
}
