//! Core diagnostic message types.

use hconf_source_map::{SourceContext, SourceInfo};
use serde::{Deserialize, Serialize};

/// The kind of diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    Error,
    Warning,
    Info,
    Note,
}

impl DiagnosticKind {
    fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Error => "Error",
            DiagnosticKind::Warning => "Warning",
            DiagnosticKind::Info => "Info",
            DiagnosticKind::Note => "Note",
        }
    }
}

/// How a detail bullet is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailKind {
    /// ✖ bullet
    Error,
    /// ℹ bullet
    Info,
    /// plain bullet
    Note,
}

impl DetailKind {
    fn bullet(self) -> &'static str {
        match self {
            DetailKind::Error => "✖",
            DetailKind::Info => "ℹ",
            DetailKind::Note => "•",
        }
    }
}

/// A detail bullet, optionally pointing at its own source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    pub kind: DetailKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

/// A structured diagnostic.
///
/// Structure:
/// 1. **Code**: optional stable error code (e.g. `H-1-2`)
/// 2. **Title**: brief message
/// 3. **Problem**: what went wrong
/// 4. **Details**: specific facts (values, names, positions)
/// 5. **Hints**: optional guidance, phrased as a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub title: String,
    pub kind: DiagnosticKind,
    pub problem: Option<String>,
    pub details: Vec<DetailItem>,
    pub hints: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

impl DiagnosticMessage {
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            code: None,
            title: title.into(),
            kind,
            problem: None,
            details: Vec::new(),
            hints: Vec::new(),
            location: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Render as text.
    ///
    /// With a [`SourceContext`] holding the content of the located file, the
    /// output starts with an ariadne snippet (title, code, problem and located
    /// details); unlocated details and hints follow as bullets. Without one,
    /// everything is rendered as bullets:
    ///
    /// ```text
    /// Error [H-1-2]: Parse error
    /// unexpected '}'
    /// ✖ in app.cfg at line 3
    /// ? Is a '{' missing?
    /// ```
    pub fn to_text(&self, ctx: Option<&SourceContext>) -> String {
        use std::fmt::Write;

        let mut result = String::new();

        let snippet = match (self.snippet_location(), ctx) {
            (Some(location), Some(ctx)) => self.render_ariadne_source_context(location, ctx),
            _ => None,
        };

        match snippet {
            Some(snippet) => {
                result.push_str(&snippet);
                for detail in self.details.iter().filter(|d| d.location.is_none()) {
                    let _ = writeln!(result, "{} {}", detail.kind.bullet(), detail.content);
                }
            }
            None => {
                match &self.code {
                    Some(code) => {
                        let _ = writeln!(result, "{} [{}]: {}", self.kind.label(), code, self.title);
                    }
                    None => {
                        let _ = writeln!(result, "{}: {}", self.kind.label(), self.title);
                    }
                }
                if let Some(problem) = &self.problem {
                    let _ = writeln!(result, "{}", problem);
                }
                for detail in &self.details {
                    let _ = writeln!(result, "{} {}", detail.kind.bullet(), detail.content);
                }
            }
        }

        for hint in &self.hints {
            let _ = writeln!(result, "? {}", hint);
        }

        result
    }

    /// Render as a JSON value.
    ///
    /// ```
    /// use hconf_error_reporting::DiagnosticMessage;
    ///
    /// let json = DiagnosticMessage::error("Something went wrong").to_json();
    /// assert_eq!(json["kind"], "error");
    /// assert_eq!(json["title"], "Something went wrong");
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let mut obj = json!({
            "kind": self.kind.label().to_lowercase(),
            "title": self.title,
        });

        if let Some(code) = &self.code {
            obj["code"] = json!(code);
        }
        if let Some(problem) = &self.problem {
            obj["problem"] = json!(problem);
        }
        if !self.details.is_empty() {
            let details: Vec<_> = self
                .details
                .iter()
                .map(|d| {
                    let mut detail = json!({
                        "kind": format!("{:?}", d.kind).to_lowercase(),
                        "content": d.content,
                    });
                    if let Some(location) = &d.location {
                        detail["location"] = json!(location);
                    }
                    detail
                })
                .collect();
            obj["details"] = json!(details);
        }
        if !self.hints.is_empty() {
            obj["hints"] = json!(self.hints);
        }
        if let Some(location) = &self.location {
            obj["location"] = json!(location);
        }

        obj
    }

    fn snippet_location(&self) -> Option<&SourceInfo> {
        self.location
            .as_ref()
            .or_else(|| self.details.iter().find_map(|d| d.location.as_ref()))
    }

    fn render_ariadne_source_context(
        &self,
        main_location: &SourceInfo,
        ctx: &SourceContext,
    ) -> Option<String> {
        use ariadne::{Color, Config, Label, Report, ReportKind, Source};

        let file = ctx.get_file(main_location.file_id)?;
        let content = file.content.as_deref()?;
        let path = file.path.clone();

        let (report_kind, main_color) = match self.kind {
            DiagnosticKind::Error => (ReportKind::Error, Color::Red),
            DiagnosticKind::Warning => (ReportKind::Warning, Color::Yellow),
            DiagnosticKind::Info => (ReportKind::Advice, Color::Cyan),
            DiagnosticKind::Note => (ReportKind::Advice, Color::Blue),
        };

        let main_span = clamp_span(main_location, content.len());
        let mut report = Report::build(report_kind, path.clone(), main_span.start)
            .with_config(Config::default().with_color(false));

        report = match &self.code {
            Some(code) => report.with_message(format!("[{}] {}", code, self.title)),
            None => report.with_message(&self.title),
        };

        let main_message = self.problem.as_deref().unwrap_or(&self.title);
        report = report.with_label(
            Label::new((path.clone(), main_span))
                .with_message(main_message)
                .with_color(main_color),
        );

        for detail in &self.details {
            let Some(location) = &detail.location else {
                continue;
            };
            if location.file_id != main_location.file_id {
                continue;
            }
            report = report.with_label(
                Label::new((path.clone(), clamp_span(location, content.len())))
                    .with_message(&detail.content),
            );
        }

        let mut output = Vec::new();
        report
            .finish()
            .write((path, Source::from(content)), &mut output)
            .ok()?;
        String::from_utf8(output).ok()
    }
}

/// ariadne needs a non-empty span inside the text to draw a label.
fn clamp_span(location: &SourceInfo, len: usize) -> std::ops::Range<usize> {
    let start = location.range.start.offset.min(len);
    let end = location.range.end.offset.clamp(start, len);
    if end > start || start == len {
        start..end
    } else {
        start..start + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hconf_source_map::{FileId, Location, Range};

    fn at(offset: usize, row: usize, column: usize) -> Location {
        Location {
            offset,
            row,
            column,
        }
    }

    #[test]
    fn test_plain_text_rendering() {
        let mut msg = DiagnosticMessage::error("Parse error").with_code("H-1-2");
        msg.problem = Some("unexpected '}'".to_string());
        msg.details.push(DetailItem {
            kind: DetailKind::Error,
            content: "in app.cfg at line 3".to_string(),
            location: None,
        });
        msg.hints.push("Is a '{' missing?".to_string());

        let text = msg.to_text(None);
        assert_eq!(
            text,
            "Error [H-1-2]: Parse error\nunexpected '}'\n✖ in app.cfg at line 3\n? Is a '{' missing?\n"
        );
    }

    #[test]
    fn test_snippet_rendering_with_context() {
        let mut ctx = SourceContext::new();
        let file_id = ctx.add_file("app.cfg", Some("a = 1;\nb = ;\n".to_string()));

        let mut msg = DiagnosticMessage::error("Parse error").with_code("H-1-2");
        msg.problem = Some("expected a value".to_string());
        msg.location = Some(SourceInfo::new(
            file_id,
            Range {
                start: at(11, 1, 4),
                end: at(12, 1, 5),
            },
        ));

        let text = msg.to_text(Some(&ctx));
        assert!(text.contains("[H-1-2] Parse error"));
        assert!(text.contains("app.cfg"));
        assert!(text.contains("expected a value"));
    }

    #[test]
    fn test_missing_file_falls_back_to_bullets() {
        let ctx = SourceContext::new();
        let mut msg = DiagnosticMessage::error("Parse error");
        msg.location = Some(SourceInfo::point(FileId(3), at(0, 0, 0)));

        assert_eq!(msg.to_text(Some(&ctx)), "Error: Parse error\n");
    }

    #[test]
    fn test_json_rendering() {
        let mut msg = DiagnosticMessage::warning("Odd value").with_code("H-2-2");
        msg.hints.push("Use a smaller number?".to_string());
        let json = msg.to_json();

        assert_eq!(json["kind"], "warning");
        assert_eq!(json["code"], "H-2-2");
        assert_eq!(json["hints"][0], "Use a smaller number?");
        assert!(json.get("location").is_none());
    }

    #[test]
    fn test_clamp_span() {
        let info = SourceInfo::point(FileId(0), at(4, 0, 4));
        assert_eq!(clamp_span(&info, 10), 4..5);
        assert_eq!(clamp_span(&info, 4), 4..4);
    }
}
