//! Registry of the files read into a document

use crate::types::FileId;
use serde::{Deserialize, Serialize};

/// Every file that contributed text to a document, in the order it was read.
///
/// File ids are indices into the registry, so they stay valid until the
/// registry is truncated below them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceContext {
    files: Vec<SourceFile>,
}

/// A registered source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Display path (the real path for files, a label such as `<string>` otherwise)
    pub path: String,
    /// The text that was parsed, kept for snippet rendering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl SourceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and return its id.
    ///
    /// When `content` is `None` the file is recorded by path only and no
    /// snippet can be rendered for it.
    pub fn add_file(&mut self, path: impl Into<String>, content: Option<String>) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile {
            path: path.into(),
            content,
        });
        id
    }

    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    pub fn path(&self, id: FileId) -> Option<&str> {
        self.get_file(id).map(|f| f.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over `(id, file)` pairs in registration order.
    pub fn files(&self) -> impl Iterator<Item = (FileId, &SourceFile)> {
        self.files.iter().enumerate().map(|(i, f)| (FileId(i), f))
    }

    /// Forget every file registered at or after index `len`.
    pub fn truncate(&mut self, len: usize) {
        self.files.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context() {
        let ctx = SourceContext::new();
        assert!(ctx.is_empty());
        assert!(ctx.get_file(FileId(0)).is_none());
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut ctx = SourceContext::new();
        let a = ctx.add_file("main.cfg", Some("a = 1;".to_string()));
        let b = ctx.add_file("extra.cfg", None);

        assert_eq!(a, FileId(0));
        assert_eq!(b, FileId(1));
        assert_eq!(ctx.path(b), Some("extra.cfg"));
        assert_eq!(ctx.files().count(), 2);
    }

    #[test]
    fn test_truncate_drops_later_files() {
        let mut ctx = SourceContext::new();
        ctx.add_file("a.cfg", Some("x = 1;".to_string()));
        ctx.add_file("b.cfg", Some("y = 2;".to_string()));
        ctx.truncate(1);

        assert_eq!(ctx.len(), 1);
        assert!(ctx.get_file(FileId(1)).is_none());
        // ids are reused after truncation
        assert_eq!(ctx.add_file("c.cfg", None), FileId(1));
    }

    #[test]
    fn test_serialization_skips_missing_content() {
        let mut ctx = SourceContext::new();
        ctx.add_file("a.cfg", None);
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("a.cfg"));
        assert!(!json.contains("content"));
    }
}
