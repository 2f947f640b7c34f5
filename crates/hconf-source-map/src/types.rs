//! Core location types

use serde::{Deserialize, Serialize};

/// Identifier of a file registered in a [`crate::SourceContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub usize);

/// A position in source text (all fields 0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset from start of the file
    pub offset: usize,
    /// Line number
    pub row: usize,
    /// Column, counted in characters
    pub column: usize,
}

/// Half-open range `[start, end)` in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Location,
    pub end: Location,
}

impl Range {
    /// Length of the range in bytes.
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(offset: usize, row: usize, column: usize) -> Location {
        Location {
            offset,
            row,
            column,
        }
    }

    #[test]
    fn test_location_ordering() {
        assert!(loc(0, 0, 0) < loc(4, 0, 4));
        assert!(loc(4, 0, 4) < loc(9, 1, 0));
    }

    #[test]
    fn test_range_len() {
        let range = Range {
            start: loc(3, 0, 3),
            end: loc(10, 1, 2),
        };
        assert_eq!(range.len(), 7);
        assert!(!range.is_empty());
        assert!(Range::default().is_empty());
    }

    #[test]
    fn test_serialization_range() {
        let range = Range {
            start: loc(0, 0, 0),
            end: loc(12, 2, 4),
        };
        let json = serde_json::to_string(&range).unwrap();
        let back: Range = serde_json::from_str(&json).unwrap();
        assert_eq!(range, back);
    }
}
