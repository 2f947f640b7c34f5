//! Location of a setting inside a registered file

use crate::types::{FileId, Location, Range};
use serde::{Deserialize, Serialize};

/// Where a piece of parsed text lives: a file and a range inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceInfo {
    pub file_id: FileId,
    pub range: Range,
}

impl SourceInfo {
    pub fn new(file_id: FileId, range: Range) -> Self {
        SourceInfo { file_id, range }
    }

    /// Zero-width source info at a single location.
    pub fn point(file_id: FileId, location: Location) -> Self {
        SourceInfo {
            file_id,
            range: Range {
                start: location,
                end: location,
            },
        }
    }

    /// 1-based line of the start of the range.
    pub fn line(&self) -> usize {
        self.range.start.row + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_is_one_based_and_empty() {
        let info = SourceInfo::point(
            FileId(0),
            Location {
                offset: 12,
                row: 2,
                column: 4,
            },
        );
        assert_eq!(info.line(), 3);
        assert!(info.range.is_empty());
        assert_eq!(info.range.start.offset, 12);
    }
}
