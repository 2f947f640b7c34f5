/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Document-level options.

bitflags::bitflags! {
    /// Behaviour switches for a document.
    ///
    /// Most flags only shape the writer's output; the parser accepts both
    /// assignment characters and both statement terminators whatever is set
    /// here, unless [`Options::STRICT_ASSIGNMENT`] is enabled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Options: u32 {
        /// Numeric reads and writes may widen or narrow between kinds.
        const AUTO_CONVERT = 1 << 0;
        /// Terminate every written statement with `;`.
        const SEMICOLON_SEPARATORS = 1 << 1;
        /// Write `name : { ... }` instead of `name = { ... }`.
        const COLON_ASSIGNMENT_FOR_GROUPS = 1 << 2;
        /// Write `name : value` for every setting that is not a group.
        const COLON_ASSIGNMENT_FOR_NON_GROUPS = 1 << 3;
        /// Put the opening brace of a group on its own line.
        const OPEN_BRACE_ON_SEPARATE_LINE = 1 << 4;
        /// Let the writer choose scientific notation for floats.
        const ALLOW_SCIENTIFIC_NOTATION = 1 << 5;
        /// Flush written files to disk before returning.
        const FSYNC = 1 << 6;
        /// Adding a duplicate group member replaces the existing one in place.
        const ALLOW_OVERRIDES = 1 << 7;
        /// Parser rejects an assignment character that differs from the one
        /// the writer would use for that kind of setting.
        const STRICT_ASSIGNMENT = 1 << 8;
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::SEMICOLON_SEPARATORS
            | Options::COLON_ASSIGNMENT_FOR_GROUPS
            | Options::OPEN_BRACE_ON_SEPARATE_LINE
    }
}

impl Options {
    /// The assignment character written for a setting.
    pub fn assignment_char(self, is_group: bool) -> char {
        let colon = if is_group {
            self.contains(Options::COLON_ASSIGNMENT_FOR_GROUPS)
        } else {
            self.contains(Options::COLON_ASSIGNMENT_FOR_NON_GROUPS)
        };
        if colon { ':' } else { '=' }
    }
}

pub const DEFAULT_TAB_WIDTH: u8 = 2;
pub const MAX_TAB_WIDTH: u8 = 15;
pub const DEFAULT_FLOAT_PRECISION: u8 = 6;
pub const MAX_FLOAT_PRECISION: u8 = 17;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(options.contains(Options::SEMICOLON_SEPARATORS));
        assert!(options.contains(Options::OPEN_BRACE_ON_SEPARATE_LINE));
        assert!(!options.contains(Options::AUTO_CONVERT));
        assert!(!options.contains(Options::ALLOW_OVERRIDES));
    }

    #[test]
    fn test_assignment_char() {
        let options = Options::default();
        assert_eq!(options.assignment_char(true), ':');
        assert_eq!(options.assignment_char(false), '=');

        let options = Options::COLON_ASSIGNMENT_FOR_NON_GROUPS;
        assert_eq!(options.assignment_char(true), '=');
        assert_eq!(options.assignment_char(false), ':');
    }
}
