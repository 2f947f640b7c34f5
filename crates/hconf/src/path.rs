/*
 * path.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Path expressions such as `app.servers[1].host`.
//!
//! Member names are separated by `.`, `/` or `:`. Each name may be followed by
//! any number of zero-based `[n]` indices, which address array or list
//! elements (or group members by position). A segment may consist of indices
//! alone, so `[0].name` resolves against a list. The empty path resolves to
//! the starting setting itself.

use crate::error::{Error, Result};
use crate::tree::{Key, NodeId, Tree};
use crate::value::Kind;

#[derive(Debug, PartialEq, Eq)]
enum Step<'p> {
    Member(&'p str),
    Index(usize),
}

fn is_separator(c: char) -> bool {
    matches!(c, '.' | '/' | ':')
}

/// Split one separator-delimited segment into steps.
fn segment_steps(segment: &str) -> Option<Vec<Step<'_>>> {
    let (name, mut rest) = match segment.find('[') {
        Some(pos) => segment.split_at(pos),
        None => (segment, ""),
    };

    let mut steps = Vec::new();
    if !name.is_empty() {
        if name.contains(']') {
            return None;
        }
        steps.push(Step::Member(name));
    }
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        let digits = &inner[..close];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        steps.push(Step::Index(digits.parse().ok()?));
        rest = &inner[close + 1..];
    }

    if steps.is_empty() { None } else { Some(steps) }
}

/// Resolve `path` starting at `from`.
pub(crate) fn resolve(tree: &Tree, from: NodeId, path: &str) -> Result<NodeId> {
    tree.get(from)?;
    let mut current = from;
    if path.is_empty() {
        return Ok(current);
    }

    let not_found = |segment: &str| Error::NotFound {
        path: path.to_string(),
        segment: segment.to_string(),
    };

    for segment in path.split(is_separator) {
        let steps = segment_steps(segment).ok_or_else(|| not_found(segment))?;
        for step in steps {
            let (key, shown) = match step {
                Step::Member(name) => {
                    if tree.get(current)?.kind() != Kind::Group {
                        return Err(not_found(name));
                    }
                    (Key::Name(name), name.to_string())
                }
                Step::Index(i) => (Key::Index(i), format!("[{}]", i)),
            };
            current = match tree.child(current, key) {
                Ok(Some(id)) => id,
                Ok(None) | Err(Error::NotAggregate { .. }) => return Err(not_found(&shown)),
                Err(e) => return Err(e),
            };
        }
    }

    tracing::trace!(path, "resolved path");
    Ok(current)
}
