/*
 * copy.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Deep copy of subtrees, within a document or between documents.
//!
//! The source subtree is first taken as a [`Detached`] snapshot, then grafted
//! under the destination through the checked `add`, so a copy can never
//! break the group or array invariants of the destination tree.

use crate::error::{Error, Result};
use crate::tree::{NodeId, Payload, Tree};
use crate::value::{Format, Kind, Value};

/// An owned copy of a subtree, independent of any arena.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Detached {
    pub name: Option<String>,
    pub kind: Kind,
    pub format: Format,
    pub value: Option<Value>,
    pub children: Vec<Detached>,
}

impl Tree {
    pub(crate) fn detach(&self, id: NodeId) -> Result<Detached> {
        let setting = self.get(id)?;
        let children = match &setting.payload {
            Payload::Scalar(_) => Vec::new(),
            Payload::Group(members) => members
                .values()
                .map(|child| self.detach(*child))
                .collect::<Result<_>>()?,
            Payload::Elements(elements) => elements
                .iter()
                .map(|child| self.detach(*child))
                .collect::<Result<_>>()?,
        };
        Ok(Detached {
            name: setting.name().map(str::to_string),
            kind: setting.kind(),
            format: setting.format(),
            value: setting.value().cloned(),
            children,
        })
    }

    /// Rebuild `detached` as a new child of `parent`.
    ///
    /// On failure nothing below `parent` is left behind.
    pub(crate) fn graft(&mut self, parent: NodeId, detached: &Detached, overrides: bool) -> Result<NodeId> {
        let id = self.add(
            parent,
            detached.name.as_deref(),
            detached.kind,
            detached.format,
            overrides,
        )?;
        if let Err(e) = self.fill(id, detached, overrides) {
            self.remove_node(id)?;
            return Err(e);
        }
        Ok(id)
    }

    fn fill(&mut self, id: NodeId, detached: &Detached, overrides: bool) -> Result<()> {
        if let Some(value) = &detached.value {
            self.set_value(id, value.clone())?;
        }
        for child in &detached.children {
            self.graft(id, child, overrides)?;
        }
        Ok(())
    }
}

/// Only groups and lists can receive copies.
fn check_destination(tree: &Tree, dest: NodeId) -> Result<Kind> {
    let kind = tree.get(dest)?.kind();
    match kind {
        Kind::Group | Kind::List => Ok(kind),
        _ => Err(Error::InvalidDestination {
            path: tree.path(dest)?,
            kind,
        }),
    }
}

/// Copy a detached subtree under `dest`.
pub(crate) fn copy_into(tree: &mut Tree, dest: NodeId, source: &Detached, overrides: bool) -> Result<NodeId> {
    check_destination(tree, dest)?;
    let destination = tree.path(dest)?;
    tracing::debug!(
        name = ?source.name,
        kind = %source.kind,
        destination = %destination,
        "copying setting"
    );
    tree.graft(dest, source, overrides)
}

/// Copy every child of a detached aggregate under `dest`.
///
/// All conflicts are checked before the first child is added, so a failed
/// merge leaves `dest` unchanged.
pub(crate) fn merge_into(tree: &mut Tree, dest: NodeId, source: &Detached, overrides: bool) -> Result<()> {
    let dest_kind = check_destination(tree, dest)?;
    if source.kind.is_scalar() {
        return Err(Error::NotAggregate {
            path: source.name.clone().unwrap_or_default(),
            kind: source.kind,
        });
    }

    if dest_kind == Kind::Group {
        for child in &source.children {
            let Some(name) = child.name.as_deref() else {
                return Err(Error::MissingName {
                    path: tree.path(dest)?,
                });
            };
            if !overrides && tree.child(dest, name.into())?.is_some() {
                return Err(Error::NameConflict {
                    path: tree.path(dest)?,
                    name: name.to_string(),
                });
            }
        }
    }

    let destination = tree.path(dest)?;
    tracing::debug!(
        children = source.children.len(),
        destination = %destination,
        "merging settings"
    );

    let mut added = Vec::with_capacity(source.children.len());
    for child in &source.children {
        match tree.graft(dest, child, overrides) {
            Ok(id) => added.push(id),
            Err(e) => {
                for id in added {
                    tree.remove_node(id)?;
                }
                return Err(e);
            }
        }
    }
    Ok(())
}
