/*
 * tree.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Arena storage for the setting tree.
//!
//! Settings live in a slot vector and are addressed by [`NodeId`], an index
//! paired with the generation of the slot. Freeing a slot bumps its
//! generation, so a handle kept past the removal of its setting is reported
//! as [`Error::StaleNode`] instead of silently reaching a newer setting.
//! Each tree also has its own id, so handles from a cleared or re-read
//! document, or from another document, are rejected the same way.

use crate::error::{Error, Result};
use crate::value::{Format, Kind, Value};
use hconf_source_map::SourceInfo;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_TREE_ID: AtomicU32 = AtomicU32::new(0);

/// Handle to a setting inside one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    tree: u32,
    index: u32,
    generation: u32,
}

/// Addresses a child of an aggregate: by member name or by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
    Name(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(name: &'a str) -> Self {
        Key::Name(name)
    }
}

impl<'a> From<&'a String> for Key<'a> {
    fn from(name: &'a String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key<'_> {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

/// Called when the arena cannot grow. The process aborts once it returns.
#[derive(Clone)]
pub struct FatalErrorHandler(Arc<dyn Fn(&str) + Send + Sync>);

impl FatalErrorHandler {
    pub fn new(handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        FatalErrorHandler(Arc::new(handler))
    }

    pub(crate) fn fail(&self, message: &str) -> ! {
        (self.0)(message);
        std::process::abort()
    }
}

impl Default for FatalErrorHandler {
    fn default() -> Self {
        FatalErrorHandler::new(|message| eprintln!("hconf: fatal: {}", message))
    }
}

impl fmt::Debug for FatalErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FatalErrorHandler(..)")
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Payload {
    Scalar(Value),
    Group(IndexMap<String, NodeId>),
    Elements(Vec<NodeId>),
}

/// One node of the tree.
#[derive(Debug, Clone)]
pub struct Setting {
    kind: Kind,
    name: Option<String>,
    format: Format,
    pub(crate) payload: Payload,
    parent: Option<NodeId>,
    pub(crate) source: Option<SourceInfo>,
}

impl Setting {
    fn new(kind: Kind, name: Option<String>, format: Format, parent: Option<NodeId>) -> Self {
        let payload = match kind {
            Kind::Group => Payload::Group(IndexMap::new()),
            Kind::Array | Kind::List => Payload::Elements(Vec::new()),
            // scalar kinds always have a default
            _ => Payload::Scalar(Value::default_for(kind).unwrap_or(Value::Int(0))),
        };
        Setting {
            kind,
            name,
            format,
            payload,
            parent,
            source: None,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Member name; `None` for the root and for array or list elements.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Integer output format. Meaningful for int and int64 settings only.
    pub fn format(&self) -> Format {
        self.format
    }

    pub(crate) fn set_format(&mut self, format: Format) {
        self.format = format;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Where the setting was read from, if it came from parsed text.
    pub fn source(&self) -> Option<&SourceInfo> {
        self.source.as_ref()
    }

    /// Scalar payload; `None` for aggregates.
    pub fn value(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    setting: Option<Setting>,
}

/// Iterator over the children of an aggregate, in document order.
#[derive(Debug, Clone)]
pub enum Children<'a> {
    Members(indexmap::map::Values<'a, String, NodeId>),
    Elements(std::slice::Iter<'a, NodeId>),
    Empty,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        match self {
            Children::Members(it) => it.next().copied(),
            Children::Elements(it) => it.next().copied(),
            Children::Empty => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Children::Members(it) => it.size_hint(),
            Children::Elements(it) => it.size_hint(),
            Children::Empty => (0, Some(0)),
        }
    }
}

impl ExactSizeIterator for Children<'_> {}

/// Whether `name` is a legal member name: `[A-Za-z*][-A-Za-z0-9_*]*`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '*' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '*'))
}

#[derive(Debug, Clone)]
pub(crate) struct Tree {
    id: u32,
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    fatal: FatalErrorHandler,
}

impl Tree {
    pub(crate) fn new(fatal: FatalErrorHandler) -> Self {
        let id = NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed);
        let root = NodeId {
            tree: id,
            index: 0,
            generation: 0,
        };
        Tree {
            id,
            slots: vec![Slot {
                generation: 0,
                setting: Some(Setting::new(Kind::Group, None, Format::Decimal, None)),
            }],
            free: Vec::new(),
            root,
            fatal,
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live settings, the root included.
    pub(crate) fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn get(&self, id: NodeId) -> Result<&Setting> {
        if id.tree != self.id {
            return Err(Error::StaleNode);
        }
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.setting.as_ref())
            .ok_or(Error::StaleNode)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut Setting> {
        if id.tree != self.id {
            return Err(Error::StaleNode);
        }
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.setting.as_mut())
            .ok_or(Error::StaleNode)
    }

    fn alloc(&mut self, setting: Setting) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.setting = Some(setting);
            return NodeId {
                tree: self.id,
                index,
                generation: slot.generation,
            };
        }

        if self.slots.len() >= u32::MAX as usize {
            self.fatal.fail("setting arena is full");
        }
        if self.slots.len() == self.slots.capacity() && self.slots.try_reserve(1).is_err() {
            self.fatal.fail("out of memory while growing the setting arena");
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            setting: Some(setting),
        });
        NodeId {
            tree: self.id,
            index,
            generation: 0,
        }
    }

    /// Free `id` and everything below it. Does not unlink it from its parent.
    fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let Some(slot) = self.slots.get_mut(id.index as usize) else {
                continue;
            };
            if id.tree != self.id || slot.generation != id.generation {
                continue;
            }
            if let Some(setting) = slot.setting.take() {
                match setting.payload {
                    Payload::Group(members) => pending.extend(members.into_values()),
                    Payload::Elements(elements) => pending.extend(elements),
                    Payload::Scalar(_) => {}
                }
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
    }

    /// Add a child to `parent`.
    ///
    /// Group members need a valid, unique name; with `overrides` a duplicate
    /// replaces the existing member at its position. Names are ignored for
    /// array and list elements. Arrays only take scalars of one kind.
    pub(crate) fn add(
        &mut self,
        parent: NodeId,
        name: Option<&str>,
        kind: Kind,
        format: Format,
        overrides: bool,
    ) -> Result<NodeId> {
        let parent_setting = self.get(parent)?;

        let stored_name = match &parent_setting.payload {
            Payload::Scalar(_) => {
                return Err(Error::NotAggregate {
                    path: self.path(parent)?,
                    kind: parent_setting.kind,
                });
            }
            Payload::Group(members) => {
                let Some(name) = name else {
                    return Err(Error::MissingName {
                        path: self.path(parent)?,
                    });
                };
                if !is_valid_name(name) {
                    return Err(Error::InvalidName {
                        name: name.to_string(),
                    });
                }
                if !overrides && members.contains_key(name) {
                    return Err(Error::NameConflict {
                        path: self.path(parent)?,
                        name: name.to_string(),
                    });
                }
                Some(name.to_string())
            }
            Payload::Elements(elements) => {
                if parent_setting.kind == Kind::Array {
                    let expected = match elements.first() {
                        Some(first) => Some(self.get(*first)?.kind),
                        None => None,
                    };
                    if kind.is_aggregate() || expected.is_some_and(|e| e != kind) {
                        return Err(Error::ArrayKindConflict {
                            path: self.path(parent)?,
                            expected,
                            actual: kind,
                        });
                    }
                }
                None
            }
        };

        let id = self.alloc(Setting::new(kind, stored_name.clone(), format, Some(parent)));

        let replaced = match &mut self.get_mut(parent)?.payload {
            Payload::Group(members) => match stored_name {
                Some(name) => members.insert(name, id),
                None => None,
            },
            Payload::Elements(elements) => {
                elements.push(id);
                None
            }
            Payload::Scalar(_) => None,
        };
        if let Some(old) = replaced {
            tracing::debug!(name = ?name, "replacing existing member");
            self.free_subtree(old);
        }

        Ok(id)
    }

    pub(crate) fn set_value(&mut self, id: NodeId, value: Value) -> Result<()> {
        let setting = self.get_mut(id)?;
        if let Payload::Scalar(slot) = &mut setting.payload {
            *slot = value;
            return Ok(());
        }
        let kind = setting.kind;
        Err(Error::NotScalar {
            path: self.path(id)?,
            kind,
        })
    }

    /// Find the child of `parent` addressed by `key`.
    pub(crate) fn child(&self, parent: NodeId, key: Key<'_>) -> Result<Option<NodeId>> {
        let setting = self.get(parent)?;
        Ok(match (&setting.payload, key) {
            (Payload::Group(members), Key::Name(name)) => members.get(name).copied(),
            (Payload::Group(members), Key::Index(i)) => members.get_index(i).map(|(_, id)| *id),
            (Payload::Elements(elements), Key::Index(i)) => elements.get(i).copied(),
            (Payload::Elements(_), Key::Name(_)) => None,
            (Payload::Scalar(_), _) => {
                return Err(Error::NotAggregate {
                    path: self.path(parent)?,
                    kind: setting.kind,
                });
            }
        })
    }

    /// Remove the child of `parent` addressed by `key`, with its subtree.
    pub(crate) fn remove(&mut self, parent: NodeId, key: Key<'_>) -> Result<()> {
        let removed = match self.child(parent, key)? {
            Some(id) => id,
            None => {
                return Err(Error::NotFound {
                    path: self.path(parent)?,
                    segment: match key {
                        Key::Name(name) => name.to_string(),
                        Key::Index(i) => format!("[{}]", i),
                    },
                });
            }
        };
        self.unlink(parent, removed)?;
        self.free_subtree(removed);
        Ok(())
    }

    /// Remove `id` from its parent, with its subtree.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Result<()> {
        let parent = self.get(id)?.parent.ok_or(Error::RootRemoval)?;
        self.unlink(parent, id)?;
        self.free_subtree(id);
        Ok(())
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        match &mut self.get_mut(parent)?.payload {
            Payload::Group(members) => members.retain(|_, id| *id != child),
            Payload::Elements(elements) => elements.retain(|id| *id != child),
            Payload::Scalar(_) => {}
        }
        Ok(())
    }

    pub(crate) fn children(&self, id: NodeId) -> Result<Children<'_>> {
        Ok(match &self.get(id)?.payload {
            Payload::Group(members) => Children::Members(members.values()),
            Payload::Elements(elements) => Children::Elements(elements.iter()),
            Payload::Scalar(_) => Children::Empty,
        })
    }

    /// Number of children; 0 for scalars.
    pub(crate) fn len(&self, id: NodeId) -> Result<usize> {
        Ok(match &self.get(id)?.payload {
            Payload::Group(members) => members.len(),
            Payload::Elements(elements) => elements.len(),
            Payload::Scalar(_) => 0,
        })
    }

    /// Position of `id` within its parent; `None` for the root.
    pub(crate) fn index_of(&self, id: NodeId) -> Result<Option<usize>> {
        let Some(parent) = self.get(id)?.parent else {
            return Ok(None);
        };
        Ok(match &self.get(parent)?.payload {
            Payload::Group(members) => members.values().position(|c| *c == id),
            Payload::Elements(elements) => elements.iter().position(|c| *c == id),
            Payload::Scalar(_) => None,
        })
    }

    /// Dotted path from the root, e.g. `servers[0].host`. Empty for the root.
    pub(crate) fn path(&self, id: NodeId) -> Result<String> {
        let mut segments = Vec::new();
        let mut current = id;
        loop {
            let setting = self.get(current)?;
            let Some(parent) = setting.parent else {
                break;
            };
            match &setting.name {
                Some(name) => segments.push(name.clone()),
                None => {
                    let index = self.index_of(current)?.unwrap_or(0);
                    segments.push(format!("[{}]", index));
                }
            }
            current = parent;
        }

        let mut path = String::new();
        for segment in segments.iter().rev() {
            if !path.is_empty() && !segment.starts_with('[') {
                path.push('.');
            }
            path.push_str(segment);
        }
        Ok(path)
    }
}
