/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The document: a setting tree plus the options that govern it.

use crate::coerce::{self, Failure, Mode};
use crate::copy;
use crate::error::{Error, Result};
use crate::options::{
    DEFAULT_FLOAT_PRECISION, DEFAULT_TAB_WIDTH, MAX_FLOAT_PRECISION, MAX_TAB_WIDTH, Options,
};
use crate::parser::{self, ParseContext};
use crate::path;
use crate::resolver::{FileSystemResolver, IncludeResolver};
use crate::tree::{Children, FatalErrorHandler, Key, NodeId, Setting, Tree};
use crate::value::{Format, Kind, Value};
use crate::writer::{self, Layout};
use hconf_source_map::{SourceContext, SourceInfo};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name under which text read from a string is registered.
const STRING_SOURCE: &str = "<string>";

/// A configuration document.
///
/// Settings are addressed by [`NodeId`] handles obtained from [`Config::root`],
/// [`Config::lookup`], [`Config::add`] and friends. Handles stay valid until
/// their setting is removed or the document is re-read or cleared.
///
/// # Example
///
/// ```
/// use hconf::Config;
///
/// let mut config = Config::new();
/// config.read_str("server = { port = 8080; hosts = [\"a\", \"b\"]; };").unwrap();
/// assert_eq!(config.lookup_i32("server.port").unwrap(), 8080);
/// assert_eq!(config.lookup_str("server.hosts[1]").unwrap(), "b");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    tree: Tree,
    options: Options,
    default_format: Format,
    tab_width: u8,
    float_precision: u8,
    include_dir: Option<PathBuf>,
    resolver: Arc<dyn IncludeResolver>,
    sources: SourceContext,
    /// Leading entries of `sources` that belong to the current tree
    tree_files: usize,
    fatal: FatalErrorHandler,
}

/// Builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    options: Options,
    default_format: Format,
    tab_width: u8,
    float_precision: u8,
    include_dir: Option<PathBuf>,
    resolver: Arc<dyn IncludeResolver>,
    fatal: FatalErrorHandler,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        ConfigBuilder {
            options: Options::default(),
            default_format: Format::Decimal,
            tab_width: DEFAULT_TAB_WIDTH,
            float_precision: DEFAULT_FLOAT_PRECISION,
            include_dir: None,
            resolver: Arc::new(FileSystemResolver),
            fatal: FatalErrorHandler::default(),
        }
    }
}

impl ConfigBuilder {
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Format given to integer settings that do not specify one.
    pub fn default_format(mut self, format: Format) -> Self {
        self.default_format = format;
        self
    }

    /// Spaces per indentation level, at most 15. Zero indents with tabs.
    pub fn tab_width(mut self, width: u8) -> Self {
        self.tab_width = width.min(MAX_TAB_WIDTH);
        self
    }

    /// Digits written for floats, at most 17.
    pub fn float_precision(mut self, digits: u8) -> Self {
        self.float_precision = digits.min(MAX_FLOAT_PRECISION);
        self
    }

    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dir = Some(dir.into());
        self
    }

    pub fn resolver(mut self, resolver: impl IncludeResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Handler called before the process aborts on allocation failure.
    pub fn fatal_error_handler(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.fatal = FatalErrorHandler::new(handler);
        self
    }

    pub fn build(self) -> Config {
        Config {
            tree: Tree::new(self.fatal.clone()),
            options: self.options,
            default_format: self.default_format,
            tab_width: self.tab_width,
            float_precision: self.float_precision,
            include_dir: self.include_dir,
            resolver: self.resolver,
            sources: SourceContext::new(),
            tree_files: 0,
            fatal: self.fatal,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl Config {
    /// An empty document with default options.
    pub fn new() -> Self {
        ConfigBuilder::default().build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    // Document-level options

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    /// Turn a single option on or off.
    pub fn set_option(&mut self, option: Options, enabled: bool) {
        self.options.set(option, enabled);
    }

    pub fn default_format(&self) -> Format {
        self.default_format
    }

    pub fn set_default_format(&mut self, format: Format) {
        self.default_format = format;
    }

    pub fn tab_width(&self) -> u8 {
        self.tab_width
    }

    pub fn set_tab_width(&mut self, width: u8) {
        self.tab_width = width.min(MAX_TAB_WIDTH);
    }

    pub fn float_precision(&self) -> u8 {
        self.float_precision
    }

    pub fn set_float_precision(&mut self, digits: u8) {
        self.float_precision = digits.min(MAX_FLOAT_PRECISION);
    }

    pub fn include_dir(&self) -> Option<&Path> {
        self.include_dir.as_deref()
    }

    pub fn set_include_dir(&mut self, dir: Option<PathBuf>) {
        self.include_dir = dir;
    }

    pub fn set_resolver(&mut self, resolver: impl IncludeResolver + 'static) {
        self.resolver = Arc::new(resolver);
    }

    /// Files behind the current document, for diagnostics rendering.
    ///
    /// Holds the files of the last successful read, followed by those of
    /// the most recent failed read, if it came later.
    pub fn sources(&self) -> &SourceContext {
        &self.sources
    }

    // Reading and writing

    /// Replace the document with the settings in `text`.
    ///
    /// On error the previous settings are kept.
    pub fn read_str(&mut self, text: &str) -> Result<()> {
        self.read_text(text, STRING_SOURCE, None)
    }

    /// Like [`Config::read_str`], reporting errors against `name`.
    pub fn read_str_named(&mut self, text: &str, name: &str) -> Result<()> {
        self.read_text(text, name, None)
    }

    /// Replace the document with the settings in the file at `path`.
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        tracing::debug!(path = %shown, "reading configuration file");
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(&shown, e))?;
        let identity = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.read_text(&text, &shown, Some(identity))
    }

    fn read_text(&mut self, text: &str, name: &str, identity: Option<PathBuf>) -> Result<()> {
        let mut sources = SourceContext::new();
        let file_id = sources.add_file(name, Some(text.to_string()));
        let mut tree = Tree::new(self.fatal.clone());
        let mut ctx = ParseContext {
            resolver: &*self.resolver,
            include_dir: self.include_dir.as_deref(),
            options: self.options,
            default_format: self.default_format,
            sources: &mut sources,
            stack: identity.into_iter().collect(),
            depth: 0,
            nesting: 0,
        };
        match parser::parse_document(&mut tree, text, name, file_id, &mut ctx) {
            Ok(()) => {
                self.tree = tree;
                self.tree_files = sources.len();
                self.sources = sources;
                Ok(())
            }
            Err(err) => {
                // The failed read's files go after the current tree's, replacing
                // those of any earlier failure.
                self.sources.truncate(self.tree_files);
                let offset = self.sources.len();
                for (_, file) in sources.files() {
                    self.sources.add_file(file.path.clone(), file.content.clone());
                }
                Err(err.shift_file_ids(offset))
            }
        }
    }

    fn layout(&self) -> Layout {
        Layout {
            options: self.options,
            tab_width: self.tab_width,
            float_precision: self.float_precision,
        }
    }

    pub fn write_string(&self) -> Result<String> {
        writer::write_tree(&self.tree, self.layout())
    }

    pub fn write(&self, out: &mut impl Write) -> Result<()> {
        let text = self.write_string()?;
        out.write_all(text.as_bytes())
            .map_err(|e| Error::io("<stream>", e))
    }

    /// Write the document to `path`, syncing to disk when
    /// [`Options::FSYNC`] is set.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let text = self.write_string()?;
        tracing::debug!(path = %shown, "writing configuration file");

        let mut file = std::fs::File::create(path).map_err(|e| Error::io(&shown, e))?;
        file.write_all(text.as_bytes())
            .map_err(|e| Error::io(&shown, e))?;
        if self.options.contains(Options::FSYNC) {
            file.sync_all().map_err(|e| Error::io(&shown, e))?;
        }
        Ok(())
    }

    /// Remove every setting. Options and the source registry are kept.
    pub fn clear(&mut self) {
        self.tree = Tree::new(self.fatal.clone());
        self.sources = SourceContext::new();
        self.tree_files = 0;
    }

    // Tree queries

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn get(&self, id: NodeId) -> Result<&Setting> {
        self.tree.get(id)
    }

    pub fn kind(&self, id: NodeId) -> Result<Kind> {
        Ok(self.tree.get(id)?.kind())
    }

    pub fn name(&self, id: NodeId) -> Result<Option<&str>> {
        Ok(self.tree.get(id)?.name())
    }

    pub fn format(&self, id: NodeId) -> Result<Format> {
        Ok(self.tree.get(id)?.format())
    }

    /// Change how an integer setting is written.
    pub fn set_format(&mut self, id: NodeId, format: Format) -> Result<()> {
        let kind = self.kind(id)?;
        if !kind.is_integer() {
            return Err(Error::Type {
                path: self.tree.path(id)?,
                expected: Kind::Int,
                actual: kind,
            });
        }
        self.tree.get_mut(id)?.set_format(format);
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.tree.get(id)?.parent())
    }

    pub fn is_root(&self, id: NodeId) -> Result<bool> {
        Ok(self.tree.get(id)?.parent().is_none())
    }

    /// Position within the parent; `None` for the root.
    pub fn index(&self, id: NodeId) -> Result<Option<usize>> {
        self.tree.index_of(id)
    }

    /// Number of children; 0 for scalars.
    pub fn len(&self, id: NodeId) -> Result<usize> {
        self.tree.len(id)
    }

    /// Path from the root, e.g. `app.servers[0].host`.
    pub fn path(&self, id: NodeId) -> Result<String> {
        self.tree.path(id)
    }

    /// Whether `parent` is a group with a member called `name`.
    pub fn exists(&self, parent: NodeId, name: &str) -> bool {
        matches!(self.member(parent, name), Ok(Some(_)))
    }

    pub fn member(&self, parent: NodeId, name: &str) -> Result<Option<NodeId>> {
        if self.kind(parent)? != Kind::Group {
            return Ok(None);
        }
        self.tree.child(parent, Key::Name(name))
    }

    /// Child at `index`, for groups as well as arrays and lists.
    pub fn element(&self, parent: NodeId, index: usize) -> Result<Option<NodeId>> {
        if self.kind(parent)?.is_scalar() {
            return Ok(None);
        }
        self.tree.child(parent, Key::Index(index))
    }

    /// Children in document order; empty for scalars.
    pub fn children(&self, id: NodeId) -> Result<Children<'_>> {
        self.tree.children(id)
    }

    // Source locations

    pub fn source_info(&self, id: NodeId) -> Option<&SourceInfo> {
        self.tree.get(id).ok()?.source()
    }

    /// File the setting was read from; `None` for settings built in code.
    pub fn source_file(&self, id: NodeId) -> Option<&str> {
        let info = self.source_info(id)?;
        self.sources.path(info.file_id)
    }

    /// 1-based line the setting was read from.
    pub fn source_line(&self, id: NodeId) -> Option<usize> {
        self.source_info(id).map(SourceInfo::line)
    }

    // Mutation

    /// Add a child setting holding the default value for its kind.
    ///
    /// `name` is required under a group and ignored under arrays and lists.
    pub fn add(&mut self, parent: NodeId, name: Option<&str>, kind: Kind) -> Result<NodeId> {
        let format = if kind.is_integer() {
            self.default_format
        } else {
            Format::Decimal
        };
        let overrides = self.options.contains(Options::ALLOW_OVERRIDES);
        self.tree.add(parent, name, kind, format, overrides)
    }

    /// Add a named scalar member holding `value`.
    pub fn add_value(&mut self, parent: NodeId, name: &str, value: impl Into<Value>) -> Result<NodeId> {
        self.add_scalar(parent, Some(name), value.into())
    }

    /// Append a scalar element to an array or list.
    pub fn push_value(&mut self, parent: NodeId, value: impl Into<Value>) -> Result<NodeId> {
        self.add_scalar(parent, None, value.into())
    }

    fn add_scalar(&mut self, parent: NodeId, name: Option<&str>, value: Value) -> Result<NodeId> {
        if let Value::Float(v) = value {
            if !v.is_finite() {
                return Err(Error::Range {
                    path: self.tree.path(parent)?,
                    target: Kind::Float,
                });
            }
        }
        let id = self.add(parent, name, value.kind())?;
        self.tree.set_value(id, value)?;
        Ok(id)
    }

    /// Remove a child by name or position, with everything below it.
    pub fn remove<'k>(&mut self, parent: NodeId, key: impl Into<Key<'k>>) -> Result<()> {
        self.tree.remove(parent, key.into())
    }

    /// Remove a setting, with everything below it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        self.tree.remove_node(id)
    }

    // Values

    /// The stored value of a scalar setting.
    pub fn value(&self, id: NodeId) -> Result<&Value> {
        let setting = self.tree.get(id)?;
        setting.value().ok_or_else(|| Error::NotScalar {
            path: self.tree.path(id).unwrap_or_default(),
            kind: setting.kind(),
        })
    }

    /// Store `value`, converting it to the setting's kind when auto-convert
    /// allows. Floats are never narrowed to integers here.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let kind = self.kind(id)?;
        if kind.is_aggregate() {
            return Err(Error::NotScalar {
                path: self.tree.path(id)?,
                kind,
            });
        }
        if matches!(value, Value::Float(v) if !v.is_finite()) {
            return Err(Error::Range {
                path: self.tree.path(id)?,
                target: kind,
            });
        }
        let auto = self.options.contains(Options::AUTO_CONVERT);
        let converted = match coerce::coerce(&value, kind, auto, Mode::Implicit) {
            Ok(v) => v,
            Err(failure) => return Err(self.conversion_error(id, failure, kind, value.kind())),
        };
        self.tree.set_value(id, converted)
    }

    fn conversion_error(&self, id: NodeId, failure: Failure, target: Kind, actual: Kind) -> Error {
        let path = self.tree.path(id).unwrap_or_default();
        match failure {
            Failure::Type => Error::Type {
                path,
                expected: target,
                actual,
            },
            Failure::Range => Error::Range { path, target },
        }
    }

    fn read_as(&self, id: NodeId, target: Kind) -> Result<Value> {
        let value = self.value(id)?;
        let auto = self.options.contains(Options::AUTO_CONVERT);
        coerce::coerce(value, target, auto, Mode::Explicit)
            .map_err(|failure| self.conversion_error(id, failure, target, value.kind()))
    }

    pub fn get_i32(&self, id: NodeId) -> Result<i32> {
        match self.read_as(id, Kind::Int)? {
            Value::Int(v) => Ok(v),
            other => Err(self.conversion_error(id, Failure::Type, Kind::Int, other.kind())),
        }
    }

    pub fn get_i64(&self, id: NodeId) -> Result<i64> {
        match self.read_as(id, Kind::Int64)? {
            Value::Int64(v) => Ok(v),
            other => Err(self.conversion_error(id, Failure::Type, Kind::Int64, other.kind())),
        }
    }

    pub fn get_f64(&self, id: NodeId) -> Result<f64> {
        match self.read_as(id, Kind::Float)? {
            Value::Float(v) => Ok(v),
            other => Err(self.conversion_error(id, Failure::Type, Kind::Float, other.kind())),
        }
    }

    pub fn get_bool(&self, id: NodeId) -> Result<bool> {
        match self.read_as(id, Kind::Bool)? {
            Value::Bool(v) => Ok(v),
            other => Err(self.conversion_error(id, Failure::Type, Kind::Bool, other.kind())),
        }
    }

    /// Strings are never converted.
    pub fn get_str(&self, id: NodeId) -> Result<&str> {
        let value = self.value(id)?;
        value
            .as_str()
            .ok_or_else(|| self.conversion_error(id, Failure::Type, Kind::String, value.kind()))
    }

    pub fn set_i32(&mut self, id: NodeId, value: i32) -> Result<()> {
        self.set_value(id, value)
    }

    pub fn set_i64(&mut self, id: NodeId, value: i64) -> Result<()> {
        self.set_value(id, value)
    }

    pub fn set_f64(&mut self, id: NodeId, value: f64) -> Result<()> {
        self.set_value(id, value)
    }

    pub fn set_bool(&mut self, id: NodeId, value: bool) -> Result<()> {
        self.set_value(id, value)
    }

    pub fn set_str(&mut self, id: NodeId, value: impl Into<String>) -> Result<()> {
        self.set_value(id, Value::String(value.into()))
    }

    // Lookup by path

    /// Resolve a path from the root, e.g. `app.servers[0].host`.
    pub fn lookup(&self, path: &str) -> Result<NodeId> {
        path::resolve(&self.tree, self.tree.root(), path)
    }

    pub fn try_lookup(&self, path: &str) -> Option<NodeId> {
        self.lookup(path).ok()
    }

    /// Resolve a path relative to `from`.
    pub fn lookup_from(&self, from: NodeId, path: &str) -> Result<NodeId> {
        path::resolve(&self.tree, from, path)
    }

    pub fn try_lookup_from(&self, from: NodeId, path: &str) -> Option<NodeId> {
        self.lookup_from(from, path).ok()
    }

    pub fn lookup_i32(&self, path: &str) -> Result<i32> {
        self.get_i32(self.lookup(path)?)
    }

    pub fn lookup_i64(&self, path: &str) -> Result<i64> {
        self.get_i64(self.lookup(path)?)
    }

    pub fn lookup_f64(&self, path: &str) -> Result<f64> {
        self.get_f64(self.lookup(path)?)
    }

    pub fn lookup_bool(&self, path: &str) -> Result<bool> {
        self.get_bool(self.lookup(path)?)
    }

    pub fn lookup_str(&self, path: &str) -> Result<&str> {
        self.get_str(self.lookup(path)?)
    }

    pub fn try_lookup_i32(&self, path: &str) -> Option<i32> {
        self.lookup_i32(path).ok()
    }

    pub fn try_lookup_i64(&self, path: &str) -> Option<i64> {
        self.lookup_i64(path).ok()
    }

    pub fn try_lookup_f64(&self, path: &str) -> Option<f64> {
        self.lookup_f64(path).ok()
    }

    pub fn try_lookup_bool(&self, path: &str) -> Option<bool> {
        self.lookup_bool(path).ok()
    }

    pub fn try_lookup_str(&self, path: &str) -> Option<&str> {
        self.lookup_str(path).ok()
    }

    // Copy and merge

    /// Deep-copy `src` from `source` under `dest` in this document.
    ///
    /// `dest` must be a group or a list. Under a group the copy keeps the
    /// source name; under a list it is appended unnamed. The integer formats
    /// of copied settings are kept.
    pub fn copy(&mut self, dest: NodeId, source: &Config, src: NodeId) -> Result<NodeId> {
        let detached = source.tree.detach(src)?;
        let overrides = self.options.contains(Options::ALLOW_OVERRIDES);
        copy::copy_into(&mut self.tree, dest, &detached, overrides)
    }

    /// Deep-copy a setting of this document under `dest`.
    pub fn copy_within(&mut self, dest: NodeId, src: NodeId) -> Result<NodeId> {
        let detached = self.tree.detach(src)?;
        let overrides = self.options.contains(Options::ALLOW_OVERRIDES);
        copy::copy_into(&mut self.tree, dest, &detached, overrides)
    }

    /// Deep-copy every child of the aggregate `src` under `dest`.
    ///
    /// `config.merge(config.root(), &other, other.root())` brings all of
    /// `other`'s top-level settings into `config`.
    pub fn merge(&mut self, dest: NodeId, source: &Config, src: NodeId) -> Result<()> {
        let detached = source.tree.detach(src)?;
        let overrides = self.options.contains(Options::ALLOW_OVERRIDES);
        copy::merge_into(&mut self.tree, dest, &detached, overrides)
    }
}
