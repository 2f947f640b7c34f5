/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `@include` resolution.
//!
//! The parser asks an [`IncludeResolver`] for the text of every included file.
//! The default [`FileSystemResolver`] reads from disk; [`MemoryResolver`]
//! serves bundled or test documents from a map.

use std::collections::HashMap;
use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};

/// An included file, loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSource {
    /// Identity of the file; used for cycle detection and in error messages
    pub path: PathBuf,
    pub content: String,
}

/// Loads the files named by `@include` directives.
pub trait IncludeResolver: Debug + Send + Sync {
    /// Load an included file.
    ///
    /// # Arguments
    /// * `name` - The name as written in the directive
    /// * `include_dir` - The document's include directory, if one is set
    fn load(&self, name: &str, include_dir: Option<&Path>) -> io::Result<IncludeSource>;
}

/// Resolver that reads included files from the filesystem.
///
/// Relative names are looked up in the include directory (or the working
/// directory when none is set); absolute names are used as they are.
#[derive(Debug, Clone, Default)]
pub struct FileSystemResolver;

impl IncludeResolver for FileSystemResolver {
    fn load(&self, name: &str, include_dir: Option<&Path>) -> io::Result<IncludeSource> {
        let path = resolve_include_path(name, include_dir);
        let content = std::fs::read_to_string(&path)?;
        let path = std::fs::canonicalize(&path).unwrap_or(path);
        Ok(IncludeSource { path, content })
    }
}

/// Resolver that serves included files from an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    files: HashMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file under the name used in `@include` directives.
    pub fn add(&mut self, name: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.files.insert(name.into(), content.into());
        self
    }

    pub fn with_files(
        files: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut resolver = Self::new();
        for (name, content) in files {
            resolver.add(name, content);
        }
        resolver
    }
}

impl IncludeResolver for MemoryResolver {
    fn load(&self, name: &str, _include_dir: Option<&Path>) -> io::Result<IncludeSource> {
        match self.files.get(name) {
            Some(content) => Ok(IncludeSource {
                path: PathBuf::from(name),
                content: content.clone(),
            }),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no bundled file named {}", name),
            )),
        }
    }
}

/// Path an include name refers to.
pub fn resolve_include_path(name: &str, include_dir: Option<&Path>) -> PathBuf {
    let path = Path::new(name);
    match include_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}
