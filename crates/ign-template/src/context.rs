/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Per-invocation parse state.
//!
//! [`ParseContext`] is threaded through every pass. It is never mutated in
//! place while recursing: entering an include derives a child context with
//! the depth incremented and the target pushed onto a copy of the include
//! stack.

use crate::loader::{FileSystemLoader, IncludeLoader};
use crate::variables::Variables;
use std::path::{Path, PathBuf};

/// Default ceiling for nested includes.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 10;

/// Engine configuration, passed explicitly rather than read from globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Includes may nest this many levels; the next one fails.
    pub max_include_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

/// State for one parse invocation.
#[derive(Clone)]
pub struct ParseContext<'a> {
    /// Variable bindings consulted by every directive.
    pub variables: &'a Variables,

    /// Current include nesting depth (0 for the top-level file).
    pub include_depth: usize,

    /// Include targets currently open, outermost first.
    pub include_stack: Vec<PathBuf>,

    /// Base directory for root-relative includes.
    pub template_root: PathBuf,

    /// The file being processed, if known.
    pub current_file: Option<PathBuf>,

    /// Engine configuration.
    pub options: EngineOptions,

    /// Source of include target contents.
    pub loader: &'a dyn IncludeLoader,
}

impl<'a> ParseContext<'a> {
    /// Create a context with the given variables, rooted at the current
    /// directory and reading includes from the filesystem.
    pub fn new(variables: &'a Variables) -> Self {
        Self {
            variables,
            include_depth: 0,
            include_stack: Vec::new(),
            template_root: PathBuf::from("."),
            current_file: None,
            options: EngineOptions::default(),
            loader: &FileSystemLoader,
        }
    }

    /// Create a context for processing `file` inside the template at `root`.
    ///
    /// The file itself is the first entry of the include stack, so a chain
    /// that leads back to it is reported as circular.
    pub fn for_file(
        variables: &'a Variables,
        root: impl Into<PathBuf>,
        file: impl Into<PathBuf>,
    ) -> Self {
        let file = file.into();
        let mut ctx = Self::new(variables).with_template_root(root);
        ctx.include_stack.push(crate::loader::normalize(&file));
        ctx.current_file = Some(file);
        ctx
    }

    pub fn with_template_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.template_root = root.into();
        self
    }

    pub fn with_current_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.current_file = Some(file.into());
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.options.max_include_depth = depth;
        self
    }

    pub fn with_loader(mut self, loader: &'a dyn IncludeLoader) -> Self {
        self.loader = loader;
        self
    }

    /// The file being processed, as a path.
    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    /// Derive the context used to process an include target.
    pub fn child(&self, target: &Path) -> ParseContext<'a> {
        let mut include_stack = self.include_stack.clone();
        include_stack.push(target.to_path_buf());
        ParseContext {
            variables: self.variables,
            include_depth: self.include_depth + 1,
            include_stack,
            template_root: self.template_root.clone(),
            current_file: Some(target.to_path_buf()),
            options: self.options,
            loader: self.loader,
        }
    }

    /// Whether `target` is already open further up the include chain.
    pub fn is_open(&self, target: &Path) -> bool {
        self.include_stack.iter().any(|open| open == target)
    }

    /// Render the include chain ending in `target`, e.g. `a.txt -> b.txt -> a.txt`.
    pub fn describe_chain(&self, target: &Path) -> String {
        self.include_stack
            .iter()
            .map(|p| p.display().to_string())
            .chain(std::iter::once(target.display().to_string()))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl std::fmt::Debug for ParseContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseContext")
            .field("variables", &self.variables)
            .field("include_depth", &self.include_depth)
            .field("include_stack", &self.include_stack)
            .field("template_root", &self.template_root)
            .field("current_file", &self.current_file)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
