/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! Render command implementation.
//!
//! Resolves every directive in a single template file and writes the result
//! to stdout. Includes are read from disk below the template root.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use ign_template::{ParseContext, parse_with_context};

use super::input::VarArgs;

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    /// Template file
    pub file: PathBuf,
    /// Template root for includes
    pub root: Option<PathBuf>,
    /// Variable sources
    pub vars: VarArgs,
    /// Maximum include nesting depth
    pub max_include_depth: usize,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let output = render(&args)?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&output)
        .and_then(|()| stdout.flush())
        .context("Failed to write output")
}

fn render(args: &RenderArgs) -> Result<Vec<u8>> {
    let variables = args.vars.load()?;
    let content = fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let root = match &args.root {
        Some(root) => root.clone(),
        None => default_root(&args.file),
    };
    debug!(file = %args.file.display(), root = %root.display(), "rendering");

    let ctx = ParseContext::for_file(&variables, root, &args.file)
        .with_max_include_depth(args.max_include_depth);
    parse_with_context(&content, &ctx)
        .with_context(|| format!("Failed to render {}", args.file.display()))
}

fn default_root(file: &Path) -> PathBuf {
    file.parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
