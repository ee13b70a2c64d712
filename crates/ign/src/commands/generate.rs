/*
 * generate.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Generate command implementation
 */

//! Generate command implementation.
//!
//! Loads a template directory, checks the supplied variables against its
//! manifest, generates every file and writes the result. Files that fail
//! are reported and make the command exit with an error, after the files
//! that did generate have been written.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info};

use ign_project::{CreateProjectOptions, WriteMode, create_project};
use ign_template::EngineOptions;

use super::input::VarArgs;

/// Arguments for the generate command
#[derive(Debug)]
pub struct GenerateArgs {
    /// Template directory
    pub template_dir: PathBuf,
    /// Output directory
    pub out_dir: PathBuf,
    /// Variable sources
    pub vars: VarArgs,
    /// Replace existing files
    pub overwrite: bool,
    /// Maximum include nesting depth
    pub max_include_depth: usize,
}

/// Execute the generate command
pub fn execute(args: GenerateArgs) -> Result<()> {
    let variables = args.vars.load()?;
    let options = CreateProjectOptions {
        engine: EngineOptions {
            max_include_depth: args.max_include_depth,
        },
        write_mode: if args.overwrite {
            WriteMode::Overwrite
        } else {
            WriteMode::SkipExisting
        },
    };

    let summary = create_project(&args.template_dir, &args.out_dir, &variables, &options)
        .with_context(|| {
            format!(
                "Failed to generate {} from {}",
                args.out_dir.display(),
                args.template_dir.display()
            )
        })?;

    for file in &summary.written {
        println!("{:>11}  {}", file.outcome, file.path.display());
    }
    for failure in &summary.failures {
        error!(path = %failure.path, "{}", failure.error);
    }

    info!(
        written = summary.written.len(),
        failed = summary.failures.len(),
        out_dir = %args.out_dir.display(),
        "done"
    );

    if !summary.failures.is_empty() {
        anyhow::bail!(
            "{} of {} template files failed to generate",
            summary.failures.len(),
            summary.written.len() + summary.failures.len()
        );
    }
    Ok(())
}
