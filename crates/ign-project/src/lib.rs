/*
 * ign-project
 * Copyright (c) 2025 Posit, PBC
 *
 * Template bundles and project generation for ign.
 *
 * This crate turns a template directory into a project. It builds on the
 * `ign-template` directive engine and adds everything around it: the
 * `ign.json` manifest, loading a template directory into memory, checking
 * supplied variables against the manifest's definitions, running every
 * file through the engine, and writing the result.
 *
 * # Architecture
 *
 * Generation is split into independent steps so front ends can report or
 * intervene between them:
 *
 * - [`TemplateBundle::load_local`] reads the manifest and all entries
 * - [`resolve_variables`] merges supplied values with definitions
 * - [`generate`] resolves paths and content, collecting per-file failures
 * - [`write_files`] puts the generated files on disk
 *
 * [`create_project`] runs all four.
 *
 * # Usage
 *
 * ```ignore
 * use ign_project::{CreateProjectOptions, create_project};
 * use ign_template::{Value, Variables};
 *
 * let vars: Variables = [("app_name", Value::from("svc"))].into_iter().collect();
 * let summary = create_project("templates/go-service", "out", &vars, &CreateProjectOptions::default())?;
 *
 * for file in &summary.written {
 *     println!("{}: {}", file.outcome, file.path.display());
 * }
 * ```
 */

mod bundle;
mod definitions;
mod generate;
mod manifest;
mod types;
mod write;

pub use bundle::{TemplateBundle, TemplateEntry, is_binary};
pub use definitions::{VariableDefinition, resolve_variables};
pub use generate::{GenerationFailure, GenerationReport, generate};
pub use manifest::{CONFIG_DIR, DEFAULT_VERSION, MANIFEST_FILE, Manifest, is_reserved};
pub use types::{CreateError, GeneratedFile};
pub use write::{WriteMode, WriteOutcome, WrittenFile, write_files};

use ign_template::{EngineOptions, Variables};
use std::path::Path;

/// Options for creating a project from a template directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateProjectOptions {
    /// Directive engine configuration
    pub engine: EngineOptions,

    /// Policy for files that already exist in the output directory
    pub write_mode: WriteMode,
}

/// What [`create_project`] did.
#[derive(Debug)]
pub struct CreateSummary {
    /// Files handed to the writer, with their outcome
    pub written: Vec<WrittenFile>,

    /// Template entries that could not be generated
    pub failures: Vec<GenerationFailure>,
}

/// Generate a project from the template in `template_dir` into `out_dir`.
///
/// Files that generated successfully are written even when other files
/// failed; the failures are returned in the summary.
///
/// # Errors
///
/// Returns an error when the template cannot be loaded, the variables do not
/// satisfy the manifest, a resolved path is a security violation, or writing
/// fails.
pub fn create_project(
    template_dir: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    supplied: &Variables,
    options: &CreateProjectOptions,
) -> Result<CreateSummary, CreateError> {
    let bundle = TemplateBundle::load_local(template_dir)?;
    let variables = resolve_variables(&bundle.manifest.variables, supplied)?;
    let report = generate(&bundle, &variables, options.engine)?;
    let written = write_files(out_dir.as_ref(), &report.files, options.write_mode)?;

    Ok(CreateSummary {
        written,
        failures: report.failures,
    })
}
