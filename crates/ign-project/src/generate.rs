/*
 * generate.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Generation: run every bundle entry through the directive engine.
 *
 * A directive failure in one file is recorded and generation moves on to
 * the next file. Filename security violations are different: they abort
 * the whole run, since they signal hostile or broken variable input rather
 * than a problem with a single template file.
 */

use crate::bundle::{TemplateBundle, TemplateEntry};
use crate::types::{CreateError, GeneratedFile};
use ign_template::{EngineOptions, ParseContext, ParseError, Variables, parse_filename, parse_with_context};
use std::collections::HashMap;
use std::path::PathBuf;

/// A template entry that could not be generated.
#[derive(Debug)]
pub struct GenerationFailure {
    /// Template-relative path of the entry
    pub path: String,

    /// What went wrong
    pub error: ParseError,
}

/// Result of generating a bundle.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Files ready to be written, in template path order
    pub files: Vec<GeneratedFile>,

    /// Entries that failed, in template path order
    pub failures: Vec<GenerationFailure>,
}

impl GenerationReport {
    /// Whether every entry was generated.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolve every entry of `bundle` against `variables`.
///
/// Include directives are served from the bundle itself, relative to the
/// including entry or (with a leading `/`) to the bundle root.
pub fn generate(
    bundle: &TemplateBundle,
    variables: &Variables,
    options: EngineOptions,
) -> Result<GenerationReport, CreateError> {
    let mut report = GenerationReport::default();
    let mut produced_by: HashMap<String, &str> = HashMap::new();

    for entry in &bundle.entries {
        let output_path = match parse_filename(&entry.path, variables) {
            Ok(path) => path,
            Err(e) if e.is_security_violation() => return Err(e.into()),
            Err(e) => {
                record_failure(&mut report, entry, e);
                continue;
            }
        };

        if let Some(first) = produced_by.get(&output_path) {
            let error = ParseError::invalid_syntax(format!(
                "resolves to '{}', which is already generated from '{}'",
                output_path, first
            ))
            .with_file(&entry.path);
            record_failure(&mut report, entry, error);
            continue;
        }

        let content = if entry.binary {
            tracing::debug!(path = %entry.path, "copying binary file");
            entry.content.clone()
        } else {
            let ctx = ParseContext::for_file(variables, &bundle.root, bundle.root.join(&entry.path))
                .with_options(options)
                .with_loader(bundle);
            match parse_with_context(&entry.content, &ctx) {
                Ok(content) => content,
                Err(e) => {
                    record_failure(&mut report, entry, e);
                    continue;
                }
            }
        };

        tracing::debug!(from = %entry.path, to = %output_path, "generated file");
        produced_by.insert(output_path.clone(), &entry.path);
        report.files.push(GeneratedFile {
            path: PathBuf::from(output_path),
            content,
            mode: entry.mode,
            binary: entry.binary,
        });
    }

    tracing::info!(
        template = %bundle.manifest.name,
        files = report.files.len(),
        failures = report.failures.len(),
        "generation finished"
    );
    Ok(report)
}

fn record_failure(report: &mut GenerationReport, entry: &TemplateEntry, error: ParseError) {
    tracing::warn!(path = %entry.path, error = %error, "skipping file");
    report.failures.push(GenerationFailure {
        path: entry.path.clone(),
        error,
    });
}
