/*
 * input.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Variable input shared by the commands that evaluate directives.
 */

use anyhow::{Context, Result};
use clap::Args;
use ign_template::{Value, Variables};
use std::fs;
use std::path::{Path, PathBuf};

/// Variable sources for commands that resolve directives.
#[derive(Debug, Clone, Default, Args)]
pub struct VarArgs {
    /// Variable value (KEY=VALUE); `true`/`false` are bools, whole numbers ints
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,

    /// JSON file with an object of variable values
    #[arg(long, value_name = "FILE")]
    pub vars_file: Option<PathBuf>,
}

impl VarArgs {
    /// Build the variable store; `--var` values win over the file.
    pub fn load(&self) -> Result<Variables> {
        let mut variables = match &self.vars_file {
            Some(path) => load_vars_file(path)?,
            None => Variables::new(),
        };
        for (key, value) in &self.vars {
            variables.insert(key.as_str(), Value::parse_literal(value));
        }
        Ok(variables)
    }
}

fn load_vars_file(path: &Path) -> Result<Variables> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read variables file {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse variables file {}", path.display()))?;
    let object = json
        .as_object()
        .with_context(|| format!("Variables file {} must contain a JSON object", path.display()))?;
    Variables::from_json(object)
        .with_context(|| format!("Invalid variables file {}", path.display()))
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}
