//! Validate command implementation

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Execute the validate command
pub fn execute(file: &Path) -> Result<()> {
    let content = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    ign_template::validate(&content)
        .map_err(|e| e.with_file_opt(Some(file)))
        .with_context(|| format!("{} is not a valid template", file.display()))?;
    tracing::info!(file = %file.display(), "template is valid");
    Ok(())
}
