//! Vars command implementation

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Execute the vars command
pub fn execute(file: &Path) -> Result<()> {
    let content = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    for name in ign_template::extract_variables(&content) {
        println!("{}", name);
    }
    Ok(())
}
