//! Filename command implementation

use anyhow::{Context, Result};

use super::input::VarArgs;

/// Execute the filename command
pub fn execute(path: &str, vars: &VarArgs) -> Result<()> {
    let variables = vars.load()?;
    let resolved = ign_template::parse_filename(path, &variables)
        .with_context(|| format!("Failed to resolve path '{}'", path))?;
    println!("{}", resolved);
    Ok(())
}
