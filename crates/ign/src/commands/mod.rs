//! Command implementations for the ign CLI
//!
//! Each command module handles the CLI interface and delegates to
//! ign-template or ign-project for the actual work.

pub mod filename;
pub mod generate;
pub mod input;
pub mod render;
pub mod validate;
pub mod vars;
