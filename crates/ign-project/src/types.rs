/*
 * types.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Core types for project generation.
 */

use ign_template::ParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for project generation operations.
#[derive(Debug, Error)]
pub enum CreateError {
    /// A directive failed in a way that stops the whole run
    #[error(transparent)]
    Template(#[from] ParseError),

    /// Reading from the template directory failed
    #[error("Failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing to the output directory failed
    #[error("Failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `ign.json` is not valid JSON or has the wrong shape
    #[error("Invalid template manifest {}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A variable definition in the manifest is inconsistent
    #[error("Invalid definition for variable '{name}': {message}")]
    InvalidDefinition { name: String, message: String },

    /// A supplied or default value violates its definition
    #[error("Invalid value for variable '{name}': {message}")]
    InvalidValue { name: String, message: String },

    /// Required variables have neither a supplied value nor a default
    #[error("Missing required variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    /// Invalid template or output configuration
    #[error("Invalid project configuration: {0}")]
    InvalidConfig(String),
}

/// A file produced by generation, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    /// Relative path within the output directory
    pub path: PathBuf,

    /// File content (resolved, or copied as-is for binary files)
    pub content: Vec<u8>,

    /// Unix permission bits carried over from the template entry
    pub mode: Option<u32>,

    /// Whether the content was copied without directive processing
    pub binary: bool,
}

impl GeneratedFile {
    /// Create a new generated text file.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            mode: None,
            binary: false,
        }
    }

    /// Set the permission bits for this file.
    pub fn with_mode(mut self, mode: Option<u32>) -> Self {
        self.mode = mode;
        self
    }
}
