/*
 * manifest.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The `ign.json` template manifest.
 */

use crate::definitions::VariableDefinition;
use crate::types::CreateError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// File name of the manifest at a template root.
pub const MANIFEST_FILE: &str = "ign.json";

/// Directory at a template root reserved for tool configuration.
pub const CONFIG_DIR: &str = ".ign-config";

/// Version reported for templates without a manifest.
pub const DEFAULT_VERSION: &str = "0.0.0";

/// Whether a top-level entry of a template root is reserved.
///
/// Reserved entries are never treated as template files.
pub fn is_reserved(name: &str) -> bool {
    name == MANIFEST_FILE || name == CONFIG_DIR
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// Template metadata and variable definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Template name
    pub name: String,

    /// Template version
    #[serde(default = "default_version")]
    pub version: String,

    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Variables the template expects, by name
    #[serde(default)]
    pub variables: BTreeMap<String, VariableDefinition>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            description: None,
            variables: BTreeMap::new(),
        }
    }

    /// Add a variable definition.
    pub fn with_variable(mut self, name: impl Into<String>, definition: VariableDefinition) -> Self {
        self.variables.insert(name.into(), definition);
        self
    }

    /// Load the manifest of the template at `root`.
    ///
    /// A template without `ign.json` gets a manifest named after its
    /// directory, with the default version and no definitions.
    pub fn load(root: &Path) -> Result<Self, CreateError> {
        let path = root.join(MANIFEST_FILE);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(root = %root.display(), "no manifest, using defaults");
                return Ok(Self::default_for(root));
            }
            Err(source) => return Err(CreateError::Read { path, source }),
        };

        let manifest = Self::from_slice(&bytes).map_err(|e| match e {
            CreateError::Manifest { source, .. } => CreateError::Manifest {
                path: path.clone(),
                source,
            },
            other => other,
        })?;
        tracing::debug!(
            name = %manifest.name,
            version = %manifest.version,
            variables = manifest.variables.len(),
            "loaded manifest"
        );
        Ok(manifest)
    }

    /// Parse and check manifest JSON.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CreateError> {
        let manifest: Manifest =
            serde_json::from_slice(bytes).map_err(|source| CreateError::Manifest {
                path: MANIFEST_FILE.into(),
                source,
            })?;
        for (name, definition) in &manifest.variables {
            definition.check(name)?;
        }
        Ok(manifest)
    }

    /// The manifest used for a template directory without `ign.json`.
    pub fn default_for(root: &Path) -> Self {
        let name = root
            .file_name()
            .map(|n| n.to_os_string())
            .or_else(|| root.canonicalize().ok()?.file_name().map(|n| n.to_os_string()))
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "template".to_string());
        Self::new(name)
    }
}
