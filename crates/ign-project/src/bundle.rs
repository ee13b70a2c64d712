/*
 * bundle.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Template bundles: a manifest plus the files of a template directory.
 *
 * A bundle is fully loaded into memory before generation starts, so the
 * directive engine reads include targets from the bundle rather than from
 * disk. Reserved entries at the template root (`ign.json`, `.ign-config/`)
 * are never part of the bundle.
 */

use crate::manifest::{Manifest, is_reserved};
use crate::types::CreateError;
use ign_template::IncludeLoader;
use ign_template::loader::normalize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Files whose first bytes contain a NUL within this window are binary.
const BINARY_SNIFF_LEN: usize = 8000;

/// Whether `content` looks like binary data.
pub fn is_binary(content: &[u8]) -> bool {
    content.iter().take(BINARY_SNIFF_LEN).any(|b| *b == 0)
}

/// A single file of a template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateEntry {
    /// Path relative to the template root, `/`-separated
    pub path: String,

    /// Raw file content
    pub content: Vec<u8>,

    /// Unix permission bits, when known
    pub mode: Option<u32>,

    /// Binary entries are copied without directive processing
    pub binary: bool,
}

impl TemplateEntry {
    /// Create an entry, detecting binary content.
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            binary: is_binary(&content),
            content,
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// A loaded template.
#[derive(Debug, Clone)]
pub struct TemplateBundle {
    /// Directory the template was loaded from; include paths resolve here
    pub root: PathBuf,

    /// Template metadata
    pub manifest: Manifest,

    /// Template files in path order
    pub entries: Vec<TemplateEntry>,
}

impl TemplateBundle {
    /// Create a bundle from in-memory entries.
    ///
    /// Reserved top-level entries are dropped.
    pub fn new(root: impl Into<PathBuf>, manifest: Manifest, entries: Vec<TemplateEntry>) -> Self {
        let mut entries: Vec<_> = entries
            .into_iter()
            .filter(|e| !is_reserved(top_level(&e.path)))
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            root: root.into(),
            manifest,
            entries,
        }
    }

    /// Load the template stored in `dir`.
    pub fn load_local(dir: impl AsRef<Path>) -> Result<Self, CreateError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(CreateError::InvalidConfig(format!(
                "template directory {} does not exist",
                dir.display()
            )));
        }

        let manifest = Manifest::load(dir)?;
        let mut entries = Vec::new();

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.depth() == 1 && is_reserved(&e.file_name().to_string_lossy())));

        for item in walker {
            let item = item.map_err(|e| CreateError::Read {
                path: e.path().unwrap_or(dir).to_path_buf(),
                source: io::Error::from(e),
            })?;
            if !item.file_type().is_file() {
                continue;
            }

            let Ok(relative) = item.path().strip_prefix(dir) else {
                continue;
            };
            let path = to_slash_path(relative);
            let content = fs::read(item.path()).map_err(|source| CreateError::Read {
                path: item.path().to_path_buf(),
                source,
            })?;

            let mut entry = TemplateEntry::new(path, content);
            entry.mode = file_mode(&item);
            tracing::debug!(path = %entry.path, binary = entry.binary, "loaded template entry");
            entries.push(entry);
        }

        Ok(Self::new(dir, manifest, entries))
    }

    /// Look up an entry by its `/`-separated relative path.
    pub fn entry(&self, path: &str) -> Option<&TemplateEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Path of `target` relative to the bundle root, if it lies inside it.
    fn relative_to_root(&self, target: &Path) -> Option<String> {
        let target = normalize(target);
        let root = normalize(&self.root);
        let relative = if root == Path::new(".") {
            Some(target.as_path()).filter(|p| !p.is_absolute())?
        } else {
            target.strip_prefix(&root).ok()?
        };
        Some(to_slash_path(relative))
    }
}

/// Include targets are served from the bundle's entries.
impl IncludeLoader for TemplateBundle {
    fn load(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.relative_to_root(path)
            .and_then(|relative| self.entry(&relative))
            .map(|entry| entry.content.clone())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} is not part of template '{}'", path.display(), self.manifest.name),
                )
            })
    }
}

fn top_level(path: &str) -> &str {
    path.split('/').next().unwrap_or(path)
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn file_mode(entry: &walkdir::DirEntry) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    entry.metadata().ok().map(|m| m.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn file_mode(_entry: &walkdir::DirEntry) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(root: &Path, path: &str, content: &[u8]) {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    #[test]
    fn test_binary_detection() {
        assert!(!is_binary(b"plain text\n"));
        assert!(is_binary(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"));

        let mut late_nul = vec![b'a'; BINARY_SNIFF_LEN];
        late_nul.push(0);
        assert!(!is_binary(&late_nul));
    }

    #[test]
    fn test_load_local_skips_reserved_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "ign.json", br#"{ "name": "svc" }"#);
        write(root, ".ign-config/settings.json", b"{}");
        write(root, "main.go", b"package @ign-var:name@\n");
        write(root, "cmd/@ign-var:name@/main.go", b"package main\n");
        write(root, "docs/ign.json", b"nested copies are ordinary files");
        write(root, "logo.png", b"\x89PNG\0\0");

        let bundle = TemplateBundle::load_local(root).unwrap();
        assert_eq!(bundle.manifest.name, "svc");

        let paths: Vec<_> = bundle.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["cmd/@ign-var:name@/main.go", "docs/ign.json", "logo.png", "main.go"]
        );
        assert!(bundle.entry("logo.png").unwrap().binary);
        assert!(!bundle.entry("main.go").unwrap().binary);
    }

    #[cfg(unix)]
    #[test]
    fn test_load_local_records_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "run.sh", b"#!/bin/sh\n");
        fs::set_permissions(dir.path().join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();

        let bundle = TemplateBundle::load_local(dir.path()).unwrap();
        assert_eq!(bundle.entry("run.sh").unwrap().mode, Some(0o755));
    }

    #[test]
    fn test_load_local_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = TemplateBundle::load_local(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, CreateError::InvalidConfig(_)));
    }

    #[test]
    fn test_new_drops_reserved_entries() {
        let bundle = TemplateBundle::new(
            "/tpl",
            Manifest::new("mem"),
            vec![
                TemplateEntry::new("b.txt", "b"),
                TemplateEntry::new("ign.json", "{}"),
                TemplateEntry::new(".ign-config/x", "x"),
                TemplateEntry::new("a.txt", "a"),
            ],
        );
        let paths: Vec<_> = bundle.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_bundle_serves_includes() {
        let bundle = TemplateBundle::new(
            "/tpl",
            Manifest::new("mem"),
            vec![TemplateEntry::new("partials/header.txt", "HEADER")],
        );
        assert_eq!(
            bundle.load(Path::new("/tpl/partials/header.txt")).unwrap(),
            b"HEADER"
        );
        assert_eq!(
            bundle.load(Path::new("/tpl/x/../partials/header.txt")).unwrap(),
            b"HEADER"
        );
        let err = bundle.load(Path::new("/elsewhere/partials/header.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_relative_root_serves_includes() {
        let bundle = TemplateBundle::new(
            ".",
            Manifest::new("mem"),
            vec![TemplateEntry::new("a.txt", "A")],
        );
        assert_eq!(bundle.load(Path::new("a.txt")).unwrap(), b"A");
        assert_eq!(bundle.load(Path::new("./a.txt")).unwrap(), b"A");
    }
}
