/*
 * loader.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Include loading and include path resolution.
//!
//! The engine reads include targets through the [`IncludeLoader`] trait so
//! templates can be processed from disk or from memory alike.

use crate::error::{ParseError, ParseResult};
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Trait for reading include targets.
pub trait IncludeLoader {
    /// Read the bytes of a resolved include path.
    fn load(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Loader that reads include targets from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemLoader;

impl IncludeLoader for FileSystemLoader {
    fn load(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Loader that serves include targets from an in-memory map.
///
/// Keys are compared after lexical normalization, so `./a/../b.txt` and
/// `b.txt` refer to the same entry.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the loader.
    pub fn add(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> &mut Self {
        self.files
            .insert(normalize(path.as_ref()), content.into());
        self
    }

    /// Create a loader with the given files.
    pub fn with_files(
        files: impl IntoIterator<Item = (impl AsRef<Path>, impl Into<Vec<u8>>)>,
    ) -> Self {
        let mut loader = Self::new();
        for (path, content) in files {
            loader.add(path, content);
        }
        loader
    }
}

impl IncludeLoader for MemoryLoader {
    fn load(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files.get(&normalize(path)).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not in the template bundle", path.display()),
            )
        })
    }
}

/// Lexically normalize a path: drop `.` segments and fold `name/..` pairs.
///
/// Leading `..` segments that cannot be folded are kept. An empty result is
/// `.`, matching how the rest of the engine treats "the current directory".
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Resolve the target of an include directive.
///
/// A leading `/` makes the path relative to `template_root`; otherwise it is
/// relative to the directory of `current_file` (or the root when there is no
/// current file). The resolved path must stay inside the template root.
pub fn resolve_include_path(
    include: &str,
    template_root: &Path,
    current_file: Option<&Path>,
) -> ParseResult<PathBuf> {
    let joined = match include.strip_prefix('/') {
        Some(rooted) => template_root.join(rooted),
        None => {
            let base = current_file
                .and_then(Path::parent)
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(template_root);
            base.join(include)
        }
    };

    let resolved = normalize(&joined);
    if !is_within(&resolved, template_root) {
        return Err(ParseError::invalid_syntax(format!(
            "include path '{}' escapes the template root",
            include
        )));
    }
    Ok(resolved)
}

/// Whether `path` lies inside `root`, comparing both as absolute paths so a
/// relative root and an absolute file still line up.
fn is_within(path: &Path, root: &Path) -> bool {
    let anchor = |p: &Path| {
        let p = if p.as_os_str().is_empty() {
            Path::new(".")
        } else {
            p
        };
        std::path::absolute(p).map(|abs| normalize(&abs))
    };
    match (anchor(path), anchor(root)) {
        (Ok(path), Ok(root)) => path.starts_with(root),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
    }

    #[test]
    fn test_relative_to_including_file() {
        let resolved = resolve_include_path(
            "part.txt",
            Path::new("/tpl"),
            Some(Path::new("/tpl/src/main.txt")),
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/tpl/src/part.txt"));
    }

    #[test]
    fn test_root_relative() {
        let resolved = resolve_include_path(
            "/shared/header.txt",
            Path::new("/tpl"),
            Some(Path::new("/tpl/src/deep/main.txt")),
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/tpl/shared/header.txt"));
    }

    #[test]
    fn test_without_current_file_uses_root() {
        let resolved = resolve_include_path("a.txt", Path::new("/tpl"), None).unwrap();
        assert_eq!(resolved, PathBuf::from("/tpl/a.txt"));
    }

    #[test]
    fn test_parent_segments_inside_root_are_allowed() {
        let resolved = resolve_include_path(
            "../common.txt",
            Path::new("/tpl"),
            Some(Path::new("/tpl/src/main.txt")),
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/tpl/common.txt"));
    }

    #[test]
    fn test_escaping_root_is_rejected() {
        for include in ["../../etc/passwd", "/../outside.txt", "../x.txt"] {
            let err = resolve_include_path(
                include,
                Path::new("/tpl"),
                Some(Path::new("/tpl/main.txt")),
            )
            .unwrap_err();
            assert_eq!(err.kind, crate::error::ParseErrorKind::InvalidSyntax);
        }
    }

    #[test]
    fn test_relative_root() {
        let resolved = resolve_include_path("b.txt", Path::new("."), Some(Path::new("a/x.txt")))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("a/b.txt"));
        assert!(resolve_include_path("../../b.txt", Path::new("."), Some(Path::new("a/x.txt")))
            .is_err());
    }

    #[test]
    fn test_relative_root_with_absolute_file() {
        let cwd = std::env::current_dir().unwrap();
        let current = cwd.join("tpl/src/main.txt");

        let resolved = resolve_include_path("part.txt", Path::new("tpl"), Some(&current)).unwrap();
        assert_eq!(resolved, cwd.join("tpl/src/part.txt"));

        let resolved =
            resolve_include_path("/shared/a.txt", Path::new("tpl"), Some(&current)).unwrap();
        assert_eq!(resolved, PathBuf::from("tpl/shared/a.txt"));

        assert!(resolve_include_path("../../x.txt", Path::new("tpl"), Some(&current)).is_err());
    }

    #[test]
    fn test_memory_loader_normalizes_keys() {
        let loader = MemoryLoader::with_files([("/tpl/./a/../b.txt", "content")]);
        assert_eq!(loader.load(Path::new("/tpl/b.txt")).unwrap(), b"content");
        let err = loader.load(Path::new("/tpl/c.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_filesystem_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inc.txt");
        std::fs::write(&path, "from disk").unwrap();
        assert_eq!(FileSystemLoader.load(&path).unwrap(), b"from disk");
        assert!(FileSystemLoader.load(&dir.path().join("missing")).is_err());
    }
}
