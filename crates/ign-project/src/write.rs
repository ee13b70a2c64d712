/*
 * write.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Writing generated files to an output directory.
 */

use crate::types::{CreateError, GeneratedFile};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// How to treat files that already exist in the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Leave existing files alone
    #[default]
    SkipExisting,

    /// Replace existing files
    Overwrite,
}

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Skipped,
    Overwritten,
}

impl WriteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOutcome::Created => "created",
            WriteOutcome::Skipped => "skipped",
            WriteOutcome::Overwritten => "overwritten",
        }
    }
}

impl std::fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A file handled by [`write_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// Path relative to the output directory
    pub path: PathBuf,
    pub outcome: WriteOutcome,
}

/// Write `files` below `out_dir`, creating parent directories as needed.
///
/// Paths must be relative and stay inside `out_dir`. Permission bits are
/// applied on unix when the file carries them.
pub fn write_files(
    out_dir: &Path,
    files: &[GeneratedFile],
    mode: WriteMode,
) -> Result<Vec<WrittenFile>, CreateError> {
    let mut written = Vec::with_capacity(files.len());

    for file in files {
        if !stays_inside(&file.path) {
            return Err(CreateError::InvalidConfig(format!(
                "refusing to write {} outside the output directory",
                file.path.display()
            )));
        }

        let target = out_dir.join(&file.path);
        let existed = target.exists();
        if existed && mode == WriteMode::SkipExisting {
            tracing::debug!(path = %file.path.display(), "exists, skipping");
            written.push(WrittenFile {
                path: file.path.clone(),
                outcome: WriteOutcome::Skipped,
            });
            continue;
        }

        let write_err = |source: std::io::Error| CreateError::Write {
            path: target.clone(),
            source,
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&target, &file.content).map_err(write_err)?;
        if let Some(bits) = file.mode {
            set_mode(&target, bits).map_err(write_err)?;
        }

        let outcome = if existed {
            WriteOutcome::Overwritten
        } else {
            WriteOutcome::Created
        };
        tracing::debug!(path = %file.path.display(), %outcome, "wrote file");
        written.push(WrittenFile {
            path: file.path.clone(),
            outcome,
        });
    }

    Ok(written)
}

fn stays_inside(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && path.components().any(|c| matches!(c, Component::Normal(_)))
}

#[cfg(unix)]
fn set_mode(path: &Path, bits: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(bits))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _bits: u32) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn outcomes(written: &[WrittenFile]) -> Vec<(String, WriteOutcome)> {
        written
            .iter()
            .map(|w| (w.path.display().to_string(), w.outcome))
            .collect()
    }

    #[test]
    fn test_creates_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            GeneratedFile::new("README.md", "# svc\n"),
            GeneratedFile::new("cmd/svc/main.go", "package main\n"),
        ];

        let written = write_files(dir.path(), &files, WriteMode::SkipExisting).unwrap();
        assert_eq!(
            outcomes(&written),
            vec![
                ("README.md".to_string(), WriteOutcome::Created),
                ("cmd/svc/main.go".to_string(), WriteOutcome::Created),
            ]
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("cmd/svc/main.go")).unwrap(),
            "package main\n"
        );
    }

    #[test]
    fn test_skip_existing_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "mine").unwrap();

        let files = vec![GeneratedFile::new("a.txt", "generated")];
        let written = write_files(dir.path(), &files, WriteMode::SkipExisting).unwrap();
        assert_eq!(written[0].outcome, WriteOutcome::Skipped);
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "mine");
    }

    #[test]
    fn test_overwrite_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "mine").unwrap();

        let files = vec![GeneratedFile::new("a.txt", "generated")];
        let written = write_files(dir.path(), &files, WriteMode::Overwrite).unwrap();
        assert_eq!(written[0].outcome, WriteOutcome::Overwritten);
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "generated");
    }

    #[test]
    fn test_rejects_paths_outside_output() {
        let dir = tempfile::tempdir().unwrap();
        for path in ["../escape.txt", "/abs.txt", "a/../../b.txt", "."] {
            let files = vec![GeneratedFile::new(path, "x")];
            let err = write_files(dir.path(), &files, WriteMode::Overwrite).unwrap_err();
            assert!(
                matches!(err, CreateError::InvalidConfig(_)),
                "{} should be rejected",
                path
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_applies_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let files = vec![GeneratedFile::new("run.sh", "#!/bin/sh\n").with_mode(Some(0o750))];
        write_files(dir.path(), &files, WriteMode::SkipExisting).unwrap();

        let mode = fs::metadata(dir.path().join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o750);
    }
}
