//! Collapses `prefix<sep>suffix` subdirectory names down to `prefix`.
//!
//! Unrelated to the harness; shipped as its own binary. The first
//! subdirectory (in name order) for a prefix is renamed, later ones with the
//! same prefix are removed recursively. Names are handled as `OsStr`, so
//! directories whose names are not valid UTF-8 are split on their raw bytes.

use crate::domain::CaseCheckError;
use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SEPARATOR: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollapseAction {
    Renamed { from: PathBuf, to: PathBuf },
    Removed { path: PathBuf, prefix: OsString },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollapseReport {
    pub actions: Vec<CollapseAction>,
}

impl CollapseReport {
    pub fn renamed_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| matches!(action, CollapseAction::Renamed { .. }))
            .count()
    }

    pub fn removed_count(&self) -> usize {
        self.actions.len() - self.renamed_count()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollapseDirsError {
    #[error("separator must not be empty")]
    EmptySeparator,
    #[error("failed to read directory '{}': {source}", path.display())]
    ReadDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to rename '{}' to '{}': {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove '{}': {source}", path.display())]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<CollapseDirsError> for CaseCheckError {
    fn from(error: CollapseDirsError) -> Self {
        let message = error.to_string();
        match error {
            CollapseDirsError::EmptySeparator => {
                CaseCheckError::input_validation("INPUT.COLLAPSE_SEPARATOR", message)
            }
            CollapseDirsError::ReadDirectory { .. }
            | CollapseDirsError::Rename { .. }
            | CollapseDirsError::Remove { .. } => {
                CaseCheckError::io_system("IO.COLLAPSE_FILESYSTEM", message)
            }
        }
    }
}

pub fn collapse_subdirectories(
    dir: impl AsRef<Path>,
    separator: &str,
) -> Result<CollapseReport, CollapseDirsError> {
    let dir = dir.as_ref();
    if separator.is_empty() {
        return Err(CollapseDirsError::EmptySeparator);
    }

    let read_error = |source| CollapseDirsError::ReadDirectory {
        path: dir.to_path_buf(),
        source,
    };
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let path = entry.path();
        if path.is_dir() {
            subdirs.push((entry.file_name(), path));
        }
    }
    subdirs.sort();

    let mut seen = BTreeSet::new();
    let mut report = CollapseReport::default();
    for (name, path) in subdirs {
        let Some(prefix) = name_prefix(&name, separator) else {
            continue;
        };
        if prefix.is_empty() {
            tracing::warn!(
                name = %name.to_string_lossy(),
                "skipping directory with empty prefix"
            );
            continue;
        }

        if seen.contains(&prefix) {
            fs::remove_dir_all(&path).map_err(|source| CollapseDirsError::Remove {
                path: path.clone(),
                source,
            })?;
            tracing::info!(
                path = %path.display(),
                prefix = %prefix.to_string_lossy(),
                "removed duplicate directory"
            );
            report.actions.push(CollapseAction::Removed { path, prefix });
        } else {
            let target = dir.join(&prefix);
            fs::rename(&path, &target).map_err(|source| CollapseDirsError::Rename {
                from: path.clone(),
                to: target.clone(),
                source,
            })?;
            tracing::info!(from = %path.display(), to = %target.display(), "renamed directory");
            seen.insert(prefix);
            report.actions.push(CollapseAction::Renamed {
                from: path,
                to: target,
            });
        }
    }

    Ok(report)
}

/// Part of `name` before the first `separator`, or `None` when absent.
#[cfg(unix)]
fn name_prefix(name: &OsStr, separator: &str) -> Option<OsString> {
    use std::os::unix::ffi::OsStrExt;

    let bytes = name.as_bytes();
    let needle = separator.as_bytes();
    let end = bytes
        .windows(needle.len())
        .position(|window| window == needle)?;
    Some(OsStr::from_bytes(&bytes[..end]).to_os_string())
}

#[cfg(not(unix))]
fn name_prefix(name: &OsStr, separator: &str) -> Option<OsString> {
    let Some(name) = name.to_str() else {
        tracing::warn!(
            name = %name.to_string_lossy(),
            "skipping directory with non-UTF-8 name"
        );
        return None;
    };
    name.split_once(separator)
        .map(|(prefix, _)| OsString::from(prefix))
}
