//! Clone destination handling
//!
//! The target directory must be absent or empty before a clone. It is
//! never deleted here; a failed clone leaves its partial state in place.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Cap on entries reported by [`listing`]
pub const MAX_LISTING_ENTRIES: usize = 200;

#[derive(Error, Debug)]
pub enum TargetError {
    #[error("Target directory '{}' is not empty", path.display())]
    NotEmpty { path: PathBuf },

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Make sure `target` is a directory that a clone can populate
///
/// - missing: created (with parents)
/// - empty directory: left alone
/// - anything else (a file, or a directory with entries): `NotEmpty`
pub fn ensure_clean(target: &Path) -> Result<(), TargetError> {
    if !target.exists() {
        return std::fs::create_dir_all(target).map_err(|source| TargetError::CreateDir {
            path: target.to_path_buf(),
            source,
        });
    }

    if target.is_dir() && is_empty_dir(target)? {
        return Ok(());
    }

    Err(TargetError::NotEmpty {
        path: target.to_path_buf(),
    })
}

fn is_empty_dir(path: &Path) -> Result<bool, TargetError> {
    let mut entries = std::fs::read_dir(path).map_err(|source| TargetError::ReadDir {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(entries.next().is_none())
}

/// Sorted entry names of `dir`, at most [`MAX_LISTING_ENTRIES`]
pub fn listing(dir: &Path) -> Result<Vec<String>, TargetError> {
    let entries = std::fs::read_dir(dir).map_err(|source| TargetError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names.truncate(MAX_LISTING_ENTRIES);
    Ok(names)
}
