//! Advisory locks around clone and preview start
//!
//! Without these, two callers can both pass the directory guard or the port
//! probe and then collide. The lock is non-blocking: a busy lock is reported
//! to the caller instead of queued.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("Another operation is already in progress ({})", path.display())]
    Busy { path: PathBuf },

    #[error("Failed to create lock file {}: {source}", path.display())]
    CreateFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to acquire lock on {}: {source}", path.display())]
    LockFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// An exclusive lock held for the duration of one operation
///
/// Released when dropped; the lock file is removed on drop as well. A
/// process that opened the file just before the unlink can lock the
/// orphaned inode while a third one creates a fresh file, so exclusion is
/// best effort across processes.
#[derive(Debug)]
pub struct OperationLock {
    _file: File,
    path: PathBuf,
}

impl OperationLock {
    /// Take the lock or fail with `Busy` if someone else holds it
    pub fn acquire(lock_path: &Path) -> Result<Self, LockError> {
        Self::try_acquire(lock_path)?.ok_or_else(|| LockError::Busy {
            path: lock_path.to_path_buf(),
        })
    }

    /// Try to acquire an exclusive lock without blocking
    ///
    /// Returns `Ok(Some(lock))` if acquired, `Ok(None)` if held elsewhere.
    pub fn try_acquire(lock_path: &Path) -> Result<Option<Self>, LockError> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LockError::CreateFailed {
                path: lock_path.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .map_err(|source| LockError::CreateFailed {
                path: lock_path.to_path_buf(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(OperationLock {
                _file: file,
                path: lock_path.to_path_buf(),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            // EAGAIN / EACCES on some Unix platforms
            Err(e) if matches!(e.raw_os_error(), Some(11) | Some(13)) => Ok(None),
            Err(source) => Err(LockError::LockFailed {
                path: lock_path.to_path_buf(),
                source,
            }),
        }
    }
}

impl Drop for OperationLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Returns `<path>.lock`, a sibling of `path`
///
/// `path` is normalised first so a trailing separator cannot put the lock
/// inside the directory it guards.
pub fn lock_path_for(path: &Path) -> PathBuf {
    let normalized: PathBuf = path.components().collect();
    match normalized.file_name() {
        Some(name) => {
            let mut lock_name = name.to_os_string();
            lock_name.push(".lock");
            normalized.with_file_name(lock_name)
        }
        None => {
            let mut lock_path = normalized.into_os_string();
            lock_path.push(".lock");
            PathBuf::from(lock_path)
        }
    }
}
