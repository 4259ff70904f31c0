//! Single-instance guard.
//!
//! Two installers racing over the same package manager corrupt each other's
//! work, so the binary takes an exclusive advisory lock on a well-known file
//! before it starts a run. The lock dies with the process: a file left
//! behind by a crashed run is simply locked again.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LockError {
    /// Another process holds the lock.
    #[error(
        "another installation is already running{}",
        .pid.map(|pid| format!(" (pid {})", pid)).unwrap_or_default()
    )]
    AlreadyRunning {
        /// Process id recorded by the holder, when it could be read.
        pid: Option<u32>,
    },

    /// The lock file could not be opened or written.
    #[error("cannot use lock file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    /// Get an actionable suggestion for fixing this error.
    pub fn fix_suggestion(&self) -> &'static str {
        match self {
            Self::AlreadyRunning { .. } => {
                "Wait for the other installation to finish, or close it first"
            }
            Self::Io { .. } => "Check that the lock directory exists and is writable",
        }
    }
}

/// Held for as long as this process may run installations.
///
/// ```rust,no_run
/// use setgo::{InstanceLock, LockError};
///
/// match InstanceLock::acquire(std::env::temp_dir().join("setgo.lock")) {
///     Ok(_lock) => println!("ready"),
///     Err(LockError::AlreadyRunning { pid }) => println!("busy: {:?}", pid),
///     Err(err) => println!("{}", err),
/// }
/// ```
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

/// Attempts before giving up on a lock file that keeps being replaced.
const MAX_ATTEMPTS: usize = 8;

impl InstanceLock {
    /// Take the lock at `path` without waiting, recording this process id.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, LockError> {
        let path = path.into();

        for _ in 0..MAX_ATTEMPTS {
            let file = open(&path)?;
            if let Some(lock) = Self::lock_file(file, &path)? {
                return Ok(lock);
            }
        }
        Err(LockError::AlreadyRunning {
            pid: read_pid(&path),
        })
    }

    /// Lock an already opened `file` that was found at `path`.
    ///
    /// Returns `Ok(None)` when the locked file is no longer the one at
    /// `path`: the previous holder unlinked it between our open and lock.
    fn lock_file(mut file: File, path: &Path) -> Result<Option<Self>, LockError> {
        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(LockError::AlreadyRunning {
                    pid: read_pid(path),
                })
            }
            Err(TryLockError::Error(source)) => return Err(io_error(path, source)),
        }

        if !still_linked(&file, path) {
            debug!(path = %path.display(), "lock file was replaced, retrying");
            return Ok(None);
        }

        file.set_len(0).map_err(|source| io_error(path, source))?;
        write!(file, "{}", std::process::id()).map_err(|source| io_error(path, source))?;
        file.flush().map_err(|source| io_error(path, source))?;

        debug!(path = %path.display(), "instance lock acquired");
        Ok(Some(Self {
            file,
            path: path.to_path_buf(),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // Unlink while still locked; acquirers check they locked the linked file.
        let _ = fs::remove_file(&self.path);
        let _ = self.file.unlock();
    }
}

fn open(path: &Path) -> Result<File, LockError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: io::Error) -> LockError {
    LockError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path)
        .ok()
        .and_then(|contents| contents.trim().parse().ok())
}

/// Whether `file` is still the file linked at `path`.
#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (file.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(linked)) => held.dev() == linked.dev() && held.ino() == linked.ino(),
        _ => false,
    }
}

// An open file cannot be deleted on Windows, so the lock file is never
// swapped underneath a waiting process.
#[cfg(not(unix))]
fn still_linked(_file: &File, _path: &Path) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_records_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setgo.lock");

        let lock = InstanceLock::acquire(&path).unwrap();
        assert_eq!(lock.path(), path);
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, std::process::id().to_string());
    }

    #[cfg(unix)]
    #[test]
    fn test_second_acquire_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setgo.lock");

        let _held = InstanceLock::acquire(&path).unwrap();
        let err = InstanceLock::acquire(&path).unwrap_err();
        let LockError::AlreadyRunning { pid } = err else {
            panic!("expected AlreadyRunning, got {:?}", err);
        };
        assert_eq!(pid, Some(std::process::id()));
    }

    #[cfg(unix)]
    #[test]
    fn test_unlinked_file_is_not_a_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setgo.lock");

        // B opens the file while A still holds it, and locks only after A is gone.
        let a = InstanceLock::acquire(&path).unwrap();
        let b_file = open(&path).unwrap();
        drop(a);

        assert!(InstanceLock::lock_file(b_file, &path).unwrap().is_none());

        // C locks the fresh file; B retrying from scratch is refused.
        let _c = InstanceLock::acquire(&path).unwrap();
        let err = InstanceLock::acquire(&path).unwrap_err();
        assert!(matches!(err, LockError::AlreadyRunning { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_handle_and_fresh_acquire_never_both_hold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setgo.lock");

        let a = InstanceLock::acquire(&path).unwrap();
        let b_file = open(&path).unwrap();
        drop(a);
        let c = InstanceLock::acquire(&path).unwrap();

        let b = InstanceLock::lock_file(b_file, &path);
        assert!(!matches!(b, Ok(Some(_))), "two holders: {:?} and {:?}", b, c);
    }

    #[test]
    fn test_drop_releases_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setgo.lock");

        drop(InstanceLock::acquire(&path).unwrap());
        assert!(!path.exists());
        InstanceLock::acquire(&path).unwrap();
    }

    #[test]
    fn test_stale_file_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setgo.lock");
        fs::write(&path, "999999999").unwrap();

        let _lock = InstanceLock::acquire(&path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            std::process::id().to_string()
        );
    }

    #[test]
    fn test_missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = InstanceLock::acquire(dir.path().join("missing").join("setgo.lock")).unwrap_err();
        assert!(matches!(err, LockError::Io { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_already_running_display() {
        let err = LockError::AlreadyRunning { pid: Some(42) };
        assert_eq!(err.to_string(), "another installation is already running (pid 42)");
        let err = LockError::AlreadyRunning { pid: None };
        assert_eq!(err.to_string(), "another installation is already running");
        assert!(!err.fix_suggestion().is_empty());
    }
}
