use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ffindex_core::FfindexError;

/// Presence-based single-writer lock for one namespace. Deliberately not
/// an OS-level advisory lock: a stale lock from a crashed master must be
/// diagnosable and removable by an operator, not silently broken by the
/// next run. "Fail fast, don't wait" — no retries, no timeout.
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    /// Acquire the lock at `namespace_path` + `.lock`. Fails immediately
    /// if the marker already exists; never waits.
    pub fn acquire(namespace_path: &Path) -> Result<Self> {
        let path = lock_path(namespace_path);
        if path.exists() {
            return Err(FfindexError::LockConflict(path.display().to_string()).into());
        }

        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        fs::write(&path, std::process::id().to_string())
            .with_context(|| format!("creating lock {}", path.display()))?;

        Ok(LockGuard {
            path,
            released: false,
        })
    }

    /// Release early (rather than waiting for `Drop`). Idempotent.
    pub fn release(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
            self.released = true;
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release();
    }
}

fn lock_path(namespace_path: &Path) -> PathBuf {
    let mut s = namespace_path.as_os_str().to_os_string();
    s.push(".lock");
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquiring_twice_fails_for_second_caller() {
        let dir = tempfile::tempdir().unwrap();
        let ns = dir.path().join("ns");

        let first = LockGuard::acquire(&ns).unwrap();
        let second = LockGuard::acquire(&ns);
        assert!(second.is_err());
        drop(first);
    }

    #[test]
    fn drop_removes_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let ns = dir.path().join("ns");

        {
            let _guard = LockGuard::acquire(&ns).unwrap();
            assert!(lock_path(&ns).exists());
        }
        assert!(!lock_path(&ns).exists());
    }

    #[test]
    fn double_release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ns = dir.path().join("ns");
        let mut guard = LockGuard::acquire(&ns).unwrap();
        guard.release();
        guard.release();
        assert!(!lock_path(&ns).exists());
    }

    #[test]
    fn failed_acquisition_leaves_lock_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let ns = dir.path().join("ns");
        let first = LockGuard::acquire(&ns).unwrap();

        let before = fs::read(lock_path(&ns)).unwrap();
        let _ = LockGuard::acquire(&ns);
        let after = fs::read(lock_path(&ns)).unwrap();

        assert_eq!(before, after);
        drop(first);
    }
}
