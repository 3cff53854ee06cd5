use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::atomic;

/// `absolute directory path -> last-observed mtime, in whole seconds`.
///
/// A directory is "hot" (safe to skip) iff it is present here and its
/// current mtime is `<=` the recorded value. The recorded value is never
/// set higher than the real mtime sampled at scan time.
pub type HotMap = HashMap<PathBuf, i64>;

/// Process-wide metadata persisted alongside the hot map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub initial_run: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub last_scan_secs: f64,
    pub last_write_secs: f64,
    pub last_close_secs: f64,
    pub directory_count: usize,
    pub on_disk_bytes: u64,
}

impl Header {
    fn bootstrap() -> Self {
        Header {
            version: 1,
            initial_run: true,
            last_run: None,
            last_scan_secs: 0.0,
            last_write_secs: 0.0,
            last_close_secs: 0.0,
            directory_count: 0,
            on_disk_bytes: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NamespaceFile {
    header: Header,
    hot: HotMap,
}

/// The namespace file `N`: header plus hot map. The sibling index store
/// (`N.shlv`) is a separate file handled by
/// [`crate::store::FileIndexStore`]; the lock file (`N.lock`) by
/// [`crate::lock::LockGuard`].
pub struct Namespace {
    path: PathBuf,
    pub header: Header,
    pub hot: HotMap,
}

impl Namespace {
    /// Open the namespace at `path`, bootstrapping an empty one if it
    /// does not yet exist. A missing namespace file is never an error —
    /// only a missing *directory* for it is.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Namespace {
                path: path.to_path_buf(),
                header: Header::bootstrap(),
                hot: HotMap::new(),
            });
        }

        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let file: NamespaceFile = bincode::deserialize(&bytes)
            .with_context(|| format!("decoding namespace {}", path.display()))?;

        Ok(Namespace {
            path: path.to_path_buf(),
            header: file.header,
            hot: file.hot,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the namespace atomically (temp file + rename).
    pub fn save(&mut self, mode: u32, scan: Duration, write: Duration, close: Duration) -> Result<()> {
        self.header.initial_run = false;
        self.header.last_run = Some(Utc::now());
        self.header.last_scan_secs = scan.as_secs_f64();
        self.header.last_write_secs = write.as_secs_f64();
        self.header.last_close_secs = close.as_secs_f64();
        self.header.directory_count = self.hot.len();

        let file = NamespaceFile {
            header: self.header.clone(),
            hot: self.hot.clone(),
        };
        let bytes = bincode::serialize(&file).context("encoding namespace")?;
        self.header.on_disk_bytes = bytes.len() as u64;

        atomic::publish(&self.path, &bytes, mode)?;
        Ok(())
    }

    /// True iff directory `d` is hot: recorded and its current mtime does
    /// not exceed the recorded sample.
    pub fn is_hot(&self, dir: &Path, current_mtime: i64) -> bool {
        matches!(self.hot.get(dir), Some(&recorded) if current_mtime <= recorded)
    }

    pub fn mark_hot(&mut self, dir: PathBuf, mtime: i64) {
        self.hot.insert(dir, mtime);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_missing_namespace_bootstraps_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ns = Namespace::open(&dir.path().join("ns")).unwrap();
        assert!(ns.header.initial_run);
        assert!(ns.hot.is_empty());
    }

    #[test]
    fn save_then_open_round_trips_hot_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ns");

        let mut ns = Namespace::open(&path).unwrap();
        ns.mark_hot(PathBuf::from("/a/b"), 12345);
        ns.save(0o644, Duration::ZERO, Duration::ZERO, Duration::ZERO).unwrap();

        let reopened = Namespace::open(&path).unwrap();
        assert!(!reopened.header.initial_run);
        assert_eq!(reopened.hot.get(&PathBuf::from("/a/b")), Some(&12345));
    }

    #[test]
    fn hot_directory_detection_uses_less_than_or_equal() {
        let dir = tempfile::tempdir().unwrap();
        let mut ns = Namespace::open(&dir.path().join("ns")).unwrap();
        ns.mark_hot(PathBuf::from("/a"), 1000);

        assert!(ns.is_hot(Path::new("/a"), 1000));
        assert!(ns.is_hot(Path::new("/a"), 999));
        assert!(!ns.is_hot(Path::new("/a"), 1001));
        assert!(!ns.is_hot(Path::new("/unknown"), 0));
    }
}
