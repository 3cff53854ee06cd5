use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::atomic;
use crate::fragment::Fragment;

/// Abstract string-keyed persistent map from directory path to fragment.
/// The master uses [`FileIndexStore`]; a
/// worker, which has no write permission to the persistent index store,
/// accumulates into a pure [`MemoryIndexStore`] and ships it home as an
/// IPC payload instead.
pub trait KeyedStore {
    fn set(&mut self, key: String, value: Fragment);
    fn get(&self, key: &str) -> Option<&Fragment>;
    fn keys(&self) -> Vec<&str>;
    fn iter(&self) -> Box<dyn Iterator<Item = (&str, &Fragment)> + '_>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The sidecar index store `N.shlv`. Loaded wholesale on open (directory
/// fragments are small; the whole store for millions of directories is
/// still a modest in-memory map), mutated per-key, and republished
/// atomically on [`FileIndexStore::save`].
pub struct FileIndexStore {
    path: PathBuf,
    map: HashMap<String, Fragment>,
}

impl FileIndexStore {
    pub fn open(path: &Path) -> Result<Self> {
        let map = if path.exists() {
            let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            bincode::deserialize(&bytes)
                .with_context(|| format!("decoding index store {}", path.display()))?
        } else {
            HashMap::new()
        };

        Ok(FileIndexStore {
            path: path.to_path_buf(),
            map,
        })
    }

    pub fn save(&self, mode: u32) -> Result<()> {
        let bytes = bincode::serialize(&self.map).context("encoding index store")?;
        atomic::publish(&self.path, &bytes, mode)
    }
}

impl KeyedStore for FileIndexStore {
    fn set(&mut self, key: String, value: Fragment) {
        self.map.insert(key, value);
    }

    fn get(&self, key: &str) -> Option<&Fragment> {
        self.map.get(key)
    }

    fn keys(&self) -> Vec<&str> {
        self.map.keys().map(String::as_str).collect()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&str, &Fragment)> + '_> {
        Box::new(self.map.iter().map(|(k, v)| (k.as_str(), v)))
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// A worker's in-memory index store: same interface, no file behind it.
/// Its contents are serialized once, at worker exit, into the IPC
/// payload rather than into the shared `N.shlv`.
#[derive(Default)]
pub struct MemoryIndexStore {
    map: HashMap<String, Fragment>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_map(self) -> HashMap<String, Fragment> {
        self.map
    }
}

impl KeyedStore for MemoryIndexStore {
    fn set(&mut self, key: String, value: Fragment) {
        self.map.insert(key, value);
    }

    fn get(&self, key: &str) -> Option<&Fragment> {
        self.map.get(key)
    }

    fn keys(&self) -> Vec<&str> {
        self.map.keys().map(String::as_str).collect()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&str, &Fragment)> + '_> {
        Box::new(self.map.iter().map(|(k, v)| (k.as_str(), v)))
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffindex_core::{Interval, Sfde};

    fn sample_fragment() -> Fragment {
        let mut f = Fragment::new();
        f.insert(
            Sfde {
                site: "H".into(),
                frametype: "R".into(),
                duration: 16,
                extension: "gwf".into(),
            },
            vec![Interval::new(0, 16)],
        );
        f
    }

    #[test]
    fn file_store_round_trips_through_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ns.shlv");

        let mut store = FileIndexStore::open(&path).unwrap();
        store.set("/a/b".to_string(), sample_fragment());
        store.save(0o644).unwrap();

        let reopened = FileIndexStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert!(reopened.get("/a/b").is_some());
    }

    #[test]
    fn memory_store_needs_no_file() {
        let mut store = MemoryIndexStore::new();
        assert!(store.is_empty());
        store.set("/a".to_string(), sample_fragment());
        assert_eq!(store.len(), 1);
        let map = store.into_map();
        assert!(map.contains_key("/a"));
    }
}
