use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ffindex_cache::{Fragment, HotMap};
use serde::{Deserialize, Serialize};

/// The self-describing payload a worker writes to its IPC file at exit:
/// the per-directory fragments it produced and the hot-map entries it
/// is prepared to vouch for.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IpcPayload {
    pub dc: HashMap<String, Fragment>,
    pub hot: HotMap,
    pub dirs_visited: u64,
    pub dirs_pruned_hot: u64,
    pub files_indexed: u64,
    pub io_errors: u64,
}

impl IpcPayload {
    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self).context("encoding IPC payload")?;
        fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        bincode::deserialize(&bytes).with_context(|| format!("decoding {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffindex_core::{Interval, Sfde};

    #[test]
    fn payload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worker.ipc");

        let mut payload = IpcPayload::default();
        let mut frag = Fragment::new();
        frag.insert(
            Sfde {
                site: "H".into(),
                frametype: "R".into(),
                duration: 16,
                extension: "gwf".into(),
            },
            vec![Interval::new(0, 16)],
        );
        payload.dc.insert("/a/b".to_string(), frag);
        payload.hot.insert("/a/b".into(), 1000);

        payload.write(&path).unwrap();
        let reread = IpcPayload::read(&path).unwrap();

        assert_eq!(reread.dc.len(), 1);
        assert_eq!(reread.hot.get(Path::new("/a/b")), Some(&1000));
    }
}
