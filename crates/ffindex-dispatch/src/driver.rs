use std::collections::{HashMap, VecDeque};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use ffindex_cache::{KeyedStore, Namespace};
use ffindex_core::cli::Args;
use ffindex_core::FfindexError;
use ffindex_scan::ScanStats;

use crate::payload::IpcPayload;
use crate::run_guard::RunGuard;
use crate::worker::build_worker_command;

const POLL_INTERVAL: Duration = Duration::from_millis(125);

/// Run-level totals, accumulated whether the scan ran inline (one root)
/// or fanned out across worker processes (many roots).
#[derive(Debug, Default, Clone, Copy)]
pub struct DispatchOutcome {
    pub dirs_visited: u64,
    pub dirs_pruned_hot: u64,
    pub files_indexed: u64,
    pub io_errors: u64,
}

impl DispatchOutcome {
    fn accumulate_stats(&mut self, stats: ScanStats) {
        self.dirs_visited += stats.dirs_visited as u64;
        self.dirs_pruned_hot += stats.dirs_pruned_hot as u64;
        self.files_indexed += stats.files_indexed as u64;
        self.io_errors += stats.io_errors as u64;
    }

    fn accumulate_payload(&mut self, payload: &IpcPayload) {
        self.dirs_visited += payload.dirs_visited;
        self.dirs_pruned_hot += payload.dirs_pruned_hot;
        self.files_indexed += payload.files_indexed;
        self.io_errors += payload.io_errors;
    }
}

/// Single-root case: run the scan inline in the master, no
/// worker process involved.
pub fn run_single_root(
    root: &Path,
    namespace: &mut Namespace,
    store: &mut dyn KeyedStore,
    threads: usize,
) -> Result<DispatchOutcome> {
    let (delta, stats) = ffindex_scan::scan_root(root, &namespace.hot, threads)?;

    for (dir, mtime) in delta.hot {
        namespace.mark_hot(dir, mtime);
    }
    for (dir, fragment) in delta.fragments {
        store.set(dir.to_string_lossy().into_owned(), fragment);
    }

    let mut outcome = DispatchOutcome::default();
    outcome.accumulate_stats(stats);
    Ok(outcome)
}

/// Multi-root case: one worker process per root, at most
/// `args.concurrency` alive at once, polled every 125 ms. `guard` owns
/// the scratch directory workers write their IPC files into and is
/// responsible for killing stragglers if this function returns early.
pub fn run_multi_root(
    args: &Args,
    roots: &[PathBuf],
    namespace: &mut Namespace,
    store: &mut dyn KeyedStore,
    guard: &RunGuard,
) -> Result<DispatchOutcome> {
    let exe = std::env::current_exe().context("locating own executable")?;
    let mut pending: VecDeque<PathBuf> = roots.iter().cloned().collect();
    let mut inflight: HashMap<u32, (PathBuf, PathBuf, PathBuf)> = HashMap::new();
    let mut next_id = 0usize;
    let mut outcome = DispatchOutcome::default();
    let concurrency = args.concurrency.max(1);

    while !pending.is_empty() || !inflight.is_empty() {
        while inflight.len() < concurrency && !pending.is_empty() {
            let root = pending.pop_front().expect("checked non-empty");
            let ipc_path = guard.scratch_dir().join(format!("worker-{next_id}.ipc"));
            let stderr_path = guard.scratch_dir().join(format!("worker-{next_id}.stderr"));
            next_id += 1;

            // A worker's stderr carries one `warn!` line per per-directory
            // I/O error, which on a tree with many unreadable subdirectories
            // can run to megabytes — far past what an OS pipe buffers. Piping
            // it and reading only on failure would let the worker block
            // writing to a full pipe while this loop is off polling others,
            // so it's redirected straight to a scratch file instead.
            let stderr_file = File::create(&stderr_path)
                .with_context(|| format!("creating {}", stderr_path.display()))?;

            let mut command = build_worker_command(&exe, args, &root, &ipc_path);
            let child = command
                .stderr(Stdio::from(stderr_file))
                .spawn()
                .with_context(|| format!("spawning worker for {}", root.display()))?;

            log::info!("launched worker pid {} for {}", child.id(), root.display());
            inflight.insert(child.id(), (root, ipc_path, stderr_path));
            guard.track_child(child);
        }

        for (child, status) in guard.poll_finished() {
            let (root, ipc_path, stderr_path) = inflight
                .remove(&child.id())
                .expect("poll_finished only returns tracked children");

            if !status.success() {
                let stderr = fs::read_to_string(&stderr_path).unwrap_or_default();
                return Err(FfindexError::WorkerFailed(format!(
                    "{} exited with {status}: {}",
                    root.display(),
                    stderr.trim()
                ))
                .into());
            }

            let payload = IpcPayload::read(&ipc_path)
                .with_context(|| format!("reading worker output for {}", root.display()))?;
            outcome.accumulate_payload(&payload);

            for (dir, fragment) in payload.dc {
                store.set(dir, fragment);
            }
            namespace.hot.extend(payload.hot);

            log::info!("absorbed worker output for {}", root.display());
        }

        if !inflight.is_empty() {
            sleep(POLL_INTERVAL);
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffindex_cache::MemoryIndexStore;

    #[test]
    fn single_root_merges_delta_into_namespace_and_store() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("H-R-0-16.gwf")).unwrap();

        let mut namespace = Namespace::open(&dir.path().join("ns")).unwrap();
        let mut store = MemoryIndexStore::new();

        let outcome = run_single_root(dir.path(), &mut namespace, &mut store, 2).unwrap();

        assert_eq!(outcome.files_indexed, 1);
        assert_eq!(store.len(), 1);
        assert!(namespace.hot.contains_key(dir.path()));
    }
}
