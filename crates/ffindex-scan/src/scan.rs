use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use ffindex_cache::{insert_frame, Fragment, HotMap};
use ffindex_core::parse_frame_name;

/// What one `scan_root` call produced: fragments for the directories it
/// actually visited, and the hot-map entries for the directories it
/// fully indexed (or found empty). Directories not observed this run are
/// simply absent — the caller leaves their prior fragment untouched.
#[derive(Debug, Default)]
pub struct ScanDelta {
    pub fragments: HashMap<PathBuf, Fragment>,
    pub hot: HotMap,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScanStats {
    pub dirs_visited: usize,
    pub dirs_pruned_hot: usize,
    pub files_indexed: usize,
    pub io_errors: usize,
}

fn mtime_secs(path: &Path) -> Result<i64> {
    let meta = fs::metadata(path)?;
    let modified = meta.modified()?;
    let secs = modified
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    Ok(secs as i64)
}

/// Walk `root`, pruning any directory that is "hot" against `baseline_hot`.
/// Uses a bounded `rayon` thread pool internally for work-stealing
/// parallel descent within this one process — invisible to the
/// multi-process worker dispatch, which only ever calls this once per
/// worker.
pub fn scan_root(root: &Path, baseline_hot: &HotMap, threads: usize) -> Result<(ScanDelta, ScanStats)> {
    if !root.is_dir() {
        anyhow::bail!("scan root is not a directory: {}", root.display());
    }

    let work_queue: Mutex<VecDeque<PathBuf>> = Mutex::new(VecDeque::from([root.to_path_buf()]));
    let fragments: Mutex<HashMap<PathBuf, Fragment>> = Mutex::new(HashMap::new());
    let hot_out: Mutex<HotMap> = Mutex::new(HotMap::new());
    let dirs_visited = AtomicUsize::new(0);
    let dirs_pruned_hot = AtomicUsize::new(0);
    let files_indexed = AtomicUsize::new(0);
    let io_errors = AtomicUsize::new(0);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .context("building scan thread pool")?;

    pool.in_place_scope(|scope| {
        for _ in 0..threads.max(1) {
            scope.spawn(|_| {
                worker_loop(
                    &work_queue,
                    baseline_hot,
                    &fragments,
                    &hot_out,
                    &dirs_visited,
                    &dirs_pruned_hot,
                    &files_indexed,
                    &io_errors,
                );
            });
        }
    });

    let delta = ScanDelta {
        fragments: fragments.into_inner().unwrap(),
        hot: hot_out.into_inner().unwrap(),
    };
    let stats = ScanStats {
        dirs_visited: dirs_visited.load(Ordering::Relaxed),
        dirs_pruned_hot: dirs_pruned_hot.load(Ordering::Relaxed),
        files_indexed: files_indexed.load(Ordering::Relaxed),
        io_errors: io_errors.load(Ordering::Relaxed),
    };
    Ok((delta, stats))
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    work_queue: &Mutex<VecDeque<PathBuf>>,
    baseline_hot: &HotMap,
    fragments: &Mutex<HashMap<PathBuf, Fragment>>,
    hot_out: &Mutex<HotMap>,
    dirs_visited: &AtomicUsize,
    dirs_pruned_hot: &AtomicUsize,
    files_indexed: &AtomicUsize,
    io_errors: &AtomicUsize,
) {
    loop {
        let dir = {
            let mut queue = work_queue.lock().unwrap();
            queue.pop_front()
        };
        let Some(dir) = dir else {
            return;
        };

        // Sample mtime no later than listing begins: a write
        // racing a sample taken afterward could be missed forever.
        let current_mtime = match mtime_secs(&dir) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("stat failed for {}: {e}", dir.display());
                io_errors.fetch_add(1, Ordering::Relaxed);
                continue;
            }
        };

        if matches!(baseline_hot.get(&dir), Some(&recorded) if current_mtime <= recorded) {
            dirs_pruned_hot.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) => {
                log::warn!("read_dir failed for {}: {e}", dir.display());
                io_errors.fetch_add(1, Ordering::Relaxed);
                continue;
            }
        };

        let mut local_fragment = Fragment::new();
        let mut child_dirs = Vec::new();
        let mut saw_any_child = false;

        for entry in entries.flatten() {
            saw_any_child = true;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();

            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) => {
                    log::warn!("stat failed for {}: {e}", entry.path().display());
                    io_errors.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };

            if file_type.is_dir() {
                let child_path = entry.path();
                let child_mtime = mtime_secs(&child_path).ok();
                let is_hot = match (baseline_hot.get(&child_path), child_mtime) {
                    (Some(&recorded), Some(m)) => m <= recorded,
                    _ => false,
                };
                if !is_hot {
                    child_dirs.push(child_path);
                }
            } else if file_type.is_file() {
                if let Some(frame) = parse_frame_name(&name) {
                    insert_frame(&mut local_fragment, &frame);
                    files_indexed.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        if !child_dirs.is_empty() {
            work_queue.lock().unwrap().extend(child_dirs);
        }

        // Empty directories still record hot so the next run can
        // skip them; directories that contributed at least one fragment
        // entry do too. Either way this directory was fully indexed.
        if !local_fragment.is_empty() || !saw_any_child {
            hot_out.lock().unwrap().insert(dir.clone(), current_mtime);
        }
        if !local_fragment.is_empty() {
            fragments.lock().unwrap().insert(dir.clone(), local_fragment);
        }

        dirs_visited.fetch_add(1, Ordering::Relaxed);
    }
}
