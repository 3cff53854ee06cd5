use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use ffindex_cache::{FileIndexStore, LockGuard, Namespace};
use ffindex_core::cli::Args;
use ffindex_core::{ExitReason, FfindexError};
use ffindex_dispatch::{create_scratch_dir, run_multi_root, run_single_root, DispatchOutcome, IpcPayload, RunGuard};
use ffindex_emit::{render, write_output};

fn main() {
    let args = ffindex_core::parse_args();
    init_logging(args.verbose);

    let code = match run(&args) {
        Ok(()) => ExitReason::Success.code(),
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("ffindex: {e:#}");
            ExitReason::classify(&e).code()
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn run(args: &Args) -> Result<()> {
    args.validate()?;

    let namespace_path = PathBuf::from(&args.namespace);

    // `--status` is handled before the lock is taken: it only reads the
    // header.
    if args.status {
        return print_status(&namespace_path);
    }

    if args.is_worker() {
        return run_worker(args);
    }

    run_master(args, &namespace_path)
}

fn print_status(namespace_path: &Path) -> Result<()> {
    if !namespace_path.exists() {
        return Err(FfindexError::MissingNamespace(namespace_path.display().to_string()).into());
    }

    let namespace = Namespace::open(namespace_path)?;
    let header = &namespace.header;
    println!("namespace:        {}", namespace_path.display());
    println!("initial_run:      {}", header.initial_run);
    println!("last_run:         {:?}", header.last_run);
    println!("last_scan_secs:   {:.3}", header.last_scan_secs);
    println!("last_write_secs:  {:.3}", header.last_write_secs);
    println!("last_close_secs:  {:.3}", header.last_close_secs);
    println!("directory_count:  {}", header.directory_count);
    println!("on_disk_bytes:    {}", header.on_disk_bytes);
    Ok(())
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Append `.suffix` onto a namespace path to derive its sibling files
/// (`N.shlv` for the index store; `N.lock`, handled separately in
/// `ffindex_cache::lock`, follows the same convention).
fn sibling_path(base: &Path, suffix: &str) -> PathBuf {
    let mut os = base.as_os_str().to_os_string();
    os.push(".");
    os.push(suffix);
    PathBuf::from(os)
}

/// Worker entry point: scan the one assigned root against a freshly
/// loaded hot-map baseline and write the result to the IPC file.
/// A worker never touches the namespace lock or the persistent index
/// store — it has no write permission to either.
fn run_worker(args: &Args) -> Result<()> {
    let namespace_path = PathBuf::from(&args.namespace);
    let namespace = Namespace::open(&namespace_path)?;
    let root = args.dirs[0].clone();

    let (delta, stats) = ffindex_scan::scan_root(&root, &namespace.hot, default_threads())?;

    let mut payload = IpcPayload {
        hot: delta.hot,
        dirs_visited: stats.dirs_visited as u64,
        dirs_pruned_hot: stats.dirs_pruned_hot as u64,
        files_indexed: stats.files_indexed as u64,
        io_errors: stats.io_errors as u64,
        ..IpcPayload::default()
    };
    for (dir, fragment) in delta.fragments {
        payload.dc.insert(dir.to_string_lossy().into_owned(), fragment);
    }

    let ipc_path = args
        .ipc_file
        .as_ref()
        .expect("Args::validate guarantees worker mode sets -i/--ipc-file");
    payload.write(ipc_path)?;

    log::info!(
        "worker for {} indexed {} directories, {} files ({} I/O errors)",
        root.display(),
        payload.dc.len(),
        payload.files_indexed,
        payload.io_errors,
    );
    Ok(())
}

/// Master entry point: acquire the single-writer lock, scan (inline for
/// one root, via a worker pool for many), aggregate, publish, and
/// optionally emit.
fn run_master(args: &Args, namespace_path: &Path) -> Result<()> {
    let lock = LockGuard::acquire(namespace_path)?;
    let mut namespace = Namespace::open(namespace_path)?;
    let store_path = sibling_path(namespace_path, "shlv");
    let mut store = FileIndexStore::open(&store_path)?;

    let scratch_parent = args.tempdir.clone().unwrap_or_else(std::env::temp_dir);
    let scratch_dir = create_scratch_dir(&scratch_parent)?;
    // One scoped guard owns the lock, any worker children, and the
    // scratch directory for the rest of this run; its `Drop` releases
    // all three unconditionally.
    let guard = RunGuard::new(lock, scratch_dir);

    let scan_start = Instant::now();
    let outcome = scan_all_roots(args, &guard, &mut namespace, &mut store)?;
    let scan_elapsed = scan_start.elapsed();

    log::info!(
        "scan complete: {} dirs visited, {} pruned hot, {} files indexed, {} I/O errors ({:.3}s)",
        outcome.dirs_visited,
        outcome.dirs_pruned_hot,
        outcome.files_indexed,
        outcome.io_errors,
        scan_elapsed.as_secs_f64(),
    );

    let write_start = Instant::now();
    store.save(args.output_file_mode)?;
    let write_elapsed = write_start.elapsed();

    namespace.save(args.output_file_mode, scan_elapsed, write_elapsed, Duration::ZERO)?;

    if let Some(protocol) = args.protocol {
        let extensions: HashSet<String> = args.extensions().into_iter().collect();
        let bytes = render(protocol, &store, &namespace.hot, &extensions);
        write_output(&args.output, args.output_file_mode, &bytes)?;
        log::info!("emitted {:?} to {}", protocol, args.output);
    }

    Ok(())
}

/// Dispatches to the single-root inline path or the multi-root worker
/// pool depending on how many roots were given.
fn scan_all_roots(
    args: &Args,
    guard: &RunGuard,
    namespace: &mut Namespace,
    store: &mut dyn ffindex_cache::KeyedStore,
) -> Result<DispatchOutcome> {
    if args.dirs.len() > 1 {
        run_multi_root(args, &args.dirs, namespace, store, guard)
    } else {
        match args.dirs.first() {
            Some(root) => run_single_root(root, namespace, store, default_threads()),
            None => Ok(DispatchOutcome::default()),
        }
    }
}
