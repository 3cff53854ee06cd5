use std::path::Path;
use std::process::Command;

use ffindex_core::cli::Args;

/// Build the invocation for one worker: the same `ffindex` binary,
/// re-invoked against a single root with `-i/--ipc-file` set. Output
/// and protocol flags are meaningless to a worker and are not passed.
pub fn build_worker_command(exe: &Path, args: &Args, root: &Path, ipc_path: &Path) -> Command {
    let mut command = Command::new(exe);
    command.arg(&args.namespace).arg(root);
    command.arg("-i").arg(ipc_path);

    for ext in args.extensions() {
        command.arg("-e").arg(ext);
    }

    for _ in 0..args.verbose {
        command.arg("-v");
    }

    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_args() -> Args {
        Args {
            namespace: "ns".into(),
            dirs: vec![PathBuf::from("/data/h1"), PathBuf::from("/data/l1")],
            extension: vec!["gwf".into()],
            output: "-".into(),
            output_file_mode: 0o644,
            ipc_file: None,
            protocol: None,
            concurrency: 5,
            tempdir: None,
            status: false,
            verbose: 2,
            reject_overlapping_roots: false,
        }
    }

    #[test]
    fn worker_command_carries_namespace_root_and_ipc_file() {
        let args = sample_args();
        let command = build_worker_command(
            Path::new("/usr/bin/ffindex"),
            &args,
            Path::new("/data/h1"),
            Path::new("/tmp/scratch/worker-0.ipc"),
        );

        let argv: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            argv,
            vec![
                "ns",
                "/data/h1",
                "-i",
                "/tmp/scratch/worker-0.ipc",
                "-e",
                "gwf",
                "-v",
                "-v",
            ]
        );
    }
}
