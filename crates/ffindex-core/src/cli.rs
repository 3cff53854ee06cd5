use std::path::PathBuf;

use clap::Parser;

use crate::error::{FfindexError, FfindexResult};

/// The three wire formats the emitter knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Ldas,
    Pmdc,
    Dcfs,
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ldas" => Ok(Protocol::Ldas),
            "pmdc" => Ok(Protocol::Pmdc),
            "dcfs" => Ok(Protocol::Dcfs),
            other => Err(format!("unknown protocol: {other} (expected ldas, pmdc, or dcfs)")),
        }
    }
}

fn parse_mode(s: &str) -> Result<u32, String> {
    let trimmed = s.trim_start_matches("0o");
    u32::from_str_radix(trimmed, 8).map_err(|e| format!("invalid octal mode {s:?}: {e}"))
}

/// An incremental, parallel index builder for frame-file trees.
///
/// Given a namespace and a set of root directories, discovers frame files,
/// coalesces their GPS coverage into contiguous intervals per directory,
/// and persists the result so later runs can skip unchanged directories.
#[derive(Parser, Debug, Clone)]
#[command(name = "ffindex")]
#[command(about = "Incremental, parallel index builder for frame-file trees")]
pub struct Args {
    /// Base path under which the namespace's cache files live.
    pub namespace: String,

    /// Root directories to scan. Workers (`-i`) take exactly one.
    pub dirs: Vec<PathBuf>,

    /// Accept files with this extension (no dot). Repeatable; defaults to `gwf`.
    #[arg(short = 'e', long = "extension")]
    pub extension: Vec<String>,

    /// Where the emitted protocol output goes; `-` for stdout.
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub output: String,

    /// Mode applied to atomically-published files, as an octal int.
    #[arg(short = 'm', long = "output-file-mode", default_value = "0644", value_parser = parse_mode)]
    pub output_file_mode: u32,

    /// Worker mode: write the IPC payload here instead of mutating the
    /// persistent cache. Requires exactly one DIR.
    #[arg(short = 'i', long = "ipc-file")]
    pub ipc_file: Option<PathBuf>,

    /// Emit in this protocol after updating the cache. If omitted, no
    /// emission happens (the cache is still updated).
    #[arg(short = 'p', long = "protocol")]
    pub protocol: Option<Protocol>,

    /// Maximum number of live worker processes.
    #[arg(short = 'r', long = "concurrency", default_value_t = 5)]
    pub concurrency: usize,

    /// Parent directory for the master's scratch directory.
    #[arg(short = 't', long = "tempdir")]
    pub tempdir: Option<PathBuf>,

    /// Print the namespace header and exit.
    #[arg(short = 's', long = "status")]
    pub status: bool,

    /// Raise log verbosity. Repeat for more detail.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Fail CLI validation if two supplied roots are nested, instead of
    /// accepting the documented last-writer-wins behavior.
    #[arg(long = "reject-overlapping-roots")]
    pub reject_overlapping_roots: bool,
}

impl Args {
    /// The extensions this run accepts, with the `gwf` default applied
    /// when none were given on the command line.
    pub fn extensions(&self) -> Vec<String> {
        if self.extension.is_empty() {
            vec!["gwf".to_string()]
        } else {
            self.extension.clone()
        }
    }

    /// True when this invocation is a worker (writes an IPC payload
    /// instead of touching the persistent cache).
    pub fn is_worker(&self) -> bool {
        self.ipc_file.is_some()
    }

    /// Validate cross-field constraints clap's derive can't express:
    /// worker mode takes exactly one directory, and (optionally) roots
    /// must be pairwise non-nested.
    pub fn validate(&self) -> FfindexResult<()> {
        if self.ipc_file.is_some() && self.dirs.len() != 1 {
            return Err(FfindexError::BadUsage(format!(
                "-i/--ipc-file requires exactly one DIR, got {}",
                self.dirs.len()
            )));
        }

        if self.reject_overlapping_roots {
            for (i, a) in self.dirs.iter().enumerate() {
                for b in self.dirs.iter().skip(i + 1) {
                    if a.starts_with(b) || b.starts_with(a) {
                        return Err(FfindexError::BadUsage(format!(
                            "overlapping roots: {} and {}",
                            a.display(),
                            b.display()
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_extension_to_gwf() {
        let args = Args {
            namespace: "ns".into(),
            dirs: vec![],
            extension: vec![],
            output: "-".into(),
            output_file_mode: 0o644,
            ipc_file: None,
            protocol: None,
            concurrency: 5,
            tempdir: None,
            status: false,
            verbose: 0,
            reject_overlapping_roots: false,
        };
        assert_eq!(args.extensions(), vec!["gwf".to_string()]);
    }

    #[test]
    fn worker_mode_requires_exactly_one_dir() {
        let mut args = Args {
            namespace: "ns".into(),
            dirs: vec![PathBuf::from("/a"), PathBuf::from("/b")],
            extension: vec![],
            output: "-".into(),
            output_file_mode: 0o644,
            ipc_file: Some(PathBuf::from("/tmp/ipc")),
            protocol: None,
            concurrency: 5,
            tempdir: None,
            status: false,
            verbose: 0,
            reject_overlapping_roots: false,
        };
        assert!(args.validate().is_err());
        args.dirs = vec![PathBuf::from("/a")];
        assert!(args.validate().is_ok());
    }

    #[test]
    fn parse_mode_accepts_octal_literal() {
        assert_eq!(parse_mode("0644").unwrap(), 0o644);
        assert_eq!(parse_mode("0o755").unwrap(), 0o755);
    }

    #[test]
    fn rejects_overlapping_roots_when_flag_set() {
        let args = Args {
            namespace: "ns".into(),
            dirs: vec![PathBuf::from("/a"), PathBuf::from("/a/b")],
            extension: vec![],
            output: "-".into(),
            output_file_mode: 0o644,
            ipc_file: None,
            protocol: None,
            concurrency: 5,
            tempdir: None,
            status: false,
            verbose: 0,
            reject_overlapping_roots: true,
        };
        assert!(args.validate().is_err());
    }
}
