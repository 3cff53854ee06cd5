use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use ffindex_cache::atomic;

/// Write rendered output to stdout (`-`) or atomically publish it to a
/// named file via the cache store's temp-file-and-rename protocol.
pub fn write_output(output: &str, mode: u32, bytes: &[u8]) -> Result<()> {
    if output == "-" {
        std::io::stdout()
            .write_all(bytes)
            .context("writing output to stdout")
    } else {
        atomic::publish(Path::new(output), bytes, mode)
    }
}
