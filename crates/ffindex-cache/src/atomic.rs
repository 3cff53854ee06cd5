use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

/// Write `bytes` to `dest` atomically: write to a fresh temp file in the
/// same directory, flush, chmod to `mode` on Unix, then rename over the
/// destination. The rename is atomic within one filesystem, so a reader
/// opening `dest` concurrently always sees either the prior contents or
/// the new ones, never a partial write.
///
/// The temp name mixes the PID and a nanosecond timestamp so concurrent
/// callers (a master and a stray leftover process, say) never collide.
pub fn publish(dest: &Path, bytes: &[u8], mode: u32) -> Result<()> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tmp".to_string());
    let temp_path = dir.join(format!(".{file_name}.{}.{nanos}.tmp", std::process::id()));

    let write_result = (|| -> Result<()> {
        let mut file = File::create(&temp_path)
            .with_context(|| format!("creating temp file {}", temp_path.display()))?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()?;
        set_mode(&temp_path, mode)?;
        Ok(())
    })();

    if let Err(e) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, dest).with_context(|| {
        let _ = fs::remove_file(&temp_path);
        format!("publishing {}", dest.display())
    })?;

    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("chmod {} to {:o}", path.display(), mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn publish_creates_destination_with_contents() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("namespace.dat");

        publish(&dest, b"hello", 0o644).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"hello");
    }

    #[test]
    fn publish_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("namespace.dat");

        publish(&dest, b"v1", 0o644).unwrap();
        publish(&dest, b"v2", 0o644).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(fs::read(&dest).unwrap(), b"v2");
    }

    #[test]
    fn publish_overwrites_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.txt");
        fs::write(&dest, b"old").unwrap();

        publish(&dest, b"new", 0o644).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }
}
