// BirthWindow - platform/fs.rs
//
// Filesystem helpers for output files.

use std::io;
use std::path::Path;

/// Write `contents` to `path` atomically (write temp, rename to final).
///
/// Parent directories are created as needed. A failure between write and
/// rename leaves any previous file at `path` intact; the temp file is removed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, contents)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }

    tracing::debug!(path = %path.display(), bytes = contents.len(), "File written");
    Ok(())
}
