use std::io::Write;
use std::path::Path;

use locflow_core::Result;

/// Write `bytes` to `path` via a temp file in the same directory plus a
/// rename, so a crash mid-write never corrupts an existing file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.persist(path)
        .map_err(|e| std::io::Error::from(e.error))?;
    Ok(())
}

/// Copy an existing file to `<name>.<ext>.bak` before it gets overwritten.
pub fn backup_file(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!("{e}.bak"))
        .unwrap_or_else(|| "bak".to_string());
    std::fs::copy(path, path.with_extension(ext))?;
    Ok(())
}
