use std::io;
use std::path::Path;

/// Writes `content` to `path` unless the file already holds exactly those
/// bytes, keeping mtimes stable for downstream builds. Returns whether the
/// file was touched.
pub fn write_file_if_changed(path: &Path, content: &str) -> io::Result<bool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Ok(existing) = std::fs::read(path) {
        if existing == content.as_bytes() {
            return Ok(false);
        }
    }
    std::fs::write(path, content)?;
    Ok(true)
}
