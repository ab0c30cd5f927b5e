// File: src/persistence.rs
use crate::error::{Result, SpellerError};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `bytes` to `path` through a temporary file in the same directory,
/// creating missing parent directories. Readers never see a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir).map_err(|e| SpellerError::io(parent_dir, e))?;

    let temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| SpellerError::io(parent_dir, e))?;
    {
        let mut writer = BufWriter::new(&temp_file);
        writer.write_all(bytes).map_err(|e| SpellerError::io(path, e))?;
        writer.flush().map_err(|e| SpellerError::io(path, e))?;
    }
    temp_file.as_file().sync_all().map_err(|e| SpellerError::io(path, e))?;

    temp_file
        .persist(path)
        .map_err(|e| SpellerError::io(path, e.error))?;
    Ok(())
}
