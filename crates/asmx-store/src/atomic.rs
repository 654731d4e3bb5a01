//! Atomic write primitives
//!
//! Uses temp→rename so a reader never sees a partially written document

use crate::errors::{io_error, Result};
use std::fs;
use std::path::Path;

/// Atomically write bytes to a file
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_save_dir", e))?;
    }

    // Same directory as the target so the rename stays on one filesystem
    let temp_path = target_path.with_extension("asmx.tmp");
    fs::write(&temp_path, content).map_err(|e| io_error("write_save_temp", e))?;
    if let Err(err) = fs::rename(&temp_path, target_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error("rename_save_temp", err));
    }

    Ok(())
}
