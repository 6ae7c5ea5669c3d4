//! ALFA Faces Vault - Database Persistence
//!
//! JSON load/save for both database forms. Writes go through a temp file
//! and a rename so a crash never leaves a half-written database behind.
//! Record order in the document is the same order the codec walks, so the
//! files round-trip the nonce ledger intact.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use log::debug;

use crate::database::{EncryptedDatabase, PlainDatabase};
use crate::error::VaultResult;

/// Load a plaintext database from a JSON document
pub fn load_plain<P: AsRef<Path>>(path: P) -> VaultResult<PlainDatabase> {
    let data = fs::read(path.as_ref())?;
    Ok(serde_json::from_slice(&data)?)
}

/// Load an encrypted database, preserving stored record order
pub fn load_encrypted<P: AsRef<Path>>(path: P) -> VaultResult<EncryptedDatabase> {
    let data = fs::read(path.as_ref())?;
    Ok(serde_json::from_slice(&data)?)
}

/// Save a plaintext database as JSON
pub fn save_plain<P: AsRef<Path>>(path: P, db: &PlainDatabase) -> VaultResult<()> {
    write_atomic(path.as_ref(), &serde_json::to_vec_pretty(db)?)
}

/// Save an encrypted database as JSON, record order intact
pub fn save_encrypted<P: AsRef<Path>>(path: P, db: &EncryptedDatabase) -> VaultResult<()> {
    write_atomic(path.as_ref(), &serde_json::to_vec_pretty(db)?)
}

/// Write to a temp file first, then rename into place
fn write_atomic(path: &Path, data: &[u8]) -> VaultResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;
    debug!("wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}
