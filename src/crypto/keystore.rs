//! ALFA Faces Vault - Key File Store
//!
//! One binary file per store: a 16-byte AES key followed by an append-only
//! run of 16-byte nonces in encryption order. No headers, no length fields,
//! no checksums.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{VaultError, VaultResult};

/// AES-128 key length
pub const KEY_LEN: usize = 16;

/// EAX nonce length
pub const NONCE_LEN: usize = 16;

/// Owns one key file: `key (16B) || nonce_0 (16B) || nonce_1 (16B) || ...`
///
/// Nonce position equals append order and the file only ever grows within a
/// generation. Concurrent appenders against the same path can interleave
/// writes and corrupt the position ledger; callers keep a single writer per
/// path. Reads are safe to run in parallel.
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    /// Create a store for the given key file path (no I/O happens here)
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Key file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self) -> VaultError {
        VaultError::KeyFile(self.path.display().to_string())
    }

    /// Truncate the file and write a fresh random key.
    ///
    /// Starts a new generation: every nonce appended before this call is
    /// discarded, and ciphertext from the old generation becomes
    /// unrecoverable through this store.
    pub fn generate_key(&self) -> VaultResult<()> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        rand::thread_rng().fill_bytes(&mut key[..]);

        let mut file = File::create(&self.path).map_err(|_| self.unavailable())?;
        file.write_all(&key[..]).map_err(|_| self.unavailable())?;
        Ok(())
    }

    /// Read the key (first 16 bytes of the file)
    pub fn key(&self) -> VaultResult<Zeroizing<[u8; KEY_LEN]>> {
        let mut file = File::open(&self.path).map_err(|_| self.unavailable())?;
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        file.read_exact(&mut key[..]).map_err(|_| self.unavailable())?;
        Ok(key)
    }

    /// Append one nonce after the existing content
    pub fn append_nonce(&self, nonce: &[u8; NONCE_LEN]) -> VaultResult<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|_| self.unavailable())?;
        file.write_all(nonce).map_err(|_| self.unavailable())?;
        Ok(())
    }

    /// Read the nonce at the given position (0-based, append order).
    ///
    /// A position past the end of the file means either too few encryptions
    /// happened or the caller mis-computed the ledger; both surface as the
    /// same `KeyFile` error.
    pub fn nonce_at(&self, position: usize) -> VaultResult<[u8; NONCE_LEN]> {
        let mut file = File::open(&self.path).map_err(|_| self.unavailable())?;
        let offset = (KEY_LEN + position * NONCE_LEN) as u64;
        file.seek(SeekFrom::Start(offset))
            .map_err(|_| self.unavailable())?;
        let mut nonce = [0u8; NONCE_LEN];
        file.read_exact(&mut nonce).map_err(|_| self.unavailable())?;
        Ok(nonce)
    }

    /// Number of whole nonces currently in the file
    pub fn nonce_count(&self) -> VaultResult<usize> {
        let len = std::fs::metadata(&self.path)
            .map_err(|_| self.unavailable())?
            .len() as usize;
        if len < KEY_LEN {
            return Err(self.unavailable());
        }
        Ok((len - KEY_LEN) / NONCE_LEN)
    }
}
