//! ALFA Faces Vault - Record Codec
//!
//! Turns a plaintext database into the encrypted, serialization-ready
//! mapping and back. Key material layout per field:
//!
//! ```text
//! name.keys:  [KEY 16B][nonce: record 0][nonce: record 1]...
//! embed.keys: [KEY 16B][nonce: vector 0][nonce: vector 1]...
//! ```
//!
//! The two files are independent so neither field's position ledger depends
//! on the other's record counts. Nonce files grow strictly in encryption
//! order and decryption recomputes every position from its own traversal,
//! so the encrypted mapping must be walked exactly as it was produced.

use std::path::PathBuf;

use log::debug;

use crate::crypto::{FieldCipher, KeyStore, NonceCursor};
use crate::database::{
    bytes_to_codepoints, codepoints_to_bytes, pack_vector, unpack_vector, EncryptedDatabase,
    PlainDatabase, RecordVectors,
};
use crate::error::{VaultError, VaultResult};

/// Codec options. Every recognized knob is a named field; there is no
/// open-ended option bag.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Leave names as plaintext
    pub skip_names: bool,
    /// Leave embedding vectors as plaintext
    pub skip_embeddings: bool,
    /// Persist nonces so the output can be decrypted later. When false the
    /// ciphertext is write-only: nothing is appended to the key files.
    pub decryptable: bool,
    /// Key file for name encryption
    pub name_key_path: PathBuf,
    /// Key file for embedding encryption
    pub embed_key_path: PathBuf,
}

impl CodecConfig {
    /// Config with both fields encrypted and nonces persisted
    pub fn decryptable<P: Into<PathBuf>, Q: Into<PathBuf>>(
        name_key_path: P,
        embed_key_path: Q,
    ) -> Self {
        Self {
            skip_names: false,
            skip_embeddings: false,
            decryptable: true,
            name_key_path: name_key_path.into(),
            embed_key_path: embed_key_path.into(),
        }
    }
}

/// Encrypts and decrypts whole databases
pub struct RecordCodec {
    names: KeyStore,
    embeddings: KeyStore,
    skip_names: bool,
    skip_embeddings: bool,
    decryptable: bool,
}

impl RecordCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            names: KeyStore::new(config.name_key_path),
            embeddings: KeyStore::new(config.embed_key_path),
            skip_names: config.skip_names,
            skip_embeddings: config.skip_embeddings,
            decryptable: config.decryptable,
        }
    }

    /// Key store backing name encryption
    pub fn name_store(&self) -> &KeyStore {
        &self.names
    }

    /// Key store backing embedding encryption
    pub fn embedding_store(&self) -> &KeyStore {
        &self.embeddings
    }

    /// Encrypt a database.
    ///
    /// When the codec is decryptable this first resets BOTH key files: a
    /// new generation begins and ciphertext from the old generation becomes
    /// undecryptable through these paths.
    pub fn encrypt_data(&self, db: &PlainDatabase) -> VaultResult<EncryptedDatabase> {
        if self.decryptable {
            self.names.generate_key()?;
            self.embeddings.generate_key()?;
        }

        let dim = expected_dimension(db);
        let mut encrypted = EncryptedDatabase::new();

        for (name, vectors) in db.iter() {
            check_shape(name, vectors, dim)?;

            let stored_name = if self.skip_names {
                name.clone()
            } else {
                let cipher = FieldCipher::new(self.names.key()?);
                if self.decryptable {
                    self.names.append_nonce(cipher.nonce())?;
                }
                bytes_to_codepoints(&cipher.encrypt(name.as_bytes()))
            };

            let stored_vectors = if self.skip_embeddings {
                RecordVectors::Plain(vectors.clone())
            } else {
                let mut out = Vec::with_capacity(vectors.len());
                for vector in vectors {
                    // one cipher (and thus one nonce) per vector
                    let cipher = FieldCipher::new(self.embeddings.key()?);
                    if self.decryptable {
                        self.embeddings.append_nonce(cipher.nonce())?;
                    }
                    out.push(cipher.encrypt(&pack_vector(vector)));
                }
                RecordVectors::Cipher(out)
            };

            encrypted.insert(stored_name, stored_vectors);
        }

        debug!(
            "encrypted {} records, {} vectors (decryptable: {})",
            db.len(),
            db.vector_count(),
            self.decryptable
        );
        Ok(encrypted)
    }

    /// Decrypt a database.
    ///
    /// Walks the records in stored order and recomputes every nonce
    /// position from that walk. There is no tag to check: a stale key file
    /// or a reordered mapping yields garbage fields or a `Decode` error,
    /// never an authentication failure.
    pub fn decrypt_data(&self, db: &EncryptedDatabase) -> VaultResult<PlainDatabase> {
        let mut cursor = NonceCursor::new();
        let mut decrypted = PlainDatabase::new();

        for (stored_name, stored_vectors) in db.iter() {
            let name = if self.skip_names {
                stored_name.clone()
            } else {
                let nonce = self.names.nonce_at(cursor.name_position())?;
                let cipher = FieldCipher::with_nonce(self.names.key()?, nonce);
                let bytes = cipher.decrypt(&codepoints_to_bytes(stored_name)?);
                String::from_utf8(bytes)
                    .map_err(|_| VaultError::Decode("decrypted name is not valid UTF-8".into()))?
            };

            let vectors = if self.skip_embeddings {
                match stored_vectors {
                    RecordVectors::Plain(v) => v.clone(),
                    RecordVectors::Cipher(v) if v.is_empty() => Vec::new(),
                    RecordVectors::Cipher(_) => {
                        return Err(VaultError::Decode(
                            "expected plaintext embeddings, found ciphertext bytes".into(),
                        ))
                    }
                }
            } else {
                let cipher_vectors: &[Vec<u8>] = match stored_vectors {
                    RecordVectors::Cipher(v) => v.as_slice(),
                    RecordVectors::Plain(v) if v.is_empty() => &[],
                    RecordVectors::Plain(_) => {
                        return Err(VaultError::Decode(
                            "expected ciphertext bytes, found plaintext embeddings".into(),
                        ))
                    }
                };
                let mut out = Vec::with_capacity(cipher_vectors.len());
                for (idx, bytes) in cipher_vectors.iter().enumerate() {
                    let nonce = self.embeddings.nonce_at(cursor.embedding_position(idx))?;
                    let cipher = FieldCipher::with_nonce(self.embeddings.key()?, nonce);
                    out.push(unpack_vector(&cipher.decrypt(bytes))?);
                }
                out
            };

            cursor.advance(stored_vectors.len());
            decrypted.insert(name, vectors);
        }

        debug!("decrypted {} records", decrypted.len());
        Ok(decrypted)
    }
}

/// Dimension of the first vector in the database, if any. Every other
/// vector must match it.
fn expected_dimension(db: &PlainDatabase) -> Option<usize> {
    db.iter().flat_map(|(_, v)| v.iter()).map(Vec::len).next()
}

fn check_shape(name: &str, vectors: &[Vec<f64>], dim: Option<usize>) -> VaultResult<()> {
    let Some(dim) = dim else { return Ok(()) };
    for vector in vectors {
        if vector.len() != dim {
            return Err(VaultError::Shape {
                name: name.to_string(),
                expected: dim,
                actual: vector.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn sample_db() -> PlainDatabase {
        let mut db = PlainDatabase::new();
        db.insert("alice", vec![vec![1.0, 2.0]]);
        db.insert("bob", vec![vec![3.0, 4.0], vec![5.0, 6.0]]);
        db
    }

    fn config(dir: &Path) -> CodecConfig {
        CodecConfig::decryptable(dir.join("name.keys"), dir.join("embed.keys"))
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let codec = RecordCodec::new(config(dir.path()));

        let db = sample_db();
        let encrypted = codec.encrypt_data(&db).unwrap();
        assert_eq!(codec.decrypt_data(&encrypted).unwrap(), db);
    }

    #[test]
    fn test_nonce_monotonicity() {
        let dir = tempdir().unwrap();
        let codec = RecordCodec::new(config(dir.path()));

        codec.encrypt_data(&sample_db()).unwrap();

        // 2 names, 3 embedding vectors total
        assert_eq!(codec.name_store().nonce_count().unwrap(), 2);
        assert_eq!(codec.embedding_store().nonce_count().unwrap(), 3);
    }

    #[test]
    fn test_ciphertext_hides_fields() {
        let dir = tempdir().unwrap();
        let codec = RecordCodec::new(config(dir.path()));

        let encrypted = codec.encrypt_data(&sample_db()).unwrap();
        for (stored_name, stored_vectors) in encrypted.iter() {
            assert_ne!(stored_name, "alice");
            assert_ne!(stored_name, "bob");
            assert!(matches!(stored_vectors, RecordVectors::Cipher(_)));
        }
    }

    #[test]
    fn test_skip_names_passes_names_through() {
        let dir = tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.skip_names = true;
        let codec = RecordCodec::new(cfg);

        let db = sample_db();
        let encrypted = codec.encrypt_data(&db).unwrap();
        let names: Vec<&str> = encrypted.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);
        assert_eq!(codec.name_store().nonce_count().unwrap(), 0);

        assert_eq!(codec.decrypt_data(&encrypted).unwrap(), db);
    }

    #[test]
    fn test_skip_embeddings_passes_vectors_through() {
        let dir = tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.skip_embeddings = true;
        let codec = RecordCodec::new(cfg);

        let db = sample_db();
        let encrypted = codec.encrypt_data(&db).unwrap();
        for (_, stored_vectors) in encrypted.iter() {
            assert!(matches!(stored_vectors, RecordVectors::Plain(_)));
        }
        assert_eq!(codec.embedding_store().nonce_count().unwrap(), 0);

        assert_eq!(codec.decrypt_data(&encrypted).unwrap(), db);
    }

    #[test]
    fn test_write_only_appends_no_nonces() {
        let dir = tempdir().unwrap();

        // key files must already exist for write-only encryption
        let mut cfg = config(dir.path());
        RecordCodec::new(cfg.clone()).encrypt_data(&PlainDatabase::new()).unwrap();

        cfg.decryptable = false;
        let codec = RecordCodec::new(cfg);
        let encrypted = codec.encrypt_data(&sample_db()).unwrap();

        assert_eq!(codec.name_store().nonce_count().unwrap(), 0);
        assert_eq!(codec.embedding_store().nonce_count().unwrap(), 0);

        // nothing to look the nonces up in: position 0 is already past the end
        let err = codec.decrypt_data(&encrypted).unwrap_err();
        assert!(matches!(err, VaultError::KeyFile(_)));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let codec = RecordCodec::new(config(dir.path()));

        let mut db = PlainDatabase::new();
        db.insert("alice", vec![vec![1.0, 2.0]]);
        db.insert("bob", vec![vec![3.0, 4.0, 5.0]]);

        let err = codec.encrypt_data(&db).unwrap_err();
        assert!(matches!(err, VaultError::Shape { .. }));
    }

    #[test]
    fn test_missing_key_files_reported() {
        let dir = tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.decryptable = false; // skip key generation, nothing on disk
        let codec = RecordCodec::new(cfg);

        let err = codec.encrypt_data(&sample_db()).unwrap_err();
        assert!(matches!(err, VaultError::KeyFile(_)));
    }

    #[test]
    fn test_off_by_one_nonce_goes_undetected() {
        let dir = tempdir().unwrap();
        let codec = RecordCodec::new(config(dir.path()));
        let encrypted = codec.encrypt_data(&sample_db()).unwrap();

        // decrypt alice's vector (position 0) with bob's first nonce
        // (position 1): no authentication error is possible, the bytes
        // still unpack, the floats are nonsense
        let (_, stored_vectors) = encrypted.iter().next().unwrap();
        let RecordVectors::Cipher(vectors) = stored_vectors else {
            panic!("embeddings were not encrypted");
        };

        let store = codec.embedding_store();
        let wrong = FieldCipher::with_nonce(store.key().unwrap(), store.nonce_at(1).unwrap());
        let garbled = unpack_vector(&wrong.decrypt(&vectors[0])).unwrap();
        assert_ne!(garbled, vec![1.0, 2.0]);
    }

    #[test]
    fn test_reordered_records_corrupt_silently() {
        let dir = tempdir().unwrap();
        let codec = RecordCodec::new(config(dir.path()));
        let db = sample_db();
        let encrypted = codec.encrypt_data(&db).unwrap();

        // rebuild the mapping with the records swapped
        let mut reordered = EncryptedDatabase::new();
        let records: Vec<_> = encrypted.iter().cloned().collect();
        for (name, vectors) in records.into_iter().rev() {
            reordered.insert(name, vectors);
        }

        // never an authentication error: either the garbage fails to
        // decode, or it "succeeds" with the wrong contents
        match codec.decrypt_data(&reordered) {
            Ok(wrong) => assert_ne!(wrong, db),
            Err(VaultError::Decode(_)) => {}
            Err(VaultError::KeyFile(_)) => {}
            Err(e) => panic!("unexpected error class: {e}"),
        }
    }

    #[test]
    fn test_empty_database() {
        let dir = tempdir().unwrap();
        let codec = RecordCodec::new(config(dir.path()));

        let db = PlainDatabase::new();
        let encrypted = codec.encrypt_data(&db).unwrap();
        assert!(encrypted.is_empty());
        assert_eq!(codec.decrypt_data(&encrypted).unwrap(), db);
    }

    #[test]
    fn test_unicode_names_round_trip() {
        let dir = tempdir().unwrap();
        let codec = RecordCodec::new(config(dir.path()));

        let mut db = PlainDatabase::new();
        db.insert("Żaneta Kowalska", vec![vec![0.5, -0.5]]);
        db.insert("李小龙", vec![vec![1.5, 2.5]]);

        let encrypted = codec.encrypt_data(&db).unwrap();
        assert_eq!(codec.decrypt_data(&encrypted).unwrap(), db);
    }

    #[test]
    fn test_new_generation_orphans_old_ciphertext() {
        let dir = tempdir().unwrap();
        let db = sample_db();

        let encrypted = RecordCodec::new(config(dir.path())).encrypt_data(&db).unwrap();

        // re-encrypting resets both key files; the earlier mapping now
        // points at nonces of a dead generation
        let codec = RecordCodec::new(config(dir.path()));
        codec.encrypt_data(&db).unwrap();

        match codec.decrypt_data(&encrypted) {
            Ok(wrong) => assert_ne!(wrong, db),
            Err(e) => assert!(e.is_corruption(), "unexpected error class: {e}"),
        }
    }
}
