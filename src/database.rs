//! ALFA Faces Vault - Database Model
//!
//! Ordered record lists for both database forms. Iteration order doubles as
//! the nonce ledger, so neither type is a hash map: records keep exactly
//! the order they were inserted, and the serde impls preserve that order
//! through JSON in both directions.
//!
//! Encrypted names travel as strings of code points 0-255, one character
//! per ciphertext byte; encrypted vectors travel as lists of raw byte
//! values. Both survive any JSON-like document format.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{VaultError, VaultResult};

/// Width of one packed embedding component (f64)
pub const EMBED_WIDTH: usize = 8;

/// Plaintext database: ordered `name -> embedding vectors`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlainDatabase {
    records: Vec<(String, Vec<Vec<f64>>)>,
}

impl PlainDatabase {
    /// Empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. An existing name is updated in place and keeps its
    /// original position; the position is what the nonce ledger indexes.
    pub fn insert(&mut self, name: impl Into<String>, vectors: Vec<Vec<f64>>) {
        let name = name.into();
        if let Some(slot) = self.records.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = vectors;
        } else {
            self.records.push((name, vectors));
        }
    }

    /// Vectors registered under `name`
    pub fn get(&self, name: &str) -> Option<&Vec<Vec<f64>>> {
        self.records.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &(String, Vec<Vec<f64>>)> {
        self.records.iter()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of embedding vectors across all records
    pub fn vector_count(&self) -> usize {
        self.records.iter().map(|(_, v)| v.len()).sum()
    }
}

/// One record's vectors in the encrypted mapping: ciphertext bytes when the
/// embedding field was encrypted, untouched floats when it was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordVectors {
    /// Raw ciphertext bytes, one list per original vector
    Cipher(Vec<Vec<u8>>),
    /// Pass-through plaintext vectors
    Plain(Vec<Vec<f64>>),
}

impl RecordVectors {
    /// Vector count, independent of form
    pub fn len(&self) -> usize {
        match self {
            RecordVectors::Cipher(v) => v.len(),
            RecordVectors::Plain(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Encrypted database: ordered `stored name -> vectors`, in exactly the
/// order encryption produced them. Reordering breaks the nonce ledger
/// without any detectable error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncryptedDatabase {
    records: Vec<(String, RecordVectors)>,
}

impl EncryptedDatabase {
    /// Empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, preserving the position of an existing key
    pub fn insert(&mut self, name: impl Into<String>, vectors: RecordVectors) {
        let name = name.into();
        if let Some(slot) = self.records.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = vectors;
        } else {
            self.records.push((name, vectors));
        }
    }

    /// Records in stored order
    pub fn iter(&self) -> impl Iterator<Item = &(String, RecordVectors)> {
        self.records.iter()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Field encodings
// ---------------------------------------------------------------------------

/// Encrypted name bytes -> string of code points 0-255
pub fn bytes_to_codepoints(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Inverse of [`bytes_to_codepoints`]
pub fn codepoints_to_bytes(s: &str) -> VaultResult<Vec<u8>> {
    s.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| {
                VaultError::Decode(format!(
                    "code point U+{:04X} does not fit in a ciphertext byte",
                    u32::from(c)
                ))
            })
        })
        .collect()
}

/// Pack one embedding vector as little-endian f64 fields
pub fn pack_vector(vector: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * EMBED_WIDTH);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Unpack a run of little-endian f64 fields
pub fn unpack_vector(bytes: &[u8]) -> VaultResult<Vec<f64>> {
    if bytes.len() % EMBED_WIDTH != 0 {
        return Err(VaultError::Decode(format!(
            "embedding byte length {} is not a multiple of {}",
            bytes.len(),
            EMBED_WIDTH
        )));
    }
    Ok(bytes
        .chunks_exact(EMBED_WIDTH)
        .map(|chunk| f64::from_le_bytes(chunk.try_into().expect("chunk width is EMBED_WIDTH")))
        .collect())
}

// ---------------------------------------------------------------------------
// Serde (ordered maps)
// ---------------------------------------------------------------------------

impl Serialize for PlainDatabase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for (name, vectors) in &self.records {
            map.serialize_entry(name, vectors)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PlainDatabase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PlainVisitor;

        impl<'de> Visitor<'de> for PlainVisitor {
            type Value = PlainDatabase;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of name to embedding vectors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut db = PlainDatabase::new();
                while let Some((name, vectors)) = access.next_entry::<String, Vec<Vec<f64>>>()? {
                    db.insert(name, vectors);
                }
                Ok(db)
            }
        }

        deserializer.deserialize_map(PlainVisitor)
    }
}

impl Serialize for EncryptedDatabase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for (name, vectors) in &self.records {
            map.serialize_entry(name, vectors)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EncryptedDatabase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EncryptedVisitor;

        impl<'de> Visitor<'de> for EncryptedVisitor {
            type Value = EncryptedDatabase;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of stored name to ciphertext or plaintext vectors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut db = EncryptedDatabase::new();
                while let Some((name, vectors)) = access.next_entry::<String, RecordVectors>()? {
                    db.insert(name, vectors);
                }
                Ok(db)
            }
        }

        deserializer.deserialize_map(EncryptedVisitor)
    }
}
