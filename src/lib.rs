//! # ALFA Faces Vault
//!
//! Encrypted face-embedding database with a positional nonce ledger.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     ALFA FACES VAULT                     │
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────────┐   │
//! │  │  KEY STORE  │  │ FIELD CIPHER │  │  NONCE LEDGER  │   │
//! │  │ key+nonces  │  │ AES-128-EAX  │  │  pure offsets  │   │
//! │  └──────┬──────┘  └──────┬───────┘  └───────┬────────┘   │
//! │         │                │                  │            │
//! │  ┌──────┴────────────────┴──────────────────┴─────────┐  │
//! │  │                    RECORD CODEC                    │  │
//! │  │    names -> code points / vectors -> byte lists    │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │                                                          │
//! │  ┌─────────────┐  ┌──────────────┐                       │
//! │  │  DATABASE   │  │  JSON STORE  │                       │
//! │  │  (ordered)  │  │ atomic write │                       │
//! │  └─────────────┘  └──────────────┘                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Model
//!
//! - Person names and embedding vectors never touch disk in plaintext
//! - One key file per field: a 16-byte AES key plus append-only 16-byte
//!   nonces, in encryption order
//! - Nonce positions are recomputed from record order, never stored
//! - EAX tags are discarded: decrypting with stale key material yields
//!   garbage rather than an error, so key-file lifecycle is the caller's
//!   contract
//! - One writer per key file; interleaved appends corrupt the ledger

pub mod codec;
pub mod crypto;
pub mod database;
pub mod error;
pub mod storage;

pub use codec::{CodecConfig, RecordCodec};
pub use crypto::{FieldCipher, KeyStore, NonceCursor, KEY_LEN, NONCE_LEN};
pub use database::{EncryptedDatabase, PlainDatabase, RecordVectors};
pub use error::{VaultError, VaultResult};

/// ALFA Faces Vault version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ALFA Faces Vault signature
pub const SIGNATURE: &str = "ALFA_FACES_VAULT_v1";
