//! ALFA Faces Vault - Cryptographic Core
//!
//! Key files, the per-field EAX cipher, and the nonce position arithmetic.

pub mod cipher;
pub mod keystore;
pub mod nonce_index;

pub use cipher::*;
pub use keystore::*;
pub use nonce_index::*;
