//! ALFA Faces Vault - Field Cipher
//!
//! AES-128-EAX over single fields (one name, one embedding vector). The
//! authentication tag is computed and thrown away on encrypt and never
//! checked on decrypt: a wrong key or nonce yields wrong bytes, not an
//! error. Integrity of the stored mapping is outside this cipher's
//! contract.

use aes::Aes128;
use eax::aead::generic_array::GenericArray;
use eax::online::{Decrypt, Eax, Encrypt};
use rand::RngCore;
use zeroize::Zeroizing;

use super::keystore::{KEY_LEN, NONCE_LEN};

/// One-shot cipher bound to a key and a nonce
pub struct FieldCipher {
    key: Zeroizing<[u8; KEY_LEN]>,
    nonce: [u8; NONCE_LEN],
}

impl FieldCipher {
    /// New cipher with a fresh random nonce.
    ///
    /// The nonce is the only entropy besides the key: append it to the key
    /// file (in encryption order) or the ciphertext stays write-only.
    pub fn new(key: Zeroizing<[u8; KEY_LEN]>) -> Self {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        Self { key, nonce }
    }

    /// Reconstruct the cipher that produced an earlier ciphertext
    pub fn with_nonce(key: Zeroizing<[u8; KEY_LEN]>, nonce: [u8; NONCE_LEN]) -> Self {
        Self { key, nonce }
    }

    /// The nonce this cipher encrypts under
    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Encrypt a field. The EAX tag is discarded, so ciphertext length
    /// equals plaintext length.
    pub fn encrypt(&self, data: &[u8]) -> Vec<u8> {
        let key = GenericArray::from_slice(&self.key[..]);
        let nonce = GenericArray::from_slice(&self.nonce);
        let mut stream = Eax::<Aes128, Encrypt>::with_key_and_nonce(key, nonce);

        let mut buf = data.to_vec();
        stream.encrypt(&mut buf);
        let _tag = stream.finish();
        buf
    }

    /// Decrypt a field without tag verification. Never fails: mismatched
    /// key material produces plausible-looking garbage instead.
    pub fn decrypt(&self, data: &[u8]) -> Vec<u8> {
        let key = GenericArray::from_slice(&self.key[..]);
        let nonce = GenericArray::from_slice(&self.nonce);
        let mut stream = Eax::<Aes128, Decrypt>::with_key_and_nonce(key, nonce);

        let mut buf = data.to_vec();
        stream.decrypt_unauthenticated_hazmat(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> Zeroizing<[u8; KEY_LEN]> {
        Zeroizing::new([byte; KEY_LEN])
    }

    #[test]
    fn test_roundtrip() {
        let cipher = FieldCipher::new(key(0x42));
        let plaintext = b"person name";

        let ciphertext = cipher.encrypt(plaintext);
        assert_eq!(ciphertext.len(), plaintext.len());
        assert_ne!(ciphertext.as_slice(), plaintext.as_slice());

        let restored = FieldCipher::with_nonce(key(0x42), *cipher.nonce());
        assert_eq!(restored.decrypt(&ciphertext), plaintext);
    }

    #[test]
    fn test_fresh_nonce_per_cipher() {
        let a = FieldCipher::new(key(0x42));
        let b = FieldCipher::new(key(0x42));
        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.encrypt(b"same input"), b.encrypt(b"same input"));
    }

    #[test]
    fn test_wrong_nonce_goes_unnoticed() {
        let cipher = FieldCipher::new(key(0x42));
        let ciphertext = cipher.encrypt(b"embedding bytes!");

        let mut wrong_nonce = *cipher.nonce();
        wrong_nonce[0] ^= 0xFF;
        let wrong = FieldCipher::with_nonce(key(0x42), wrong_nonce);

        // no error, no panic - just the wrong plaintext
        let garbage = wrong.decrypt(&ciphertext);
        assert_eq!(garbage.len(), 16);
        assert_ne!(garbage.as_slice(), b"embedding bytes!".as_slice());
    }

    #[test]
    fn test_empty_plaintext() {
        let cipher = FieldCipher::new(key(0x01));
        let ciphertext = cipher.encrypt(b"");
        assert!(ciphertext.is_empty());

        let restored = FieldCipher::with_nonce(key(0x01), *cipher.nonce());
        assert!(restored.decrypt(&ciphertext).is_empty());
    }
}
