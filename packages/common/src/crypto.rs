//! AES-256-GCM encryption for stored blobs.
//!
//! Every call to [`Cipher::encrypt`] draws a fresh random 96-bit IV, and the
//! same IV must be passed back to [`Cipher::decrypt`]. The GCM tag is
//! appended to the ciphertext, so any modification of the stored bytes (or a
//! mismatched IV) fails decryption instead of yielding altered plaintext.

use std::fmt;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::Rng;
use thiserror::Error;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// GCM nonce length in bytes.
pub const IV_LEN: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("invalid IV length: expected {expected} bytes, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },

    #[error("ciphertext too short: {0} bytes")]
    Truncated(usize),

    #[error("encryption failed")]
    Encrypt,

    #[error("ciphertext failed authentication")]
    Decrypt,
}

/// Ciphertext together with the IV it was sealed under.
#[derive(Clone)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
}

/// Symmetric cipher over byte buffers, holding the process-wide key.
///
/// The key is only accepted at construction and is never exposed again.
#[derive(Clone)]
pub struct Cipher {
    aead: Aes256Gcm,
}

impl Cipher {
    /// Build a cipher from raw key bytes.
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_LEN {
            return Err(CipherError::InvalidKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        if key.iter().all(|&b| b == 0) {
            return Err(CipherError::InvalidKey("key is all zeros".into()));
        }

        let aead = Aes256Gcm::new_from_slice(key)
            .map_err(|_| CipherError::InvalidKey("rejected by AES-256-GCM".into()))?;
        Ok(Self { aead })
    }

    /// Build a cipher from a 64-character hex key.
    pub fn from_hex(key_hex: &str) -> Result<Self, CipherError> {
        let key = hex::decode(key_hex.trim())
            .map_err(|e| CipherError::InvalidKey(format!("invalid hex: {e}")))?;
        Self::new(&key)
    }

    /// Generate a random key, hex encoded, suitable for configuration.
    pub fn generate_key_hex() -> String {
        let key: [u8; KEY_LEN] = rand::rng().random();
        hex::encode(key)
    }

    /// Encrypt `plaintext` under a freshly generated IV.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Sealed, CipherError> {
        let iv = fresh_iv();
        let ciphertext = self
            .aead
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|_| CipherError::Encrypt)?;
        Ok(Sealed { ciphertext, iv })
    }

    /// Decrypt `ciphertext` that was sealed under `iv`.
    pub fn decrypt(&self, ciphertext: &[u8], iv: &[u8]) -> Result<Vec<u8>, CipherError> {
        if iv.len() != IV_LEN {
            return Err(CipherError::InvalidIvLength {
                expected: IV_LEN,
                actual: iv.len(),
            });
        }
        if ciphertext.len() < TAG_LEN {
            return Err(CipherError::Truncated(ciphertext.len()));
        }

        self.aead
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| CipherError::Decrypt)
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cipher(AES-256-GCM)")
    }
}

/// Random IV, never all-zero.
fn fresh_iv() -> [u8; IV_LEN] {
    let mut rng = rand::rng();
    loop {
        let iv: [u8; IV_LEN] = rng.random();
        if iv.iter().any(|&b| b != 0) {
            return iv;
        }
    }
}
