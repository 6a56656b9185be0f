//! Cryptographic building blocks for the Tapo session.
//!
//! - [`padding`]: PKCS#7 padding used to frame CBC plaintexts
//! - [`aes_cbc`]: AES-CBC session cipher for command traffic
//! - [`rsa_keys`]: RSA key pair whose public half is sent in the handshake

pub mod aes_cbc;
pub mod padding;
pub mod rsa_keys;

pub use aes_cbc::{AesCbcSession, BLOCK_SIZE, CipherContext};
pub use padding::{pad, unpad};
pub use rsa_keys::{DEFAULT_KEY_BITS, KeyPair, PublicKeyPem};

use thiserror::Error;

/// Error type for padding and session cipher operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Trailing padding bytes do not form valid PKCS#7 padding.
    #[error("invalid padding")]
    InvalidPadding,

    /// Ciphertext is empty or not a whole number of cipher blocks.
    #[error("invalid ciphertext length: {len} is not a nonzero multiple of {BLOCK_SIZE}")]
    InvalidCiphertextLength {
        /// Length of the rejected ciphertext.
        len: usize,
    },

    /// Key or IV has a length the cipher does not support.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),
}
