//! AES-CBC session cipher for encrypted command traffic.
//!
//! Once the handshake has produced a session key, every command sent to the
//! device is PKCS#7 padded and encrypted with AES in CBC mode. The key size
//! selects the AES variant:
//!
//! - 16 bytes: AES-128
//! - 24 bytes: AES-192
//! - 32 bytes: AES-256
//!
//! The IV is fixed for the lifetime of the session. Each call starts a fresh
//! chain from that IV, so the session holds no state between calls.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, generic_array::GenericArray};

use super::{
    CipherError,
    padding::{pad, unpad},
};

/// AES block size in bytes. Also the required IV length.
pub const BLOCK_SIZE: usize = 16;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes192CbcEnc = cbc::Encryptor<Aes192>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Raw key material for a session cipher.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherContext {
    /// Symmetric key (16, 24 or 32 bytes).
    pub key: Vec<u8>,
    /// Initialization vector (16 bytes).
    pub iv: Vec<u8>,
}

impl CipherContext {
    /// Creates a context from key and IV bytes.
    pub fn new(key: impl Into<Vec<u8>>, iv: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            iv: iv.into(),
        }
    }
}

impl std::fmt::Debug for CipherContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherContext")
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone)]
enum AesKey {
    Aes128([u8; 16]),
    Aes192([u8; 24]),
    Aes256([u8; 32]),
}

impl AesKey {
    fn from_slice(key: &[u8]) -> Result<Self, CipherError> {
        match key.len() {
            16 => Ok(Self::Aes128(copy_array(key))),
            24 => Ok(Self::Aes192(copy_array(key))),
            32 => Ok(Self::Aes256(copy_array(key))),
            n => Err(CipherError::InvalidKeyMaterial(format!(
                "key must be 16, 24 or 32 bytes, got {}",
                n
            ))),
        }
    }

    fn bits(&self) -> usize {
        match self {
            Self::Aes128(_) => 128,
            Self::Aes192(_) => 192,
            Self::Aes256(_) => 256,
        }
    }
}

/// AES-CBC cipher bound to one key and IV.
///
/// # Example
///
/// ```
/// use tapo_core::crypto::AesCbcSession;
///
/// let session = AesCbcSession::new(&[7u8; 16], &[9u8; 16]).unwrap();
/// let ciphertext = session.encrypt(br#"{"method":"get_device_info"}"#);
/// assert_eq!(ciphertext.len() % 16, 0);
///
/// let plaintext = session.decrypt(&ciphertext).unwrap();
/// assert_eq!(plaintext, br#"{"method":"get_device_info"}"#);
/// ```
#[derive(Clone)]
pub struct AesCbcSession {
    key: AesKey,
    iv: [u8; BLOCK_SIZE],
}

impl AesCbcSession {
    /// Creates a session from raw key and IV bytes.
    ///
    /// Fails with [`CipherError::InvalidKeyMaterial`] if the key is not 16, 24
    /// or 32 bytes, or the IV is not exactly one block.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, CipherError> {
        let key = AesKey::from_slice(key)?;
        if iv.len() != BLOCK_SIZE {
            return Err(CipherError::InvalidKeyMaterial(format!(
                "iv must be {} bytes, got {}",
                BLOCK_SIZE,
                iv.len()
            )));
        }

        Ok(Self {
            key,
            iv: copy_array(iv),
        })
    }

    /// Creates a session from a [`CipherContext`].
    pub fn from_context(context: &CipherContext) -> Result<Self, CipherError> {
        Self::new(&context.key, &context.iv)
    }

    /// Pads and encrypts `plaintext`.
    ///
    /// The result is a new buffer whose length is a positive multiple of
    /// [`BLOCK_SIZE`].
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let padded = pad(plaintext, BLOCK_SIZE);
        let iv = GenericArray::from_slice(&self.iv);

        match &self.key {
            AesKey::Aes128(key) => {
                encrypt_blocks(Aes128CbcEnc::new(GenericArray::from_slice(key), iv), &padded)
            }
            AesKey::Aes192(key) => {
                encrypt_blocks(Aes192CbcEnc::new(GenericArray::from_slice(key), iv), &padded)
            }
            AesKey::Aes256(key) => {
                encrypt_blocks(Aes256CbcEnc::new(GenericArray::from_slice(key), iv), &padded)
            }
        }
    }

    /// Decrypts `ciphertext` and strips its padding.
    ///
    /// The ciphertext must be a nonzero multiple of [`BLOCK_SIZE`]; anything
    /// else is rejected before any block is processed.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CipherError::InvalidCiphertextLength {
                len: ciphertext.len(),
            });
        }

        let iv = GenericArray::from_slice(&self.iv);
        let padded = match &self.key {
            AesKey::Aes128(key) => {
                decrypt_blocks(Aes128CbcDec::new(GenericArray::from_slice(key), iv), ciphertext)
            }
            AesKey::Aes192(key) => {
                decrypt_blocks(Aes192CbcDec::new(GenericArray::from_slice(key), iv), ciphertext)
            }
            AesKey::Aes256(key) => {
                decrypt_blocks(Aes256CbcDec::new(GenericArray::from_slice(key), iv), ciphertext)
            }
        };

        Ok(unpad(&padded)?.to_vec())
    }

    /// Returns the AES key size in bits.
    pub fn key_bits(&self) -> usize {
        self.key.bits()
    }
}

impl std::fmt::Debug for AesCbcSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesCbcSession")
            .field("key_bits", &self.key.bits())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Runs the CBC chain over block-aligned `input` into a buffer of equal length.
fn encrypt_blocks<C: BlockEncryptMut>(mut mode: C, input: &[u8]) -> Vec<u8> {
    let block_size = C::block_size();
    let mut output = vec![0u8; input.len()];

    for (src, dst) in input
        .chunks_exact(block_size)
        .zip(output.chunks_exact_mut(block_size))
    {
        mode.encrypt_block_b2b_mut(GenericArray::from_slice(src), GenericArray::from_mut_slice(dst));
    }

    output
}

fn decrypt_blocks<C: BlockDecryptMut>(mut mode: C, input: &[u8]) -> Vec<u8> {
    let block_size = C::block_size();
    let mut output = vec![0u8; input.len()];

    for (src, dst) in input
        .chunks_exact(block_size)
        .zip(output.chunks_exact_mut(block_size))
    {
        mode.decrypt_block_b2b_mut(GenericArray::from_slice(src), GenericArray::from_mut_slice(dst));
    }

    output
}

/// Copies a slice whose length has already been checked into an array.
fn copy_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 16] = [0x42; 16];
    const IV: [u8; 16] = [0x24; 16];

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let session = AesCbcSession::new(&KEY, &IV).unwrap();

        for len in [0usize, 1, 15, 16, 17, 31, 32, 100] {
            let plaintext: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let ciphertext = session.encrypt(&plaintext);
            assert_eq!(session.decrypt(&ciphertext).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_ciphertext_is_block_multiple_and_nonempty() {
        let session = AesCbcSession::new(&KEY, &IV).unwrap();

        assert_eq!(session.encrypt(b"").len(), 16);
        assert_eq!(session.encrypt(b"a").len(), 16);
        assert_eq!(session.encrypt(&[0u8; 16]).len(), 32);
        assert_ne!(session.encrypt(b"a"), vec![0u8; 16]);
    }

    #[test]
    fn test_known_answer_aes128_cbc() {
        // NIST SP 800-38A F.2.1, first block.
        let key = [
            0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf,
            0x4f, 0x3c,
        ];
        let iv: Vec<u8> = (0u8..16).collect();
        let plaintext = [
            0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93,
            0x17, 0x2a,
        ];
        let expected = [
            0x76, 0x49, 0xab, 0xac, 0x81, 0x19, 0xb2, 0x46, 0xce, 0xe9, 0x8e, 0x9b, 0x12, 0xe9,
            0x19, 0x7d,
        ];

        let session = AesCbcSession::new(&key, &iv).unwrap();
        let ciphertext = session.encrypt(&plaintext);
        assert_eq!(&ciphertext[..16], &expected);
        assert_eq!(ciphertext.len(), 32);
    }

    #[test]
    fn test_all_key_sizes() {
        for len in [16usize, 24, 32] {
            let key = vec![0x11u8; len];
            let session = AesCbcSession::new(&key, &IV).unwrap();
            assert_eq!(session.key_bits(), len * 8);

            let ciphertext = session.encrypt(b"turn it on");
            assert_eq!(session.decrypt(&ciphertext).unwrap(), b"turn it on");
        }
    }

    #[test]
    fn test_invalid_key_length() {
        let err = AesCbcSession::new(&[0u8; 10], &IV).unwrap_err();
        assert!(matches!(err, CipherError::InvalidKeyMaterial(_)));
    }

    #[test]
    fn test_invalid_iv_length() {
        let err = AesCbcSession::new(&KEY, &[0u8; 8]).unwrap_err();
        assert!(matches!(err, CipherError::InvalidKeyMaterial(_)));
    }

    #[test]
    fn test_decrypt_rejects_unaligned_ciphertext() {
        let session = AesCbcSession::new(&KEY, &IV).unwrap();

        for len in [0usize, 1, 15, 17, 33] {
            assert_eq!(
                session.decrypt(&vec![0u8; len]),
                Err(CipherError::InvalidCiphertextLength { len })
            );
        }
    }

    #[test]
    fn test_decrypt_with_wrong_key_never_recovers_plaintext() {
        let session = AesCbcSession::new(&KEY, &IV).unwrap();
        let other = AesCbcSession::new(&[0x43; 16], &IV).unwrap();

        let ciphertext = session.encrypt(b"0123456789abcdef0123456789abcdef");
        if let Ok(plaintext) = other.decrypt(&ciphertext) {
            assert_ne!(plaintext, b"0123456789abcdef0123456789abcdef");
        }
    }

    #[test]
    fn test_session_is_stateless_between_calls() {
        let session = AesCbcSession::new(&KEY, &IV).unwrap();
        assert_eq!(session.encrypt(b"same"), session.encrypt(b"same"));
    }

    #[test]
    fn test_from_context() {
        let context = CipherContext::new(KEY.to_vec(), IV.to_vec());
        let session = AesCbcSession::from_context(&context).unwrap();
        let ciphertext = session.encrypt(b"ctx");
        assert_eq!(session.decrypt(&ciphertext).unwrap(), b"ctx");
    }

    #[test]
    fn test_debug_redacts_key() {
        let context = CipherContext::new(KEY.to_vec(), IV.to_vec());
        assert!(format!("{:?}", context).contains("[REDACTED]"));

        let session = AesCbcSession::from_context(&context).unwrap();
        let debug = format!("{:?}", session);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("66"));
    }
}
