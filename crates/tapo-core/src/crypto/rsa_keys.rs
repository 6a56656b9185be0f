//! RSA key pair for the Tapo handshake.
//!
//! The client sends the public half of a freshly generated RSA key pair to the
//! device, encoded as a SubjectPublicKeyInfo PEM block (`-----BEGIN PUBLIC
//! KEY-----`). The device uses it to wrap the session key it returns. A key
//! pair belongs to exactly one handshake and is never reused or persisted.

use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs8::{EncodePublicKey, LineEnding},
    rand_core::OsRng,
};
use tracing::debug;

use crate::error::Error;

/// Default RSA modulus size in bits.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// PEM-encoded public key, as sent in the handshake `key` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyPem(pub(crate) String);

impl PublicKeyPem {
    /// Returns the PEM text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PublicKeyPem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An RSA key pair generated for a single handshake.
///
/// The public key is PEM-encoded once at generation time and cached, so
/// exporting it is infallible and always yields the same text.
///
/// # Example
///
/// ```no_run
/// use tapo_core::crypto::KeyPair;
///
/// let key_pair = KeyPair::generate().unwrap();
/// assert!(key_pair.public_key_pem().as_str().starts_with("-----BEGIN PUBLIC KEY-----"));
/// ```
pub struct KeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    public_pem: PublicKeyPem,
}

impl KeyPair {
    /// Generates a fresh 2048-bit key pair from the OS random source.
    pub fn generate() -> Result<Self, Error> {
        Self::generate_with_bits(DEFAULT_KEY_BITS)
    }

    /// Generates a fresh key pair with a modulus of `bits` bits.
    pub fn generate_with_bits(bits: usize) -> Result<Self, Error> {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| Error::KeyGenerationFailed(format!("RSA key generation failed: {}", e)))?;
        let public_key = RsaPublicKey::from(&private_key);

        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::KeyGenerationFailed(format!("PEM encoding failed: {}", e)))?;

        debug!(bits, "generated RSA key pair");

        Ok(Self {
            private_key,
            public_key,
            public_pem: PublicKeyPem(public_pem),
        })
    }

    /// Returns the public key as SubjectPublicKeyInfo PEM.
    pub fn public_key_pem(&self) -> &PublicKeyPem {
        &self.public_pem
    }

    /// Returns the public key.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Returns the private key.
    ///
    /// Needed by the command layer to unwrap the session key returned in the
    /// handshake. Never log or persist it.
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }
}

// Implement Debug manually so the private key never reaches logs
impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_pem)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rsa::{pkcs8::DecodePublicKey, traits::PublicKeyParts};

    use super::*;

    const TEST_BITS: usize = 1024;

    #[test]
    fn test_export_pem_framing() {
        let key_pair = KeyPair::generate_with_bits(TEST_BITS).unwrap();
        let pem = key_pair.public_key_pem().as_str();

        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----\n"));
        assert!(pem.trim_end().ends_with("-----END PUBLIC KEY-----"));
        assert!(!pem.contains("RSA PUBLIC KEY"));
    }

    #[test]
    fn test_export_parses_back_to_same_modulus() {
        let key_pair = KeyPair::generate_with_bits(TEST_BITS).unwrap();
        let parsed = RsaPublicKey::from_public_key_pem(key_pair.public_key_pem().as_str()).unwrap();

        assert_eq!(parsed.n(), key_pair.public_key().n());
        assert_eq!(parsed.e(), key_pair.public_key().e());
        assert_eq!(parsed.size() * 8, TEST_BITS);
    }

    #[test]
    fn test_export_is_deterministic() {
        let key_pair = KeyPair::generate_with_bits(TEST_BITS).unwrap();
        let reencoded = key_pair
            .public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();

        assert_eq!(key_pair.public_key_pem().as_str(), reencoded);
        assert_eq!(key_pair.public_key_pem(), key_pair.public_key_pem());
    }

    #[test]
    fn test_generated_pairs_are_fresh() {
        let a = KeyPair::generate_with_bits(TEST_BITS).unwrap();
        let b = KeyPair::generate_with_bits(TEST_BITS).unwrap();
        assert_ne!(a.public_key_pem(), b.public_key_pem());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let key_pair = KeyPair::generate_with_bits(TEST_BITS).unwrap();
        let debug = format!("{:?}", key_pair);
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("BEGIN PUBLIC KEY"));
    }
}
