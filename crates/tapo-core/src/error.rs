//! Error types for tapo-core.
//!
//! This module defines the error types returned by the library.

use thiserror::Error;

use crate::crypto::CipherError;

/// Error type for tapo-core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Padding, ciphertext length or key material rejected by the session cipher.
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// The random source failed while generating the RSA key pair.
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// The device could not be reached (connection refused, timeout, broken socket).
    #[error("device unreachable: {0}")]
    DeviceUnreachable(String),

    /// The device answered the handshake with a nonzero `error_code`.
    #[error("device rejected handshake (error_code: {error_code})")]
    DeviceRejectedHandshake {
        /// Device-defined error code, reported as-is.
        error_code: i64,
    },

    /// The handshake response carried no usable `Set-Cookie` header.
    #[error("device response has no session cookie")]
    MissingSessionCookie,

    /// An operation needs account credentials but none (or blank ones) are configured.
    #[error("no credentials configured for login")]
    MissingCredentials,

    /// A handshake instance was driven a second time.
    #[error("handshake already attempted; generate a new key pair and start over")]
    HandshakeAlreadyAttempted,

    /// Protocol error (malformed HTTP, unexpected response shape, etc.).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Failed to parse the device response body.
    #[error("parse error: {0}")]
    ParseError(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::DeviceUnreachable(err.to_string())
    }
}
