//! Core library for opening sessions with TP-Link Tapo smart plugs.
//!
//! Tapo devices (P100 and friends) expose a JSON endpoint at
//! `http://{device}/app`. Before accepting commands they require a handshake:
//! the client presents an RSA public key and receives a session key plus a
//! session cookie. Subsequent command payloads are AES-CBC encrypted with
//! PKCS#7 padding.
//!
//! # Overview
//!
//! - [`crypto`]: padding codec, AES-CBC session and RSA key pairs
//! - [`protocol`]: request/response wire types and cookie extraction
//! - [`handshake`]: the handshake state machine and [`perform_handshake`]
//! - [`transport`]: the [`HttpTransport`](transport::HttpTransport) capability
//!   and its TCP implementation
//! - [`client`]: [`DeviceConfig`] and [`TapoClient`]
//!
//! # Example
//!
//! ```no_run
//! use tapo_core::{DeviceConfig, TapoClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tapo_core::Error> {
//!     let client = TapoClient::connect(DeviceConfig::new("192.168.0.138"));
//!     let session = client.handshake().await?;
//!
//!     println!("cookie: {}", session.credentials().cookie());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod credentials;
pub mod crypto;
pub mod error;
pub mod handshake;
pub mod protocol;
pub mod transport;

pub use client::{DeviceConfig, Session, TapoClient};
pub use credentials::Credentials;
pub use crypto::{AesCbcSession, CipherContext, CipherError, KeyPair};
pub use error::Error;
pub use handshake::{Handshake, HandshakeState, perform_handshake};
pub use protocol::{Request, SessionCredentials};

/// The version of the tapo-core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
