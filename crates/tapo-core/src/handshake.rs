//! Tapo handshake: public-key exchange that opens a session.
//!
//! # Protocol Overview
//!
//! 1. Client generates an RSA key pair and PEM-encodes the public key
//! 2. Client POSTs `{"method":"handshake","params":{"key":<pem>,"requestTimeMils":<ms>}}`
//!    to `http://{device}/app`
//! 3. Device answers `{"error_code":0,"result":{"key":<session key>}}` and sets
//!    a session cookie (`Set-Cookie: TP_SESSIONID=...; ...`)
//! 4. Client keeps the session key and the cookie for all further requests
//!
//! The session key is returned exactly as the device sent it, still wrapped
//! for the client's public key. Unwrapping it with [`KeyPair::private_key`]
//! and turning it into a [`CipherContext`](crate::crypto::CipherContext) is
//! left to the command layer.

use tracing::debug;

use crate::{
    crypto::KeyPair,
    error::Error,
    protocol::{HandshakeResponse, Request, SET_COOKIE_HEADER, SessionCredentials, session_cookie},
    transport::HttpTransport,
};

/// Progress of a [`Handshake`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeState {
    /// Created, nothing sent yet.
    #[default]
    Unstarted,
    /// Request sent, waiting for the device.
    AwaitingResponse,
    /// Session credentials received.
    Completed,
    /// The attempt failed; start over with a new key pair.
    Failed,
}

/// A single handshake attempt bound to one key pair.
///
/// An instance can be driven exactly once. Retrying requires a new
/// [`Handshake`] with a freshly generated [`KeyPair`], so no key material is
/// shared between attempts.
///
/// # Example
///
/// ```no_run
/// use tapo_core::{crypto::KeyPair, handshake::Handshake, transport::TcpHttpTransport};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let transport = TcpHttpTransport::default();
///     let mut handshake = Handshake::new(KeyPair::generate()?);
///
///     let credentials = handshake.perform(&transport, "192.168.0.138").await?;
///     println!("cookie: {}", credentials.cookie());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Handshake {
    key_pair: KeyPair,
    state: HandshakeState,
}

impl Handshake {
    /// Creates a handshake that will present `key_pair` to the device.
    pub fn new(key_pair: KeyPair) -> Self {
        Self {
            key_pair,
            state: HandshakeState::Unstarted,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Returns the key pair presented to the device.
    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Consumes the handshake, returning its key pair.
    pub fn into_key_pair(self) -> KeyPair {
        self.key_pair
    }

    /// Runs the handshake against `device` (`host` or `host:port`).
    ///
    /// Returns [`Error::HandshakeAlreadyAttempted`] if this instance has
    /// already been driven, whatever the outcome was.
    pub async fn perform<T>(&mut self, transport: &T, device: &str) -> Result<SessionCredentials, Error>
    where
        T: HttpTransport + ?Sized,
    {
        if self.state != HandshakeState::Unstarted {
            return Err(Error::HandshakeAlreadyAttempted);
        }

        self.state = HandshakeState::AwaitingResponse;
        let result = perform_handshake(transport, device, &self.key_pair).await;

        self.state = match result {
            Ok(_) => HandshakeState::Completed,
            Err(_) => HandshakeState::Failed,
        };

        result
    }
}

/// Returns the control endpoint URL for a device address.
///
/// ```
/// assert_eq!(tapo_core::handshake::app_url("192.168.0.138"), "http://192.168.0.138/app");
/// ```
pub fn app_url(device: &str) -> String {
    format!("http://{}/app", device)
}

/// Sends the handshake request for `key_pair` and collects the session
/// credentials.
///
/// # Errors
///
/// - [`Error::DeviceUnreachable`]: connection failure or timeout
/// - [`Error::DeviceRejectedHandshake`]: the device answered with a nonzero `error_code`
/// - [`Error::MissingSessionCookie`]: no usable `Set-Cookie` header
/// - [`Error::Protocol`] / [`Error::ParseError`]: unexpected HTTP status or body
pub async fn perform_handshake<T>(
    transport: &T,
    device: &str,
    key_pair: &KeyPair,
) -> Result<SessionCredentials, Error>
where
    T: HttpTransport + ?Sized,
{
    let url = app_url(device);
    let body = Request::handshake(key_pair.public_key_pem()).to_json()?;

    debug!(url = %url, bytes = body.len(), "sending handshake");
    let response = transport.post_json(&url, &body).await?;

    if !response.is_success() {
        debug!(
            status = response.status,
            body = %String::from_utf8_lossy(&response.body),
            "handshake failed"
        );
        return Err(Error::Protocol(format!(
            "handshake returned HTTP status {}",
            response.status
        )));
    }

    let parsed = HandshakeResponse::parse(&response.body)?;
    if parsed.error_code != 0 {
        debug!(error_code = parsed.error_code, "device rejected handshake");
        return Err(Error::DeviceRejectedHandshake {
            error_code: parsed.error_code,
        });
    }

    let cookie = session_cookie(response.header(SET_COOKIE_HEADER))?;

    let result = parsed
        .result
        .ok_or_else(|| Error::Protocol("handshake response has no result".into()))?;

    debug!(device, "handshake completed");
    Ok(SessionCredentials::new(result.key, cookie))
}
