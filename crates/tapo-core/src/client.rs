//! Device client: configuration plus session establishment.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::{
    credentials::Credentials,
    crypto::{DEFAULT_KEY_BITS, KeyPair},
    error::Error,
    handshake::{Handshake, app_url},
    protocol::{Request, SessionCredentials},
    transport::{DEFAULT_TIMEOUT, HttpTransport, TcpHttpTransport, tcp::DEFAULT_PORT},
};

/// Configuration for talking to one device.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tapo_core::{Credentials, DeviceConfig};
///
/// let config = DeviceConfig::new("192.168.0.138")
///     .with_timeout(Duration::from_secs(3))
///     .with_credentials(Credentials::new("user@example.com", "password"));
/// assert_eq!(config.port, None);
/// assert_eq!(config.key_bits, 2048);
/// ```
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// The device hostname or IP address.
    pub host: String,
    /// Optional port override (80 if None).
    pub port: Option<u16>,
    /// Account credentials for `login_device`.
    pub credentials: Option<Credentials>,
    /// Request timeout.
    pub timeout: Duration,
    /// RSA modulus size for the per-session key pair.
    pub key_bits: usize,
}

impl DeviceConfig {
    /// Creates a new device configuration.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
            key_bits: DEFAULT_KEY_BITS,
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the credentials.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the RSA key size.
    pub fn with_key_bits(mut self, bits: usize) -> Self {
        self.key_bits = bits;
        self
    }

    /// Returns `host`, or `host:port` when a non-default port is set.
    ///
    /// IPv6 literals are bracketed (`[::1]`, `[::1]:8080`).
    pub fn address(&self) -> String {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        match self.port {
            Some(port) if port != DEFAULT_PORT => format!("{}:{}", host, port),
            _ => host,
        }
    }
}

/// An established session: the handshake result and the key pair it was
/// negotiated with.
#[derive(Debug)]
pub struct Session {
    credentials: SessionCredentials,
    key_pair: KeyPair,
}

impl Session {
    /// Returns the session key and cookie.
    pub fn credentials(&self) -> &SessionCredentials {
        &self.credentials
    }

    /// Returns the key pair whose public half was sent to the device.
    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Splits the session into its parts.
    pub fn into_parts(self) -> (SessionCredentials, KeyPair) {
        (self.credentials, self.key_pair)
    }
}

/// Client for a single Tapo device.
///
/// The client holds only configuration and a transport. Every call to
/// [`handshake`](Self::handshake) generates a new key pair and yields an
/// independent [`Session`].
///
/// # Example
///
/// ```no_run
/// use tapo_core::{DeviceConfig, TapoClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = TapoClient::connect(DeviceConfig::new("192.168.0.138"));
///     let session = client.handshake().await?;
///     println!("cookie: {}", session.credentials().cookie());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct TapoClient {
    config: DeviceConfig,
    transport: Arc<dyn HttpTransport>,
}

impl TapoClient {
    /// Creates a client using the given transport.
    pub fn new(config: DeviceConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Creates a client with a TCP transport using the configured timeout.
    pub fn connect(config: DeviceConfig) -> Self {
        let transport = Arc::new(TcpHttpTransport::new(config.timeout));
        Self::new(config, transport)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns the device control endpoint.
    pub fn app_url(&self) -> String {
        app_url(&self.config.address())
    }

    /// Runs a handshake with a freshly generated key pair.
    pub async fn handshake(&self) -> Result<Session, Error> {
        debug!(
            host = %self.config.host,
            port = ?self.config.port,
            key_bits = self.config.key_bits,
            "starting session"
        );

        let key_pair = KeyPair::generate_with_bits(self.config.key_bits)?;
        let mut handshake = Handshake::new(key_pair);
        let credentials = handshake
            .perform(self.transport.as_ref(), &self.config.address())
            .await?;

        Ok(Session {
            credentials,
            key_pair: handshake.into_key_pair(),
        })
    }

    /// Builds the `login_device` request from the configured credentials.
    ///
    /// Returns [`Error::MissingCredentials`] when none are configured or they
    /// are blank.
    pub fn login_request(&self) -> Result<Request, Error> {
        match &self.config.credentials {
            Some(credentials) if !credentials.is_blank() => {
                Ok(Request::login_device(credentials))
            }
            _ => Err(Error::MissingCredentials),
        }
    }
}

impl std::fmt::Debug for TapoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapoClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
