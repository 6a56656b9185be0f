//! HTTP transport used to reach the device's `/app` endpoint.
//!
//! The handshake only needs one capability: POST a JSON body to a URL and get
//! back the status, headers and body. That capability is the [`HttpTransport`]
//! trait, which is passed explicitly to everything that talks to a device so
//! each session controls its own timeout and tests can substitute a stub.
//!
//! - [`TcpHttpTransport`]: HTTP/1.1 over a plain TCP socket

pub mod tcp;

pub use tcp::TcpHttpTransport;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;

/// Default request timeout.
///
/// Devices are on the local network; one that does not answer within this
/// window is treated as unreachable.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// A response as seen by the protocol layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers in the order received.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability to POST a JSON body and receive the raw response.
///
/// Implementations map connection failures and timeouts to
/// [`Error::DeviceUnreachable`] and never retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `body` as `application/json` to `url`.
    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(200, "{}")
            .with_header("set-cookie", "TP_SESSIONID=1; Path=/")
            .with_header("Set-Cookie", "second=2");

        assert_eq!(response.header("Set-Cookie"), Some("TP_SESSIONID=1; Path=/"));
        assert_eq!(response.header("SET-COOKIE"), Some("TP_SESSIONID=1; Path=/"));
        assert_eq!(response.header("Content-Type"), None);
    }

    #[test]
    fn test_is_success() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }
}
