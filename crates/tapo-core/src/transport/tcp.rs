//! HTTP/1.1 over a plain TCP socket.
//!
//! # Note on HTTP Implementation
//!
//! This uses raw TCP sockets instead of an HTTP client library because TP-Link
//! devices run a non-compliant HTTP server that rejects requests with lowercase
//! headers. HTTP client libraries normalize header names to lowercase, while
//! the devices only accept HTTP/1.1 with title-case headers
//! (e.g. "Content-Type", not "content-type").

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use super::{DEFAULT_TIMEOUT, HttpResponse, HttpTransport};
use crate::error::Error;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 80;

/// Largest response accepted from a device.
const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// [`HttpTransport`] speaking HTTP/1.1 over TCP.
///
/// The timeout bounds the whole request. Connect, write and every read are
/// also bounded individually by the same duration.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use tapo_core::transport::{HttpTransport, TcpHttpTransport};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let transport = TcpHttpTransport::new(Duration::from_secs(1));
///     let response = transport
///         .post_json("http://192.168.0.138/app", r#"{"method":"get_device_info"}"#)
///         .await?;
///     println!("{}", response.status);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TcpHttpTransport {
    timeout: Duration,
}

impl TcpHttpTransport {
    /// Creates a transport with the given per-operation timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the per-operation timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for TcpHttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl HttpTransport for TcpHttpTransport {
    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, Error> {
        let target = HttpTarget::parse(url)?;

        // Bounds the whole request; each step below has its own bound too
        timeout(self.timeout, self.exchange(&target, body))
            .await
            .map_err(|_| {
                Error::DeviceUnreachable(format!(
                    "request to {} timed out after {:?}",
                    url, self.timeout
                ))
            })?
    }
}

impl TcpHttpTransport {
    /// Connects, sends the request and reads the whole response.
    async fn exchange(&self, target: &HttpTarget, body: &str) -> Result<HttpResponse, Error> {
        let io_timeout = self.timeout;

        // Build the HTTP request with title-case headers
        let request = format!(
            "POST {} HTTP/1.1\r\n\
             Host: {}:{}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Accept: application/json\r\n\
             Connection: close\r\n\
             \r\n",
            target.path,
            target.host,
            target.port,
            body.len()
        );

        let addr = format!("{}:{}", target.host, target.port);
        debug!(addr = %addr, path = %target.path, "connecting");

        let mut stream = timeout(io_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| Error::DeviceUnreachable(format!("connection to {} timed out", addr)))?
            .map_err(|e| Error::DeviceUnreachable(format!("connection to {} failed: {}", addr, e)))?;

        let mut full_request = request.into_bytes();
        full_request.extend_from_slice(body.as_bytes());
        debug!(bytes = full_request.len(), "sending request");

        timeout(io_timeout, stream.write_all(&full_request))
            .await
            .map_err(|_| Error::DeviceUnreachable("write timed out".into()))?
            .map_err(|e| Error::DeviceUnreachable(format!("write failed: {}", e)))?;

        let raw = read_response(&mut stream, io_timeout).await?;
        let response = parse_response(&raw)?;

        debug!(
            status = response.status,
            body_bytes = response.body.len(),
            "received response"
        );

        Ok(response)
    }
}

/// Host, port and path of an `http://` URL.
#[derive(Debug, PartialEq, Eq)]
struct HttpTarget {
    host: String,
    port: u16,
    path: String,
}

impl HttpTarget {
    fn parse(url: &str) -> Result<Self, Error> {
        let rest = url
            .strip_prefix("http://")
            .ok_or_else(|| Error::Protocol(format!("unsupported URL (expected http://): {}", url)))?;

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        let invalid_port = || Error::Protocol(format!("invalid port in URL: {}", url));

        // Bracketed IPv6 literals keep their brackets for `connect` and `Host`
        let (host, port) = match authority.rfind(']') {
            Some(end) => {
                let (host, rest) = authority.split_at(end + 1);
                if rest.is_empty() {
                    (host, None)
                } else {
                    (host, Some(rest.strip_prefix(':').ok_or_else(invalid_port)?))
                }
            }
            None => match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            },
        };

        let port = match port {
            Some(port) => port.parse::<u16>().map_err(|_| invalid_port())?,
            None => DEFAULT_PORT,
        };

        if host.is_empty() {
            return Err(Error::Protocol(format!("missing host in URL: {}", url)));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }
}

/// Reads until the declared body length has arrived or the peer closes.
async fn read_response(stream: &mut TcpStream, io_timeout: Duration) -> Result<Vec<u8>, Error> {
    let mut response = Vec::with_capacity(1024);
    let mut buf = [0u8; 4096];

    loop {
        if let Some(header_end) = find_header_end(&response) {
            let headers = String::from_utf8_lossy(&response[..header_end]);
            if let Some(expected_len) = parse_content_length(&headers)
                && response.len() - (header_end + 4) >= expected_len
            {
                break;
            }
        }

        let n = timeout(io_timeout, stream.read(&mut buf))
            .await
            .map_err(|_| Error::DeviceUnreachable("read timed out".into()))?
            .map_err(|e| Error::DeviceUnreachable(format!("read failed: {}", e)))?;

        if n == 0 {
            break;
        }

        response.extend_from_slice(&buf[..n]);

        if response.len() > MAX_RESPONSE_SIZE {
            return Err(Error::Protocol(format!(
                "response too large: more than {} bytes",
                MAX_RESPONSE_SIZE
            )));
        }
    }

    Ok(response)
}

fn parse_response(raw: &[u8]) -> Result<HttpResponse, Error> {
    let header_end = find_header_end(raw)
        .ok_or_else(|| Error::Protocol("invalid HTTP response: no header end".into()))?;

    let head = String::from_utf8_lossy(&raw[..header_end]);
    let status = parse_status_code(&head)
        .ok_or_else(|| Error::Protocol("invalid HTTP response: no status code".into()))?;

    let headers = head
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();

    let mut body = raw[header_end + 4..].to_vec();
    if let Some(len) = parse_content_length(&head) {
        body.truncate(len);
    }

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

/// Find the position of "\r\n\r\n" in the response (end of headers).
fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}

fn parse_status_code(headers: &str) -> Option<u16> {
    headers
        .lines()
        .next()?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}

fn parse_content_length(headers: &str) -> Option<usize> {
    for line in headers.lines() {
        if line.to_lowercase().starts_with("content-length:") {
            return line.split(':').nth(1)?.trim().parse().ok();
        }
    }
    None
}
