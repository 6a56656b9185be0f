//! Wire types for the Tapo `/app` endpoint.
//!
//! Every request is a JSON object with a `method` name and a method-specific
//! `params` object:
//!
//! ```json
//! {"method":"handshake","params":{"key":"-----BEGIN PUBLIC KEY-----\n...","requestTimeMils":1700000000000}}
//! ```
//!
//! Responses carry an `error_code` (0 on success) and a `result` object. The
//! handshake additionally returns the session cookie in a `Set-Cookie` header.

use std::time::{SystemTime, UNIX_EPOCH};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use crate::{credentials::Credentials, crypto::PublicKeyPem, error::Error};

/// Response header carrying the session cookie.
pub const SET_COOKIE_HEADER: &str = "Set-Cookie";

/// A request to the device.
///
/// Serialized as `{"method": "<name>", "params": {...}}`.
///
/// # Example
///
/// ```
/// use tapo_core::protocol::Request;
///
/// let json = Request::set_device_on(true).to_json().unwrap();
/// assert_eq!(json, r#"{"method":"set_device_info","params":{"device_on":true}}"#);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum Request {
    /// Public-key exchange that opens a session.
    Handshake(HandshakeParams),
    /// Account login, sent once the session is open.
    LoginDevice(LoginParams),
    /// Device state change (e.g. relay on/off).
    SetDeviceInfo(DeviceInfoParams),
}

/// Parameters of the `handshake` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandshakeParams {
    /// Client public key as SubjectPublicKeyInfo PEM.
    pub key: String,
    /// Wall-clock time the request was built, in milliseconds since the epoch.
    #[serde(rename = "requestTimeMils")]
    pub request_time_mils: i64,
}

/// Parameters of the `login_device` request.
///
/// Fields are sent as given; any vendor encoding of them is applied by the
/// caller before building the request.
#[derive(Clone, Serialize)]
pub struct LoginParams {
    /// Account username.
    pub username: String,
    /// Account password.
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
}

impl std::fmt::Debug for LoginParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginParams")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Parameters of the `set_device_info` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceInfoParams {
    /// Relay state.
    pub device_on: bool,
}

impl Request {
    /// Builds a handshake request stamped with the current wall-clock time.
    pub fn handshake(public_key: &PublicKeyPem) -> Self {
        Self::handshake_at(public_key, now_millis())
    }

    /// Builds a handshake request with an explicit timestamp.
    pub fn handshake_at(public_key: &PublicKeyPem, request_time_mils: i64) -> Self {
        Request::Handshake(HandshakeParams {
            key: public_key.as_str().to_string(),
            request_time_mils,
        })
    }

    /// Builds a login request from account credentials.
    pub fn login_device(credentials: &Credentials) -> Self {
        Request::LoginDevice(LoginParams {
            username: credentials.username.clone(),
            password: SecretString::from(credentials.expose_password().to_string()),
        })
    }

    /// Builds a request switching the device relay on or off.
    pub fn set_device_on(on: bool) -> Self {
        Request::SetDeviceInfo(DeviceInfoParams { device_on: on })
    }

    /// Returns the wire method name.
    pub fn method(&self) -> &'static str {
        match self {
            Request::Handshake(_) => "handshake",
            Request::LoginDevice(_) => "login_device",
            Request::SetDeviceInfo(_) => "set_device_info",
        }
    }

    /// Serializes the request to its JSON body.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self)
            .map_err(|e| Error::Protocol(format!("failed to encode {} request: {}", self.method(), e)))
    }
}

fn serialize_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Body of the device's answer to a handshake.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HandshakeResponse {
    /// 0 on success, device-defined code otherwise.
    pub error_code: i64,
    /// Present on success.
    #[serde(default)]
    pub result: Option<HandshakeResult>,
}

/// The `result` object of a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HandshakeResult {
    /// Session key, still in the device's transport encoding.
    pub key: String,
}

impl HandshakeResponse {
    /// Parses a handshake response body.
    pub fn parse(body: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(body)
            .map_err(|e| Error::ParseError(format!("invalid handshake response: {}", e)))
    }
}

/// Extracts the session cookie from a `Set-Cookie` header value.
///
/// Keeps everything before the first `;`, so `TP_SESSIONID=XYZ; Path=/`
/// becomes `TP_SESSIONID=XYZ`. A missing or empty cookie is an error.
///
/// # Example
///
/// ```
/// use tapo_core::protocol::session_cookie;
///
/// let cookie = session_cookie(Some("TP_SESSIONID=XYZ; Path=/")).unwrap();
/// assert_eq!(cookie, "TP_SESSIONID=XYZ");
/// assert!(session_cookie(None).is_err());
/// ```
pub fn session_cookie(set_cookie: Option<&str>) -> Result<String, Error> {
    let cookie = set_cookie
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .unwrap_or_default();

    if cookie.is_empty() {
        return Err(Error::MissingSessionCookie);
    }

    Ok(cookie.to_string())
}

/// Result of a successful handshake: the session key and cookie.
///
/// Both values are immutable once produced. The session key is kept in a
/// [`SecretString`] and redacted from `Debug` output.
#[derive(Clone)]
pub struct SessionCredentials {
    session_key: SecretString,
    cookie: String,
}

impl SessionCredentials {
    /// Creates session credentials from the handshake results.
    pub fn new(session_key: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            session_key: SecretString::from(session_key.into()),
            cookie: cookie.into(),
        }
    }

    /// Exposes the session key as returned by the device.
    pub fn session_key(&self) -> &str {
        self.session_key.expose_secret()
    }

    /// Returns the cookie to send with subsequent requests.
    pub fn cookie(&self) -> &str {
        &self.cookie
    }
}

impl PartialEq for SessionCredentials {
    fn eq(&self, other: &Self) -> bool {
        self.session_key() == other.session_key() && self.cookie == other.cookie
    }
}

impl Eq for SessionCredentials {}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("session_key", &"[REDACTED]")
            .field("cookie", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn test_handshake_request_wire_format() {
        let pem = PublicKeyPem("KEY".to_string());
        let request = Request::handshake_at(&pem, 1_700_000_000_123);

        let value: Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "method": "handshake",
                "params": {"key": "KEY", "requestTimeMils": 1_700_000_000_123i64}
            })
        );
    }

    #[test]
    fn test_handshake_request_uses_current_time() {
        let pem = PublicKeyPem("KEY".to_string());
        let before = now_millis();
        let Request::Handshake(params) = Request::handshake(&pem) else {
            panic!("expected handshake request");
        };
        assert!(params.request_time_mils >= before);
        assert!(params.request_time_mils > 1_600_000_000_000);
    }

    #[test]
    fn test_login_request_wire_format() {
        let request = Request::login_device(&Credentials::new("user@example.com", "hunter2"));
        let value: Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "method": "login_device",
                "params": {"username": "user@example.com", "password": "hunter2"}
            })
        );
        assert!(!format!("{:?}", request).contains("hunter2"));
    }

    #[test]
    fn test_set_device_info_wire_format() {
        assert_eq!(
            Request::set_device_on(false).to_json().unwrap(),
            r#"{"method":"set_device_info","params":{"device_on":false}}"#
        );
        assert_eq!(Request::set_device_on(true).method(), "set_device_info");
    }

    #[test]
    fn test_parse_success_response() {
        let response =
            HandshakeResponse::parse(br#"{"error_code":0,"result":{"key":"abc123"}}"#).unwrap();
        assert_eq!(response.error_code, 0);
        assert_eq!(response.result.unwrap().key, "abc123");
    }

    #[test]
    fn test_parse_error_response_without_result() {
        let response = HandshakeResponse::parse(br#"{"error_code":-1010}"#).unwrap();
        assert_eq!(response.error_code, -1010);
        assert!(response.result.is_none());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            HandshakeResponse::parse(b"<html>"),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn test_session_cookie_extraction() {
        assert_eq!(
            session_cookie(Some("TP_SESSIONID=XYZ; Path=/")).unwrap(),
            "TP_SESSIONID=XYZ"
        );
        assert_eq!(
            session_cookie(Some("TP_SESSIONID=XYZ")).unwrap(),
            "TP_SESSIONID=XYZ"
        );
        assert_eq!(
            session_cookie(Some("TP_SESSIONID=A;TIMEOUT=1440")).unwrap(),
            "TP_SESSIONID=A"
        );
    }

    #[test]
    fn test_session_cookie_missing_or_empty() {
        assert!(matches!(session_cookie(None), Err(Error::MissingSessionCookie)));
        assert!(matches!(session_cookie(Some("")), Err(Error::MissingSessionCookie)));
        assert!(matches!(
            session_cookie(Some("; Path=/")),
            Err(Error::MissingSessionCookie)
        ));
    }

    #[test]
    fn test_session_credentials_accessors_and_debug() {
        let creds = SessionCredentials::new("abc123", "TP_SESSIONID=XYZ");
        assert_eq!(creds.session_key(), "abc123");
        assert_eq!(creds.cookie(), "TP_SESSIONID=XYZ");

        let debug = format!("{:?}", creds);
        assert!(!debug.contains("abc123"));
        assert!(!debug.contains("XYZ"));
    }
}
