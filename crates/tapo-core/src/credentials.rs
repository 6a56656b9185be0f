//! Account credentials for the Tapo `login_device` request.
//!
//! After the handshake, a Tapo plug expects the TP-Link account that owns it
//! to log in before it accepts device commands. This module provides the
//! [`Credentials`] struct carried by [`DeviceConfig`](crate::client::DeviceConfig)
//! and used by [`Request::login_device`](crate::protocol::Request::login_device).
//!
//! # Security
//!
//! Passwords are stored using [`SecretString`] from the `secrecy` crate to prevent
//! accidental logging or display. Use [`Credentials::expose_password()`] to access
//! the raw password value when needed for authentication.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Credentials for logging in to a Tapo device.
///
/// # Example
///
/// ```
/// use tapo_core::Credentials;
///
/// let creds = Credentials::new("user@example.com", "password123");
/// assert_eq!(creds.username, "user@example.com");
/// assert_eq!(creds.expose_password(), "password123");
/// ```
#[derive(Clone)]
pub struct Credentials {
    /// The username (the TP-Link cloud account email address).
    pub username: String,
    /// The password for the account (protected from accidental logging).
    password: SecretString,
}

impl Credentials {
    /// Creates new credentials with the given username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Creates blank credentials (empty username and password).
    pub fn blank() -> Self {
        Self::new("", "")
    }

    /// Returns `true` if both username and password are empty.
    ///
    /// # Example
    ///
    /// ```
    /// use tapo_core::Credentials;
    ///
    /// assert!(Credentials::blank().is_blank());
    /// assert!(!Credentials::new("user", "pass").is_blank());
    /// ```
    pub fn is_blank(&self) -> bool {
        self.username.is_empty() && self.password.expose_secret().is_empty()
    }

    /// Exposes the password for authentication purposes.
    ///
    /// Only use this when building the login request. Never log or display
    /// the returned value.
    pub fn expose_password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl PartialEq for Credentials {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
            && self.password.expose_secret() == other.password.expose_secret()
    }
}

impl Eq for Credentials {}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_new() {
        let creds = Credentials::new("user@example.com", "password123");
        assert_eq!(creds.username, "user@example.com");
        assert_eq!(creds.expose_password(), "password123");
    }

    #[test]
    fn test_credentials_is_blank() {
        assert!(Credentials::blank().is_blank());
        assert!(!Credentials::new("user", "").is_blank());
        assert!(!Credentials::new("", "pass").is_blank());
    }

    #[test]
    fn test_credentials_equality() {
        let a = Credentials::new("user", "pass");
        assert_eq!(a, Credentials::new("user", "pass"));
        assert_ne!(a, Credentials::new("user", "other"));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("user@example.com", "secret123");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("user@example.com"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret123"));
    }
}
