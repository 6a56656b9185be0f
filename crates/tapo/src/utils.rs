use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use tapo_core::{AesCbcSession, SessionCredentials};

/// Render session credentials as the JSON printed by `tapo handshake`.
pub fn session_json(credentials: &SessionCredentials) -> Value {
    json!({
        "session_key": credentials.session_key(),
        "cookie": credentials.cookie(),
    })
}

/// Build a cipher session from hex-encoded key and IV arguments.
pub fn cipher_session(key_hex: &str, iv_hex: &str) -> Result<AesCbcSession, String> {
    let key = hex::decode(key_hex.trim()).map_err(|e| format!("Invalid key hex: {}", e))?;
    let iv = hex::decode(iv_hex.trim()).map_err(|e| format!("Invalid IV hex: {}", e))?;
    AesCbcSession::new(&key, &iv).map_err(|e| e.to_string())
}

/// Encrypt `text` and return the ciphertext as base64.
pub fn encrypt_text(key_hex: &str, iv_hex: &str, text: &str) -> Result<String, String> {
    let session = cipher_session(key_hex, iv_hex)?;
    Ok(STANDARD.encode(session.encrypt(text.as_bytes())))
}

/// Decrypt base64 ciphertext and return the plaintext as UTF-8.
pub fn decrypt_text(key_hex: &str, iv_hex: &str, ciphertext: &str) -> Result<String, String> {
    let session = cipher_session(key_hex, iv_hex)?;
    let bytes = STANDARD
        .decode(ciphertext.trim())
        .map_err(|e| format!("Invalid base64 ciphertext: {}", e))?;
    let plaintext = session.decrypt(&bytes).map_err(|e| e.to_string())?;
    String::from_utf8(plaintext).map_err(|e| format!("Plaintext is not UTF-8: {}", e))
}
