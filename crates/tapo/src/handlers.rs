use std::time::Duration;

use tapo_core::{DeviceConfig, KeyPair, TapoClient};
use tracing::{debug, error};

use crate::utils::{decrypt_text, encrypt_text, session_json};

/// Handle the handshake command.
pub async fn handle_handshake(host: String, port: Option<u16>, timeout: Duration, key_bits: usize) {
    let mut config = DeviceConfig::new(host)
        .with_timeout(timeout)
        .with_key_bits(key_bits);
    if let Some(port) = port {
        config = config.with_port(port);
    }

    let client = TapoClient::connect(config);
    debug!(url = %client.app_url(), "starting handshake");

    match client.handshake().await {
        Ok(session) => println!("{}", session_json(session.credentials())),
        Err(e) => {
            error!(error = %e, "handshake failed");
            eprintln!("Error: Handshake with {} failed: {}", client.app_url(), e);
            std::process::exit(1);
        }
    }
}

/// Handle the keygen command.
pub fn handle_keygen(key_bits: usize) {
    match KeyPair::generate_with_bits(key_bits) {
        Ok(key_pair) => print!("{}", key_pair.public_key_pem()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle the encrypt command.
pub fn handle_encrypt(key: &str, iv: &str, text: &str) {
    match encrypt_text(key, iv, text) {
        Ok(ciphertext) => println!("{}", ciphertext),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle the decrypt command.
pub fn handle_decrypt(key: &str, iv: &str, ciphertext: &str) {
    match decrypt_text(key, iv, ciphertext) {
        Ok(plaintext) => println!("{}", plaintext),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
