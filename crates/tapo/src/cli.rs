use std::time::Duration;

use clap::{Parser, Subcommand};
use tapo_core::crypto::DEFAULT_KEY_BITS;

pub fn parse_duration(arg: &str) -> Result<Duration, std::num::ParseIntError> {
    let seconds = arg.parse()?;
    Ok(Duration::from_secs(seconds))
}

/// TP-Link Tapo smart plug handshake client
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show version information for CLI and core library
    Version,

    /// Perform a handshake and print the session key and cookie
    Handshake {
        /// Target hostname or IP address.
        /// Can also be set via TAPO_HOST environment variable.
        #[arg(env = "TAPO_HOST")]
        host: String,

        /// Target port (default: 80)
        #[arg(short, long)]
        port: Option<u16>,

        /// Request timeout in seconds
        #[arg(long, value_parser = parse_duration, default_value = "1")]
        timeout: Duration,

        /// RSA key size in bits
        #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
        key_bits: usize,
    },

    /// Generate an RSA key pair and print the public key PEM
    Keygen {
        /// RSA key size in bits
        #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
        key_bits: usize,
    },

    /// Encrypt text with AES-CBC and print it as base64
    Encrypt {
        /// AES key as hex (16, 24 or 32 bytes)
        #[arg(long)]
        key: String,

        /// Initialization vector as hex (16 bytes)
        #[arg(long)]
        iv: String,

        /// Plaintext to encrypt
        text: String,
    },

    /// Decrypt base64 AES-CBC ciphertext and print the plaintext
    Decrypt {
        /// AES key as hex (16, 24 or 32 bytes)
        #[arg(long)]
        key: String,

        /// Initialization vector as hex (16 bytes)
        #[arg(long)]
        iv: String,

        /// Base64 ciphertext
        ciphertext: String,
    },
}
