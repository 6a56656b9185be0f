use clap::Parser;

mod cli;
mod handlers;
mod utils;

use cli::{Cli, Command};
use handlers::{handle_decrypt, handle_encrypt, handle_handshake, handle_keygen};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    match cli.command {
        Command::Version => {
            println!("tapo {}", env!("CARGO_PKG_VERSION"));
            println!("tapo-core {}", tapo_core::VERSION);
        }

        Command::Handshake {
            host,
            port,
            timeout,
            key_bits,
        } => handle_handshake(host, port, timeout, key_bits).await,

        Command::Keygen { key_bits } => handle_keygen(key_bits),

        Command::Encrypt { key, iv, text } => handle_encrypt(&key, &iv, &text),

        Command::Decrypt {
            key,
            iv,
            ciphertext,
        } => handle_decrypt(&key, &iv, &ciphertext),
    }
}
