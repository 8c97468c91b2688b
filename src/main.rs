use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rsa_vault::{CryptoConfig, Salt, StoredKeyPair};

/// Block RSA text encryption with passphrase-protected private keys
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a key pair and print the stored record as JSON
    Keygen {
        /// Bits per prime (modulus is twice this)
        #[arg(long, default_value_t = 512)]
        bits: u32,

        #[arg(long, env = "RSA_VAULT_PASSPHRASE", hide_env_values = true)]
        passphrase: String,

        /// Write the record here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Encrypt text with a stored record's public key
    Encrypt {
        #[arg(long)]
        key: PathBuf,

        /// Text to encrypt; read from stdin when omitted
        text: Option<String>,
    },

    /// Decrypt a payload with a stored record's private key
    Decrypt {
        #[arg(long)]
        key: PathBuf,

        #[arg(long, env = "RSA_VAULT_PASSPHRASE", hide_env_values = true)]
        passphrase: String,

        /// Payload to decrypt; read from stdin when omitted
        payload: Option<String>,
    },

    /// Change the passphrase protecting a stored record
    Rewrap {
        #[arg(long)]
        key: PathBuf,

        #[arg(long, env = "RSA_VAULT_PASSPHRASE", hide_env_values = true)]
        passphrase: String,

        #[arg(long)]
        new_passphrase: String,
    },

    /// Print a fresh base64 salt
    Salt,
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

fn load_record(path: &PathBuf) -> Result<StoredKeyPair> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read key file {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("{} is not a stored key pair", path.display()))
}

fn write_record(record: &StoredKeyPair, out: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(record)?;
    match out {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = CryptoConfig::default();

    match cli.command {
        Command::Keygen { bits, passphrase, out } => {
            let config = config.with_prime_bits(bits);
            let (record, _) = StoredKeyPair::create(&passphrase, &config)
                .context("key generation failed")?;
            write_record(&record, out.as_ref())
        }
        Command::Encrypt { key, text } => {
            let record = load_record(&key)?;
            let text = match text {
                Some(text) => text,
                None => read_stdin()?,
            };
            let payload = record
                .public_key()
                .context("stored public key is invalid")?
                .encrypt(&text)
                .context("encryption failed")?;
            println!("{}", payload);
            Ok(())
        }
        Command::Decrypt { key, passphrase, payload } => {
            let record = load_record(&key)?;
            let payload = match payload {
                Some(payload) => payload,
                None => read_stdin()?,
            };
            let keypair = record
                .unlock(&passphrase, &config)
                .context("could not unlock private key")?;
            let text = keypair
                .private_key
                .decrypt(payload.trim())
                .context("decryption failed")?;
            println!("{}", text);
            Ok(())
        }
        Command::Rewrap { key, passphrase, new_passphrase } => {
            let record = load_record(&key)?;
            let updated = record
                .change_passphrase(&passphrase, &new_passphrase, &config)
                .context("could not rewrap private key")?;
            write_record(&updated, Some(&key))
        }
        Command::Salt => {
            println!("{}", Salt::generate().to_base64());
            Ok(())
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
