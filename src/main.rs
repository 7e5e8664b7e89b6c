// PMZ RSA command line
// Key generation, key inspection and file encryption/decryption

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pmz_rsa::config::{RsaConfig, DEFAULT_PRIME_ROUNDS, DEFAULT_PUBLIC_EXPONENT};
use pmz_rsa::rsa::{generate_key, load_key, save_key, RsaCipher, RsaKey};
use pmz_rsa::util::format_file_size;
use pmz_rsa::TimeSeededRng;

#[derive(Parser, Debug)]
#[command(name = "pmz-rsa", version, about = "Textbook RSA key generation and file encryption")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a private key file
    Genkey {
        file: PathBuf,
        bits: usize,

        /// Public exponent, decimal or 0x-prefixed hex
        #[arg(long, default_value_t = DEFAULT_PUBLIC_EXPONENT, value_parser = parse_exponent)]
        exponent: u32,

        /// Miller-Rabin rounds per prime candidate
        #[arg(long, default_value_t = DEFAULT_PRIME_ROUNDS)]
        rounds: u32,

        /// Seed a reproducible, non-cryptographic generator instead of the OS-seeded one
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Write the public half of a private key file
    Publickey { private: PathBuf, public: PathBuf },

    /// Check a key file for structural validity
    Checkkey {
        file: PathBuf,

        #[arg(long, default_value_t = DEFAULT_PRIME_ROUNDS)]
        rounds: u32,
    },

    /// Encrypt a file
    Encrypt {
        key: PathBuf,
        input: PathBuf,
        output: PathBuf,
    },

    /// Decrypt a file with a private key
    Decrypt {
        key: PathBuf,
        input: PathBuf,
        output: PathBuf,
    },
}

fn parse_exponent(s: &str) -> std::result::Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid exponent {:?}: {}", s, e))
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> Result<RsaKey> {
    load_key(path).with_context(|| format!("failed to load key from {}", path.display()))
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Genkey {
            file,
            bits,
            exponent,
            rounds,
            seed,
        } => {
            let config = RsaConfig::default()
                .with_public_exponent(exponent)
                .with_prime_rounds(rounds);
            let key = match seed {
                Some(seed) => generate_key(bits, &config, &mut TimeSeededRng::seed(seed)),
                None => generate_key(bits, &config, &mut rand::thread_rng()),
            }
            .context("key generation failed")?;

            save_key(&RsaKey::Private(key), &file)
                .with_context(|| format!("failed to save key to {}", file.display()))?;
            println!("Generated {}-bit key in {}", bits, file.display());
        }

        Command::Publickey { private, public } => {
            let key = load(&private)?.demote();
            save_key(&key, &public)
                .with_context(|| format!("failed to save key to {}", public.display()))?;
            println!("Wrote public key to {}", public.display());
        }

        Command::Checkkey { file, rounds } => {
            let key = load(&file)?;
            if !key.is_valid(rounds) {
                bail!("{} key in {} is not valid", key.kind(), file.display());
            }
            println!("{} key in {} is valid ({} bits)", key.kind(), file.display(), key.bits());
        }

        Command::Encrypt { key, input, output } => {
            let key = load(&key)?;
            let cipher = RsaCipher::new(&key)?;
            let stats = cipher
                .encrypt_file(&input, &output)
                .with_context(|| format!("failed to encrypt {}", input.display()))?;
            println!(
                "Encrypted {} into {} blocks ({})",
                format_file_size(stats.bytes_in),
                stats.blocks,
                format_file_size(stats.bytes_out)
            );
        }

        Command::Decrypt { key, input, output } => {
            let key = load(&key)?;
            let cipher = RsaCipher::new(&key)?;
            let stats = cipher
                .decrypt_file(&input, &output)
                .with_context(|| format!("failed to decrypt {}", input.display()))?;
            println!(
                "Decrypted {} blocks into {}",
                stats.blocks,
                format_file_size(stats.bytes_out)
            );
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
