use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "py-utils")]
#[command(about = "Hashing, encryption, JWT and one-time password helpers")]
pub struct CliConfig {
    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the package greeting
    Greet,
    /// MD5 hex digest of TEXT
    Md5 { text: String },
    /// SHA-256 hex digest of TEXT
    Sha256 { text: String },
    /// Random lowercase hex string
    Random {
        #[arg(default_value = "16")]
        length: usize,
    },
    /// AES-256-CBC encrypt TEXT
    Encrypt {
        text: String,
        #[arg(long)]
        key: String,
    },
    /// Decrypt an `iv:ciphertext` payload
    Decrypt {
        payload: String,
        #[arg(long)]
        key: String,
    },
    /// Sign a JSON object as a JWT
    JwtSign {
        #[arg(long, default_value = "{}")]
        payload: String,
        #[arg(long)]
        secret: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        expires_in: Option<i64>,
    },
    /// Verify a JWT and print its claims
    JwtVerify {
        token: String,
        #[arg(long)]
        secret: Option<String>,
    },
    /// Generate an OTP secret, otpauth URI and QR code
    OtpSecret { user: String, service: String },
    /// Current OTP token for SECRET
    OtpToken { secret: String },
    /// Check an OTP token
    OtpVerify {
        token: String,
        secret: String,
        #[arg(long)]
        window: Option<u32>,
    },
}
