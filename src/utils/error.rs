use thiserror::Error;

#[derive(Error, Debug)]
pub enum UtilsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigError { field: String, message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Crypto error: {message}")]
    CryptoError { message: String },

    #[error("Encrypted payload must contain IV and ciphertext separated by ':'")]
    InvalidPayload,

    #[error("TOKEN_EXPIRED")]
    TokenExpired,

    #[error("TOKEN_NOT_ACTIVE")]
    TokenNotActive,

    #[error("{0}")]
    InvalidToken(String),

    #[error("OTP error: {message}")]
    OtpError { message: String },

    #[error("QR code error: {0}")]
    QrCodeError(String),
}

impl UtilsError {
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::CryptoError {
            message: message.into(),
        }
    }

    pub fn otp(message: impl Into<String>) -> Self {
        Self::OtpError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// Exit code used by the CLI when this error terminates a command.
    pub fn exit_code(&self) -> i32 {
        match self {
            UtilsError::ConfigError { .. } | UtilsError::InvalidConfigValueError { .. } => 2,
            UtilsError::TokenExpired | UtilsError::TokenNotActive | UtilsError::InvalidToken(_) => 3,
            UtilsError::IoError(_) => 4,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, UtilsError>;
