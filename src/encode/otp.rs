//! Time-based one-time passwords (RFC 6238) with provisioning QR codes.

use crate::utils::error::{Result, UtilsError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use data_encoding::{Encoding, BASE32_NOPAD};
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use subtle::ConstantTimeEq;
use url::form_urlencoded;

/// Secret size handed out by [`OtpHelper::new_secret`]; encodes to 32 base32 characters.
const SECRET_BYTES: usize = 20;

/// Largest digit count a 31-bit truncated HMAC can fill.
const MAX_DIGITS: u32 = 10;

/// Unpadded base32 that ignores the unused low bits of the final character.
static BASE32_SECRET: Lazy<Encoding> = Lazy::new(|| {
    let mut spec = BASE32_NOPAD.specification();
    spec.check_trailing_bits = false;
    spec.encoding().unwrap_or_else(|_| BASE32_NOPAD.clone())
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpAlgorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

impl OtpAlgorithm {
    fn hmac(&self, key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
        fn run<M: Mac + hmac::digest::KeyInit>(key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
            let mut mac = <M as Mac>::new_from_slice(key)
                .map_err(|e| UtilsError::otp(format!("invalid HMAC key: {}", e)))?;
            mac.update(message);
            Ok(mac.finalize().into_bytes().to_vec())
        }

        match self {
            OtpAlgorithm::Sha1 => run::<Hmac<Sha1>>(key, message),
            OtpAlgorithm::Sha256 => run::<Hmac<Sha256>>(key, message),
            OtpAlgorithm::Sha512 => run::<Hmac<Sha512>>(key, message),
        }
    }
}

impl fmt::Display for OtpAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OtpAlgorithm::Sha1 => "SHA1",
            OtpAlgorithm::Sha256 => "SHA256",
            OtpAlgorithm::Sha512 => "SHA512",
        };
        f.write_str(name)
    }
}

impl FromStr for OtpAlgorithm {
    type Err = UtilsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(OtpAlgorithm::Sha1),
            "sha256" => Ok(OtpAlgorithm::Sha256),
            "sha512" => Ok(OtpAlgorithm::Sha512),
            other => Err(UtilsError::otp(format!("Unsupported hash algorithm: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpOptions {
    /// Number of steps accepted on either side of the current one.
    pub window: u32,
    /// Step length in seconds.
    pub step: u64,
    pub algorithm: OtpAlgorithm,
    pub digits: u32,
}

impl Default for OtpOptions {
    fn default() -> Self {
        Self {
            window: 1,
            step: 30,
            algorithm: OtpAlgorithm::Sha1,
            digits: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpSecret {
    pub secret: String,
    pub otpauth: String,
    /// PNG QR code of `otpauth` as a data URL.
    pub image_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerifyResult {
    pub is_valid: bool,
    /// Seconds elapsed in the current step, only set for valid tokens.
    pub delta: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct OtpHelper {
    options: OtpOptions,
}

impl OtpHelper {
    pub fn new(options: OtpOptions) -> Result<Self> {
        if options.step == 0 {
            return Err(UtilsError::otp("step must be a positive integer"));
        }
        if options.digits == 0 || options.digits > MAX_DIGITS {
            return Err(UtilsError::otp(format!(
                "digits must be between 1 and {}",
                MAX_DIGITS
            )));
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &OtpOptions {
        &self.options
    }

    /// Generates a random secret with its otpauth URI and a QR code for it.
    pub fn new_secret(&self, user: &str, service: &str) -> Result<OtpSecret> {
        let mut raw = [0u8; SECRET_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut raw);
        let secret = BASE32_NOPAD.encode(&raw);

        let otpauth = self.provisioning_uri(&secret, user, service)?;
        let png = render_qr_png(&otpauth)?;
        let image_url = format!("data:image/png;base64,{}", STANDARD.encode(png));

        tracing::debug!("Generated OTP secret for {} ({})", user, service);
        Ok(OtpSecret {
            secret,
            otpauth,
            image_url,
        })
    }

    /// Builds the `otpauth://totp/...` URI understood by authenticator apps.
    pub fn provisioning_uri(&self, secret: &str, user: &str, service: &str) -> Result<String> {
        let defaults = OtpOptions::default();
        let mut params = vec![
            ("secret", secret.to_string()),
            ("issuer", service.to_string()),
        ];
        if self.options.algorithm != defaults.algorithm {
            params.push(("algorithm", self.options.algorithm.to_string()));
        }
        if self.options.digits != defaults.digits {
            params.push(("digits", self.options.digits.to_string()));
        }
        if self.options.step != defaults.step {
            params.push(("period", self.options.step.to_string()));
        }

        let query = params
            .iter()
            .map(|(name, value)| format!("{}={}", name, percent_encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!(
            "otpauth://totp/{}:{}?{}",
            percent_encode(service),
            percent_encode(user),
            query
        ))
    }

    /// Seconds left in the current step, in `1..=step`.
    pub fn timer(&self) -> u64 {
        self.options.step - now() % self.options.step
    }

    pub fn get_token(&self, secret: &str) -> Result<String> {
        self.token_at(secret, now())
    }

    /// Token for the step containing `timestamp` (Unix seconds).
    pub fn token_at(&self, secret: &str, timestamp: u64) -> Result<String> {
        let key = decode_secret(secret)?;
        self.hotp(&key, timestamp / self.options.step)
    }

    /// Checks `token` against the current step, `window` steps either side
    /// (the configured window when `None`).
    pub fn verify_token(&self, token: &str, secret: &str, window: Option<u32>) -> Result<bool> {
        self.verify_token_at(token, secret, window, now())
    }

    pub fn verify_token_at(
        &self,
        token: &str,
        secret: &str,
        window: Option<u32>,
        timestamp: u64,
    ) -> Result<bool> {
        let key = decode_secret(secret)?;
        let window = u64::from(window.unwrap_or(self.options.window));
        let counter = timestamp / self.options.step;

        let first = counter.saturating_sub(window);
        let last = counter.saturating_add(window);
        let mut matched = false;
        for candidate in first..=last {
            let expected = self.hotp(&key, candidate)?;
            matched |= bool::from(token.as_bytes().ct_eq(expected.as_bytes()));
        }
        Ok(matched)
    }

    pub fn verify_token_with_detail(
        &self,
        token: &str,
        secret: &str,
        window: Option<u32>,
    ) -> Result<VerifyResult> {
        let timestamp = now();
        let is_valid = self.verify_token_at(token, secret, window, timestamp)?;
        Ok(VerifyResult {
            is_valid,
            delta: is_valid.then(|| timestamp % self.options.step),
        })
    }

    /// RFC 4226 value for `counter`, zero-padded to the configured digits.
    fn hotp(&self, key: &[u8], counter: u64) -> Result<String> {
        let hash = self.options.algorithm.hmac(key, &counter.to_be_bytes())?;
        let offset = usize::from(hash[hash.len() - 1] & 0x0f);
        let binary = u32::from_be_bytes([
            hash[offset] & 0x7f,
            hash[offset + 1],
            hash[offset + 2],
            hash[offset + 3],
        ]);
        let code = u64::from(binary) % 10u64.pow(self.options.digits);
        Ok(format!("{:0width$}", code, width = self.options.digits as usize))
    }
}

/// Percent-encodes a label part or query value, spaces as `%20`.
fn percent_encode(value: &str) -> String {
    // byte_serialize writes spaces as "+" and a literal "+" as %2B
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Accepts lowercase, spaced or padded base32 as produced by most issuers.
fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if normalized.is_empty() {
        return Err(UtilsError::otp("secret cannot be empty"));
    }
    BASE32_SECRET
        .decode(normalized.as_bytes())
        .map_err(|e| UtilsError::otp(format!("invalid base32 secret: {}", e)))
}

fn render_qr_png(data: &str) -> Result<Vec<u8>> {
    let code =
        qrcode::QrCode::new(data.as_bytes()).map_err(|e| UtilsError::QrCodeError(e.to_string()))?;
    let image = code.render::<image::Luma<u8>>().build();

    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| UtilsError::QrCodeError(e.to_string()))?;
    Ok(png)
}
