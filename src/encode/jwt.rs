//! HS256 JSON Web Token helpers.

use crate::utils::error::{Result, UtilsError};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};

/// Claims carried by a token.
pub type JwtPayload = Map<String, Value>;

pub const DEFAULT_EXPIRES_IN_SECONDS: i64 = 3600;

#[derive(Clone)]
pub struct JwtHelper {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHelper {
    pub fn new(secret_key: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret_key.as_bytes()),
            algorithm: Algorithm::HS256,
        }
    }

    /// Signs `payload` with an `exp` claim `expires_in_seconds` from now.
    ///
    /// A negative lifetime produces a token that is already expired.
    pub fn generate_token(&self, payload: &JwtPayload, expires_in_seconds: i64) -> Result<String> {
        let mut claims = payload.clone();
        let exp = Utc::now().timestamp() + expires_in_seconds;
        claims.insert("exp".to_string(), Value::from(exp));
        self.encode(&claims)
    }

    pub fn generate_token_default(&self, payload: &JwtPayload) -> Result<String> {
        self.generate_token(payload, DEFAULT_EXPIRES_IN_SECONDS)
    }

    /// Verifies signature and time claims, distinguishing expiry from other failures.
    pub fn verify_token(&self, token: &str) -> Result<JwtPayload> {
        let claims = decode::<JwtPayload>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT verification failed: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => UtilsError::TokenExpired,
                    ErrorKind::ImmatureSignature => UtilsError::TokenNotActive,
                    _ => UtilsError::InvalidToken("INVALID_TOKEN".to_string()),
                }
            })?;

        if has_reached_expiry(&claims) {
            tracing::debug!("JWT verification failed: token expires this second");
            return Err(UtilsError::TokenExpired);
        }
        Ok(claims)
    }

    /// Reads the payload without checking the signature or expiry.
    pub fn decode_token(&self, token: &str) -> Option<JwtPayload> {
        let mut validation = Validation::new(self.algorithm);
        validation.insecure_disable_signature_validation();
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        decode::<JwtPayload>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .ok()
    }

    /// True when the token cannot be read, has no numeric `exp`, or `exp` is in the past.
    pub fn is_token_expired(&self, token: &str) -> bool {
        let Some(claims) = self.decode_token(token) else {
            return true;
        };
        match claims.get("exp").and_then(Value::as_f64) {
            Some(exp) => exp < now_seconds(),
            None => true,
        }
    }

    /// Signs `payload` as-is, without adding an expiry.
    pub fn encode(&self, payload: &JwtPayload) -> Result<String> {
        encode(&Header::new(self.algorithm), payload, &self.encoding_key)
            .map_err(|e| UtilsError::crypto(format!("token signing failed: {}", e)))
    }

    /// Verifies the signature; any failure is reported as a generic invalid token.
    pub fn decode(&self, token: &str) -> Result<JwtPayload> {
        let claims = decode::<JwtPayload>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT decode failed: {}", e);
                UtilsError::InvalidToken("Invalid token".to_string())
            })?;

        if has_reached_expiry(&claims) {
            return Err(UtilsError::InvalidToken("Invalid token".to_string()));
        }
        Ok(claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        // exp/nbf are checked when present but not required
        validation.required_spec_claims.clear();
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation
    }
}

fn now_seconds() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// An `exp` equal to the current time already counts as expired.
fn has_reached_expiry(claims: &JwtPayload) -> bool {
    claims
        .get("exp")
        .and_then(Value::as_f64)
        .is_some_and(|exp| exp <= now_seconds())
}
