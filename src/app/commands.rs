use crate::config::{Command, UtilsConfig};
use crate::encode::{crypto, JwtPayload};
use crate::utils::error::{Result, UtilsError};
use crate::utils::example_function;

/// Runs one CLI command and returns the text to print.
pub fn execute(command: &Command, config: &UtilsConfig) -> Result<String> {
    tracing::debug!("Executing command: {:?}", command);

    match command {
        Command::Greet => Ok(example_function().to_string()),
        Command::Md5 { text } => Ok(crypto::calculate_md5(text)),
        Command::Sha256 { text } => Ok(crypto::calculate_sha256(text)),
        Command::Random { length } => crypto::generate_random_string(*length),
        Command::Encrypt { text, key } => Ok(crypto::encrypt_aes(text, key)),
        Command::Decrypt { payload, key } => crypto::decrypt_aes(payload, key),
        Command::JwtSign {
            payload,
            secret,
            expires_in,
        } => {
            let claims = parse_claims(payload)?;
            let helper = config.jwt_helper(secret.as_deref())?;
            helper.generate_token(&claims, expires_in.unwrap_or_else(|| config.jwt_expires_in()))
        }
        Command::JwtVerify { token, secret } => {
            let helper = config.jwt_helper(secret.as_deref())?;
            let claims = helper.verify_token(token)?;
            Ok(serde_json::to_string_pretty(&claims)?)
        }
        Command::OtpSecret { user, service } => {
            let generated = config.otp_helper()?.new_secret(user, service)?;
            Ok(serde_json::to_string_pretty(&generated)?)
        }
        Command::OtpToken { secret } => {
            let helper = config.otp_helper()?;
            let token = helper.get_token(secret)?;
            tracing::info!("Token valid for {}s", helper.timer());
            Ok(token)
        }
        Command::OtpVerify {
            token,
            secret,
            window,
        } => {
            let result = config
                .otp_helper()?
                .verify_token_with_detail(token, secret, *window)?;
            Ok(serde_json::to_string_pretty(&result)?)
        }
    }
}

fn parse_claims(payload: &str) -> Result<JwtPayload> {
    match serde_json::from_str::<serde_json::Value>(payload)? {
        serde_json::Value::Object(claims) => Ok(claims),
        other => Err(UtilsError::validation(format!(
            "JWT payload must be a JSON object, got {}",
            other
        ))),
    }
}
