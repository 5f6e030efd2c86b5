use crate::cache::{memo::DEFAULT_MAX_LOCKS, MemoryCache, Memoizer, DEFAULT_TTL};
use crate::encode::jwt::DEFAULT_EXPIRES_IN_SECONDS;
use crate::encode::{JwtHelper, OtpHelper, OtpOptions};
use crate::utils::error::{Result, UtilsError};
use crate::utils::validation::{
    validate_non_empty_string, validate_one_of, validate_positive_number, validate_range, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UtilsConfig {
    pub jwt: Option<JwtConfig>,
    pub otp: Option<OtpOptions>,
    pub cache: Option<CacheConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub default_ttl_seconds: Option<u64>,
    pub prefix: Option<String>,
    pub max_locks: Option<usize>,
    pub use_lock: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl UtilsConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| UtilsError::ConfigError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with its environment value; unset variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| UtilsError::ConfigError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(jwt) = &self.jwt {
            validate_non_empty_string("jwt.secret", &jwt.secret)?;
            if jwt.secret.starts_with("${") {
                return Err(UtilsError::InvalidConfigValueError {
                    field: "jwt.secret".to_string(),
                    value: jwt.secret.clone(),
                    reason: "Environment variable is not set".to_string(),
                });
            }
        }

        if let Some(otp) = &self.otp {
            validate_positive_number("otp.step", otp.step, 1)?;
            validate_range("otp.digits", otp.digits, 1, 10)?;
        }

        if let Some(cache) = &self.cache {
            if let Some(max_locks) = cache.max_locks {
                validate_positive_number("cache.max_locks", max_locks, 1)?;
            }
        }

        if let Some(level) = self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            validate_one_of(
                "logging.level",
                level,
                &["trace", "debug", "info", "warn", "error"],
            )?;
        }

        Ok(())
    }

    pub fn jwt_secret(&self) -> Option<&str> {
        self.jwt.as_ref().map(|j| j.secret.as_str())
    }

    pub fn jwt_expires_in(&self) -> i64 {
        self.jwt
            .as_ref()
            .and_then(|j| j.expires_in_seconds)
            .unwrap_or(DEFAULT_EXPIRES_IN_SECONDS)
    }

    pub fn otp_options(&self) -> OtpOptions {
        self.otp.unwrap_or_default()
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache
            .as_ref()
            .and_then(|c| c.default_ttl_seconds)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TTL)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    /// JWT helper keyed by `secret_override` or, failing that, `jwt.secret`.
    pub fn jwt_helper(&self, secret_override: Option<&str>) -> Result<JwtHelper> {
        let secret = secret_override
            .or_else(|| self.jwt_secret())
            .ok_or_else(|| UtilsError::ConfigError {
                field: "jwt.secret".to_string(),
                message: "No JWT secret configured; pass --secret or set [jwt] secret".to_string(),
            })?;
        validate_non_empty_string("jwt.secret", secret)?;
        Ok(JwtHelper::new(secret))
    }

    pub fn otp_helper(&self) -> Result<OtpHelper> {
        OtpHelper::new(self.otp_options())
    }

    /// Memoizer over a fresh store using the `[cache]` settings.
    pub fn memoizer<V: Clone>(&self) -> Memoizer<V> {
        let cache = self.cache.as_ref();
        let prefix = cache.and_then(|c| c.prefix.clone()).unwrap_or_default();
        Memoizer::new(Arc::new(MemoryCache::new()), self.cache_ttl(), prefix)
            .with_locking(cache.and_then(|c| c.use_lock).unwrap_or(true))
            .with_max_locks(cache.and_then(|c| c.max_locks).unwrap_or(DEFAULT_MAX_LOCKS))
    }
}

impl Validate for UtilsConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::OtpAlgorithm;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[jwt]
secret = "s3cret"
expires_in_seconds = 120

[otp]
window = 2
step = 60
algorithm = "sha256"
digits = 8

[cache]
default_ttl_seconds = 5
prefix = "svc"
max_locks = 100

[logging]
level = "debug"
json = true
"#;

        let config = UtilsConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.jwt_secret(), Some("s3cret"));
        assert_eq!(config.jwt_expires_in(), 120);
        assert_eq!(
            config.otp_options(),
            OtpOptions {
                window: 2,
                step: 60,
                algorithm: OtpAlgorithm::Sha256,
                digits: 8,
            }
        );
        assert_eq!(config.cache_ttl(), Duration::from_secs(5));
        assert_eq!(config.log_level(), Some("debug"));
        assert!(config.json_logs());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = UtilsConfig::from_toml_str("").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.otp_options(), OtpOptions::default());
        assert_eq!(config.cache_ttl(), DEFAULT_TTL);
        assert_eq!(config.jwt_expires_in(), DEFAULT_EXPIRES_IN_SECONDS);
        assert!(config.jwt_helper(None).is_err());
        assert!(config.jwt_helper(Some("cli-secret")).is_ok());
    }

    #[test]
    fn test_partial_otp_section_fills_defaults() {
        let config = UtilsConfig::from_toml_str("[otp]\ndigits = 8\n").unwrap();
        let options = config.otp_options();
        assert_eq!(options.digits, 8);
        assert_eq!(options.step, 30);
        assert_eq!(options.window, 1);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PY_UTILS_TEST_JWT_SECRET", "from-env");

        let config = UtilsConfig::from_toml_str(
            "[jwt]\nsecret = \"${PY_UTILS_TEST_JWT_SECRET}\"\n",
        )
        .unwrap();
        assert_eq!(config.jwt_secret(), Some("from-env"));

        std::env::remove_var("PY_UTILS_TEST_JWT_SECRET");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let config =
            UtilsConfig::from_toml_str("[jwt]\nsecret = \"${PY_UTILS_TEST_UNSET_VAR}\"\n").unwrap();
        assert_eq!(config.jwt_secret(), Some("${PY_UTILS_TEST_UNSET_VAR}"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        let bad_step = UtilsConfig::from_toml_str("[otp]\nstep = 0\n").unwrap();
        assert!(bad_step.validate().is_err());

        let bad_level = UtilsConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(bad_level.validate().is_err());

        assert!(UtilsConfig::from_toml_str("[otp]\nalgorithm = \"md5\"\n").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[cache]\nprefix = \"file\"\ndefault_ttl_seconds = 0\n")
            .unwrap();

        let config = UtilsConfig::from_file(temp_file.path()).unwrap();
        let memo = config.memoizer::<u32>();
        assert_eq!(memo.ttl(), Duration::ZERO);
        assert_eq!(memo.key_for("f", &1), "file:f:1");
    }
}
