use crate::utils::error::{Result, UtilsError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_positive_number<T>(field_name: &str, value: T, min_value: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if value < min_value {
        return Err(UtilsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(UtilsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(UtilsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.iter().any(|candidate| candidate.eq_ignore_ascii_case(value)) {
        return Ok(());
    }
    Err(UtilsError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: format!("Allowed values: {}", allowed.join(", ")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("otp.step", 30u64, 1).is_ok());
        assert!(validate_positive_number("otp.step", 0u64, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("otp.digits", 6u32, 1, 10).is_ok());
        assert!(validate_range("otp.digits", 11u32, 1, 10).is_err());
        assert!(validate_range("otp.digits", 0u32, 1, 10).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("jwt.secret", "s3cret").is_ok());
        assert!(validate_non_empty_string("jwt.secret", "   ").is_err());
    }

    #[test]
    fn test_validate_one_of_is_case_insensitive() {
        assert!(validate_one_of("otp.algorithm", "SHA256", &["sha1", "sha256"]).is_ok());
        let err = validate_one_of("otp.algorithm", "md5", &["sha1", "sha256"]).unwrap_err();
        assert!(err.to_string().contains("sha1, sha256"));
    }
}
