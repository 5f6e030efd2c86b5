pub mod crypto;
pub mod jwt;
pub mod otp;

pub use jwt::{JwtHelper, JwtPayload};
pub use otp::{OtpAlgorithm, OtpHelper, OtpOptions, OtpSecret, VerifyResult};
