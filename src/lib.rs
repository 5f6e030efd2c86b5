//! py-utils: a collection of small utilities.
//!
//! The crate exposes the package greeting ([`example_function`]), hashing and
//! encryption helpers, JWT and TOTP helpers, and an in-memory TTL cache with
//! memoization.

#[cfg(feature = "cli")]
pub mod app;
pub mod cache;
pub mod config;
pub mod encode;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use cache::{create_memory_cache, MemoryCache, Memoizer};
pub use config::UtilsConfig;
pub use encode::{JwtHelper, JwtPayload, OtpHelper, OtpOptions};
pub use utils::error::{Result, UtilsError};
pub use utils::example_function;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
