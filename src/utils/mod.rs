pub mod error;
pub mod example;
pub mod logger;
pub mod validation;

pub use example::example_function;
