/// Greeting returned by [`example_function`].
pub const GREETING: &str = "Hello from py-utils!";

/// Placeholder utility that returns the package greeting.
pub fn example_function() -> &'static str {
    GREETING
}
