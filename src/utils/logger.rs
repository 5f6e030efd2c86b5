use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "py_utils=info";
const VERBOSE_DIRECTIVE: &str = "py_utils=debug,info";

/// Filter directive for a configured level name such as `"WARN"`.
pub fn level_directive(level: &str) -> String {
    format!("py_utils={}", level.trim().to_ascii_lowercase())
}

/// `RUST_LOG` wins over the directive when set.
fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

fn init_compact(directive: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(directive))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

fn init_json(directive: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(directive))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .try_init();
}

pub fn init_cli_logger(verbose: bool) {
    init_compact(if verbose { VERBOSE_DIRECTIVE } else { DEFAULT_DIRECTIVE });
}

pub fn init_json_logger(verbose: bool) {
    init_json(if verbose { VERBOSE_DIRECTIVE } else { DEFAULT_DIRECTIVE });
}

/// Initializes logging at the configured `[logging] level`, info when unset.
pub fn init_from_level(level: Option<&str>, json: bool) {
    let directive = level
        .map(level_directive)
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string());
    if json {
        init_json(&directive);
    } else {
        init_compact(&directive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("warn"), "py_utils=warn");
        assert_eq!(level_directive("ERROR"), "py_utils=error");
        assert_eq!(level_directive("Trace"), "py_utils=trace");
    }

    #[test]
    fn test_level_directive_parses_as_filter() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(EnvFilter::try_new(level_directive(level)).is_ok());
        }
    }
}
