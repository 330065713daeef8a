//! Diagnostic logging setup

use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "CRYSENSE_LOG";

/// Filter used when `CRYSENSE_LOG` is unset
fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "crysense=debug,warn",
        _ => "crysense=trace,debug",
    }
}

/// Install the stderr log subscriber.
///
/// `CRYSENSE_LOG` wins over `-v` so a filter can be pinned per environment.
pub fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_crate_level() {
        assert_eq!(default_directive(0), "warn");
        assert!(default_directive(1).contains("crysense=debug"));
        assert!(default_directive(3).contains("crysense=trace"));
    }

    #[test]
    fn directives_parse() {
        for verbose in 0..3 {
            assert!(EnvFilter::try_new(default_directive(verbose)).is_ok());
        }
    }
}
