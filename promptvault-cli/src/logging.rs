//! Log output for the `pvault` binary.
//!
//! Logs go to stderr so that command output on stdout can be piped. `--debug` turns on
//! debug output; without it the level comes from `RUST_LOG`, or `warn` when that is unset.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// `--debug` wins over `RUST_LOG`, which wins over the `warn` default.
pub fn filter_directive(debug: bool, rust_log: Option<&str>) -> String {
    if debug {
        return String::from("debug");
    }
    match rust_log.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directive) => directive.to_string(),
        None => String::from("warn"),
    }
}

pub fn init_logging(debug: bool) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(debug, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_warn() {
        assert_eq!("warn", filter_directive(false, None));
        assert_eq!("warn", filter_directive(false, Some("  ")));
    }

    #[test]
    fn test_rust_log_used_without_flag() {
        assert_eq!("promptvault_core=trace", filter_directive(false, Some("promptvault_core=trace")));
    }

    #[test]
    fn test_debug_flag_overrides_rust_log() {
        assert_eq!("debug", filter_directive(true, None));
        assert_eq!("debug", filter_directive(true, Some("error")));
    }
}
