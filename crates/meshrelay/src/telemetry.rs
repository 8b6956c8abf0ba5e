//! Log subscriber bootstrap for binaries.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_level` (and to `info` if that does not parse).
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(default_level));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(default_level, "telemetry initialized");
    }
    installed
}

/// Filter used when `RUST_LOG` is unset or invalid.
fn default_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_new(default_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_uses_configured_level() {
        assert_eq!(default_filter("debug").to_string(), "debug");
        assert_eq!(default_filter("meshrelay=trace").to_string(), "meshrelay=trace");
    }

    #[test]
    fn test_unparsable_level_falls_back_to_info() {
        assert_eq!(default_filter("meshrelay=loudest").to_string(), "info");
    }

    #[test]
    fn test_second_init_is_refused() {
        // The first call may lose to another test's subscriber; the second
        // always finds one installed.
        init("meshrelay=loudest");
        assert!(!init("debug"));
    }
}
