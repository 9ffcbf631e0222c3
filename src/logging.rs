// Log filter setup shared by the binaries
//
// RUST_LOG wins when it is set and parses; otherwise the binary's default
// level applies.

use tracing_subscriber::EnvFilter;

/// Default level for the HTTP server
pub const SERVER_LOG_LEVEL: &str = "info";

/// Default level for the CLI; command output goes to stdout and stays readable
pub const CLI_LOG_LEVEL: &str = "warn";

pub fn env_filter(default_level: &str) -> EnvFilter {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_or_default(from_env.as_deref(), default_level)
}

fn filter_or_default(directives: Option<&str>, default_level: &str) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_env_level_overrides_default() {
        let filter = filter_or_default(Some("debug"), SERVER_LOG_LEVEL);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_default_when_unset_or_blank() {
        let filter = filter_or_default(None, SERVER_LOG_LEVEL);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));

        let filter = filter_or_default(Some("  "), CLI_LOG_LEVEL);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_unparsable_env_falls_back() {
        let filter = filter_or_default(Some("money_manager=loud"), CLI_LOG_LEVEL);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }
}
