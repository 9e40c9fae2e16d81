//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

use crate::settings::LoggingConfig;

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` wins over `config.level`. Safe to call multiple times
/// (subsequent calls are no-ops).
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    // A subscriber may already be installed (tests, embedding binaries)
    if config.json {
        builder.json().try_init().ok();
    } else {
        builder.try_init().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        init(&config);
        init(&LoggingConfig {
            json: true,
            ..config
        });
    }
}
