//! Runtime configuration loaded with the `config` crate

use config::{Config as Cfg, Environment, File};
use serde::Deserialize;

use crate::types::WorkshopResult;

/// Top-level configuration for the workshop core
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkshopConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub payments: PaymentConfig,
    #[serde(default)]
    pub customers: CustomerConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaymentConfig {
    /// Refuse negative values in single-invoice payment updates.
    /// Off by default: negative amounts have always been accepted there.
    #[serde(default)]
    pub reject_negative_amount_paid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CustomerConfig {
    /// Include walk-in customers when listing customers
    #[serde(default)]
    pub include_walk_in: bool,
}

impl WorkshopConfig {
    /// Load from an optional `workshop.{toml,yaml,json}` file in the working
    /// directory, overridden by `WORKSHOP__SECTION__KEY` environment variables.
    pub fn load() -> WorkshopResult<Self> {
        Self::load_from("workshop")
    }

    /// Load from an optional file with the given base name plus the environment
    pub fn load_from(file_name: &str) -> WorkshopResult<Self> {
        let config = Cfg::builder()
            .add_source(File::with_name(file_name).required(false))
            .add_source(
                Environment::with_prefix("WORKSHOP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkshopConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert!(!config.payments.reject_negative_amount_paid);
        assert!(!config.customers.include_walk_in);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = WorkshopConfig::load_from("no-such-workshop-config").unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections_deserialize() {
        let config: WorkshopConfig = serde_json::from_str(
            r#"{ "payments": { "reject_negative_amount_paid": true }, "logging": { "json": true } }"#,
        )
        .unwrap();
        assert!(config.payments.reject_negative_amount_paid);
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
        assert!(!config.customers.include_walk_in);
    }
}
