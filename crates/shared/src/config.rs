//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Bank statement import and matching configuration.
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
    /// Posting defaults.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`postgres://...` or `sqlite://...`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default)]
    pub filter: Option<String>,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// Reconciliation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Maximum distance in days between a bank row and a document it may match.
    #[serde(default = "default_date_tolerance_days")]
    pub date_tolerance_days: i64,
    /// Minimum description score (0-100) needed to break a tie between candidates.
    #[serde(default = "default_min_description_score")]
    pub min_description_score: u32,
    /// Maximum number of rows accepted by a single import call.
    #[serde(default = "default_max_import_rows")]
    pub max_import_rows: usize,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            date_tolerance_days: default_date_tolerance_days(),
            min_description_score: default_min_description_score(),
            max_import_rows: default_max_import_rows(),
        }
    }
}

fn default_date_tolerance_days() -> i64 {
    14
}

fn default_min_description_score() -> u32 {
    50
}

fn default_max_import_rows() -> usize {
    10_000
}

/// Posting defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerConfig {
    /// Tax rate code applied to new invoices and expenses that name none.
    #[serde(default)]
    pub default_tax_code: Option<String>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `TALLY__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_applies_defaults() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("sqlite::memory:")),
                ("RUN_MODE", Some("unit-test")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "sqlite::memory:");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.reconciliation.date_tolerance_days, 14);
                assert_eq!(config.reconciliation.min_description_score, 50);
                assert!(!config.logging.json);
                assert!(config.ledger.default_tax_code.is_none());
            },
        );
    }

    #[test]
    fn test_load_reads_nested_environment_overrides() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally")),
                ("TALLY__RECONCILIATION__DATE_TOLERANCE_DAYS", Some("7")),
                ("TALLY__LEDGER__DEFAULT_TAX_CODE", Some("HST-ON")),
                ("RUN_MODE", Some("unit-test")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/tally");
                assert_eq!(config.reconciliation.date_tolerance_days, 7);
                assert_eq!(config.ledger.default_tax_code.as_deref(), Some("HST-ON"));
            },
        );
    }

    #[test]
    fn test_load_requires_database_url() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("unit-test")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
