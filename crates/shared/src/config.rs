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
    /// Bookkeeping rules.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Grading rules.
    #[serde(default)]
    pub academics: AcademicsConfig,
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
    /// Database connection URL.
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

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Largest allowed gap between total debits and credits, in minor units.
    #[serde(default = "default_rounding_tolerance")]
    pub rounding_tolerance_minor: i64,
    /// Prefix used when numbering journal entries.
    #[serde(default = "default_entry_number_prefix")]
    pub entry_number_prefix: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rounding_tolerance_minor: default_rounding_tolerance(),
            entry_number_prefix: default_entry_number_prefix(),
        }
    }
}

fn default_rounding_tolerance() -> i64 {
    1
}

fn default_entry_number_prefix() -> String {
    "JE".to_string()
}

/// Academics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AcademicsConfig {
    /// Maximum continuous-assessment score.
    #[serde(default = "default_ca_max")]
    pub ca_weight_max: u32,
    /// Maximum examination score.
    #[serde(default = "default_exam_max")]
    pub exam_weight_max: u32,
}

impl Default for AcademicsConfig {
    fn default() -> Self {
        Self {
            ca_weight_max: default_ca_max(),
            exam_weight_max: default_exam_max(),
        }
    }
}

fn default_ca_max() -> u32 {
    40
}

fn default_exam_max() -> u32 {
    60
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, lowest precedence first: `config/default`, `config/{RUN_MODE}`,
    /// then `SCHOLARIS__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("SCHOLARIS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
