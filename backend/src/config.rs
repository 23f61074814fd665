//! Configuration management for the Dining Waste Tracker
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with DWT_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::ImpactFactors;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Scan log storage configuration
    pub storage: StorageConfig,

    /// External vision estimator configuration
    pub estimator: EstimatorConfig,

    /// Weight-to-impact conversion factors
    pub impact: ImpactFactors,

    /// Report windowing configuration
    pub reporting: ReportingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Where scan records live
    pub backend: StorageBackend,

    /// PostgreSQL connection URL, required for the postgres backend
    pub database_url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EstimatorConfig {
    /// API key; the primary estimator is disabled without one
    pub api_key: Option<String>,

    /// Base URL of the generative vision API
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// Upper bound on one estimator round-trip
    pub timeout_secs: u64,
}

impl EstimatorConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportingConfig {
    /// Offset defining the local calendar day for reports
    pub utc_offset_minutes: i32,

    /// School used when a request omits one
    pub default_school_id: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("DWT_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("storage.backend", "memory")?
            .set_default("storage.max_connections", 10)?
            .set_default("storage.min_connections", 2)?
            .set_default(
                "estimator.endpoint",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("estimator.model", "gemini-1.5-flash")?
            .set_default("estimator.timeout_secs", 30)?
            .set_default("impact.cost_per_lb", 5.50)?
            .set_default("impact.co2_per_lb", 2.0)?
            .set_default("impact.water_per_lb", 25.0)?
            .set_default("impact.lbs_per_meal", 0.75)?
            .set_default("reporting.utc_offset_minutes", 0)?
            .set_default("reporting.default_school_id", shared::DEFAULT_SCHOOL_ID)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (DWT_ prefix)
            .add_source(
                Environment::with_prefix("DWT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Postgres && self.storage.database_url.is_none() {
            return Err(ConfigError::Message(
                "storage.database_url is required for the postgres backend".into(),
            ));
        }
        if self.reporting.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::Message(
                "reporting.utc_offset_minutes must be within one day".into(),
            ));
        }
        if self.estimator.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "estimator.timeout_secs must be at least 1".into(),
            ));
        }

        let factors = [
            ("impact.cost_per_lb", self.impact.cost_per_lb),
            ("impact.co2_per_lb", self.impact.co2_per_lb),
            ("impact.water_per_lb", self.impact.water_per_lb),
        ];
        for (key, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Message(format!(
                    "{} must be a non-negative number",
                    key
                )));
            }
        }
        // divisor
        if !self.impact.lbs_per_meal.is_finite() || self.impact.lbs_per_meal <= 0.0 {
            return Err(ConfigError::Message(
                "impact.lbs_per_meal must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
impl Config {
    /// In-memory, fallback-only configuration
    pub fn for_tests() -> Self {
        Self {
            environment: "test".into(),
            server: ServerConfig::default(),
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                database_url: None,
                max_connections: 1,
                min_connections: 1,
            },
            estimator: EstimatorConfig {
                api_key: None,
                endpoint: "http://localhost".into(),
                model: "test".into(),
                timeout_secs: 1,
            },
            impact: ImpactFactors::default(),
            reporting: ReportingConfig {
                utc_offset_minutes: 0,
                default_school_id: shared::DEFAULT_SCHOOL_ID.into(),
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
        }
    }
}
