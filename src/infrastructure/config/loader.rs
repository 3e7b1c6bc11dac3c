use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid concurrency: {0}. Must be between 1 and 100")]
    InvalidConcurrency(usize),

    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid max_attempts: {0}. Cannot be 0")]
    InvalidMaxAttempts(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Oracle model cannot be empty")]
    EmptyOracleModel,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. .crucible/config.yaml (project config, created by init)
    /// 3. .crucible/local.yaml (local overrides, optional)
    /// 4. Environment variables (`CRUCIBLE_*` prefix)
    ///
    /// Configuration is project-local so multiple experiments can live on
    /// one machine.
    ///
    /// # Errors
    /// Fails on unparseable files or invalid values.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".crucible/config.yaml"))
            .merge(Yaml::file(".crucible/local.yaml"))
            .merge(Env::prefixed("CRUCIBLE_").split("__"))
            .extract()
            .context("Failed to extract configuration")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    /// Fails when the file cannot be parsed or fails validation.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.queue.concurrency == 0 || config.queue.concurrency > 100 {
            return Err(ConfigError::InvalidConcurrency(config.queue.concurrency));
        }
        if config.queue.jobs_per_second <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(config.queue.jobs_per_second));
        }
        if config.oracle.requests_per_second <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(
                config.oracle.requests_per_second,
            ));
        }
        if config.queue.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(
                config.queue.retry.max_attempts,
            ));
        }
        if config.queue.retry.initial_backoff_ms > config.queue.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.queue.retry.initial_backoff_ms,
                config.queue.retry.max_backoff_ms,
            ));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.oracle.model.is_empty() {
            return Err(ConfigError::EmptyOracleModel);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        assert!(ConfigLoader::validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_invalid_concurrency_rejected() {
        let mut config = Config::default();
        config.queue.concurrency = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidConcurrency(0))
        ));

        config.queue.concurrency = 101;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_invalid_backoff_rejected() {
        let mut config = Config::default();
        config.queue.retry.initial_backoff_ms = 10_000;
        config.queue.retry.max_backoff_ms = 1_000;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff(10_000, 1_000))
        ));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "queue:\n  concurrency: 4\n  jobs_per_second: 2.5\noracle:\n  parallel_dimensions: false"
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.queue.concurrency, 4);
        assert!((config.queue.jobs_per_second - 2.5).abs() < f64::EPSILON);
        assert!(!config.oracle.parallel_dimensions);
        // Untouched sections keep defaults
        assert_eq!(config.queue.retry.max_attempts, 3);
    }

    #[test]
    fn test_load_from_file_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "queue:\n  concurrency: 0\n").unwrap();
        assert!(ConfigLoader::load_from_file(&path).is_err());
    }
}
