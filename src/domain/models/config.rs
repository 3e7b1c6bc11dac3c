use serde::{Deserialize, Serialize};

/// Main configuration structure for Crucible.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Trial queue configuration
    #[serde(default)]
    pub queue: QueueConfig,

    /// Scoring oracle configuration
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Agent-under-test configuration
    #[serde(default)]
    pub agent: AgentConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            queue: QueueConfig::default(),
            oracle: OracleConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".crucible/crucible.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// How the batch validation gate treats a batch with rejected scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// One rejection discards the whole batch; nothing is persisted.
    AllOrNothing,
    /// Persist valid scenarios, surface rejected ones separately.
    AcceptValid,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::AllOrNothing
    }
}

/// Trial queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QueueConfig {
    /// Maximum concurrent trials (1-100)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Job dequeues per second (token bucket, independent of concurrency)
    #[serde(default = "default_jobs_per_second")]
    pub jobs_per_second: f64,

    /// Retry policy for failed trial handlers
    #[serde(default)]
    pub retry: RetryConfig,

    /// Terminal completed jobs retained for observability
    #[serde(default = "default_keep_completed")]
    pub keep_completed: usize,

    /// Terminal failed jobs retained for observability
    #[serde(default = "default_keep_failed")]
    pub keep_failed: usize,

    /// Batch validation policy
    #[serde(default)]
    pub validation_policy: ValidationPolicy,
}

const fn default_concurrency() -> usize {
    10
}

const fn default_jobs_per_second() -> f64 {
    5.0
}

const fn default_keep_completed() -> usize {
    1000
}

const fn default_keep_failed() -> usize {
    5000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            jobs_per_second: default_jobs_per_second(),
            retry: RetryConfig::default(),
            keep_completed: default_keep_completed(),
            keep_failed: default_keep_failed(),
            validation_policy: ValidationPolicy::default(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum attempts per job (including the first)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff delay in milliseconds, doubled per attempt
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Ceiling on the backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    2000
}

const fn default_max_backoff_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    /// Backoff before the given retry (1-based attempt just failed).
    /// Exponential doubling from the initial delay, capped at the maximum.
    pub fn backoff_ms(&self, failed_attempts: u32) -> u64 {
        let exponent = failed_attempts.saturating_sub(1).min(16);
        let delay = self.initial_backoff_ms.saturating_mul(1u64 << exponent);
        delay.min(self.max_backoff_ms)
    }
}

/// Scoring oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OracleConfig {
    /// API key (can also be set via ANTHROPIC_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model used for dimension scoring
    #[serde(default = "default_oracle_model")]
    pub model: String,

    /// Base URL for API (for testing/proxies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Oracle calls per second across all workers.
    ///
    /// Worst-case oracle concurrency is workers x 9, so this is the
    /// caller-side bound the orchestrator itself does not provide.
    #[serde(default = "default_oracle_rps")]
    pub requests_per_second: f64,

    /// Run the nine dimension assessors in parallel per trial
    #[serde(default = "default_parallel_dimensions")]
    pub parallel_dimensions: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_oracle_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

const fn default_oracle_rps() -> f64 {
    20.0
}

const fn default_parallel_dimensions() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    300
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_oracle_model(),
            base_url: None,
            requests_per_second: default_oracle_rps(),
            parallel_dimensions: default_parallel_dimensions(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Agent-under-test configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AgentConfig {
    /// API key (can also be set via ANTHROPIC_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for API (for testing/proxies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}
