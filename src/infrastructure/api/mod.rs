//! HTTP adapters for the oracle and agent ports.

pub mod agent_client;
pub mod oracle_client;
pub mod rate_limiter;
pub mod types;

pub use agent_client::HttpCognitiveAgent;
pub use oracle_client::HttpScoringOracle;
pub use rate_limiter::TokenBucketRateLimiter;
