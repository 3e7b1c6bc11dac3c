//! HTTP adapter for the scoring oracle port against the messages API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::domain::models::OracleConfig;
use crate::domain::ports::oracle::{OracleError, OracleReply, OracleRequest, ScoringOracle};
use crate::infrastructure::api::rate_limiter::TokenBucketRateLimiter;
use crate::infrastructure::api::types::{
    ApiMessage, MessageRequest, MessageResponse, ANTHROPIC_VERSION, DEFAULT_BASE_URL,
};

const ORACLE_MAX_TOKENS: u32 = 1024;

/// Scoring oracle backed by an Anthropic-compatible messages endpoint.
///
/// One `invoke` is one HTTP round trip; rate limiting is enforced here so
/// the bound holds across all workers sharing the client.
pub struct HttpScoringOracle {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout_secs: u64,
    limiter: TokenBucketRateLimiter,
}

impl HttpScoringOracle {
    /// # Errors
    /// Fails when no API key is configured or the HTTP client cannot be
    /// built.
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                OracleError::NotConfigured(
                    "no oracle API key: set oracle.api_key or ANTHROPIC_API_KEY".to_string(),
                )
            })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| OracleError::NotConfigured(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            limiter: TokenBucketRateLimiter::new(config.requests_per_second),
        })
    }
}

#[async_trait]
impl ScoringOracle for HttpScoringOracle {
    async fn invoke(&self, request: OracleRequest) -> Result<OracleReply, OracleError> {
        self.limiter.acquire().await;

        let body = MessageRequest {
            model: self.model.clone(),
            max_tokens: ORACLE_MAX_TOKENS,
            system: Some(format!("{}\n\n{}", request.system_prompt, request.output_shape)),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: request.user_message,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(self.timeout_secs)
                } else {
                    OracleError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "oracle request rejected");
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => OracleError::RateLimitExceeded(body),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    OracleError::NotConfigured(body)
                }
                _ => OracleError::InvocationFailed(format!("{status}: {body}")),
            });
        }

        let message: MessageResponse = response
            .json()
            .await
            .map_err(|e| OracleError::InvocationFailed(e.to_string()))?;
        let text = message.text();
        debug!(
            output_tokens = message.usage.output_tokens,
            "oracle reply received"
        );

        // Clean JSON becomes a structured reply; anything else is handed to
        // the assessor as text for extraction.
        Ok(match serde_json::from_str(&text) {
            Ok(value) => OracleReply::Structured(value),
            Err(_) => OracleReply::Text(text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_not_configured() {
        let config = OracleConfig {
            api_key: None,
            ..Default::default()
        };
        if std::env::var("ANTHROPIC_API_KEY").is_err() {
            assert!(matches!(
                HttpScoringOracle::new(&config),
                Err(OracleError::NotConfigured(_))
            ));
        }
    }

    #[test]
    fn test_explicit_key_accepted() {
        let config = OracleConfig {
            api_key: Some("sk-test".to_string()),
            base_url: Some("http://localhost:9999".to_string()),
            ..Default::default()
        };
        assert!(HttpScoringOracle::new(&config).is_ok());
    }
}
