//! HTTP adapter for the cognitive-agent port against the messages API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::domain::models::{AgentConfig, CognitiveResponse, ResponseMetadata, ToolConfig};
use crate::domain::ports::agent::{AgentError, CognitiveAgent};
use crate::infrastructure::api::types::{
    ApiMessage, MessageRequest, MessageResponse, ANTHROPIC_VERSION, DEFAULT_BASE_URL,
};

const AGENT_MAX_TOKENS: u32 = 4096;

/// Cognitive agent backed by an Anthropic-compatible messages endpoint.
///
/// The model under test varies per trial, so the model id comes from the
/// scenario rather than this client's configuration.
pub struct HttpCognitiveAgent {
    http: Client,
    api_key: String,
    base_url: String,
    timeout_secs: u64,
}

impl HttpCognitiveAgent {
    /// # Errors
    /// Fails when no API key is configured or the HTTP client cannot be
    /// built.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                AgentError::NotConfigured(
                    "no agent API key: set agent.api_key or ANTHROPIC_API_KEY".to_string(),
                )
            })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| AgentError::NotConfigured(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs: config.timeout_secs,
        })
    }
}

/// System prompt describing which auxiliary capabilities the trial grants.
fn tool_system_prompt(tool_config: &ToolConfig) -> String {
    let mut granted = Vec::new();
    if tool_config.web_search {
        granted.push("web search");
    }
    if tool_config.code_execution {
        granted.push("code execution");
    }
    if tool_config.memory_tools {
        granted.push("persistent memory tools");
    }
    if tool_config.file_access {
        granted.push("file access");
    }
    if granted.is_empty() {
        "You are completing a business analysis task. No auxiliary tools are available; \
         work from the task content alone."
            .to_string()
    } else {
        format!(
            "You are completing a business analysis task. Available capabilities: {}.",
            granted.join(", ")
        )
    }
}

#[async_trait]
impl CognitiveAgent for HttpCognitiveAgent {
    async fn execute(
        &self,
        task_prompt: &str,
        model_id: &str,
        tool_config: &ToolConfig,
    ) -> Result<CognitiveResponse, AgentError> {
        let body = MessageRequest {
            model: model_id.to_string(),
            max_tokens: AGENT_MAX_TOKENS,
            system: Some(tool_system_prompt(tool_config)),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: task_prompt.to_string(),
            }],
        };

        let started = Instant::now();
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
                    AgentError::Timeout(self.timeout_secs)
                } else {
                    AgentError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimitExceeded(body),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::NotConfigured(body),
                _ => AgentError::ExecutionFailed(format!("{status}: {body}")),
            });
        }

        let message: MessageResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ExecutionFailed(e.to_string()))?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            model_id,
            elapsed_ms,
            output_tokens = message.usage.output_tokens,
            "agent response received"
        );

        let metadata = ResponseMetadata {
            processing_time_ms: elapsed_ms,
            reasoning_cycles: 1,
            memory_operations: 0,
            tool_invocations: Vec::new(),
            word_count: 0,
        };
        Ok(CognitiveResponse::new(message.text(), metadata))
    }
}
