//! Agent response model.
//!
//! A `CognitiveResponse` is produced once per trial by the agent under test
//! and is read-only afterward.

use serde::{Deserialize, Serialize};

/// Execution metadata reported alongside a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: u64,
    /// Number of reasoning cycles the agent reported
    pub reasoning_cycles: u32,
    /// Number of memory operations the agent reported
    pub memory_operations: u32,
    /// Names of tools the agent invoked, in order
    pub tool_invocations: Vec<String>,
    /// Word count of the response content
    pub word_count: usize,
}

impl ResponseMetadata {
    pub fn tool_invocation_count(&self) -> usize {
        self.tool_invocations.len()
    }
}

/// Opaque output of one agent execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveResponse {
    /// Response text
    pub content: String,
    /// Execution metadata
    pub metadata: ResponseMetadata,
}

impl CognitiveResponse {
    /// Wrap raw content, deriving the word count.
    pub fn new(content: impl Into<String>, mut metadata: ResponseMetadata) -> Self {
        let content = content.into();
        metadata.word_count = content.split_whitespace().count();
        Self { content, metadata }
    }
}
