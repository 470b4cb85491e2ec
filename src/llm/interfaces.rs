use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Generation request: a system instruction plus a single user prompt.
/// The review agents are one-shot transforms, so no conversation history
/// is carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub user_prompt: String,
}

impl GenerationRequest {
    pub fn new(system_instruction: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            user_prompt: user_prompt.into(),
        }
    }
}

/// Generation response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub text: String,
    pub usage: Usage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Text-generation capability the agents depend on.
///
/// Implementations must treat an empty candidate as an error rather than
/// returning empty text, so the retry policy upstream can engage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one generation call
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;

    /// Check if the provider is available
    async fn health_check(&self) -> Result<bool>;

    /// Model identifier used for report metadata
    fn model(&self) -> &str;
}
