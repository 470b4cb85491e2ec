use crate::agents::{ReviewAgent, REVIEWER_AGENT};
use crate::llm::{AgentPrompts, GenerationRequest, PromptTemplate, TextGenerator};
use crate::types::ReviewRequest;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// Functional reviewer: summarizes the intent of the change and flags
/// potential functional risks or bugs.
pub struct ReviewerAgent {
    generator: Arc<dyn TextGenerator>,
    template: PromptTemplate,
    max_patch_chars: usize,
}

impl ReviewerAgent {
    pub fn new(generator: Arc<dyn TextGenerator>, max_patch_chars: usize) -> Self {
        Self {
            generator,
            template: AgentPrompts::reviewer(),
            max_patch_chars,
        }
    }
}

#[async_trait]
impl ReviewAgent for ReviewerAgent {
    fn name(&self) -> &'static str {
        REVIEWER_AGENT
    }

    #[instrument(skip(self, request), fields(request = %request.label()))]
    async fn review(&self, request: &ReviewRequest) -> Result<String> {
        let prompt =
            AgentPrompts::build_review_prompt(&self.template, request, self.max_patch_chars);

        let response = self
            .generator
            .generate(GenerationRequest::new(
                self.template.system_instruction.clone(),
                prompt,
            ))
            .await
            .context("functional review generation failed")?;

        info!(
            tokens = response.usage.total_tokens,
            "Functional review completed"
        );

        Ok(response.text)
    }
}
