use crate::agents::{ReviewAgent, STYLE_AGENT};
use crate::llm::{AgentPrompts, GenerationRequest, PromptTemplate, TextGenerator};
use crate::types::ReviewRequest;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// Style reviewer: feedback on naming, readability and consistency.
pub struct StyleAgent {
    generator: Arc<dyn TextGenerator>,
    template: PromptTemplate,
    max_patch_chars: usize,
}

impl StyleAgent {
    pub fn new(generator: Arc<dyn TextGenerator>, max_patch_chars: usize) -> Self {
        Self {
            generator,
            template: AgentPrompts::style(),
            max_patch_chars,
        }
    }
}

#[async_trait]
impl ReviewAgent for StyleAgent {
    fn name(&self) -> &'static str {
        STYLE_AGENT
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
            .context("style review generation failed")?;

        info!(
            tokens = response.usage.total_tokens,
            "Style review completed"
        );

        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::interfaces::MockTextGenerator;
    use crate::llm::GenerationResponse;
    use crate::types::FileChange;

    #[tokio::test]
    async fn prompt_carries_the_files_summary() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .withf(|req| req.user_prompt.contains("- src/parser.rs (+12/-3)"))
            .returning(|_| {
                Ok(GenerationResponse {
                    text: "- naming is consistent".to_string(),
                    usage: Default::default(),
                })
            });

        let agent = StyleAgent::new(Arc::new(generator), 3000);
        let request = ReviewRequest::new(
            "Refactor parser",
            vec![FileChange::new("src/parser.rs", 12, 3)],
        );

        let result = agent.review(&request).await.unwrap();
        assert_eq!(result, "- naming is consistent");
    }
}
