use crate::llm::{AgentPrompts, GenerationRequest, PromptTemplate, TextGenerator};
use crate::reports::render_merged_document;
use crate::types::SessionState;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// The synthesized review: the generated summary plus the rendered
/// merged document.
#[derive(Debug, Clone)]
pub struct SynthesizedReview {
    pub summary: String,
    pub markdown: String,
}

/// Merge step. Only the 2-3 sentence summary is generated; headings,
/// ordering and the collapsible wrapper come from the report template,
/// with each agent's result embedded verbatim.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, session: &SessionState) -> Result<SynthesizedReview>;
}

pub struct SynthesisAgent {
    generator: Arc<dyn TextGenerator>,
    template: PromptTemplate,
}

impl SynthesisAgent {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            template: AgentPrompts::synthesis(),
        }
    }
}

#[async_trait]
impl Synthesizer for SynthesisAgent {
    #[instrument(skip(self, session))]
    async fn synthesize(&self, session: &SessionState) -> Result<SynthesizedReview> {
        let prompt = AgentPrompts::build_synthesis_prompt(&self.template, session);

        let response = self
            .generator
            .generate(GenerationRequest::new(
                self.template.system_instruction.clone(),
                prompt,
            ))
            .await
            .context("synthesis summary generation failed")?;

        let summary = response.text.trim().to_string();
        let markdown = render_merged_document(&summary, session);

        info!(
            tokens = response.usage.total_tokens,
            "Synthesis completed"
        );

        Ok(SynthesizedReview { summary, markdown })
    }
}
