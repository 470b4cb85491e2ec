pub mod events;
pub mod orchestrator;
pub mod reviewer;
pub mod security;
pub mod style;
pub mod synthesis;

use crate::types::ReviewRequest;
use anyhow::Result;
use async_trait::async_trait;

pub use events::EventBus;
pub use orchestrator::ReviewPipeline;
pub use reviewer::ReviewerAgent;
pub use security::SecurityAgent;
pub use style::StyleAgent;
pub use synthesis::SynthesisAgent;

pub const REVIEWER_AGENT: &str = "reviewer";
pub const SECURITY_AGENT: &str = "security";
pub const STYLE_AGENT: &str = "style";
pub const SYNTHESIS_AGENT: &str = "synthesis";

/// A fan-out review agent: accepts a review request, returns Markdown
/// text. Agents are stateless between calls and never see each other's
/// output.
#[async_trait]
pub trait ReviewAgent: Send + Sync {
    fn name(&self) -> &'static str;

    async fn review(&self, request: &ReviewRequest) -> Result<String>;
}
