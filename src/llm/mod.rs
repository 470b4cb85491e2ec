pub mod providers;
pub mod prompts;
pub mod interfaces;

pub use providers::{GeminiGenerator, GeneratorFactory, OpenAiCompatGenerator};
pub use prompts::{AgentPrompts, PromptTemplate};
pub use interfaces::{GenerationRequest, GenerationResponse, TextGenerator, Usage};
