use thiserror::Error;

/// Failure modes surfaced at the pipeline boundary.
///
/// Agent and client internals carry `anyhow` context; the orchestrator maps
/// exhausted retry budgets and elapsed deadlines into these variants so a
/// caller can tell a timeout apart from a generation failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("agent '{agent}' failed after {attempts} attempt(s): {source}")]
    AgentFailed {
        agent: &'static str,
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("agent '{agent}' timed out after {seconds}s")]
    AgentTimeout { agent: &'static str, seconds: u64 },

    #[error("pipeline exceeded its overall deadline of {seconds}s")]
    DeadlineExceeded { seconds: u64 },

    #[error("synthesis failed after {attempts} attempt(s): {source}")]
    SynthesisFailed {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    /// Name of the agent the error is attributed to, if any.
    pub fn agent(&self) -> Option<&'static str> {
        match self {
            PipelineError::AgentFailed { agent, .. } => Some(agent),
            PipelineError::AgentTimeout { agent, .. } => Some(agent),
            PipelineError::SynthesisFailed { .. } => Some("synthesis"),
            PipelineError::DeadlineExceeded { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            PipelineError::AgentTimeout { .. } | PipelineError::DeadlineExceeded { .. }
        )
    }
}
