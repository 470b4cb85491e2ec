use crate::agents::synthesis::Synthesizer;
use crate::agents::{
    EventBus, ReviewAgent, ReviewerAgent, SecurityAgent, StyleAgent, SynthesisAgent,
    SYNTHESIS_AGENT,
};
use crate::config::{Config, PipelineSettings};
use crate::error::PipelineError;
use crate::llm::TextGenerator;
use crate::search::SearchProvider;
use crate::types::{AgentEvent, PipelineReport, ReviewRequest, SessionState};
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Orchestrates one review run: a fixed three-way fan-out over the
/// reviewer, security and style agents, a join that constructs the
/// session state, then the synthesis step. The join is the only
/// synchronization point; each agent fills exactly one slot it owns.
pub struct ReviewPipeline {
    reviewer: Arc<dyn ReviewAgent>,
    security: Arc<dyn ReviewAgent>,
    style: Arc<dyn ReviewAgent>,
    synthesizer: Arc<dyn Synthesizer>,
    generator: Arc<dyn TextGenerator>,
    event_bus: Arc<EventBus>,
    settings: PipelineSettings,
}

#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub components: Vec<ComponentHealth>,
    pub timestamp: chrono::DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub name: String,
    pub healthy: bool,
}

impl ReviewPipeline {
    /// Build the pipeline from configuration, wiring the three fan-out
    /// agents and the synthesizer to the given providers.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        search: Option<Arc<dyn SearchProvider>>,
        config: &Config,
    ) -> Self {
        let max_patch_chars = config.generation.max_patch_chars;

        Self {
            reviewer: Arc::new(ReviewerAgent::new(generator.clone(), max_patch_chars)),
            security: Arc::new(SecurityAgent::new(
                generator.clone(),
                search,
                max_patch_chars,
            )),
            style: Arc::new(StyleAgent::new(generator.clone(), max_patch_chars)),
            synthesizer: Arc::new(SynthesisAgent::new(generator.clone())),
            generator,
            event_bus: Arc::new(EventBus::new()),
            settings: config.pipeline.clone(),
        }
    }

    /// Assemble a pipeline from already-built parts.
    pub fn from_parts(
        reviewer: Arc<dyn ReviewAgent>,
        security: Arc<dyn ReviewAgent>,
        style: Arc<dyn ReviewAgent>,
        synthesizer: Arc<dyn Synthesizer>,
        generator: Arc<dyn TextGenerator>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            reviewer,
            security,
            style,
            synthesizer,
            generator,
            event_bus: Arc::new(EventBus::new()),
            settings,
        }
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    /// Run the full pipeline for one review request. Returns either a
    /// complete report or an error naming the stage that failed; a
    /// partially merged document is never produced.
    #[instrument(skip(self, request), fields(request = %request.label(), files = request.files.len()))]
    pub async fn run(&self, request: ReviewRequest) -> Result<PipelineReport, PipelineError> {
        let deadline = Duration::from_secs(self.settings.deadline_seconds);

        match timeout(deadline, self.run_inner(&request)).await {
            Ok(result) => result,
            Err(_) => {
                self.publish(
                    "pipeline",
                    "pipeline_deadline_exceeded",
                    serde_json::json!({
                        "deadline_seconds": self.settings.deadline_seconds,
                    }),
                )
                .await;

                Err(PipelineError::DeadlineExceeded {
                    seconds: self.settings.deadline_seconds,
                })
            }
        }
    }

    async fn run_inner(&self, request: &ReviewRequest) -> Result<PipelineReport, PipelineError> {
        let started = std::time::Instant::now();
        info!("Starting review pipeline");

        self.publish(
            "pipeline",
            "pipeline_started",
            serde_json::json!({
                "request": request.label(),
                "files": request.files.len(),
                "additions": request.total_additions(),
                "deletions": request.total_deletions(),
            }),
        )
        .await;

        // Fan-out: three independent tasks, joined before synthesis.
        // The session state only exists once all three have completed.
        let (reviewer_result, security_result, style_result) = tokio::try_join!(
            self.run_agent_with_retry(self.reviewer.as_ref(), request),
            self.run_agent_with_retry(self.security.as_ref(), request),
            self.run_agent_with_retry(self.style.as_ref(), request),
        )?;

        let session = SessionState::new(reviewer_result, security_result, style_result);
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "All three agents joined, starting synthesis"
        );

        let review = self.synthesize_with_retry(&session).await?;

        let report = PipelineReport {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            model: self.generator.model().to_string(),
            summary: review.summary,
            session,
            markdown: review.markdown,
        };

        self.publish(
            "pipeline",
            "pipeline_completed",
            serde_json::json!({
                "report_id": report.id,
                "elapsed_ms": started.elapsed().as_millis() as u64,
            }),
        )
        .await;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Review pipeline completed"
        );

        Ok(report)
    }

    /// One fan-out slot: per-attempt timeout, linear sleep between
    /// attempts, distinct error variants for timeout and failure.
    async fn run_agent_with_retry(
        &self,
        agent: &dyn ReviewAgent,
        request: &ReviewRequest,
    ) -> Result<String, PipelineError> {
        let attempt_timeout = Duration::from_secs(self.settings.agent_timeout_seconds);
        let attempts = self.settings.max_retries + 1;
        let mut last_error: Option<PipelineError> = None;

        for attempt in 1..=attempts {
            match timeout(attempt_timeout, agent.review(request)).await {
                Ok(Ok(result)) => {
                    self.publish(
                        agent.name(),
                        "agent_completed",
                        serde_json::json!({ "attempt": attempt }),
                    )
                    .await;
                    return Ok(result);
                }
                Ok(Err(e)) => {
                    warn!(
                        agent = agent.name(),
                        attempt, error = %e,
                        "Agent attempt failed"
                    );
                    last_error = Some(PipelineError::AgentFailed {
                        agent: agent.name(),
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(_) => {
                    warn!(
                        agent = agent.name(),
                        attempt,
                        timeout_seconds = self.settings.agent_timeout_seconds,
                        "Agent attempt timed out"
                    );
                    last_error = Some(PipelineError::AgentTimeout {
                        agent: agent.name(),
                        seconds: self.settings.agent_timeout_seconds,
                    });
                }
            }

            if attempt < attempts {
                tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
            }
        }

        let error = last_error.unwrap_or(PipelineError::AgentTimeout {
            agent: agent.name(),
            seconds: self.settings.agent_timeout_seconds,
        });

        self.publish(
            agent.name(),
            "agent_failed",
            serde_json::json!({
                "attempts": attempts,
                "timed_out": error.is_timeout(),
            }),
        )
        .await;

        Err(error)
    }

    async fn synthesize_with_retry(
        &self,
        session: &SessionState,
    ) -> Result<crate::agents::synthesis::SynthesizedReview, PipelineError> {
        let attempts = self.settings.max_retries + 1;
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.synthesizer.synthesize(session).await {
                Ok(review) => {
                    self.publish(
                        SYNTHESIS_AGENT,
                        "agent_completed",
                        serde_json::json!({ "attempt": attempt }),
                    )
                    .await;
                    return Ok(review);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Synthesis attempt failed");
                    last_error = Some(e);
                }
            }

            if attempt < attempts {
                tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
            }
        }

        Err(PipelineError::SynthesisFailed {
            attempts,
            source: last_error
                .unwrap_or_else(|| anyhow::anyhow!("synthesis failed with no recorded error")),
        })
    }

    async fn publish(&self, agent_name: &str, event_type: &str, data: serde_json::Value) {
        let event = AgentEvent::new(agent_name, event_type, data);
        // an event that cannot be published must not abort a running review
        if let Err(e) = self.event_bus.publish(event).await {
            warn!(error = %e, "Failed to publish pipeline event");
        }
    }

    /// Check the generation provider the agents depend on.
    pub async fn health_check(&self) -> HealthStatus {
        let generation_healthy = self.generator.health_check().await.unwrap_or(false);

        HealthStatus {
            healthy: generation_healthy,
            components: vec![ComponentHealth {
                name: "generation".to_string(),
                healthy: generation_healthy,
            }],
            timestamp: Utc::now(),
        }
    }
}
