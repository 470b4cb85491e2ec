use crate::agents::{ReviewAgent, SECURITY_AGENT};
use crate::llm::prompts::{NO_CONCERNS_MARKER, NO_VERIFIED_FINDINGS};
use crate::llm::{AgentPrompts, GenerationRequest, PromptTemplate, TextGenerator};
use crate::search::{SearchHit, SearchProvider};
use crate::types::ReviewRequest;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

const MAX_CONCERNS: usize = 3;

/// Security reviewer. Two generation calls bracket a search phase:
/// the first turns the change into candidate concerns phrased as search
/// queries, the second writes the review grounded in whatever evidence
/// the searches returned. A concern whose search fails is dropped as
/// unverified rather than reported on faith, and the final text may only
/// cite URLs that appear in the gathered evidence.
pub struct SecurityAgent {
    generator: Arc<dyn TextGenerator>,
    search: Option<Arc<dyn SearchProvider>>,
    triage_template: PromptTemplate,
    findings_template: PromptTemplate,
    max_patch_chars: usize,
}

struct ConcernEvidence {
    query: String,
    hits: Vec<SearchHit>,
}

impl SecurityAgent {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        search: Option<Arc<dyn SearchProvider>>,
        max_patch_chars: usize,
    ) -> Self {
        Self {
            generator,
            search,
            triage_template: AgentPrompts::security_triage(),
            findings_template: AgentPrompts::security_findings(),
            max_patch_chars,
        }
    }

    /// First generation call: candidate concerns as search queries,
    /// one per line.
    async fn triage_concerns(&self, request: &ReviewRequest) -> Result<Vec<String>> {
        let prompt = AgentPrompts::build_review_prompt(
            &self.triage_template,
            request,
            self.max_patch_chars,
        );

        let response = self
            .generator
            .generate(GenerationRequest::new(
                self.triage_template.system_instruction.clone(),
                prompt,
            ))
            .await
            .context("security triage generation failed")?;

        let queries: Vec<String> = response
            .text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && *line != NO_CONCERNS_MARKER)
            .map(|line| line.trim_start_matches(['-', '*', ' ']).to_string())
            .take(MAX_CONCERNS)
            .collect();

        Ok(queries)
    }

    /// Runs one search per concern concurrently. A failed search yields
    /// no evidence for that concern; it never fails the agent.
    async fn gather_evidence(&self, queries: Vec<String>) -> Vec<ConcernEvidence> {
        let search = match &self.search {
            Some(search) => search.clone(),
            None => return Vec::new(),
        };

        let searches = queries.into_iter().map(|query| {
            let search = search.clone();
            async move {
                match search.search(&query).await {
                    Ok(hits) => ConcernEvidence { query, hits },
                    Err(e) => {
                        warn!(query = %query, error = %e, "Search failed, concern stays unverified");
                        ConcernEvidence {
                            query,
                            hits: Vec::new(),
                        }
                    }
                }
            }
        });

        join_all(searches)
            .await
            .into_iter()
            .filter(|evidence| !evidence.hits.is_empty())
            .collect()
    }

    fn render_evidence(evidence: &[ConcernEvidence]) -> String {
        evidence
            .iter()
            .map(|concern| {
                let hits = concern
                    .hits
                    .iter()
                    .map(|hit| format!("- [{}]({}): {}", hit.title, hit.url, hit.snippet))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("Concern: {}\n{}", concern.query, hits)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Rejects output citing a URL that is not in the gathered evidence.
    fn verify_citations(text: &str, evidence: &[ConcernEvidence]) -> Result<()> {
        let known: HashSet<&str> = evidence
            .iter()
            .flat_map(|concern| concern.hits.iter().map(|hit| hit.url.as_str()))
            .collect();

        let link = Regex::new(r"\[[^\]]*\]\(([^)]+)\)").expect("valid regex");
        for capture in link.captures_iter(text) {
            let url = capture[1].trim();
            if !known.contains(url) {
                anyhow::bail!("security review cited a source not present in the evidence: {url}");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ReviewAgent for SecurityAgent {
    fn name(&self) -> &'static str {
        SECURITY_AGENT
    }

    #[instrument(skip(self, request), fields(request = %request.label()))]
    async fn review(&self, request: &ReviewRequest) -> Result<String> {
        if self.search.is_none() {
            info!("Search is disabled, no concern can be verified");
            return Ok(NO_VERIFIED_FINDINGS.to_string());
        }

        let queries = self.triage_concerns(request).await?;
        if queries.is_empty() {
            info!("Triage raised no plausible security concerns");
            return Ok(NO_VERIFIED_FINDINGS.to_string());
        }

        info!(concerns = queries.len(), "Verifying candidate concerns");
        let evidence = self.gather_evidence(queries).await;
        if evidence.is_empty() {
            info!("No concern could be verified against search results");
            return Ok(NO_VERIFIED_FINDINGS.to_string());
        }

        let prompt = AgentPrompts::build_review_prompt(
            &self.findings_template,
            request,
            self.max_patch_chars,
        )
        .replace("{evidence}", &Self::render_evidence(&evidence));

        let response = self
            .generator
            .generate(GenerationRequest::new(
                self.findings_template.system_instruction.clone(),
                prompt,
            ))
            .await
            .context("security findings generation failed")?;

        Self::verify_citations(&response.text, &evidence)?;

        info!(
            verified_concerns = evidence.len(),
            tokens = response.usage.total_tokens,
            "Security review completed"
        );

        Ok(response.text)
    }
}
