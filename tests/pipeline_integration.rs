use anyhow::Result;
use async_trait::async_trait;
use pr_review_pipeline::agents::ReviewPipeline;
use pr_review_pipeline::config::Config;
use pr_review_pipeline::error::PipelineError;
use pr_review_pipeline::llm::{GenerationRequest, GenerationResponse, TextGenerator, Usage};
use pr_review_pipeline::reports::renderer::{
    DETAILS_LABEL, REVIEWER_HEADING, SECURITY_HEADING, STYLE_HEADING, SUMMARY_HEADING,
};
use pr_review_pipeline::search::{SearchHit, SearchProvider};
use pr_review_pipeline::summary::NO_FILES_PLACEHOLDER;
use pr_review_pipeline::types::{FileChange, ReviewRequest};
use std::sync::{Arc, Mutex};

const REVIEWER_TEXT: &str = "- adds a retry wrapper around the upload call";
const STYLE_TEXT: &str = "- `doThing` should be `do_thing`";
const SUMMARY_TEXT: &str =
    "The change is low risk. Rename the helper and add a regression test before merge.";
const TRIAGE_QUERY: &str = "unvalidated file path in upload handler path traversal";
const FINDINGS_TEXT: &str = "Path traversal via the unvalidated upload path. Canonicalize and \
     reject escapes. Sources: [Path Traversal](https://owasp.org/www-community/attacks/Path_Traversal)";
const EVIDENCE_URL: &str = "https://owasp.org/www-community/attacks/Path_Traversal";

/// Scripted generator: dispatches on the prompt text, records every
/// request it sees.
struct ScriptedGenerator {
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    fail_all: bool,
}

impl ScriptedGenerator {
    fn new() -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            fail_all: false,
        }
    }

    fn failing() -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            fail_all: true,
        }
    }

    fn seen_prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.user_prompt.clone())
            .collect()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if self.fail_all {
            anyhow::bail!("generation unavailable");
        }

        let text = if request.system_instruction.contains("security reviewer") {
            if request.user_prompt.contains("Candidate concerns") {
                FINDINGS_TEXT.to_string()
            } else {
                TRIAGE_QUERY.to_string()
            }
        } else if request.system_instruction.contains("style reviewer") {
            STYLE_TEXT.to_string()
        } else if request.system_instruction.contains("executive summary") {
            SUMMARY_TEXT.to_string()
        } else {
            REVIEWER_TEXT.to_string()
        };

        Ok(GenerationResponse {
            text,
            usage: Usage::default(),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail_all)
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

struct ScriptedSearch;

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>> {
        Ok(vec![SearchHit {
            title: "Path Traversal".to_string(),
            url: EVIDENCE_URL.to_string(),
            snippet: "An attacker escapes the intended directory".to_string(),
        }])
    }
}

struct FailingSearch;

#[async_trait]
impl SearchProvider for FailingSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>> {
        anyhow::bail!("search rate limited")
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.pipeline.agent_timeout_seconds = 5;
    config.pipeline.max_retries = 0;
    config.pipeline.deadline_seconds = 30;
    config
}

fn request() -> ReviewRequest {
    ReviewRequest::new(
        "Add file upload endpoint",
        vec![
            FileChange::new("src/upload.rs", 80, 0).with_patch("+fn upload(path: &str) {}"),
            FileChange::new("src/routes.rs", 5, 1),
        ],
    )
}

#[tokio::test]
async fn pipeline_produces_a_well_formed_merged_document() {
    let generator = Arc::new(ScriptedGenerator::new());
    let pipeline = ReviewPipeline::new(
        generator.clone(),
        Some(Arc::new(ScriptedSearch)),
        &test_config(),
    );

    let report = pipeline.run(request()).await.unwrap();

    // join invariant: every slot populated before synthesis ran
    assert_eq!(report.session.reviewer_result, REVIEWER_TEXT);
    assert_eq!(report.session.style_result, STYLE_TEXT);
    assert_eq!(report.session.security_result, FINDINGS_TEXT);

    // mandated headings each appear exactly once, in fixed order
    let doc = &report.markdown;
    for heading in [
        SUMMARY_HEADING,
        DETAILS_LABEL,
        STYLE_HEADING,
        REVIEWER_HEADING,
        SECURITY_HEADING,
    ] {
        assert_eq!(doc.matches(heading).count(), 1, "heading: {heading}");
    }
    assert!(doc.find(STYLE_HEADING).unwrap() < doc.find(REVIEWER_HEADING).unwrap());
    assert!(doc.find(REVIEWER_HEADING).unwrap() < doc.find(SECURITY_HEADING).unwrap());

    assert_eq!(report.summary, SUMMARY_TEXT);
    assert_eq!(report.model, "scripted-model");
}

#[tokio::test]
async fn security_output_is_embedded_byte_for_byte() {
    let pipeline = ReviewPipeline::new(
        Arc::new(ScriptedGenerator::new()),
        Some(Arc::new(ScriptedSearch)),
        &test_config(),
    );

    let report = pipeline.run(request()).await.unwrap();

    // the standalone security result and its citation survive the merge
    // unmodified
    assert!(report.markdown.contains(&report.session.security_result));
    assert!(report
        .markdown
        .contains("[Path Traversal](https://owasp.org/www-community/attacks/Path_Traversal)"));
}

#[tokio::test]
async fn empty_request_still_produces_a_well_formed_document() {
    let generator = Arc::new(ScriptedGenerator::new());
    let pipeline = ReviewPipeline::new(
        generator.clone(),
        Some(Arc::new(ScriptedSearch)),
        &test_config(),
    );

    let report = pipeline
        .run(ReviewRequest::new("", vec![]))
        .await
        .unwrap();

    assert!(report.markdown.starts_with(SUMMARY_HEADING));
    assert_eq!(report.markdown.matches(SECURITY_HEADING).count(), 1);
    assert!(report.markdown.trim_end().ends_with("</details>"));

    // the agents were prompted with the fixed placeholder instead of a
    // file list
    let prompts = generator.seen_prompts();
    assert!(prompts
        .iter()
        .any(|prompt| prompt.contains(NO_FILES_PLACEHOLDER)));
}

#[tokio::test]
async fn failed_searches_degrade_to_the_fixed_no_findings_text() {
    let pipeline = ReviewPipeline::new(
        Arc::new(ScriptedGenerator::new()),
        Some(Arc::new(FailingSearch)),
        &test_config(),
    );

    let report = pipeline.run(request()).await.unwrap();

    assert_eq!(
        report.session.security_result,
        "No search-verified security findings were identified for this change."
    );
    // the pipeline still completes and merges the other two reviews
    assert_eq!(report.session.reviewer_result, REVIEWER_TEXT);
    assert_eq!(report.session.style_result, STYLE_TEXT);
}

#[tokio::test]
async fn generation_failure_fails_the_run_instead_of_merging_partial_state() {
    let pipeline = ReviewPipeline::new(
        Arc::new(ScriptedGenerator::failing()),
        Some(Arc::new(ScriptedSearch)),
        &test_config(),
    );

    let error = pipeline.run(request()).await.unwrap_err();

    assert!(matches!(error, PipelineError::AgentFailed { .. }));
    assert!(error.agent().is_some());
}
