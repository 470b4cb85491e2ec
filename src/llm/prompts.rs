use crate::summary::format_files_summary;
use crate::types::{ReviewRequest, SessionState};

/// Emitted by the security agent when nothing could be verified against
/// search results. The findings template instructs the model to use this
/// exact sentence, and the zero-evidence path emits it directly.
pub const NO_VERIFIED_FINDINGS: &str =
    "No search-verified security findings were identified for this change.";

/// Marker line a triage response uses when the change raises no plausible
/// security concerns.
pub const NO_CONCERNS_MARKER: &str = "NONE";

/// Prompt template for an agent: a fixed system instruction plus a user
/// prompt with `{placeholder}` slots.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub system_instruction: String,
    pub user_prompt_template: String,
}

/// Collection of prompts for all agents
pub struct AgentPrompts;

impl AgentPrompts {
    /// Functional reviewer prompt
    pub fn reviewer() -> PromptTemplate {
        PromptTemplate {
            system_instruction: r#"You are a senior software engineer reviewing a pull request. You are precise, concrete and brief, and you only comment on what the change in front of you actually does."#.to_string(),

            user_prompt_template: r#"Review the following pull request.

{files_summary}

PR description:
{description}

Patches:
{patches}

Summarize the intent of this change in at most 3 bullet points. Then list up to 3 potential functional risks or bugs, one sentence each. Finish with exactly one concrete improvement suggestion. Respond in concise Markdown."#.to_string(),
        }
    }

    /// Security triage prompt: turns the change into candidate concerns
    /// phrased as web search queries, one per line.
    pub fn security_triage() -> PromptTemplate {
        PromptTemplate {
            system_instruction: r#"You are an application security reviewer. You never invent vulnerabilities; you only raise concerns that are plausible for the change in front of you."#.to_string(),

            user_prompt_template: r#"A pull request is under security review.

{files_summary}

PR description:
{description}

Patches:
{patches}

Identify up to 3 plausible security concerns introduced or touched by this change. For each concern, respond with one focused web search query suitable for verifying it, one query per line. Respond with the query lines only, no numbering and no commentary. If the change raises no plausible security concern, respond with the single word: NONE"#.to_string(),
        }
    }

    /// Security findings prompt: writes the review grounded in gathered
    /// search evidence, citing sources verbatim.
    pub fn security_findings() -> PromptTemplate {
        PromptTemplate {
            system_instruction: r#"You are an application security reviewer. You report only findings supported by the evidence you are given, and you cite sources exactly as provided."#.to_string(),

            user_prompt_template: r#"A pull request is under security review.

{files_summary}

PR description:
{description}

Candidate concerns and the web evidence gathered for them:

{evidence}

Write the security review. Report only concerns the evidence above supports, at most 3. For each reported concern give a one-sentence explanation and a short remediation tip, then cite its supporting sources as clickable Markdown links, copying each link title and URL verbatim from the evidence. Do not cite anything that does not appear in the evidence. If the evidence supports none of the concerns, respond with exactly: No search-verified security findings were identified for this change."#.to_string(),
        }
    }

    /// Style reviewer prompt
    pub fn style() -> PromptTemplate {
        PromptTemplate {
            system_instruction: r#"You are a meticulous code style reviewer. You care about naming, readability and consistency, not functional behavior."#.to_string(),

            user_prompt_template: r#"Review the style of the following pull request.

{files_summary}

PR description:
{description}

Patches:
{patches}

Give feedback on code style, naming and readability in at most 5 bullet points. Any refactoring suggestion must be a single sentence. Respond in concise Markdown."#.to_string(),
        }
    }

    /// Synthesis prompt: the only generated part of the final document is
    /// this short free-text summary; the surrounding structure is rendered
    /// by code.
    pub fn synthesis() -> PromptTemplate {
        PromptTemplate {
            system_instruction: r#"You write the executive summary that sits at the top of a combined code review."#.to_string(),

            user_prompt_template: r#"Three reviewers assessed the same pull request.

Functional review:
{reviewer_result}

Security review:
{security_result}

Style review:
{style_result}

Write a 2-3 sentence summary of the combined reviews, covering the most important findings and the most valuable fixes. Respond with the summary sentences only: no headings, no bullet points, no preamble."#.to_string(),
        }
    }

    /// Fill a review template from a request. Patch text is capped per
    /// file; the structural summary never is.
    pub fn build_review_prompt(
        template: &PromptTemplate,
        request: &ReviewRequest,
        max_patch_chars: usize,
    ) -> String {
        let mut prompt = template.user_prompt_template.clone();

        prompt = prompt.replace("{files_summary}", &format_files_summary(&request.files));
        prompt = prompt.replace(
            "{patches}",
            &build_patches_block(request, max_patch_chars),
        );
        prompt = prompt.replace("{description}", &request.description);

        prompt
    }

    /// Fill the synthesis template from the joined session state.
    pub fn build_synthesis_prompt(template: &PromptTemplate, session: &SessionState) -> String {
        let mut prompt = template.user_prompt_template.clone();

        prompt = prompt.replace("{reviewer_result}", &session.reviewer_result);
        prompt = prompt.replace("{security_result}", &session.security_result);
        prompt = prompt.replace("{style_result}", &session.style_result);

        prompt
    }
}

fn build_patches_block(request: &ReviewRequest, max_patch_chars: usize) -> String {
    let sections: Vec<String> = request
        .files
        .iter()
        .filter_map(|file| {
            let patch = file.patch.as_deref()?;
            if patch.is_empty() {
                return None;
            }
            Some(format!(
                "### {}\n```diff\n{}\n```",
                file.filename,
                truncate_chars(patch, max_patch_chars)
            ))
        })
        .collect();

    if sections.is_empty() {
        "No patch content available.".to_string()
    } else {
        sections.join("\n\n")
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}\n[... patch truncated ...]", truncated)
}
