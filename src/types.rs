use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Core types for the PR review pipeline

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub additions: u32,
    #[serde(default)]
    pub deletions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub description: String,
    pub files: Vec<FileChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<u64>,
}

/// Output slots of the parallel review stage. A value of this type only
/// exists once all three agents have completed, so downstream code never
/// sees a partially populated state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub reviewer_result: String,
    pub security_result: String,
    pub style_result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub summary: String,
    pub session: SessionState,
    pub markdown: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub agent_name: String,
    pub event_type: String,
    pub data: serde_json::Value,
}

impl FileChange {
    pub fn new(filename: impl Into<String>, additions: u32, deletions: u32) -> Self {
        Self {
            filename: filename.into(),
            additions,
            deletions,
            patch: None,
        }
    }

    pub fn with_patch(mut self, patch: impl Into<String>) -> Self {
        self.patch = Some(patch.into());
        self
    }
}

impl ReviewRequest {
    pub fn new(description: impl Into<String>, files: Vec<FileChange>) -> Self {
        Self {
            description: description.into(),
            files,
            repository: None,
            pr_number: None,
        }
    }

    pub fn total_additions(&self) -> u32 {
        self.files.iter().map(|f| f.additions).sum()
    }

    pub fn total_deletions(&self) -> u32 {
        self.files.iter().map(|f| f.deletions).sum()
    }

    /// Short identifier used in log spans and events, `pr-<number>` for
    /// requests built from a pull request, `local` otherwise.
    pub fn label(&self) -> String {
        match self.pr_number {
            Some(n) => format!("pr-{}", n),
            None => "local".to_string(),
        }
    }
}

impl SessionState {
    pub fn new(reviewer_result: String, security_result: String, style_result: String) -> Self {
        Self {
            reviewer_result,
            security_result,
            style_result,
        }
    }
}

impl AgentEvent {
    pub fn new(agent_name: &str, event_type: &str, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            agent_name: agent_name.to_string(),
            event_type: event_type.to_string(),
            data,
        }
    }
}
