/// Configuration management for the PR review pipeline
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub generation: GenerationSettings,
    pub search: SearchSettings,
    pub pipeline: PipelineSettings,
    pub github: GitHubSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Provider backing the agents, `gemini` or `openai`.
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub request_timeout_seconds: u64,
    /// Per-file cap on patch text embedded into prompts.
    pub max_patch_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_results: usize,
    pub max_snippet_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub agent_timeout_seconds: u64,
    pub max_retries: u32,
    pub deadline_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSettings {
    pub auto_comment: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation: GenerationSettings {
                provider: "gemini".to_string(),
                model: DEFAULT_GEMINI_MODEL.to_string(),
                api_key: None,
                base_url: None,
                temperature: 0.2,
                max_output_tokens: 2048,
                request_timeout_seconds: 120,
                max_patch_chars: 3000,
            },
            search: SearchSettings {
                enabled: true,
                api_key: None,
                base_url: "https://api.exa.ai".to_string(),
                max_results: 3,
                max_snippet_chars: 1000,
            },
            pipeline: PipelineSettings {
                agent_timeout_seconds: 300,
                max_retries: 2,
                deadline_seconds: 900,
            },
            github: GitHubSettings { auto_comment: false },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Self> {
        let mut config = Config::default();

        // Override with environment variables if present
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.generation.model = model;
        }

        if let Ok(timeout) = std::env::var("PR_REVIEW_AGENT_TIMEOUT_SECONDS") {
            config.pipeline.agent_timeout_seconds = timeout.parse()?;
        }

        if let Ok(retries) = std::env::var("PR_REVIEW_AGENT_MAX_RETRIES") {
            config.pipeline.max_retries = retries.parse()?;
        }

        if let Ok(deadline) = std::env::var("PR_REVIEW_AGENT_DEADLINE_SECONDS") {
            config.pipeline.deadline_seconds = deadline.parse()?;
        }

        if let Ok(key) = std::env::var("EXA_API_KEY") {
            config.search.api_key = Some(key);
        }

        Ok(config)
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge_with(&mut self, other: Config) {
        let defaults = Config::default();

        // Merge generation settings
        if other.generation.provider != defaults.generation.provider {
            self.generation.provider = other.generation.provider;
        }
        if other.generation.model != defaults.generation.model {
            self.generation.model = other.generation.model;
        }
        if other.generation.api_key.is_some() {
            self.generation.api_key = other.generation.api_key;
        }
        if other.generation.base_url.is_some() {
            self.generation.base_url = other.generation.base_url;
        }
        if other.generation.temperature != defaults.generation.temperature {
            self.generation.temperature = other.generation.temperature;
        }
        if other.generation.max_output_tokens != defaults.generation.max_output_tokens {
            self.generation.max_output_tokens = other.generation.max_output_tokens;
        }
        if other.generation.request_timeout_seconds != defaults.generation.request_timeout_seconds
        {
            self.generation.request_timeout_seconds = other.generation.request_timeout_seconds;
        }
        if other.generation.max_patch_chars != defaults.generation.max_patch_chars {
            self.generation.max_patch_chars = other.generation.max_patch_chars;
        }

        // Merge search settings
        self.search.enabled = other.search.enabled;
        if other.search.api_key.is_some() {
            self.search.api_key = other.search.api_key;
        }
        if other.search.base_url != defaults.search.base_url {
            self.search.base_url = other.search.base_url;
        }
        if other.search.max_results != defaults.search.max_results {
            self.search.max_results = other.search.max_results;
        }
        if other.search.max_snippet_chars != defaults.search.max_snippet_chars {
            self.search.max_snippet_chars = other.search.max_snippet_chars;
        }

        // Merge pipeline settings
        if other.pipeline.agent_timeout_seconds != defaults.pipeline.agent_timeout_seconds {
            self.pipeline.agent_timeout_seconds = other.pipeline.agent_timeout_seconds;
        }
        if other.pipeline.max_retries != defaults.pipeline.max_retries {
            self.pipeline.max_retries = other.pipeline.max_retries;
        }
        if other.pipeline.deadline_seconds != defaults.pipeline.deadline_seconds {
            self.pipeline.deadline_seconds = other.pipeline.deadline_seconds;
        }

        // Merge GitHub settings
        self.github.auto_comment = other.github.auto_comment;
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.agent_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Agent timeout must be greater than 0"));
        }

        if self.pipeline.deadline_seconds < self.pipeline.agent_timeout_seconds {
            return Err(anyhow::anyhow!(
                "Pipeline deadline must be at least the per-agent timeout"
            ));
        }

        if self.generation.provider != "gemini" && self.generation.provider != "openai" {
            return Err(anyhow::anyhow!(
                "Unknown generation provider '{}', expected 'gemini' or 'openai'",
                self.generation.provider
            ));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(anyhow::anyhow!("Temperature must be between 0.0 and 2.0"));
        }

        if self.search.enabled && self.search.max_results == 0 {
            return Err(anyhow::anyhow!(
                "Search max_results must be greater than 0 when search is enabled"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_config_save_and_load() {
        let config = Config::default();
        let temp_file = NamedTempFile::new().unwrap();

        // Save config
        config.save_to_file(temp_file.path()).await.unwrap();

        // Load config
        let loaded_config = Config::load_from_file(temp_file.path()).await.unwrap();

        assert_eq!(config.generation.model, loaded_config.generation.model);
        assert_eq!(
            config.pipeline.agent_timeout_seconds,
            loaded_config.pipeline.agent_timeout_seconds
        );
        assert_eq!(config.search.max_results, loaded_config.search.max_results);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        // Test invalid timeout
        config.pipeline.agent_timeout_seconds = 0;
        assert!(config.validate().is_err());

        // Reset and test unknown provider
        config = Config::default();
        config.generation.provider = "bard".to_string();
        assert!(config.validate().is_err());

        // Deadline below per-agent timeout
        config = Config::default();
        config.pipeline.deadline_seconds = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_merge() {
        let mut base_config = Config::default();
        let mut override_config = Config::default();

        override_config.generation.model = "gemini-2.5-pro".to_string();
        override_config.pipeline.agent_timeout_seconds = 600;
        override_config.search.api_key = Some("exa-test-key".to_string());

        base_config.merge_with(override_config);

        assert_eq!(base_config.generation.model, "gemini-2.5-pro");
        assert_eq!(base_config.pipeline.agent_timeout_seconds, 600);
        assert_eq!(base_config.search.api_key.as_deref(), Some("exa-test-key"));
    }

    #[test]
    fn test_merge_covers_request_timeout_and_snippet_cap() {
        let mut base_config = Config::default();
        let mut override_config = Config::default();

        override_config.generation.request_timeout_seconds = 30;
        override_config.search.max_snippet_chars = 500;

        base_config.merge_with(override_config);

        assert_eq!(base_config.generation.request_timeout_seconds, 30);
        assert_eq!(base_config.search.max_snippet_chars, 500);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("GEMINI_MODEL", "gemini-2.0-flash");
        std::env::set_var("PR_REVIEW_AGENT_MAX_RETRIES", "5");

        let config = Config::load_from_env().unwrap();
        assert_eq!(config.generation.model, "gemini-2.0-flash");
        assert_eq!(config.pipeline.max_retries, 5);

        std::env::remove_var("GEMINI_MODEL");
        std::env::remove_var("PR_REVIEW_AGENT_MAX_RETRIES");
    }
}
