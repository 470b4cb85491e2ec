use super::interfaces::*;
use crate::config::GenerationSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Gemini `generateContent` provider (default)
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    settings: GenerationSettings,
}

impl GeminiGenerator {
    pub fn new(settings: GenerationSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .context("Gemini API key not found")?;

        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_BASE_URL.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url,
            settings,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let body = json!({
            "systemInstruction": {
                "parts": [{ "text": request.system_instruction }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.user_prompt }]
            }],
            "generationConfig": {
                "temperature": self.settings.temperature,
                "maxOutputTokens": self.settings.max_output_tokens,
            }
        });

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.settings.model, self.api_key
        );

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(anyhow::anyhow!("Gemini API error: {} - {}", status, text));
        }

        let data: serde_json::Value = serde_json::from_str(&text)?;
        let parts = data["candidates"][0]["content"]["parts"]
            .as_array()
            .context("Gemini response missing candidate content parts")?;

        let content = parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join("");

        if content.trim().is_empty() {
            return Err(anyhow::anyhow!("Gemini returned an empty candidate"));
        }

        let usage = &data["usageMetadata"];

        Ok(GenerationResponse {
            text: content,
            usage: Usage {
                prompt_tokens: usage["promptTokenCount"].as_u64().unwrap_or(0) as u32,
                completion_tokens: usage["candidatesTokenCount"].as_u64().unwrap_or(0) as u32,
                total_tokens: usage["totalTokenCount"].as_u64().unwrap_or(0) as u32,
            },
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/models?key={}", self.base_url, self.api_key))
            .send()
            .await?;

        Ok(response.status().is_success())
    }

    fn model(&self) -> &str {
        &self.settings.model
    }
}

/// OpenAI-compatible `/chat/completions` provider; also covers local
/// servers (Ollama, vLLM) via `base_url`.
pub struct OpenAiCompatGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    settings: GenerationSettings,
}

impl OpenAiCompatGenerator {
    pub fn new(settings: GenerationSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .context("OpenAI API key not found")?;

        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url,
            settings,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let body = json!({
            "model": self.settings.model,
            "messages": [
                { "role": "system", "content": request.system_instruction },
                { "role": "user", "content": request.user_prompt }
            ],
            "temperature": self.settings.temperature,
            "max_tokens": self.settings.max_output_tokens,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(anyhow::anyhow!("OpenAI API error: {} - {}", status, text));
        }

        let data: serde_json::Value = serde_json::from_str(&text)?;
        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        if content.trim().is_empty() {
            return Err(anyhow::anyhow!("OpenAI returned an empty message"));
        }

        let usage = &data["usage"];

        Ok(GenerationResponse {
            text: content,
            usage: Usage {
                prompt_tokens: usage["prompt_tokens"].as_u64().unwrap_or(0) as u32,
                completion_tokens: usage["completion_tokens"].as_u64().unwrap_or(0) as u32,
                total_tokens: usage["total_tokens"].as_u64().unwrap_or(0) as u32,
            },
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await?;

        Ok(response.status().is_success())
    }

    fn model(&self) -> &str {
        &self.settings.model
    }
}

/// Factory for creating text-generation providers
pub struct GeneratorFactory;

impl GeneratorFactory {
    pub fn create(settings: GenerationSettings) -> Result<Arc<dyn TextGenerator>> {
        match settings.provider.to_lowercase().as_str() {
            "gemini" => Ok(Arc::new(GeminiGenerator::new(settings)?)),
            "openai" => Ok(Arc::new(OpenAiCompatGenerator::new(settings)?)),
            other => Err(anyhow::anyhow!("Unknown generation provider: {}", other)),
        }
    }
}
