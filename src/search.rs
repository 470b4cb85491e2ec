use anyhow::{Context, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::SearchSettings;

/// One ranked web search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web-search capability used by the security agent to verify candidate
/// concerns. May be unavailable or rate-limited; callers must treat a
/// failed search as missing evidence, not as a pipeline error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// Exa search client
pub struct ExaSearch {
    client: Client,
    api_key: String,
    settings: SearchSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaSearchRequest {
    query: String,
    num_results: usize,
    #[serde(rename = "type")]
    search_type: String,
    contents: ExaContents,
}

#[derive(Debug, Serialize)]
struct ExaContents {
    text: ExaTextOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaTextOptions {
    max_characters: usize,
}

#[derive(Debug, Deserialize)]
struct ExaSearchResponse {
    results: Vec<ExaResult>,
}

#[derive(Debug, Deserialize)]
struct ExaResult {
    title: Option<String>,
    url: String,
    text: Option<String>,
}

impl ExaSearch {
    pub fn new(settings: SearchSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .or_else(|| std::env::var("EXA_API_KEY").ok())
            .context("Exa API key not found")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key,
            settings,
        })
    }

    async fn search_once(&self, query: &str) -> Result<Vec<SearchHit>> {
        let body = ExaSearchRequest {
            query: query.to_string(),
            num_results: self.settings.max_results,
            search_type: "auto".to_string(),
            contents: ExaContents {
                text: ExaTextOptions {
                    max_characters: self.settings.max_snippet_chars,
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/search", self.settings.base_url))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Exa API error: {} - {}", status, text));
        }

        let data: ExaSearchResponse = response.json().await?;

        Ok(data
            .results
            .into_iter()
            .map(|result| {
                let title = result.title.unwrap_or_else(|| result.url.clone());
                SearchHit {
                    title,
                    url: result.url,
                    snippet: result.text.unwrap_or_default(),
                }
            })
            .collect())
    }
}

#[async_trait]
impl SearchProvider for ExaSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_elapsed_time(Some(Duration::from_secs(10)))
            .build();

        backoff::future::retry(backoff, || async {
            self.search_once(query)
                .await
                .map_err(backoff::Error::transient)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn request_body_uses_exa_field_names() {
        let body = ExaSearchRequest {
            query: "rust sql injection sqlx".to_string(),
            num_results: 3,
            search_type: "auto".to_string(),
            contents: ExaContents {
                text: ExaTextOptions {
                    max_characters: 1000,
                },
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["numResults"], 3);
        assert_eq!(json["type"], "auto");
        assert_eq!(json["contents"]["text"]["maxCharacters"], 1000);
    }

    #[test]
    fn response_maps_missing_fields() {
        let raw = r#"{
            "results": [
                {"title": "CWE-089", "url": "https://cwe.mitre.org/data/definitions/89.html", "text": "SQL injection"},
                {"url": "https://example.com/advisory"}
            ]
        }"#;

        let parsed: ExaSearchResponse = serde_json::from_str(raw).unwrap();
        let hits: Vec<SearchHit> = parsed
            .results
            .into_iter()
            .map(|result| {
                let title = result.title.unwrap_or_else(|| result.url.clone());
                SearchHit {
                    title,
                    url: result.url,
                    snippet: result.text.unwrap_or_default(),
                }
            })
            .collect();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "CWE-089");
        assert_eq!(hits[1].title, "https://example.com/advisory");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn client_builds_with_explicit_key() {
        let mut settings = Config::default().search;
        settings.api_key = Some("exa-test".to_string());
        assert!(ExaSearch::new(settings).is_ok());
    }
}
