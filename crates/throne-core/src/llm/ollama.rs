use crate::constants::endpoints;
use crate::error::ThroneError;
use crate::llm::traits::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for a local Ollama server, talking to its REST API directly.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ThroneError> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(endpoints::OLLAMA_BASE_URL)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    response: String,
    #[serde(flatten)]
    stats: GenerateStats,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<LocalModel>,
}

#[async_trait::async_trait]
impl SecondaryProvider for OllamaClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: &DecodingParams,
    ) -> Result<GenerateResponse, ThroneError> {
        let url = format!("{}/api/generate", self.base_url);
        let request_body = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: params.temperature,
                top_p: params.top_p,
                max_tokens: params.max_tokens,
            },
        };

        tracing::debug!("POST {} model={}", url, model);

        let response = self.client.post(&url).json(&request_body).send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(ThroneError::provider(
                "ollama",
                format!("API error ({}): {}", status, response_text),
            ));
        }

        let body: GenerateBody = serde_json::from_str(&response_text)
            .map_err(|e| ThroneError::provider("ollama", format!("Failed to parse response: {e}")))?;

        Ok(GenerateResponse {
            text: body.response,
            model: body.model.unwrap_or_else(|| model.to_string()),
            stats: body.stats,
        })
    }

    async fn list_models(&self) -> Result<Vec<LocalModel>, ThroneError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ThroneError::provider("ollama", format!("Ollama not reachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ThroneError::provider(
                "ollama",
                format!("Ollama API error: {}", status),
            ));
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models)
    }
}
