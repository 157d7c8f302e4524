//! Ollama HTTP client

use crate::assistant::{chat_prompt, command_prompt, normalize_command, AssistantBackend};
use crate::config::{AssistantConfig, Persona};
use crate::error::{Error, Result};
use crate::history::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for an Ollama-compatible completion backend
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    probe_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaClient {
    /// Create a client from the assistant configuration
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        }
    }

    /// Backend base URL this client targets
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run one non-streaming generate call and return the raw reply text
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .http
            .post(&url)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Model(format!("backend returned {}: {}", status, text)));
        }

        let data: GenerateResponse = response.json().await.map_err(request_error)?;
        if data.response.trim().is_empty() {
            return Err(Error::Model("backend returned an empty response".to_string()));
        }
        Ok(data.response)
    }

    async fn fetch_models(&self, base_url: &str, timeout: Duration) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(Error::Model(format!(
                "backend returned {} listing models",
                response.status()
            )));
        }

        let data: TagsResponse = response.json().await.map_err(request_error)?;
        Ok(data.models.into_iter().map(|m| m.name).collect())
    }
}

/// Map transport-level reqwest failures onto the error taxonomy
fn request_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(err.to_string())
    } else if err.is_connect() {
        Error::Network(err.to_string())
    } else {
        Error::Http(err)
    }
}

#[async_trait]
impl AssistantBackend for OllamaClient {
    async fn complete(
        &self,
        prompt: &str,
        history: &[Message],
        model: &str,
        persona: &Persona,
    ) -> Result<String> {
        let full_prompt = chat_prompt(persona, history, prompt);
        self.generate(model, &full_prompt).await
    }

    async fn generate_command(
        &self,
        description: &str,
        model: &str,
        persona: &Persona,
    ) -> Result<String> {
        let prompt = command_prompt(persona, description);
        let raw = self.generate(model, &prompt).await?;

        normalize_command(&raw).ok_or_else(|| {
            Error::Model("backend produced no usable command".to_string())
        })
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        self.fetch_models(&self.base_url, self.probe_timeout).await
    }

    async fn probe(&self, url: &str) -> Result<Vec<String>> {
        self.fetch_models(url, self.probe_timeout).await
    }
}
