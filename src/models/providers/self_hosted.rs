use super::super::config::ProviderSettings;
use super::ModelProvider;
use crate::error::{LlmError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

/// A llama.cpp-style server exposing the OpenAI-compatible `/v1` routes.
#[derive(Debug, Clone)]
pub struct SelfHostedProvider {
    host: String,
    port: String,
    model: String,
    system_prompt: String,
    max_tokens: u32,
    validate_timeout: Duration,
    generate_timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Prefixes `http://` when the host carries no scheme.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

impl SelfHostedProvider {
    /// Normalizes the host once; every later request reuses the stored value.
    pub fn new(host: &str, port: String, model: String, settings: &ProviderSettings) -> Self {
        Self {
            host: normalize_host(host),
            port,
            model,
            system_prompt: settings.self_hosted.system_prompt.clone(),
            max_tokens: settings.self_hosted.max_tokens,
            validate_timeout: settings.validate_timeout(),
            generate_timeout: settings.generate_timeout(),
            client: reqwest::Client::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}:{}{}", self.host, self.port, path)
    }
}

#[async_trait]
impl ModelProvider for SelfHostedProvider {
    async fn validate(&self) -> Result<()> {
        let url = self.url("/v1/models");
        debug!("Attempting to connect to self-hosted server at {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.validate_timeout)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        if response.status() != StatusCode::OK {
            error!("Self-hosted server returned status: {}", response.status());
            return Err(LlmError::ProviderUnavailable(format!(
                "self-hosted server returned status code: {}",
                response.status()
            )));
        }

        info!("Self-hosted server reachable at {}", url);
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.url("/v1/chat/completions");
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: &self.system_prompt,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
        };

        debug!("Sending request to self-hosted server at {}", url);
        let response = self
            .client
            .post(&url)
            .timeout(self.generate_timeout)
            .json(&request)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!("Self-hosted request failed with status: {}", status);
            return Err(LlmError::InvalidResponseFormat(format!(
                "self-hosted server error: {} - {}",
                status, body
            )));
        }

        let data = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| LlmError::InvalidResponseFormat(e.to_string()))?;

        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                error!("Unexpected self-hosted response shape: {}", data);
                LlmError::InvalidResponseFormat(
                    "response is missing choices[0].message.content".into(),
                )
            })?
            .to_string();

        info!("Successfully received response from self-hosted server");
        Ok(content)
    }
}
