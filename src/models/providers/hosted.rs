// src/models/providers/hosted.rs

use super::super::config::ProviderSettings;
use super::ModelProvider;
use crate::error::{LlmError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

/// OpenAI-style hosted API, authenticated with a bearer API key.
#[derive(Clone)]
pub struct HostedProvider {
    api_key: String,
    base_url: String,
    model: String,
    validate_timeout: Duration,
    generate_timeout: Duration,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl HostedProvider {
    pub fn new(api_key: String, model: String, settings: &ProviderSettings) -> Self {
        Self {
            api_key,
            base_url: settings.hosted.base_url.trim_end_matches('/').to_string(),
            model,
            validate_timeout: settings.validate_timeout(),
            generate_timeout: settings.generate_timeout(),
            client: reqwest::Client::new(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn status_error(status: StatusCode, body: &str) -> LlmError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                LlmError::Authentication(format!("hosted API rejected credentials ({})", status))
            }
            _ => LlmError::ProviderUnavailable(format!("hosted API error: {} - {}", status, body)),
        }
    }
}

impl fmt::Debug for HostedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModelProvider for HostedProvider {
    async fn validate(&self) -> Result<()> {
        let url = format!("{}/models", self.base_url);
        debug!("Validating hosted API credentials against {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.validate_timeout)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Hosted API validation failed with status: {}", status);
            return Err(Self::status_error(status, &body));
        }

        info!("Hosted API credentials accepted");
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Generating response with hosted model {}", self.model);

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.generate_timeout)
            .json(&request)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Hosted API request failed with status: {}", status);
            return Err(Self::status_error(status, &body));
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponseFormat(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                LlmError::InvalidResponseFormat("hosted API returned no message content".into())
            })?;

        info!("Successfully received response from hosted API");
        Ok(content)
    }
}
