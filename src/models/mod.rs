// src/models/mod.rs

use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod providers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Hosted,
    SelfHosted,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Hosted => "hosted",
            ProviderKind::SelfHosted => "self_hosted",
        }
    }

    /// Accepts the current names plus the legacy `openai` / `llama` aliases.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hosted" | "openai" => Ok(ProviderKind::Hosted),
            "self_hosted" | "self-hosted" | "selfhosted" | "llama" => Ok(ProviderKind::SelfHosted),
            other => Err(LlmError::Configuration(format!(
                "Unknown provider kind: '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials or address for exactly one provider kind.
#[derive(Clone, PartialEq, Eq)]
pub enum ConnectionConfig {
    Hosted { api_key: String },
    SelfHosted { host: String, port: String },
}

impl ConnectionConfig {
    /// Builds a config from loosely-typed request fields. Empty strings count as
    /// missing, and missing fields are rejected here, before any network I/O.
    pub fn from_parts(
        kind: ProviderKind,
        api_key: Option<String>,
        host: Option<String>,
        port: Option<String>,
    ) -> Result<Self> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        match kind {
            ProviderKind::Hosted => present(api_key)
                .map(|api_key| ConnectionConfig::Hosted { api_key })
                .ok_or_else(|| {
                    LlmError::Configuration("API key is required for the hosted provider".into())
                }),
            ProviderKind::SelfHosted => match (present(host), present(port)) {
                (Some(host), Some(port)) => Ok(ConnectionConfig::SelfHosted {
                    host: host.trim().to_string(),
                    port: port.trim().to_string(),
                }),
                _ => Err(LlmError::Configuration(
                    "Host and port are required for the self-hosted provider".into(),
                )),
            },
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            ConnectionConfig::Hosted { .. } => ProviderKind::Hosted,
            ConnectionConfig::SelfHosted { .. } => ProviderKind::SelfHosted,
        }
    }
}

// Keeps API keys out of logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionConfig::Hosted { .. } => f
                .debug_struct("Hosted")
                .field("api_key", &"<redacted>")
                .finish(),
            ConnectionConfig::SelfHosted { host, port } => f
                .debug_struct("SelfHosted")
                .field("host", host)
                .field("port", port)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub kind: Option<ProviderKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentType {
    Custom,
    Blog,
    Essay,
    LinkedIn,
    X,
    Threads,
    Reddit,
    Email,
    Newsletter,
    Other(String),
}

impl DocumentType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Custom" => DocumentType::Custom,
            "Blog" => DocumentType::Blog,
            "Essay" => DocumentType::Essay,
            "LinkedIn" => DocumentType::LinkedIn,
            "X" => DocumentType::X,
            "Threads" => DocumentType::Threads,
            "Reddit" => DocumentType::Reddit,
            "Email" => DocumentType::Email,
            "Newsletter" => DocumentType::Newsletter,
            other => DocumentType::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DocumentType::Custom => "Custom",
            DocumentType::Blog => "Blog",
            DocumentType::Essay => "Essay",
            DocumentType::LinkedIn => "LinkedIn",
            DocumentType::X => "X",
            DocumentType::Threads => "Threads",
            DocumentType::Reddit => "Reddit",
            DocumentType::Email => "Email",
            DocumentType::Newsletter => "Newsletter",
            DocumentType::Other(name) => name,
        }
    }

    /// Hard character ceiling communicated to the model. Output is never truncated.
    pub fn char_limit(&self) -> Option<usize> {
        match self {
            DocumentType::X => Some(280),
            DocumentType::Threads => Some(500),
            _ => None,
        }
    }

    pub fn is_short_form(&self) -> bool {
        self.char_limit().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: String,
    pub action_description: String,
    pub text: String,
    pub about_me: String,
    pub preferred_style: String,
    pub tone: String,
    pub document_type: Option<DocumentType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalRequest {
    pub eval_name: String,
    pub eval_description: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    Action(ActionRequest),
    Eval(EvalRequest),
    Chat(ChatRequest),
}

impl GenerationRequest {
    pub fn label(&self) -> &'static str {
        match self {
            GenerationRequest::Action(_) => "action",
            GenerationRequest::Eval(_) => "eval",
            GenerationRequest::Chat(_) => "chat",
        }
    }
}

/// Raw generated text, plus the extracted score for evaluations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub text: String,
    pub score: Option<u8>,
}
