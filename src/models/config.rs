use serde::{Deserialize, Deserializer};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_HOSTED_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_HOSTED_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_SELF_HOSTED_MODEL: &str = "Llama-3.2-3B-Instruct";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful writing assistant. You take the user's prompt and return a modified text according to the user's preferences.";

fn default_addr() -> String {
    "0.0.0.0:50053".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "https://cowriter-app.vercel.app".to_string(),
    ]
}

fn default_validate_timeout_secs() -> u64 {
    5
}

fn default_generate_timeout_secs() -> u64 {
    30
}

// A zero timeout would fail every request before it is sent.
fn nonzero_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match u64::deserialize(deserializer)? {
        0 => Err(serde::de::Error::custom("timeout must be at least 1 second")),
        secs => Ok(secs),
    }
}

fn default_hosted_base_url() -> String {
    DEFAULT_HOSTED_BASE_URL.to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_max_tokens() -> u32 {
    50000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HostedSettings {
    #[serde(default = "default_hosted_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for HostedSettings {
    fn default() -> Self {
        Self {
            base_url: default_hosted_base_url(),
            model: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SelfHostedSettings {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for SelfHostedSettings {
    fn default() -> Self {
        Self {
            model: None,
            system_prompt: default_system_prompt(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Provider-side settings. These are read once at startup and are not part of a connection.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    /// Used for either kind when the kind has no model of its own.
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(
        default = "default_validate_timeout_secs",
        deserialize_with = "nonzero_secs"
    )]
    pub validate_timeout_secs: u64,
    #[serde(
        default = "default_generate_timeout_secs",
        deserialize_with = "nonzero_secs"
    )]
    pub generate_timeout_secs: u64,
    #[serde(default)]
    pub hosted: HostedSettings,
    #[serde(default)]
    pub self_hosted: SelfHostedSettings,
}

impl ProviderSettings {
    pub fn validate_timeout(&self) -> Duration {
        Duration::from_secs(self.validate_timeout_secs)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            default_model: None,
            validate_timeout_secs: default_validate_timeout_secs(),
            generate_timeout_secs: default_generate_timeout_secs(),
            hosted: HostedSettings::default(),
            self_hosted: SelfHostedSettings::default(),
        }
    }
}

/// How the chat handler reports generation failures.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatErrorPolicy {
    /// Surface failures as a gRPC INTERNAL status.
    #[default]
    ServerError,
    /// Return `{success: false, detail}` like actions and evaluations.
    Envelope,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HandlerConfig {
    #[serde(default)]
    pub chat_errors: ChatErrorPolicy,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProviderSettings,
    #[serde(default)]
    pub handlers: HandlerConfig,
}

impl AppConfig {
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to an empty mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Applies `ALLOWED_ORIGINS` (comma separated, appended) and `COWRITER_ADDR`.
    pub fn apply_env_overrides(
        &mut self,
        allowed_origins: Option<String>,
        addr: Option<String>,
    ) {
        if let Some(extra) = allowed_origins {
            for origin in extra.split(',').map(str::trim).filter(|o| !o.is_empty()) {
                if !self.server.allowed_origins.iter().any(|o| o == origin) {
                    self.server.allowed_origins.push(origin.to_string());
                }
            }
        }
        if let Some(addr) = addr.filter(|a| !a.trim().is_empty()) {
            self.server.addr = addr;
        }
    }
}

pub async fn load_config(path: &Path) -> Result<AppConfig, Box<dyn Error + Send + Sync>> {
    let mut config = match tokio::fs::read_to_string(path).await {
        Ok(raw) => AppConfig::from_yaml(&raw)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file {} not found, using defaults", path.display());
            AppConfig::default()
        }
        Err(e) => return Err(e.into()),
    };

    config.apply_env_overrides(
        std::env::var("ALLOWED_ORIGINS").ok(),
        std::env::var("COWRITER_ADDR").ok(),
    );

    debug!("Loaded configuration: {:#?}", config);
    Ok(config)
}
