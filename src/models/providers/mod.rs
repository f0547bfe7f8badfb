// src/models/providers/mod.rs

use async_trait::async_trait;

use super::config::ProviderSettings;
use super::{ConnectionConfig, ProviderKind};
use crate::error::Result;

pub mod hosted;
pub mod self_hosted;
mod selector;

pub use hosted::HostedProvider;
pub use selector::ProviderSelector;
pub use self_hosted::SelfHostedProvider;

/// Capability contract shared by both backends. Each call is exactly one
/// network round trip; nothing here retries.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Cheap reachability probe, bounded by the validate timeout.
    async fn validate(&self) -> Result<()>;

    /// Single-turn generation, bounded by the generate timeout.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// The closed set of backends a connection can use.
#[derive(Debug, Clone)]
pub enum Provider {
    Hosted(HostedProvider),
    SelfHosted(SelfHostedProvider),
}

impl Provider {
    pub fn from_config(config: ConnectionConfig, settings: &ProviderSettings) -> Self {
        let model = ProviderSelector::model_name(settings, config.kind());
        match config {
            ConnectionConfig::Hosted { api_key } => {
                Provider::Hosted(HostedProvider::new(api_key, model, settings))
            }
            ConnectionConfig::SelfHosted { host, port } => {
                Provider::SelfHosted(SelfHostedProvider::new(&host, port, model, settings))
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Hosted(_) => ProviderKind::Hosted,
            Provider::SelfHosted(_) => ProviderKind::SelfHosted,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::Hosted(p) => p.model(),
            Provider::SelfHosted(p) => p.model(),
        }
    }

    /// The config as stored, i.e. after host normalization.
    pub fn config(&self) -> ConnectionConfig {
        match self {
            Provider::Hosted(p) => ConnectionConfig::Hosted {
                api_key: p.api_key().to_string(),
            },
            Provider::SelfHosted(p) => ConnectionConfig::SelfHosted {
                host: p.host().to_string(),
                port: p.port().to_string(),
            },
        }
    }
}

#[async_trait]
impl ModelProvider for Provider {
    async fn validate(&self) -> Result<()> {
        match self {
            Provider::Hosted(p) => p.validate().await,
            Provider::SelfHosted(p) => p.validate().await,
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            Provider::Hosted(p) => p.generate(prompt).await,
            Provider::SelfHosted(p) => p.generate(prompt).await,
        }
    }
}
