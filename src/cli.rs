// src/cli.rs
use clap::{Parser, ValueEnum};
use std::{error::Error, path::PathBuf, sync::Arc};
use tracing::info;

use crate::connection::ConnectionManager;
use crate::generation::run_generation;
use crate::models::{ChatRequest, ConnectionConfig, GenerationRequest, ProviderKind};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[clap(rename_all = "kebab-case")]
pub enum ProviderType {
    /// Hosted API (key from --api-key or OPENAI_API_KEY)
    Hosted,
    /// Self-hosted OpenAI-compatible server (--host/--port or LLAMA_HOST/LLAMA_PORT)
    SelfHosted,
}

impl From<ProviderType> for ProviderKind {
    fn from(value: ProviderType) -> Self {
        match value {
            ProviderType::Hosted => ProviderKind::Hosted,
            ProviderType::SelfHosted => ProviderKind::SelfHosted,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// A chat message to send once (if not provided, starts the gRPC server)
    pub prompt: Option<String>,

    /// Provider for the one-shot prompt
    #[arg(long, value_enum, value_name = "TYPE", requires = "prompt")]
    pub provider: Option<ProviderType>,

    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<String>,

    /// Path to the YAML configuration file
    #[arg(long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Address to bind, overrides the config file
    #[arg(long)]
    pub addr: Option<String>,

    /// Log at DEBUG instead of INFO
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Flags win over the environment. Missing fields are reported by
    /// `ConnectionConfig::from_parts`.
    pub fn connection_config(&self) -> Result<ConnectionConfig, Box<dyn Error + Send + Sync>> {
        let provider = self
            .provider
            .ok_or("--provider is required when sending a prompt")?;
        let env = |key: &str| std::env::var(key).ok();

        let config = ConnectionConfig::from_parts(
            provider.into(),
            self.api_key.clone().or_else(|| env("OPENAI_API_KEY")),
            self.host.clone().or_else(|| env("LLAMA_HOST")),
            self.port.clone().or_else(|| env("LLAMA_PORT")),
        )?;
        Ok(config)
    }
}

pub async fn handle_cli(
    cli: &Cli,
    manager: Arc<ConnectionManager>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if let Some(prompt) = &cli.prompt {
        let config = cli.connection_config()?;
        info!("Connecting to {} provider for a one-shot prompt", config.kind());
        manager.connect(config).await?;

        let request = GenerationRequest::Chat(ChatRequest {
            message: prompt.clone(),
            context: None,
        });
        let result = run_generation(&manager, &request).await?;

        println!("{}", result.text);
        manager.disconnect().await;
    }
    Ok(())
}
