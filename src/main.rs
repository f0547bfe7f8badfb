mod cli;
mod connection;
mod error;
mod generation;
mod grpc_server;
mod identity;
mod models;
mod prompts;
mod score_helper;
mod writer_service;

use clap::Parser;
use cli::{handle_cli, Cli};
use connection::ConnectionManager;
use grpc_server::start_writer_grpc_server;
use models::config::load_config;
use std::error::Error;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    info!("Starting application");

    let mut config = load_config(&cli.config).await?;
    if let Some(addr) = &cli.addr {
        config.server.addr = addr.clone();
    }

    // The one connection manager for the whole process, shared by every handler.
    let manager = Arc::new(ConnectionManager::new(config.providers.clone()));

    if cli.prompt.is_some() {
        handle_cli(&cli, manager).await?;
    } else {
        start_writer_grpc_server(config, manager).await?;
    }

    Ok(())
}
