//! Tracks the single active provider connection and routes generation to it.
//!
//! `connect` validates outside the lock and commits inside it, so a slow probe never
//! blocks `status` or a concurrent `disconnect`. Every connect and disconnect bumps
//! an epoch; a connect only commits if no later request bumped it while it was
//! validating, so the most recent request wins. `generate` snapshots the provider
//! and releases the lock before any I/O. An in-flight generation may therefore
//! finish against a configuration that was replaced in the meantime.

use crate::error::{LlmError, Result};
use crate::models::config::ProviderSettings;
use crate::models::providers::{ModelProvider, Provider};
use crate::models::{ConnectionConfig, ConnectionStatus};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

#[derive(Default)]
struct ConnectionState {
    // Present only after a successful validation; this is the `connected` flag.
    active: Option<Provider>,
    epoch: u64,
}

impl ConnectionState {
    fn bump(&mut self) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        self.epoch
    }
}

pub struct ConnectionManager {
    settings: ProviderSettings,
    state: RwLock<ConnectionState>,
}

impl ConnectionManager {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            state: RwLock::new(ConnectionState::default()),
        }
    }

    /// On failure the previous state is left untouched. Returns
    /// [`LlmError::Superseded`] when a newer connect or a disconnect arrived
    /// during validation.
    pub async fn connect(&self, config: ConnectionConfig) -> Result<()> {
        let kind = config.kind();
        let provider = Provider::from_config(config, &self.settings);
        let ticket = self.state.write().await.bump();

        debug!("Validating {} provider before commit", kind);
        if let Err(e) = provider.validate().await {
            error!("Failed to connect to {} provider: {}", kind, e);
            return Err(e);
        }

        let mut state = self.state.write().await;
        if state.epoch != ticket {
            warn!("Discarding {} connection, a later request replaced it", kind);
            return Err(LlmError::Superseded);
        }
        state.active = Some(provider);
        info!("Connected to {} provider", kind);
        Ok(())
    }

    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        state.bump();
        if let Some(previous) = state.active.take() {
            info!("Disconnected from {} provider", previous.kind());
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let provider = self
            .state
            .read()
            .await
            .active
            .clone()
            .ok_or(LlmError::NotConnected)?;

        debug!(
            "Dispatching prompt to {} provider (model {})",
            provider.kind(),
            provider.model()
        );
        provider.generate(prompt).await
    }

    pub async fn status(&self) -> ConnectionStatus {
        let state = self.state.read().await;
        ConnectionStatus {
            connected: state.active.is_some(),
            kind: state.active.as_ref().map(Provider::kind),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.status().await.connected
    }

    /// Stored config of the active connection, if any.
    pub async fn active_config(&self) -> Option<ConnectionConfig> {
        self.state.read().await.active.as_ref().map(Provider::config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderKind;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn hosted_settings(server: &mockito::Server) -> ProviderSettings {
        let mut settings = ProviderSettings::default();
        settings.hosted.base_url = format!("{}/v1", server.url());
        settings
    }

    fn self_hosted_config(server: &mockito::Server, host: Option<&str>) -> ConnectionConfig {
        let addr = server.socket_address();
        ConnectionConfig::SelfHosted {
            host: host.map(str::to_string).unwrap_or_else(|| addr.ip().to_string()),
            port: addr.port().to_string(),
        }
    }

    #[tokio::test]
    async fn test_hosted_connect_sets_status() {
        let mut server = mockito::Server::new_async().await;
        let _models = server
            .mock("GET", "/v1/models")
            .with_status(200)
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;

        let manager = ConnectionManager::new(hosted_settings(&server));
        manager
            .connect(ConnectionConfig::Hosted {
                api_key: "sk-test".into(),
            })
            .await
            .unwrap();

        let status = manager.status().await;
        assert!(status.connected);
        assert_eq!(status.kind, Some(ProviderKind::Hosted));
    }

    #[tokio::test]
    async fn test_failed_connect_keeps_previous_state() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/v1/models")
            .match_header("authorization", "Bearer sk-good")
            .with_status(200)
            .create_async()
            .await;
        let _rejected = server
            .mock("GET", "/v1/models")
            .match_header("authorization", "Bearer sk-bad")
            .with_status(401)
            .create_async()
            .await;

        let manager = ConnectionManager::new(hosted_settings(&server));
        manager
            .connect(ConnectionConfig::Hosted {
                api_key: "sk-good".into(),
            })
            .await
            .unwrap();

        let result = manager
            .connect(ConnectionConfig::Hosted {
                api_key: "sk-bad".into(),
            })
            .await;
        assert!(matches!(result, Err(LlmError::Authentication(_))));

        assert!(manager.is_connected().await);
        assert_eq!(
            manager.active_config().await,
            Some(ConnectionConfig::Hosted {
                api_key: "sk-good".into()
            })
        );
    }

    #[tokio::test]
    async fn test_failed_connect_from_empty_stays_disconnected() {
        let mut server = mockito::Server::new_async().await;
        let _models = server
            .mock("GET", "/v1/models")
            .with_status(500)
            .create_async()
            .await;

        let manager = ConnectionManager::new(ProviderSettings::default());
        let result = manager.connect(self_hosted_config(&server, None)).await;
        assert!(matches!(result, Err(LlmError::ProviderUnavailable(_))));
        assert_eq!(
            manager.status().await,
            ConnectionStatus {
                connected: false,
                kind: None
            }
        );
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent_and_blocks_generate() {
        let mut server = mockito::Server::new_async().await;
        let _models = server
            .mock("GET", "/v1/models")
            .with_status(200)
            .create_async()
            .await;
        let completions = server
            .mock("POST", "/v1/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let manager = ConnectionManager::new(ProviderSettings::default());
        manager
            .connect(self_hosted_config(&server, None))
            .await
            .unwrap();

        manager.disconnect().await;
        let once = manager.status().await;
        manager.disconnect().await;
        let twice = manager.status().await;

        assert_eq!(once, twice);
        assert!(!twice.connected);
        assert_eq!(twice.kind, None);
        assert!(matches!(
            manager.generate("hello").await,
            Err(LlmError::NotConnected)
        ));
        completions.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_without_connection() {
        let manager = ConnectionManager::new(ProviderSettings::default());
        assert!(matches!(
            manager.generate("hello").await,
            Err(LlmError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_connect_stores_normalized_host() {
        let mut server = mockito::Server::new_async().await;
        let _models = server
            .mock("GET", "/v1/models")
            .with_status(200)
            .create_async()
            .await;

        let manager = ConnectionManager::new(ProviderSettings::default());
        manager
            .connect(self_hosted_config(&server, Some("127.0.0.1")))
            .await
            .unwrap();

        match manager.active_config().await {
            Some(ConnectionConfig::SelfHosted { host, .. }) => assert_eq!(host, "http://127.0.0.1"),
            other => panic!("unexpected config: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_switching_providers_replaces_connection() {
        let mut server = mockito::Server::new_async().await;
        let _models = server
            .mock("GET", "/v1/models")
            .with_status(200)
            .create_async()
            .await;
        let completions = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"message": {"content": "from hosted"}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let manager = ConnectionManager::new(hosted_settings(&server));
        manager
            .connect(self_hosted_config(&server, None))
            .await
            .unwrap();
        assert_eq!(manager.status().await.kind, Some(ProviderKind::SelfHosted));

        manager
            .connect(ConnectionConfig::Hosted {
                api_key: "sk-test".into(),
            })
            .await
            .unwrap();
        assert_eq!(manager.status().await.kind, Some(ProviderKind::Hosted));

        assert_eq!(manager.generate("hi").await.unwrap(), "from hosted");
        completions.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_connects_commit_whole_configs() {
        let mut server = mockito::Server::new_async().await;
        let _models = server
            .mock("GET", "/v1/models")
            .with_status(200)
            .create_async()
            .await;

        let manager = Arc::new(ConnectionManager::new(hosted_settings(&server)));
        let hosted = {
            let manager = manager.clone();
            tokio::spawn(async move {
                manager
                    .connect(ConnectionConfig::Hosted {
                        api_key: "sk-test".into(),
                    })
                    .await
            })
        };
        let self_hosted = {
            let manager = manager.clone();
            let config = self_hosted_config(&server, None);
            tokio::spawn(async move { manager.connect(config).await })
        };

        let results = [hosted.await.unwrap(), self_hosted.await.unwrap()];
        assert!(results.iter().any(Result::is_ok));
        assert!(results
            .iter()
            .all(|r| matches!(r, Ok(()) | Err(LlmError::Superseded))));

        // Whichever commit landed last, kind and config belong to the same attempt.
        let status = manager.status().await;
        let config = manager.active_config().await.unwrap();
        assert!(status.connected);
        assert_eq!(status.kind, Some(config.kind()));
    }

    // Accepts connections and never answers.
    async fn silent_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        addr
    }

    // Answers `GET /v1/models` with 200 once `release` fires, and nothing else.
    // `seen` fires when the models request has been read.
    async fn gated_server(seen: oneshot::Sender<()>, release: oneshot::Receiver<()>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            let _ = seen.send(());
            let _ = release.await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}")
                .await
                .unwrap();
        });
        addr
    }

    // Answers `GET /v1/models` with 200 and leaves every other request hanging.
    async fn models_only_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    if buf[..n].starts_with(b"GET /v1/models") {
                        let _ = socket
                            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}")
                            .await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                });
            }
        });
        addr
    }

    fn local_config(addr: SocketAddr) -> ConnectionConfig {
        ConnectionConfig::SelfHosted {
            host: addr.ip().to_string(),
            port: addr.port().to_string(),
        }
    }

    fn one_second_timeouts() -> ProviderSettings {
        let mut settings = ProviderSettings::default();
        settings.validate_timeout_secs = 1;
        settings.generate_timeout_secs = 1;
        settings
    }

    #[tokio::test]
    async fn test_validate_timeout_is_unavailable_and_keeps_state() {
        let addr = silent_server().await;
        let manager = ConnectionManager::new(one_second_timeouts());

        let result = manager.connect(local_config(addr)).await;
        match result {
            Err(LlmError::ProviderUnavailable(detail)) => assert!(detail.contains("timed out")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!manager.status().await.connected);
    }

    #[tokio::test]
    async fn test_hosted_validate_timeout_is_unavailable() {
        let addr = silent_server().await;
        let mut settings = one_second_timeouts();
        settings.hosted.base_url = format!("http://{}/v1", addr);
        let manager = ConnectionManager::new(settings);

        let result = manager
            .connect(ConnectionConfig::Hosted {
                api_key: "sk-test".into(),
            })
            .await;
        assert!(matches!(result, Err(LlmError::ProviderUnavailable(_))));
        assert!(!manager.status().await.connected);
    }

    #[tokio::test]
    async fn test_generate_timeout_is_unavailable_and_keeps_connection() {
        let addr = models_only_server().await;
        let manager = ConnectionManager::new(one_second_timeouts());
        manager.connect(local_config(addr)).await.unwrap();

        let result = manager.generate("hello").await;
        match result {
            Err(LlmError::ProviderUnavailable(detail)) => assert!(detail.contains("timed out")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(manager.status().await.connected);
    }

    #[tokio::test]
    async fn test_disconnect_during_validation_wins() {
        let (seen_tx, seen_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let addr = gated_server(seen_tx, release_rx).await;

        let manager = Arc::new(ConnectionManager::new(ProviderSettings::default()));
        let pending = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.connect(local_config(addr)).await })
        };

        seen_rx.await.unwrap();
        manager.disconnect().await;
        release_tx.send(()).unwrap();

        assert_eq!(pending.await.unwrap(), Err(LlmError::Superseded));
        assert!(!manager.status().await.connected);
    }

    #[tokio::test]
    async fn test_older_connect_does_not_overwrite_newer() {
        let (seen_tx, seen_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let slow = gated_server(seen_tx, release_rx).await;

        let mut server = mockito::Server::new_async().await;
        let _models = server
            .mock("GET", "/v1/models")
            .with_status(200)
            .create_async()
            .await;

        let manager = Arc::new(ConnectionManager::new(hosted_settings(&server)));
        let older = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.connect(local_config(slow)).await })
        };

        seen_rx.await.unwrap();
        manager
            .connect(ConnectionConfig::Hosted {
                api_key: "sk-newer".into(),
            })
            .await
            .unwrap();
        release_tx.send(()).unwrap();

        assert_eq!(older.await.unwrap(), Err(LlmError::Superseded));
        assert_eq!(
            manager.active_config().await,
            Some(ConnectionConfig::Hosted {
                api_key: "sk-newer".into()
            })
        );
    }
}
