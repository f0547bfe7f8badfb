use crate::connection::ConnectionManager;
use crate::identity::MetadataIdentity;
use crate::models::config::AppConfig;
use crate::writer_service::cowriter::writer_server::WriterServer;
use crate::writer_service::cowriter::FILE_DESCRIPTOR_SET;
use crate::writer_service::WriterService;
use http::HeaderValue;
use std::sync::Arc;
use tonic::transport::Server;
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_headers(Any)
        .allow_methods(Any)
        .expose_headers(Any)
}

pub async fn start_writer_grpc_server(
    config: AppConfig,
    manager: Arc<ConnectionManager>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = config.server.addr.parse()?;
    info!("Starting cowriter gRPC server on {}", addr);
    info!("Allowed origins: {:?}", config.server.allowed_origins);

    let reflection_service = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let cors = cors_layer(&config.server.allowed_origins);
    let service = WriterServer::new(WriterService::new(
        manager,
        Arc::new(MetadataIdentity),
        config.handlers.chat_errors,
    ));

    match Server::builder()
        .accept_http1(true)
        .tcp_keepalive(Some(std::time::Duration::from_secs(60)))
        .tcp_nodelay(true)
        .layer(cors)
        .layer(GrpcWebLayer::new())
        .add_service(service)
        .add_service(reflection_service)
        .serve_with_shutdown(addr, async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down cowriter server...");
        })
        .await
    {
        Ok(_) => Ok(()),
        Err(e) => {
            if e.to_string().contains("Address already in use") {
                tracing::error!("Port already in use. Please stop other instances first.");
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflection_descriptor_registers() {
        let reflection = Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .with_service_name("cowriter.Writer")
            .build_v1();
        assert!(reflection.is_ok());
    }

    #[test]
    fn test_cors_layer_skips_invalid_origins() {
        // Header values cannot contain newlines; the layer must still build.
        let _layer = cors_layer(&[
            "http://localhost:3000".to_string(),
            "bad\norigin".to_string(),
        ]);
    }
}
