use crate::connection::ConnectionManager;
use crate::generation::run_generation;
use crate::identity::IdentityProvider;
use crate::models::config::ChatErrorPolicy;
use crate::models::{self, ConnectionConfig, DocumentType, GenerationRequest, ProviderKind};
use std::sync::Arc;
use tonic::{Request, Response, Status};

pub mod cowriter {
    tonic::include_proto!("cowriter");

    pub(crate) const FILE_DESCRIPTOR_SET: &[u8] =
        include_bytes!(concat!(env!("OUT_DIR"), "/cowriter_descriptor.bin"));
}

use cowriter::writer_server::Writer;
use cowriter::{
    ActionRequest, ActionResponse, ChatRequest, ChatResponse, ConnectRequest, ConnectResponse,
    DisconnectRequest, DisconnectResponse, EvalRequest, EvalResponse, HealthRequest,
    HealthResponse, StatusRequest, StatusResponse,
};

const NOT_CONNECTED: &str = "No active LLM connection";

pub struct WriterService {
    manager: Arc<ConnectionManager>,
    identity: Arc<dyn IdentityProvider>,
    chat_errors: ChatErrorPolicy,
}

impl WriterService {
    pub fn new(
        manager: Arc<ConnectionManager>,
        identity: Arc<dyn IdentityProvider>,
        chat_errors: ChatErrorPolicy,
    ) -> Self {
        Self {
            manager,
            identity,
            chat_errors,
        }
    }

    fn record_identity<T>(&self, request: &Request<T>) {
        let identity = self.identity.identify(request.metadata());
        tracing::Span::current().record("identity", tracing::field::display(&identity));
    }

    // Generation endpoints fail fast before building a prompt.
    async fn require_connection(&self) -> Result<(), Status> {
        if self.manager.is_connected().await {
            Ok(())
        } else {
            Err(Status::failed_precondition(NOT_CONNECTED))
        }
    }

    async fn connect_inner(&self, request: ConnectRequest) -> crate::error::Result<ProviderKind> {
        let kind = ProviderKind::parse(&request.kind)?;
        let config =
            ConnectionConfig::from_parts(kind, request.api_key, request.host, request.port)?;
        self.manager.connect(config).await?;
        Ok(kind)
    }
}

impl From<ActionRequest> for models::ActionRequest {
    fn from(req: ActionRequest) -> Self {
        Self {
            action: req.action,
            action_description: req.action_description,
            text: req.text,
            about_me: req.about_me,
            preferred_style: req.preferred_style,
            tone: req.tone,
            document_type: req
                .document_type
                .filter(|d| !d.trim().is_empty())
                .map(|d| DocumentType::parse(&d)),
        }
    }
}

impl From<EvalRequest> for models::EvalRequest {
    fn from(req: EvalRequest) -> Self {
        Self {
            eval_name: req.eval_name,
            eval_description: req.eval_description,
            text: req.text,
        }
    }
}

impl From<ChatRequest> for models::ChatRequest {
    fn from(req: ChatRequest) -> Self {
        Self {
            message: req.message,
            context: req.context,
        }
    }
}

fn connect_label(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Hosted => "hosted provider",
        ProviderKind::SelfHosted => "self-hosted server",
    }
}

#[tonic::async_trait]
impl Writer for WriterService {
    #[tracing::instrument(skip(self, request), fields(identity))]
    async fn connect(
        &self,
        request: Request<ConnectRequest>,
    ) -> Result<Response<ConnectResponse>, Status> {
        self.record_identity(&request);
        let request = request.into_inner();
        tracing::info!(kind = %request.kind, "Processing connect request");

        // Drop any existing connection first so a failed attempt never leaves a
        // stale provider behind.
        self.manager.disconnect().await;

        let response = match self.connect_inner(request).await {
            Ok(kind) => {
                let active = self.manager.active_config().await;
                tracing::debug!(config = ?active, "Connection committed");
                ConnectResponse {
                    success: true,
                    message: format!("Successfully connected to {}", connect_label(kind)),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Connect failed");
                ConnectResponse {
                    success: false,
                    message: e.to_string(),
                }
            }
        };

        Ok(Response::new(response))
    }

    #[tracing::instrument(skip(self, request), fields(identity))]
    async fn disconnect(
        &self,
        request: Request<DisconnectRequest>,
    ) -> Result<Response<DisconnectResponse>, Status> {
        self.record_identity(&request);
        self.manager.disconnect().await;
        Ok(Response::new(DisconnectResponse {
            success: true,
            message: "Disconnected".to_string(),
        }))
    }

    #[tracing::instrument(skip(self, request), fields(identity))]
    async fn submit_action(
        &self,
        request: Request<ActionRequest>,
    ) -> Result<Response<ActionResponse>, Status> {
        self.record_identity(&request);
        self.require_connection().await?;

        let action: models::ActionRequest = request.into_inner().into();
        tracing::info!(action = %action.action, "Processing action request");

        let response = match run_generation(&self.manager, &GenerationRequest::Action(action)).await
        {
            Ok(result) => ActionResponse {
                success: true,
                text: Some(result.text),
                detail: None,
            },
            Err(e) => {
                tracing::error!(error = %e, "Action failed");
                ActionResponse {
                    success: false,
                    text: None,
                    detail: Some(e.to_string()),
                }
            }
        };

        Ok(Response::new(response))
    }

    #[tracing::instrument(skip(self, request), fields(identity))]
    async fn submit_eval(
        &self,
        request: Request<EvalRequest>,
    ) -> Result<Response<EvalResponse>, Status> {
        self.record_identity(&request);
        self.require_connection().await?;

        let eval: models::EvalRequest = request.into_inner().into();
        tracing::info!(eval = %eval.eval_name, "Processing evaluation request");

        let response = match run_generation(&self.manager, &GenerationRequest::Eval(eval)).await {
            Ok(result) => EvalResponse {
                success: true,
                score: result.score.map(i32::from),
                result: Some(result.text),
                detail: None,
            },
            Err(e) => {
                tracing::error!(error = %e, "Evaluation failed");
                EvalResponse {
                    success: false,
                    result: None,
                    score: None,
                    detail: Some(e.to_string()),
                }
            }
        };

        Ok(Response::new(response))
    }

    #[tracing::instrument(skip(self, request), fields(identity))]
    async fn chat(&self, request: Request<ChatRequest>) -> Result<Response<ChatResponse>, Status> {
        self.record_identity(&request);
        self.require_connection().await?;

        let chat: models::ChatRequest = request.into_inner().into();
        match run_generation(&self.manager, &GenerationRequest::Chat(chat)).await {
            Ok(result) => Ok(Response::new(ChatResponse {
                text: result.text,
                success: true,
                detail: None,
            })),
            Err(e) => {
                tracing::error!(error = %e, "Chat failed");
                match self.chat_errors {
                    ChatErrorPolicy::ServerError => Err(Status::internal(e.to_string())),
                    ChatErrorPolicy::Envelope => Ok(Response::new(ChatResponse {
                        text: String::new(),
                        success: false,
                        detail: Some(e.to_string()),
                    })),
                }
            }
        }
    }

    async fn status(
        &self,
        _request: Request<StatusRequest>,
    ) -> Result<Response<StatusResponse>, Status> {
        let status = self.manager.status().await;
        Ok(Response::new(StatusResponse {
            connected: status.connected,
            provider_kind: status.kind.map(|k| k.to_string()),
        }))
    }

    async fn health(
        &self,
        _request: Request<HealthRequest>,
    ) -> Result<Response<HealthResponse>, Status> {
        let status = self.manager.status().await;
        Ok(Response::new(HealthResponse {
            status: "healthy".to_string(),
            llm_connected: status.connected,
            llm_type: status.kind.map(|k| k.to_string()),
        }))
    }
}
