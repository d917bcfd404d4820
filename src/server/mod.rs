//! HTTP surface: routes, body shapes, CORS, and error-to-status mapping.

pub mod body;

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::error::RelayError;
use crate::relay::Relay;
use body::JsonOrForm;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub board: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub board: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub resolution: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    pub msg: String,
}

/// Body of every non-2xx reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Failed { .. } | Self::OutputTooLarge { .. } => StatusCode::BAD_GATEWAY,
            Self::Spawn { .. } | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent back to the client. Collaborator stderr is cut down to its
    /// last non-empty line; the full excerpt only goes to the log.
    pub fn client_message(&self) -> String {
        match self {
            Self::Failed {
                program,
                code,
                stderr,
            } => {
                let summary = stderr
                    .lines()
                    .map(str::trim)
                    .rfind(|line| !line.is_empty())
                    .unwrap_or_default();
                format!("{program} exited with code {code}: {summary}")
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_client_error() {
            debug!(status = status.as_u16(), error = %self, "request rejected");
        } else {
            error!(status = status.as_u16(), error = %self, "request failed");
        }
        error_response(status, self.client_message())
    }
}

/// `POST /extract`
async fn extract(
    State(relay): State<Arc<Relay>>,
    JsonOrForm(req): JsonOrForm<ExtractRequest>,
) -> Result<Json<ExtractResponse>, RelayError> {
    let board = relay.extract(&req.path).await?;
    Ok(Json(ExtractResponse { board }))
}

/// `POST /resolve`
async fn resolve(
    State(relay): State<Arc<Relay>>,
    JsonOrForm(req): JsonOrForm<ResolveRequest>,
) -> Result<Json<ResolveResponse>, RelayError> {
    let resolution = relay.resolve(&req.board).await?;
    Ok(Json(ResolveResponse { resolution }))
}

/// `GET /ping`
async fn ping(State(relay): State<Arc<Relay>>) -> Json<PingResponse> {
    Json(PingResponse {
        msg: relay.ping().to_string(),
    })
}

/// Any origin, credentials allowed. Origins are mirrored since a wildcard
/// cannot be combined with credentials.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_credentials(true)
}

pub fn build_router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/extract", post(extract))
        .route("/resolve", post(resolve))
        .route("/ping", get(ping))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

/// Serve until `shutdown` resolves, then let in-flight requests finish.
pub async fn serve<F>(listener: TcpListener, relay: Arc<Relay>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "relay listening");
    axum::serve(listener, build_router(relay))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("relay stopped");
    Ok(())
}
