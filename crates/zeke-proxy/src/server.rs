//! Axum router and server loop.
//!
//! [`serve`] runs on a pre-bound listener so the caller picks the address
//! (and tests can bind port 0).

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info};

use zeke_core::{ErrorRing, GatewayConfig};
use zeke_http::ResilientClient;
use zeke_mcp::{Credentials, McpDispatcher, ToolAdapter, ToolEndpoints};

use crate::forward::ChatProxy;

/// Shared state for all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub dispatcher: Arc<McpDispatcher>,
    pub proxy: Arc<ChatProxy>,
    pub ring: Arc<ErrorRing>,
}

impl AppState {
    /// Wire the MCP dispatcher and chat proxy around one shared client and
    /// ring log.
    pub fn new(config: &GatewayConfig, client: Arc<ResilientClient>) -> Self {
        let ring = Arc::new(ErrorRing::new(config.error_log_capacity));
        let adapter = ToolAdapter::new(client.clone(), ring.clone());
        let dispatcher = McpDispatcher::new(
            adapter,
            Credentials::new(config.api_key.clone()),
            ToolEndpoints {
                search_url: config.search_url.clone(),
                reader_url: config.reader_url.clone(),
            },
        );
        let proxy = ChatProxy::new(
            client,
            config.api_key.clone(),
            config.chat_url.clone(),
            ring.clone(),
        );

        Self {
            dispatcher: Arc::new(dispatcher),
            proxy: Arc::new(proxy),
            ring,
        }
    }

    /// Token for one inbound request, cancelled when the returned guard is
    /// dropped with the handler (client gone away).
    ///
    /// Not tied to server shutdown: graceful shutdown lets in-flight
    /// upstream calls finish.
    fn request_token() -> (CancellationToken, DropGuard) {
        let token = CancellationToken::new();
        let guard = token.clone().drop_guard();
        (token, guard)
    }
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mcp", post(mcp))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/healthz", get(healthz))
        .route("/debug/last-errors", get(last_errors))
        .with_state(state)
}

/// Run the server on `listener` until `cancel` fires, then stop accepting
/// and wait for in-flight requests to complete.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "zeke-bridge listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("zeke-bridge shut down");
    Ok(())
}

async fn mcp(State(state): State<AppState>, body: Bytes) -> Response {
    let (cancel, _guard) = AppState::request_token();

    match state.dispatcher.handle_body(&body, &cancel).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn chat_completions(State(state): State<AppState>, body: Bytes) -> Response {
    debug!(bytes = body.len(), "POST /v1/chat/completions");
    let (cancel, _guard) = AppState::request_token();
    state.proxy.forward(&body, &cancel).await
}

async fn healthz() -> &'static str {
    "OK"
}

async fn last_errors(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.ring.snapshot())
}
