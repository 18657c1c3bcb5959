//! HTTP front of the host.
//!
//! Strict request/response over loopback: each endpoint decodes one JSON body
//! and answers one JSON [`Response`]. Malformed bodies are answered in-band
//! with `error: true` rather than an HTTP failure status.

use crate::dispatch::HostContext;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tether_proto::{
    CommandRequest, Response, SessionRequest, COMMAND_PATH, HEALTH_PATH, SESSION_PATH,
    SHUTDOWN_PATH,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// How long in-flight requests may run after `/shutdown` before the server
/// stops regardless.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// State shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<HostContext>,
    pub shutdown: CancellationToken,
}

async fn session_handler(
    State(state): State<AppState>,
    body: Result<Json<SessionRequest>, JsonRejection>,
) -> Json<Response> {
    match body {
        Ok(Json(request)) => Json(state.context.open_session(request).await),
        Err(rejection) => Json(malformed(rejection)),
    }
}

async fn command_handler(
    State(state): State<AppState>,
    body: Result<Json<CommandRequest>, JsonRejection>,
) -> Json<Response> {
    match body {
        Ok(Json(request)) => Json(state.context.dispatch(request).await),
        Err(rejection) => Json(malformed(rejection)),
    }
}

async fn shutdown_handler(State(state): State<AppState>) -> Json<Response> {
    info!("Shutdown requested");
    state.shutdown.cancel();
    Json(Response::ok("shutting down"))
}

async fn health_handler() -> Json<Response> {
    Json(Response::ok("ok"))
}

fn malformed(rejection: JsonRejection) -> Response {
    warn!("Rejected request body: {}", rejection.body_text());
    Response::failure(format!("Malformed request: {}", rejection.body_text()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(SESSION_PATH, post(session_handler))
        .route(COMMAND_PATH, post(command_handler))
        .route(SHUTDOWN_PATH, get(shutdown_handler))
        .route(HEALTH_PATH, get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until `/shutdown` is requested or `shutdown` is cancelled.
///
/// After cancellation, open requests get [`SHUTDOWN_GRACE`] to finish; whatever
/// is still running after that is dropped.
pub async fn serve(
    listener: TcpListener,
    context: Arc<HostContext>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    let app = router(AppState {
        context,
        shutdown: shutdown.clone(),
    });

    info!("Listening on http://{}", addr);

    let graceful = axum::serve(listener, app).with_graceful_shutdown(shutdown.clone().cancelled_owned());

    tokio::select! {
        result = graceful => result?,
        _ = async {
            shutdown.cancelled().await;
            tokio::time::sleep(SHUTDOWN_GRACE).await;
        } => warn!("Grace period elapsed, dropping in-flight requests"),
    }

    info!("Server on {} stopped", addr);
    Ok(())
}
