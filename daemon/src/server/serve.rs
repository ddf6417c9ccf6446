//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::Error;
use crate::server::handlers::{
    add_deployment_handler, deploy_handler, health_handler, hook_handler,
    list_deployments_handler, remove_deployment_handler, routing_sync_handler, status_handler,
    update_deployment_handler, version_handler,
};
use crate::server::state::ServerState;

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), Error>>, Error> {
    let app = Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Push events
        .route("/hook", post(hook_handler))
        // Registry administration
        .route("/deployments", get(list_deployments_handler))
        .route("/deployments", post(add_deployment_handler))
        .route("/deployments/status", get(status_handler))
        .route("/deployments/{name}", put(update_deployment_handler))
        .route("/deployments/{name}", delete(remove_deployment_handler))
        .route("/deployments/{name}/deploy", post(deploy_handler))
        // Routing
        .route("/routing/sync", post(routing_sync_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Server(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| Error::Server(e.to_string()))
    });

    Ok(handle)
}
