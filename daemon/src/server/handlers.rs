//! HTTP request handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::deploy::reconciler::Outcome;
use crate::errors::Error;
use crate::models::event::PushEvent;
use crate::registry::model::Deployment;
use crate::server::signature;
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Outcome envelope returned by the hook and by mutating endpoints
#[derive(Debug, Serialize)]
pub struct OutcomeResponse {
    pub success: bool,
    pub message: String,
}

fn respond(status: StatusCode, success: bool, message: &str) -> (StatusCode, Json<OutcomeResponse>) {
    (
        status,
        Json(OutcomeResponse {
            success,
            message: message.to_string(),
        }),
    )
}

/// Map an engine error onto an HTTP status class: conflicts and bad input
/// are the caller's problem, everything else is ours.
fn failure(e: Error) -> (StatusCode, Json<OutcomeResponse>) {
    let status = match &e {
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Signature(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    respond(status, false, &e.to_string())
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "slipway".to_string(),
        version: version.version,
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Push event hook handler
///
/// Takes the raw body so the signature check covers exactly the bytes the
/// sender signed, then parses and hands the event to the reconciler.
pub async fn hook_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<OutcomeResponse>) {
    if let Some(secret) = &state.webhook_secret {
        let header = headers
            .get("X-Hub-Signature-256")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if header.is_empty() {
            return respond(
                StatusCode::BAD_REQUEST,
                false,
                "missing X-Hub-Signature-256 header",
            );
        }
        if let Err(e) = signature::verify(secret.expose_secret(), &body, header) {
            return failure(e);
        }
    }

    let event: PushEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            return respond(
                StatusCode::BAD_REQUEST,
                false,
                &format!("malformed push payload: {}", e),
            )
        }
    };

    let repository = event.repository.full_name.clone();
    let branch = event.branch().to_string();
    match state.reconciler.reconcile(&repository, &branch).await {
        Ok(Outcome::Ignored) => respond(StatusCode::OK, true, "No matching deployment"),
        Ok(Outcome::Deployed) => respond(StatusCode::OK, true, "Deployment successful"),
        Err(e) => failure(e),
    }
}

/// Registry listing response
#[derive(Debug, Serialize)]
pub struct DeploymentsResponse {
    pub deployments: Vec<Deployment>,
    pub total: usize,
}

/// Registry listing handler
pub async fn list_deployments_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<OutcomeResponse>)> {
    let doc = state.registry.load().await.map_err(failure)?;
    let total = doc.deployments.len();
    Ok(Json(DeploymentsResponse {
        deployments: doc.deployments,
        total,
    }))
}

/// Add-deployment handler
pub async fn add_deployment_handler(
    State(state): State<Arc<ServerState>>,
    Json(deployment): Json<Deployment>,
) -> (StatusCode, Json<OutcomeResponse>) {
    match state.registry.add(deployment).await {
        Ok(()) => respond(StatusCode::CREATED, true, "Deployment added"),
        Err(e) => failure(e),
    }
}

/// Update-deployment handler
pub async fn update_deployment_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
    Json(deployment): Json<Deployment>,
) -> (StatusCode, Json<OutcomeResponse>) {
    match state.registry.update(&name, deployment).await {
        Ok(()) => respond(StatusCode::OK, true, "Deployment updated"),
        Err(e) => failure(e),
    }
}

/// Remove-deployment handler
pub async fn remove_deployment_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<OutcomeResponse>) {
    match state.registry.remove(&name).await {
        Ok(()) => respond(StatusCode::OK, true, "Deployment removed"),
        Err(e) => failure(e),
    }
}

/// Manual deploy handler: replays the deployment's event by name
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<OutcomeResponse>) {
    match state.reconciler.deploy_by_name(&name).await {
        Ok(()) => respond(StatusCode::OK, true, "Deployment successful"),
        Err(e) => failure(e),
    }
}

/// Per-deployment status handler: last reconciliation outcome by name
pub async fn status_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(state.reconciler.statuses().await)
}

/// Routing sync handler: full regeneration from current registry state
pub async fn routing_sync_handler(
    State(state): State<Arc<ServerState>>,
) -> (StatusCode, Json<OutcomeResponse>) {
    match state.reconciler.sync_routing().await {
        Ok(()) => respond(StatusCode::OK, true, "Routing synchronized"),
        Err(e) => failure(e),
    }
}
