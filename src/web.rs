//! HTTP surface for the reconciliation service.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use miette::IntoDiagnostic;
use serde::{Deserialize, Serialize};

use crate::rbac::types::{ClassifiedSubject, GrantOutcome, RevokeOutcome};
use crate::service::Reconciler;
use crate::settings::Settings;

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MembersResponse {
    pub role: String,
    pub members: Vec<ClassifiedSubject>,
}

#[derive(Debug, Serialize)]
pub struct SubjectRolesResponse {
    pub subject: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub subject: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct GrantResponse {
    pub outcome: GrantOutcome,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub outcome: RevokeOutcome,
}

pub fn router(reconciler: Arc<Reconciler>) -> Router {
    Router::new()
        .route("/v1/roles", get(list_roles))
        .route("/v1/roles/{role}/members", get(role_members))
        .route("/v1/subjects/{subject}/roles", get(subject_roles))
        .route("/v1/grants", post(grant_role))
        .route("/v1/revocations", post(revoke_role))
        .route("/healthz", get(health))
        .with_state(reconciler)
}

async fn list_roles(State(reconciler): State<Arc<Reconciler>>) -> impl IntoResponse {
    match reconciler.list_roles().await {
        Ok(roles) => Json(RolesResponse { roles }).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn role_members(
    State(reconciler): State<Arc<Reconciler>>,
    Path(role): Path<String>,
) -> impl IntoResponse {
    match reconciler.resolve_role_members(&role).await {
        Ok(members) => Json(MembersResponse { role, members }).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn subject_roles(
    State(reconciler): State<Arc<Reconciler>>,
    Path(subject): Path<String>,
) -> impl IntoResponse {
    match reconciler.resolve_subject_roles(&subject).await {
        Ok(roles) => Json(SubjectRolesResponse { subject, roles }).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn grant_role(
    State(reconciler): State<Arc<Reconciler>>,
    Json(req): Json<GrantRequest>,
) -> impl IntoResponse {
    match reconciler.grant_role(&req.subject, &req.role).await {
        Ok(outcome) => Json(GrantResponse { outcome }).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn revoke_role(
    State(reconciler): State<Arc<Reconciler>>,
    Json(req): Json<GrantRequest>,
) -> impl IntoResponse {
    match reconciler.revoke_role(&req.subject, &req.role).await {
        Ok(outcome) => Json(RevokeResponse { outcome }).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn serve(settings: &Settings, reconciler: Arc<Reconciler>) -> miette::Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .map_err(|e| miette::miette!("bad listen addr: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    tracing::info!(%addr, "Reconciliation API listening");
    axum::serve(listener, router(reconciler))
        .await
        .into_diagnostic()?;
    Ok(())
}
