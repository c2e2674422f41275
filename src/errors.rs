use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

use crate::accounts::AccountError;
use crate::rbac::errors::PolicyError;
use crate::store::StoreError;

/// Top-level error for reconciliation operations. Store and account
/// failures are propagated unchanged — retry policy, if any, belongs to the
/// port implementations, not to this engine.
#[derive(Debug, Error, Diagnostic)]
pub enum ReconcileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Accounts(#[from] AccountError),
}

impl IntoResponse for ReconcileError {
    fn into_response(self) -> Response {
        let status = match &self {
            // Upstream collaborators failing to answer is a gateway problem;
            // a document we cannot parse is ours to report as internal.
            ReconcileError::Store(StoreError::Unavailable(_))
            | ReconcileError::Accounts(AccountError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
