//! Listing of every domain looked up so far.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use super::super::types::ApiState;
use crate::models::{ConsultedPayload, ErrorPayload};

/// `GET /api/consulted`
pub async fn consulted_handler(State(state): State<ApiState>) -> Response {
    match state.reconciler.store().list_domain_names().await {
        Ok(domains) => Json(ConsultedPayload {
            ok: true,
            message: false,
            domains,
        })
        .into_response(),
        Err(e) => {
            log::error!("Failed to list consulted domains: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorPayload::generic())).into_response()
        }
    }
}
