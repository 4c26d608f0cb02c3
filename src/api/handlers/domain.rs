//! Domain lookup handler.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use log::{error, warn};
use url::Host;

use super::super::types::ApiState;
use crate::error_handling::{ReconcileError, SourceError};
use crate::fetch::fetch_domain;
use crate::models::{now_utc, ErrorPayload};

const MAX_DOMAIN_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

/// `GET /api/domain/:server_name`
pub async fn domain_handler(
    State(state): State<ApiState>,
    Path(server_name): Path<String>,
) -> Response {
    let Some(domain) = normalize_domain(&server_name) else {
        warn!("Rejected lookup of invalid domain {:?}", server_name);
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorPayload::new(
                "INVALID_DOMAIN",
                false,
                format!("{} is not a valid domain name", server_name),
            )),
        )
            .into_response();
    };

    let now = now_utc();
    let result = state
        .reconciler
        .lookup(&domain, now, || fetch_domain(&state.fetch, &domain, now))
        .await;

    match result {
        Ok(reconciled) => Json(reconciled.record).into_response(),
        Err(e) => {
            let (status, payload) = error_status(&e);
            if status.is_server_error() {
                error!("Lookup of {} failed: {}", domain, e);
            } else {
                warn!("Lookup of {} incomplete: {}", domain, e);
            }
            (status, Json(payload)).into_response()
        }
    }
}

/// Lowercased ASCII host name for `raw`, or `None` if it is not a plausible
/// domain. IP literals are rejected; internationalized names come back in
/// punycode.
pub fn normalize_domain(raw: &str) -> Option<String> {
    let candidate = raw.trim().trim_end_matches('.');
    match Host::parse(candidate) {
        Ok(Host::Domain(domain)) if is_hostname(&domain) => Some(domain),
        _ => None,
    }
}

fn is_hostname(domain: &str) -> bool {
    domain.len() <= MAX_DOMAIN_LENGTH
        && domain.contains('.')
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= MAX_LABEL_LENGTH
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

/// HTTP status and payload for a failed lookup.
pub fn error_status(error: &ReconcileError) -> (StatusCode, ErrorPayload) {
    match error {
        ReconcileError::Source(SourceError::NotReady {
            status, message, ..
        }) => (
            StatusCode::ACCEPTED,
            ErrorPayload::new(status.clone(), false, message.clone()),
        ),
        ReconcileError::Source(SourceError::AssessmentFailed { status, .. }) => (
            StatusCode::OK,
            ErrorPayload::new(status.clone(), true, "ERROR"),
        ),
        ReconcileError::Source(SourceError::NoEndpoints { .. })
        | ReconcileError::EmptyServerList => (
            StatusCode::BAD_GATEWAY,
            ErrorPayload::new("ERROR", true, error.to_string()),
        ),
        ReconcileError::Source(source) => (
            StatusCode::BAD_GATEWAY,
            ErrorPayload::new("ERROR", false, source.to_string()),
        ),
        ReconcileError::Database(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorPayload::generic())
        }
    }
}
