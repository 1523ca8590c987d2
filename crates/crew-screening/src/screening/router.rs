use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{CandidateId, EngineKind};
use super::repository::{CandidateSource, RepositoryError, TrustRepository};
use super::service::{OverrideRequest, ScreeningService, ScreeningServiceError};

/// Router builder exposing engine runs, the trust view, the executive summary and overrides.
pub fn screening_router<C, R>(service: Arc<ScreeningService<C, R>>) -> Router
where
    C: CandidateSource + 'static,
    R: TrustRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/candidates/:candidate_id/engines/:engine",
            post(compute_handler::<C, R>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/trust",
            get(trust_handler::<C, R>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/decision",
            get(decision_handler::<C, R>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/override",
            post(override_handler::<C, R>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/override/:override_id/revoke",
            post(revoke_handler::<C, R>),
        )
        .with_state(service)
}

pub(crate) async fn compute_handler<C, R>(
    State(service): State<Arc<ScreeningService<C, R>>>,
    Path((candidate_id, engine)): Path<(String, String)>,
) -> Response
where
    C: CandidateSource + 'static,
    R: TrustRepository + 'static,
{
    let Some(engine) = EngineKind::from_key(&engine) else {
        let payload = json!({
            "error": format!("unknown engine '{engine}'"),
        });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    let candidate = CandidateId(candidate_id);
    match service.compute(&candidate, engine) {
        Ok(Some(output)) => (StatusCode::OK, axum::Json(output)).into_response(),
        Ok(None) => {
            let payload = json!({
                "candidate_id": candidate.0,
                "engine": engine.key(),
                "computed": false,
                "detail": "engine disabled or evidence missing",
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn trust_handler<C, R>(
    State(service): State<Arc<ScreeningService<C, R>>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    C: CandidateSource + 'static,
    R: TrustRepository + 'static,
{
    let candidate = CandidateId(candidate_id);
    match service.presenter(&candidate) {
        Ok(Some(view)) => (StatusCode::OK, axum::Json(view)).into_response(),
        Ok(None) => not_found(&candidate),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn decision_handler<C, R>(
    State(service): State<Arc<ScreeningService<C, R>>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    C: CandidateSource + 'static,
    R: TrustRepository + 'static,
{
    let candidate = CandidateId(candidate_id);
    match service.executive_summary(&candidate) {
        Ok(Some(summary)) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Ok(None) => not_found(&candidate),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn override_handler<C, R>(
    State(service): State<Arc<ScreeningService<C, R>>>,
    Path(candidate_id): Path<String>,
    axum::Json(request): axum::Json<OverrideRequest>,
) -> Response
where
    C: CandidateSource + 'static,
    R: TrustRepository + 'static,
{
    let candidate = CandidateId(candidate_id);
    match service.record_override(&candidate, request) {
        Ok(stored) => (StatusCode::CREATED, axum::Json(stored)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn revoke_handler<C, R>(
    State(service): State<Arc<ScreeningService<C, R>>>,
    Path((candidate_id, override_id)): Path<(String, u64)>,
) -> Response
where
    C: CandidateSource + 'static,
    R: TrustRepository + 'static,
{
    let candidate = CandidateId(candidate_id);
    match service.revoke_override(&candidate, override_id) {
        Ok(revoked) => (StatusCode::OK, axum::Json(revoked)).into_response(),
        Err(other) => error_response(other),
    }
}

fn not_found(candidate: &CandidateId) -> Response {
    let payload = json!({
        "error": format!("candidate {candidate} not found"),
    });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

fn error_response(error: ScreeningServiceError) -> Response {
    let status = match &error {
        ScreeningServiceError::UnknownCandidate(_)
        | ScreeningServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ScreeningServiceError::InvalidOverride(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ScreeningServiceError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
        ScreeningServiceError::Repository(RepositoryError::Unavailable(_))
        | ScreeningServiceError::Source(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
