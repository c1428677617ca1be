use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use crate::error::AppError;

use super::poller::PollOutcome;
use super::service::{ProofingRequest, ProofingService};
use super::stage::Stage;
use super::store::{ResultId, ResultStore};

/// Header carrying the callback token when no bearer token is sent.
pub const API_AUTH_HEADER: &str = "x-api-auth-token";

/// Router builder exposing job submission, result polling and executor callbacks.
pub fn proofing_router<S>(service: Arc<ProofingService<S>>) -> Router
where
    S: ResultStore + 'static,
{
    Router::new()
        .route("/api/v1/proofing/:stage/jobs", post(submit_handler::<S>))
        .route(
            "/api/v1/proofing/:stage/callback",
            post(callback_handler::<S>),
        )
        .route(
            "/api/v1/proofing/results/:result_id",
            get(result_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<ProofingService<S>>>,
    Path(stage): Path<String>,
    axum::Json(request): axum::Json<ProofingRequest>,
) -> Result<Response, AppError>
where
    S: ResultStore + 'static,
{
    let stage: Stage = stage.parse()?;
    let result_id = service.submit(stage, request)?;
    let payload = json!({ "result_id": result_id });
    Ok((StatusCode::ACCEPTED, axum::Json(payload)).into_response())
}

pub(crate) async fn result_handler<S>(
    State(service): State<Arc<ProofingService<S>>>,
    Path(result_id): Path<String>,
) -> Result<Response, AppError>
where
    S: ResultStore + 'static,
{
    let result_id = ResultId::parse(result_id)?;
    match service.result(&result_id)? {
        PollOutcome::Ready(result) => Ok((StatusCode::OK, axum::Json(result)).into_response()),
        PollOutcome::Absent => {
            let payload = json!({
                "result_id": result_id,
                "status": "pending",
            });
            Ok((StatusCode::ACCEPTED, axum::Json(payload)).into_response())
        }
    }
}

pub(crate) async fn callback_handler<S>(
    State(service): State<Arc<ProofingService<S>>>,
    Path(stage): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError>
where
    S: ResultStore + 'static,
{
    let stage: Stage = stage.parse()?;
    service.receive_callback(presented_token(&headers), stage, &body)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);
    bearer.or_else(|| {
        headers
            .get(API_AUTH_HEADER)
            .and_then(|value| value.to_str().ok())
    })
}
