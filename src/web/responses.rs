use crate::domain::models::Answer;
use crate::services::responses::{submit_response, SubmissionError, SubmissionOutcome};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayload {
    pub member_id: Uuid,
    pub answers: Vec<Answer>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/:run_id/responses", post(submit))
        .with_state(state)
}

fn status_for(err: &SubmissionError) -> StatusCode {
    match err {
        SubmissionError::RunNotFound => StatusCode::NOT_FOUND,
        SubmissionError::WrongMember => StatusCode::FORBIDDEN,
        SubmissionError::UnknownQuestion(_)
        | SubmissionError::DuplicateAnswer(_)
        | SubmissionError::MissingRequired(_)
        | SubmissionError::InvalidAnswer(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SubmissionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn submit(
    State(state): State<SharedState>,
    Path(run_id): Path<Uuid>,
    Json(payload): Json<SubmitPayload>,
) -> Result<(StatusCode, Json<SubmissionOutcome>), StatusCode> {
    let outcome = submit_response(
        state.store.as_ref(),
        run_id,
        payload.member_id,
        payload.answers,
        Utc::now(),
    )
    .await
    .map_err(|e| {
        let status = status_for(&e);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Failed to store response for run {}: {}", run_id, e);
        } else {
            tracing::warn!("Rejected response for run {}: {}", run_id, e);
        }
        status
    })?;

    Ok((StatusCode::CREATED, Json(outcome)))
}
