use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::RawInput;
use super::repository::{RepositoryError, SessionRepository, SubmissionSink};
use super::service::{SurveyService, SurveyServiceError};
use super::session::SessionId;

/// Body accepted by the answer endpoint. `step` guards against replaying a stale form.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub step: Option<usize>,
    pub input: RawInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailValidationRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// Router builder exposing the catalog, session, and email validation endpoints.
pub fn survey_router<R, S>(service: Arc<SurveyService<R, S>>) -> Router
where
    R: SessionRepository + 'static,
    S: SubmissionSink + 'static,
{
    Router::new()
        .route("/api/v1/survey/catalog", get(catalog_handler::<R, S>))
        .route("/api/v1/survey/sessions", post(start_handler::<R, S>))
        .route(
            "/api/v1/survey/sessions/:session_id",
            get(session_handler::<R, S>),
        )
        .route(
            "/api/v1/survey/sessions/:session_id/answers",
            post(answer_handler::<R, S>),
        )
        .route("/api/v1/email/validate", post(validate_email_handler::<R, S>))
        .with_state(service)
}

pub(crate) async fn catalog_handler<R, S>(
    State(service): State<Arc<SurveyService<R, S>>>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SubmissionSink + 'static,
{
    let catalog = service.catalog();
    let payload = json!({
        "total_steps": catalog.len(),
        "scored_questions": catalog.scored_count(),
        "questions": catalog.prompts(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn start_handler<R, S>(
    State(service): State<Arc<SurveyService<R, S>>>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SubmissionSink + 'static,
{
    match service.start() {
        Ok(started) => (StatusCode::CREATED, axum::Json(started)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn session_handler<R, S>(
    State(service): State<Arc<SurveyService<R, S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SubmissionSink + 'static,
{
    let id = SessionId(session_id);
    match service.view(&id) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn answer_handler<R, S>(
    State(service): State<Arc<SurveyService<R, S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<AnswerRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SubmissionSink + 'static,
{
    let id = SessionId(session_id);
    match service.answer(&id, request.step, request.input).await {
        Ok(turn) => (StatusCode::OK, axum::Json(turn)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn validate_email_handler<R, S>(
    State(service): State<Arc<SurveyService<R, S>>>,
    axum::Json(request): axum::Json<EmailValidationRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SubmissionSink + 'static,
{
    let email = request.email.unwrap_or_default();
    let email = email.trim();
    if email.is_empty() {
        let payload = json!({
            "valid": false,
            "error": "Email is required",
        });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    }

    let verdict = service.validate_email(email).await;
    let payload = json!({ "valid": verdict.is_valid() });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn error_response(error: SurveyServiceError) -> Response {
    let status = match &error {
        SurveyServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        SurveyServiceError::Repository(RepositoryError::Conflict)
        | SurveyServiceError::Flow(_)
        | SurveyServiceError::Busy(_) => StatusCode::CONFLICT,
        SurveyServiceError::Repository(RepositoryError::Unavailable(_))
        | SurveyServiceError::Submission(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
