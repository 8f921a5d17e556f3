use serde::Serialize;

use super::domain::QuestionPrompt;
use super::scoring::ScoreResult;
use super::session::{SessionId, SessionStatus, SubmissionRecord, SurveySession};

/// Storage abstraction so the service can be exercised without a backing store.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, session: SurveySession) -> Result<SurveySession, RepositoryError>;
    fn update(&self, session: SurveySession) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<SurveySession>, RepositoryError>;
    /// Retires a finalized session after its record was delivered. Implementations may keep
    /// it readable for a while but must not retain archived sessions without bound.
    fn archive(&self, id: &SessionId) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook receiving the flat record of every finalized session.
pub trait SubmissionSink: Send + Sync {
    fn deliver(&self, record: SubmissionRecord) -> Result<(), SubmissionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("submission transport unavailable: {0}")]
    Transport(String),
    #[error("failed to write submission: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode submission: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Sanitized representation of a session for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub current_step: usize,
    pub total_steps: usize,
    pub answered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionPrompt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScoreResult>,
}
