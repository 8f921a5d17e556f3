//! Conversational ESG maturity survey: question catalog, answer collection, scoring,
//! and the forward-only flow that ties them to a respondent session.

pub mod catalog;
pub(crate) mod collector;
pub mod domain;
pub mod pacing;
pub mod repository;
pub mod router;
pub mod runner;
pub mod scoring;
pub mod sequencer;
pub mod service;
pub mod session;
pub mod verification;

#[cfg(test)]
mod tests;

pub use catalog::{QuestionCatalog, NONE_SENTINEL};
pub use collector::collect;
pub use domain::{
    Answer, AnswerValue, ExternalCheck, QuestionDefinition, QuestionKind, QuestionPrompt,
    RawInput, ScoringRule, SurveySection, ValidationError,
};
pub use pacing::Pacing;
pub use repository::{
    RepositoryError, SessionRepository, SessionView, SubmissionError, SubmissionSink,
};
pub use router::{survey_router, AnswerRequest, EmailValidationRequest};
pub use runner::{RunnerError, SurveyPresenter, SurveyRunner};
pub use scoring::{
    confidence, MaturityLevel, ScoreResult, ScoringEngine, SectionScore, CONFIDENCE_DENOMINATOR,
};
pub use sequencer::{FlowError, FlowSequencer, Turn};
pub use service::{SessionStarted, SurveyService, SurveyServiceError};
pub use session::{
    PendingVerification, SessionId, SessionStatus, SubmissionRecord, SurveySession,
    CONFIDENCE_KEY, SCORE_LEVEL_KEY, SCORE_LEVEL_NAME_KEY, SCORE_TOTAL_KEY,
};
pub use verification::{EmailVerdict, EmailVerifier, SyntaxEmailVerifier};
