use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::catalog::QuestionCatalog;
use super::collector::collect;
use super::domain::{
    Answer, ExternalCheck, QuestionDefinition, QuestionPrompt, RawInput, ValidationError,
};
use super::scoring::{ScoreResult, ScoringEngine};
use super::session::{PendingVerification, SubmissionRecord, SurveySession};
use super::verification::{EmailVerdict, EmailVerifier};

/// What the presentation layer should do next.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Turn {
    Ask {
        question: QuestionPrompt,
    },
    Reask {
        question: QuestionPrompt,
        reason: ValidationError,
        message: String,
    },
    Verify {
        step: usize,
        email: String,
    },
    Complete {
        result: ScoreResult,
        record: SubmissionRecord,
    },
}

impl Turn {
    pub fn question(&self) -> Option<&QuestionPrompt> {
        match self {
            Turn::Ask { question } | Turn::Reask { question, .. } => Some(question),
            Turn::Verify { .. } | Turn::Complete { .. } => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Turn::Complete { .. })
    }
}

/// Rejections of an interaction that the session state does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("answer targets step {received} but the session is at step {expected}")]
    StaleStep { expected: usize, received: usize },
    #[error("the survey has already been finalized")]
    AlreadyFinalized,
    #[error("email verification for step {step} is still pending")]
    VerificationPending { step: usize },
    #[error("no email verification is pending")]
    NoPendingVerification,
}

/// Forward-only state machine over a session's step pointer.
#[derive(Debug, Clone)]
pub struct FlowSequencer {
    catalog: Arc<QuestionCatalog>,
    engine: ScoringEngine,
}

impl FlowSequencer {
    pub fn new(catalog: Arc<QuestionCatalog>) -> Self {
        Self {
            catalog,
            engine: ScoringEngine::new(),
        }
    }

    pub fn standard() -> Self {
        Self::new(Arc::new(QuestionCatalog::standard()))
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn engine(&self) -> ScoringEngine {
        self.engine
    }

    /// Opens the session at its current step. An empty catalog finalizes immediately.
    pub fn begin(&self, session: &mut SurveySession) -> Turn {
        match self.catalog.lookup(session.current_step()) {
            Some(question) => self.ask(question),
            None if session.is_finalized() => self.current_turn(session),
            None => self.finalize(session),
        }
    }

    /// Turn the session is waiting on, without changing it.
    pub fn current_turn(&self, session: &SurveySession) -> Turn {
        if let Some(result) = session.result() {
            return Turn::Complete {
                result: result.clone(),
                record: SubmissionRecord::new(session.answers(), result),
            };
        }

        if let Some(pending) = session.pending() {
            return Turn::Verify {
                step: pending.step,
                email: pending.value.clone(),
            };
        }

        match self.catalog.lookup(session.current_step()) {
            Some(question) => self.ask(question),
            None => {
                let result = self.engine.finalize(session.scores());
                Turn::Complete {
                    record: SubmissionRecord::new(session.answers(), &result),
                    result,
                }
            }
        }
    }

    /// Validates and commits an answer for the open step.
    ///
    /// Validation failures come back as [`Turn::Reask`] and leave the session untouched.
    /// Questions carrying an external check are held as pending and answered with
    /// [`Turn::Verify`]; the caller must follow up with [`Self::resolve_verification`].
    pub fn accept(
        &self,
        session: &mut SurveySession,
        step: Option<usize>,
        input: RawInput,
    ) -> Result<Turn, FlowError> {
        if session.is_finalized() {
            return Err(FlowError::AlreadyFinalized);
        }
        if let Some(pending) = session.pending() {
            return Err(FlowError::VerificationPending { step: pending.step });
        }

        let expected = session.current_step();
        if let Some(received) = step {
            if received != expected {
                return Err(FlowError::StaleStep { expected, received });
            }
        }

        let Some(question) = self.catalog.lookup(expected) else {
            return Ok(self.finalize(session));
        };

        let answer = match collect(question, input) {
            Ok(answer) => answer,
            Err(reason) => return Ok(self.reask(session, question, reason)),
        };

        match (question.external_check, answer) {
            (Some(ExternalCheck::EmailDeliverability), Answer::Text(email)) => {
                info!(
                    session_id = %session.id(),
                    step = question.step,
                    field = question.field_key,
                    "holding answer for email verification"
                );
                session.hold_for_verification(PendingVerification {
                    step: question.step,
                    field_key: question.field_key.to_string(),
                    value: email.clone(),
                });
                Ok(Turn::Verify {
                    step: question.step,
                    email,
                })
            }
            (_, answer) => Ok(self.commit(session, question, answer)),
        }
    }

    /// Applies the verifier's outcome to the held answer.
    pub fn resolve_verification(
        &self,
        session: &mut SurveySession,
        verdict: &EmailVerdict,
    ) -> Result<Turn, FlowError> {
        if session.is_finalized() {
            return Err(FlowError::AlreadyFinalized);
        }
        let pending = session
            .take_pending()
            .ok_or(FlowError::NoPendingVerification)?;

        let Some(question) = self.catalog.lookup(pending.step) else {
            return Err(FlowError::StaleStep {
                expected: session.current_step(),
                received: pending.step,
            });
        };

        match verdict {
            EmailVerdict::Deliverable => {
                info!(
                    session_id = %session.id(),
                    step = pending.step,
                    field = question.field_key,
                    "email verified"
                );
                Ok(self.commit(session, question, Answer::Text(pending.value)))
            }
            EmailVerdict::Rejected { reason } => {
                warn!(
                    session_id = %session.id(),
                    step = pending.step,
                    field = question.field_key,
                    %reason,
                    "email rejected by verifier"
                );
                Ok(self.reask(session, question, ValidationError::InvalidEmail))
            }
        }
    }

    /// Runs the held answer past the verifier and applies the outcome.
    pub async fn verify_pending(
        &self,
        session: &mut SurveySession,
        verifier: &dyn EmailVerifier,
    ) -> Result<Turn, FlowError> {
        let email = session
            .pending()
            .map(|pending| pending.value.clone())
            .ok_or(FlowError::NoPendingVerification)?;

        let verdict = verifier.verify(&email).await;
        self.resolve_verification(session, &verdict)
    }

    /// [`Self::accept`] followed by verification when the step requires it.
    pub async fn submit(
        &self,
        session: &mut SurveySession,
        step: Option<usize>,
        input: RawInput,
        verifier: &dyn EmailVerifier,
    ) -> Result<Turn, FlowError> {
        match self.accept(session, step, input)? {
            Turn::Verify { .. } => self.verify_pending(session, verifier).await,
            turn => Ok(turn),
        }
    }

    fn ask(&self, question: &QuestionDefinition) -> Turn {
        Turn::Ask {
            question: question.to_prompt(self.catalog.len()),
        }
    }

    fn reask(
        &self,
        session: &SurveySession,
        question: &QuestionDefinition,
        reason: ValidationError,
    ) -> Turn {
        info!(
            session_id = %session.id(),
            step = question.step,
            field = question.field_key,
            %reason,
            "answer rejected, asking again"
        );
        Turn::Reask {
            question: question.to_prompt(self.catalog.len()),
            message: reason.to_string(),
            reason,
        }
    }

    fn commit(
        &self,
        session: &mut SurveySession,
        question: &QuestionDefinition,
        answer: Answer,
    ) -> Turn {
        session.set_answer(question.field_key, answer.value());
        let score = self.engine.score(question, &answer);
        if let Some(score) = score {
            session.set_score(question.field_key, score);
        }

        info!(
            session_id = %session.id(),
            step = question.step,
            field = question.field_key,
            score = ?score,
            "answer committed"
        );

        let next = session.advance_step();
        match self.catalog.lookup(next) {
            Some(question) => self.ask(question),
            None => self.finalize(session),
        }
    }

    fn finalize(&self, session: &mut SurveySession) -> Turn {
        let result = self.engine.finalize(session.scores());
        session.finalize(result.clone(), Utc::now());

        info!(
            session_id = %session.id(),
            step = session.current_step(),
            total = result.total,
            level = result.level,
            confidence = result.confidence,
            "survey finalized"
        );

        Turn::Complete {
            record: SubmissionRecord::new(session.answers(), &result),
            result,
        }
    }
}
