use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{info, warn};

use super::catalog::QuestionCatalog;
use super::domain::RawInput;
use super::repository::{
    RepositoryError, SessionRepository, SessionView, SubmissionError, SubmissionSink,
};
use super::sequencer::{FlowError, FlowSequencer, Turn};
use super::session::{SessionId, SessionStatus, SubmissionRecord, SurveySession};
use super::verification::{EmailVerdict, EmailVerifier};

/// Service composing the sequencer with session storage, email verification, and submission.
pub struct SurveyService<R, S> {
    repository: Arc<R>,
    submissions: Arc<S>,
    verifier: Arc<dyn EmailVerifier>,
    sequencer: FlowSequencer,
    in_flight: Mutex<HashSet<SessionId>>,
}

/// Response payload for a freshly started session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStarted {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub turn: Turn,
}

impl<R, S> SurveyService<R, S>
where
    R: SessionRepository + 'static,
    S: SubmissionSink + 'static,
{
    pub fn new(
        repository: Arc<R>,
        submissions: Arc<S>,
        verifier: Arc<dyn EmailVerifier>,
    ) -> Self {
        Self::with_sequencer(repository, submissions, verifier, FlowSequencer::standard())
    }

    pub fn with_sequencer(
        repository: Arc<R>,
        submissions: Arc<S>,
        verifier: Arc<dyn EmailVerifier>,
        sequencer: FlowSequencer,
    ) -> Self {
        Self {
            repository,
            submissions,
            verifier,
            sequencer,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        self.sequencer.catalog()
    }

    /// Create a session, persist it, and return the opening turn.
    pub fn start(&self) -> Result<SessionStarted, SurveyServiceError> {
        let mut session = SurveySession::new();
        let turn = self.sequencer.begin(&mut session);
        let stored = self.repository.insert(session)?;
        info!(session_id = %stored.id(), "survey session started");

        if let Turn::Complete { record, .. } = &turn {
            self.deliver(stored.id(), record.clone())?;
        }

        Ok(SessionStarted {
            session_id: stored.id().clone(),
            status: stored.status(),
            turn,
        })
    }

    pub fn get(&self, session_id: &SessionId) -> Result<SurveySession, SurveyServiceError> {
        let session = self
            .repository
            .fetch(session_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(session)
    }

    pub fn view(&self, session_id: &SessionId) -> Result<SessionView, SurveyServiceError> {
        let session = self.get(session_id)?;
        let turn = self.sequencer.current_turn(&session);

        Ok(SessionView {
            session_id: session.id().clone(),
            status: session.status(),
            current_step: session.current_step(),
            total_steps: self.catalog().len(),
            answered: session.answers().len(),
            question: turn.question().cloned(),
            pending_email: session.pending().map(|pending| pending.value.clone()),
            result: session.result().cloned(),
        })
    }

    /// Submit raw input for a session's open step.
    ///
    /// Only one request per session runs at a time; overlapping requests get
    /// [`SurveyServiceError::Busy`]. While an email check is outstanding the session is
    /// stored as awaiting verification so readers observe the suspension. If that request
    /// is dropped before the check resolves, the next answer re-opens the step.
    pub async fn answer(
        &self,
        session_id: &SessionId,
        step: Option<usize>,
        input: RawInput,
    ) -> Result<Turn, SurveyServiceError> {
        let _claim = self.claim(session_id)?;
        let mut session = self.get(session_id)?;

        // Holding the claim means no check is live; a stored one was cancelled mid-flight.
        if let Some(interrupted) = session.take_pending() {
            warn!(
                session_id = %session_id,
                step = interrupted.step,
                "discarding interrupted email verification"
            );
        }

        let turn = match self.sequencer.accept(&mut session, step, input)? {
            Turn::Verify { email, .. } => {
                self.repository.update(session.clone())?;
                let verdict = self.verifier.verify(&email).await;
                self.sequencer.resolve_verification(&mut session, &verdict)?
            }
            turn => turn,
        };

        self.repository.update(session)?;

        if let Turn::Complete { record, .. } = &turn {
            self.deliver(session_id, record.clone())?;
        }

        Ok(turn)
    }

    /// Standalone deliverability check, independent of any session.
    pub async fn validate_email(&self, email: &str) -> EmailVerdict {
        self.verifier.verify(email).await
    }

    fn deliver(
        &self,
        session_id: &SessionId,
        record: SubmissionRecord,
    ) -> Result<(), SurveyServiceError> {
        match self.submissions.deliver(record) {
            Ok(()) => {
                info!(session_id = %session_id, "submission delivered");
                if let Err(err) = self.repository.archive(session_id) {
                    warn!(session_id = %session_id, error = %err, "failed to archive session");
                }
                Ok(())
            }
            Err(err) => {
                warn!(session_id = %session_id, error = %err, "submission delivery failed");
                Err(err.into())
            }
        }
    }

    fn claim(&self, session_id: &SessionId) -> Result<InFlight<'_>, SurveyServiceError> {
        let mut guard = self
            .in_flight
            .lock()
            .map_err(|_| RepositoryError::Unavailable("in-flight registry poisoned".to_string()))?;
        if !guard.insert(session_id.clone()) {
            return Err(SurveyServiceError::Busy(session_id.clone()));
        }
        Ok(InFlight {
            registry: &self.in_flight,
            session_id: session_id.clone(),
        })
    }
}

/// Releases the per-session claim when the request finishes.
struct InFlight<'a> {
    registry: &'a Mutex<HashSet<SessionId>>,
    session_id: SessionId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.registry.lock() {
            guard.remove(&self.session_id);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SurveyServiceError {
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("session {0} is already processing a request")]
    Busy(SessionId),
}
