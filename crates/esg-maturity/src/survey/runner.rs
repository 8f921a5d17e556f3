use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::domain::{QuestionPrompt, RawInput};
use super::pacing::Pacing;
use super::repository::{SubmissionError, SubmissionSink};
use super::scoring::ScoreResult;
use super::sequencer::{FlowError, FlowSequencer, Turn};
use super::session::SurveySession;
use super::verification::EmailVerifier;

/// Rendering side of a survey: shows prompts and hands back whatever the respondent entered.
#[async_trait]
pub trait SurveyPresenter: Send {
    /// `None` means the respondent walked away.
    async fn ask(&mut self, question: &QuestionPrompt) -> Option<RawInput>;

    async fn show_lead_in(&mut self, _lead_in: &str) {}

    async fn show_rejection(&mut self, _question: &QuestionPrompt, _message: &str) {}

    async fn show_verifying(&mut self, _email: &str) {}

    async fn show_result(&mut self, _result: &ScoreResult) {}
}

/// Drives one session from the first question to submission of the final record.
pub struct SurveyRunner<S> {
    sequencer: FlowSequencer,
    verifier: Arc<dyn EmailVerifier>,
    sink: Arc<S>,
    pacing: Pacing,
}

impl<S> SurveyRunner<S>
where
    S: SubmissionSink + 'static,
{
    pub fn new(sequencer: FlowSequencer, verifier: Arc<dyn EmailVerifier>, sink: Arc<S>) -> Self {
        Self {
            sequencer,
            verifier,
            sink,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn sequencer(&self) -> &FlowSequencer {
        &self.sequencer
    }

    pub async fn run<P>(
        &self,
        session: &mut SurveySession,
        presenter: &mut P,
    ) -> Result<ScoreResult, RunnerError>
    where
        P: SurveyPresenter,
    {
        info!(
            session_id = %session.id(),
            step = session.current_step(),
            "survey session started"
        );
        let mut turn = self.sequencer.begin(session);

        loop {
            turn = match turn {
                Turn::Ask { question } => {
                    if question.step > 0 {
                        self.pacing.pause().await;
                    }
                    if let Some(lead_in) = question.lead_in {
                        presenter.show_lead_in(lead_in).await;
                    }
                    self.prompt(session, &question, presenter).await?
                }
                Turn::Reask {
                    question, message, ..
                } => {
                    presenter.show_rejection(&question, &message).await;
                    self.prompt(session, &question, presenter).await?
                }
                Turn::Verify { email, .. } => {
                    presenter.show_verifying(&email).await;
                    self.sequencer
                        .verify_pending(session, self.verifier.as_ref())
                        .await?
                }
                Turn::Complete { result, record } => {
                    presenter.show_result(&result).await;
                    self.sink.deliver(record)?;
                    info!(
                        session_id = %session.id(),
                        total = result.total,
                        "submission delivered"
                    );
                    return Ok(result);
                }
            };
        }
    }

    async fn prompt<P>(
        &self,
        session: &mut SurveySession,
        question: &QuestionPrompt,
        presenter: &mut P,
    ) -> Result<Turn, RunnerError>
    where
        P: SurveyPresenter,
    {
        let input = presenter
            .ask(question)
            .await
            .ok_or(RunnerError::Abandoned {
                step: question.step,
            })?;

        Ok(self.sequencer.accept(session, Some(question.step), input)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("respondent abandoned the survey at step {step}")]
    Abandoned { step: usize },
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}
