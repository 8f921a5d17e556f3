use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;
use tokio::sync::Notify;

use crate::survey::catalog::{QuestionCatalog, NONE_SENTINEL};
use crate::survey::domain::{QuestionDefinition, QuestionKind, QuestionPrompt, RawInput};
use crate::survey::repository::{
    RepositoryError, SessionRepository, SubmissionError, SubmissionSink,
};
use crate::survey::scoring::ScoreResult;
use crate::survey::session::{SessionId, SubmissionRecord, SurveySession};
use crate::survey::verification::{EmailVerdict, EmailVerifier};
use crate::survey::{survey_router, FlowSequencer, SurveyPresenter, SurveyService};

pub(super) const RESPONDENT_EMAIL: &str = "ops@example.com";

/// Raw input that answers `question` at the given maturity position.
///
/// Single-select questions take the option at `position` (clamped to the last option);
/// the multi-select question picks "None" at position zero and otherwise the first
/// `position` real solutions.
pub(super) fn input_at(question: &QuestionDefinition, position: usize) -> RawInput {
    match question.kind {
        QuestionKind::FreeText => RawInput::text(free_text_for(question.field_key)),
        QuestionKind::SingleSelect => {
            let index = position.min(question.options.len() - 1);
            RawInput::choice(question.options[index])
        }
        QuestionKind::MultiSelect => {
            if position == 0 {
                RawInput::choices([NONE_SENTINEL])
            } else {
                RawInput::choices(
                    question
                        .options
                        .iter()
                        .filter(|option| **option != NONE_SENTINEL)
                        .take(position)
                        .copied(),
                )
            }
        }
    }
}

pub(super) fn free_text_for(field_key: &str) -> &'static str {
    match field_key {
        "company_name" => "Acme Renewables",
        "major_countries" => "Kenya, Tanzania",
        "sector_industry" => "Renewable Energy",
        "total_emissions" => "12500",
        "email" => RESPONDENT_EMAIL,
        "Name" => "Jordan Mwangi",
        "Phone_number" => "+254 700 000 000",
        _ => "n/a",
    }
}

/// Full answer script for the standard catalog at a uniform maturity position.
pub(super) fn script_at(position: usize) -> Vec<RawInput> {
    QuestionCatalog::standard()
        .questions()
        .iter()
        .map(|question| input_at(question, position))
        .collect()
}

pub(super) fn sequencer() -> FlowSequencer {
    FlowSequencer::standard()
}

/// Walks a session forward until it reaches `step`, verifying email inline.
pub(super) fn advance_to(
    sequencer: &FlowSequencer,
    session: &mut SurveySession,
    step: usize,
    position: usize,
) {
    sequencer.begin(session);
    while session.current_step() < step {
        let question = sequencer
            .catalog()
            .lookup(session.current_step())
            .expect("question in range")
            .clone();
        let turn = sequencer
            .accept(session, Some(question.step), input_at(&question, position))
            .expect("answer accepted");
        if matches!(turn, crate::survey::Turn::Verify { .. }) {
            sequencer
                .resolve_verification(session, &EmailVerdict::Deliverable)
                .expect("verification resolves");
        }
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) sessions: Arc<Mutex<HashMap<SessionId, SurveySession>>>,
    archived: Arc<Mutex<Vec<SessionId>>>,
}

impl MemoryRepository {
    pub(super) fn archived(&self) -> Vec<SessionId> {
        self.archived.lock().expect("archive mutex poisoned").clone()
    }

    pub(super) fn stored(&self, id: &SessionId) -> Option<SurveySession> {
        self.sessions
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl SessionRepository for MemoryRepository {
    fn insert(&self, session: SurveySession) -> Result<SurveySession, RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        if guard.contains_key(session.id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id().clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: SurveySession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        guard.insert(session.id().clone(), session);
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SurveySession>, RepositoryError> {
        let guard = self.sessions.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn archive(&self, id: &SessionId) -> Result<(), RepositoryError> {
        self.archived
            .lock()
            .expect("archive mutex poisoned")
            .push(id.clone());
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _session: SurveySession) -> Result<SurveySession, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _session: SurveySession) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<SurveySession>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn archive(&self, _id: &SessionId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySink {
    records: Arc<Mutex<Vec<SubmissionRecord>>>,
}

impl MemorySink {
    pub(super) fn records(&self) -> Vec<SubmissionRecord> {
        self.records.lock().expect("sink mutex poisoned").clone()
    }
}

impl SubmissionSink for MemorySink {
    fn deliver(&self, record: SubmissionRecord) -> Result<(), SubmissionError> {
        self.records.lock().expect("sink mutex poisoned").push(record);
        Ok(())
    }
}

pub(super) struct OfflineSink;

impl SubmissionSink for OfflineSink {
    fn deliver(&self, _record: SubmissionRecord) -> Result<(), SubmissionError> {
        Err(SubmissionError::Transport("crm offline".to_string()))
    }
}

/// Verifier returning the same verdict every time and counting calls.
pub(super) struct FixedVerifier {
    verdict: EmailVerdict,
    calls: AtomicUsize,
}

impl FixedVerifier {
    pub(super) fn accepting() -> Self {
        Self {
            verdict: EmailVerdict::Deliverable,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn rejecting() -> Self {
        Self {
            verdict: EmailVerdict::rejected("mailbox does not exist"),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailVerifier for FixedVerifier {
    async fn verify(&self, _email: &str) -> EmailVerdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict.clone()
    }
}

/// Verifier that holds every call open until released.
#[derive(Default)]
pub(super) struct GatedVerifier {
    pub(super) entered: Notify,
    pub(super) release: Notify,
}

#[async_trait]
impl EmailVerifier for GatedVerifier {
    async fn verify(&self, _email: &str) -> EmailVerdict {
        self.entered.notify_one();
        self.release.notified().await;
        EmailVerdict::Deliverable
    }
}

/// Presenter replaying a fixed list of inputs and recording what it was shown.
#[derive(Default)]
pub(super) struct ScriptedPresenter {
    inputs: VecDeque<RawInput>,
    pub(super) asked: Vec<usize>,
    pub(super) lead_ins: Vec<String>,
    pub(super) rejections: Vec<(usize, String)>,
    pub(super) verifying: Vec<String>,
    pub(super) result: Option<ScoreResult>,
}

impl ScriptedPresenter {
    pub(super) fn new(inputs: impl IntoIterator<Item = RawInput>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SurveyPresenter for ScriptedPresenter {
    async fn ask(&mut self, question: &QuestionPrompt) -> Option<RawInput> {
        self.asked.push(question.step);
        self.inputs.pop_front()
    }

    async fn show_lead_in(&mut self, lead_in: &str) {
        self.lead_ins.push(lead_in.to_string());
    }

    async fn show_rejection(&mut self, question: &QuestionPrompt, message: &str) {
        self.rejections.push((question.step, message.to_string()));
    }

    async fn show_verifying(&mut self, email: &str) {
        self.verifying.push(email.to_string());
    }

    async fn show_result(&mut self, result: &ScoreResult) {
        self.result = Some(result.clone());
    }
}

pub(super) fn build_service(
    verifier: Arc<dyn EmailVerifier>,
) -> (
    SurveyService<MemoryRepository, MemorySink>,
    Arc<MemoryRepository>,
    Arc<MemorySink>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let sink = Arc::new(MemorySink::default());
    let service = SurveyService::new(repository.clone(), sink.clone(), verifier);
    (service, repository, sink)
}

pub(super) fn survey_router_with_service(
    service: SurveyService<MemoryRepository, MemorySink>,
) -> axum::Router {
    survey_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
