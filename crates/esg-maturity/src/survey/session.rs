use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::domain::AnswerValue;
use super::scoring::ScoreResult;

pub const SCORE_TOTAL_KEY: &str = "score_total";
pub const SCORE_LEVEL_KEY: &str = "score_level";
pub const SCORE_LEVEL_NAME_KEY: &str = "score_level_name";
pub const CONFIDENCE_KEY: &str = "confidence";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("session-{id:06}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    AwaitingVerification,
    Finalized,
}

/// Answer held back from commit until its external check resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVerification {
    pub step: usize,
    pub field_key: String,
    pub value: String,
}

/// Per-respondent state. Only the flow sequencer mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySession {
    id: SessionId,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    current_step: usize,
    status: SessionStatus,
    answers: BTreeMap<String, AnswerValue>,
    scores: BTreeMap<String, u32>,
    pending: Option<PendingVerification>,
    result: Option<ScoreResult>,
}

impl Default for SurveySession {
    fn default() -> Self {
        Self::new()
    }
}

impl SurveySession {
    pub fn new() -> Self {
        Self::with_id(next_session_id())
    }

    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            started_at: Utc::now(),
            completed_at: None,
            current_step: 0,
            status: SessionStatus::InProgress,
            answers: BTreeMap::new(),
            scores: BTreeMap::new(),
            pending: None,
            result: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_finalized(&self) -> bool {
        self.status == SessionStatus::Finalized
    }

    pub fn answers(&self) -> &BTreeMap<String, AnswerValue> {
        &self.answers
    }

    pub fn answer(&self, field_key: &str) -> Option<&AnswerValue> {
        self.answers.get(field_key)
    }

    pub fn scores(&self) -> &BTreeMap<String, u32> {
        &self.scores
    }

    pub fn score(&self, field_key: &str) -> Option<u32> {
        self.scores.get(field_key).copied()
    }

    pub fn pending(&self) -> Option<&PendingVerification> {
        self.pending.as_ref()
    }

    pub fn result(&self) -> Option<&ScoreResult> {
        self.result.as_ref()
    }

    /// Flat record for the submission collaborator; only available once finalized.
    pub fn submission_record(&self) -> Option<SubmissionRecord> {
        self.result
            .as_ref()
            .map(|result| SubmissionRecord::new(&self.answers, result))
    }

    pub(crate) fn set_answer(&mut self, field_key: &str, value: AnswerValue) {
        self.answers.insert(field_key.to_string(), value);
    }

    /// Overwrites any earlier score for the field.
    pub(crate) fn set_score(&mut self, field_key: &str, score: u32) {
        self.scores.insert(field_key.to_string(), score);
    }

    pub(crate) fn advance_step(&mut self) -> usize {
        self.current_step += 1;
        self.current_step
    }

    pub(crate) fn hold_for_verification(&mut self, pending: PendingVerification) {
        self.pending = Some(pending);
        self.status = SessionStatus::AwaitingVerification;
    }

    pub(crate) fn take_pending(&mut self) -> Option<PendingVerification> {
        let pending = self.pending.take();
        if self.status == SessionStatus::AwaitingVerification {
            self.status = SessionStatus::InProgress;
        }
        pending
    }

    pub(crate) fn finalize(&mut self, result: ScoreResult, completed_at: DateTime<Utc>) {
        self.status = SessionStatus::Finalized;
        self.completed_at = Some(completed_at);
        self.result = Some(result);
    }
}

/// Answers merged with the four derived result fields, keyed for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionRecord(Map<String, Value>);

impl SubmissionRecord {
    pub fn new(answers: &BTreeMap<String, AnswerValue>, result: &ScoreResult) -> Self {
        let mut map = Map::new();
        for (field, value) in answers {
            let json = match value {
                AnswerValue::Text(text) => Value::String(text.clone()),
                AnswerValue::List(values) => {
                    Value::Array(values.iter().cloned().map(Value::String).collect())
                }
            };
            map.insert(field.clone(), json);
        }

        map.insert(SCORE_TOTAL_KEY.to_string(), Value::from(result.total));
        map.insert(SCORE_LEVEL_KEY.to_string(), Value::from(result.level));
        map.insert(
            SCORE_LEVEL_NAME_KEY.to_string(),
            Value::String(result.level_name.clone()),
        );
        map.insert(CONFIDENCE_KEY.to_string(), Value::from(result.confidence));

        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
