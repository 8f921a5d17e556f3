use std::collections::{HashMap, VecDeque};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use esg_maturity::config::{EmailValidationConfig, StorageConfig, DEFAULT_ARCHIVE_CAPACITY};
use esg_maturity::survey::{
    EmailVerifier, RepositoryError, SessionId, SessionRepository, SubmissionError,
    SubmissionRecord, SubmissionSink, SurveySession, SyntaxEmailVerifier,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

use crate::verifier::AbstractApiEmailVerifier;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn poisoned(what: &str) -> String {
    format!("{what} mutex poisoned")
}

/// Active sessions plus a bounded archive of finalized ones, evicted oldest first.
#[derive(Clone)]
pub(crate) struct InMemorySessionRepository {
    store: Arc<Mutex<SessionStore>>,
}

struct SessionStore {
    active: HashMap<SessionId, SurveySession>,
    archived: HashMap<SessionId, SurveySession>,
    archive_order: VecDeque<SessionId>,
    archive_capacity: usize,
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::with_archive_capacity(DEFAULT_ARCHIVE_CAPACITY)
    }
}

impl InMemorySessionRepository {
    pub(crate) fn with_archive_capacity(archive_capacity: usize) -> Self {
        Self {
            store: Arc::new(Mutex::new(SessionStore {
                active: HashMap::new(),
                archived: HashMap::new(),
                archive_order: VecDeque::new(),
                archive_capacity,
            })),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SessionStore>, RepositoryError> {
        self.store
            .lock()
            .map_err(|_| RepositoryError::Unavailable(poisoned("session store")))
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, session: SurveySession) -> Result<SurveySession, RepositoryError> {
        let mut store = self.lock()?;
        if store.active.contains_key(session.id()) || store.archived.contains_key(session.id()) {
            return Err(RepositoryError::Conflict);
        }
        store.active.insert(session.id().clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: SurveySession) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        if store.active.contains_key(session.id()) {
            store.active.insert(session.id().clone(), session);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SurveySession>, RepositoryError> {
        let store = self.lock()?;
        Ok(store
            .active
            .get(id)
            .or_else(|| store.archived.get(id))
            .cloned())
    }

    fn archive(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        let Some(session) = store.active.remove(id) else {
            return if store.archived.contains_key(id) {
                Ok(())
            } else {
                Err(RepositoryError::NotFound)
            };
        };

        if store.archive_capacity == 0 {
            return Ok(());
        }

        store.archived.insert(id.clone(), session);
        store.archive_order.push_back(id.clone());
        while store.archive_order.len() > store.archive_capacity {
            if let Some(evicted) = store.archive_order.pop_front() {
                store.archived.remove(&evicted);
            }
        }
        Ok(())
    }
}

/// Keeps delivered records in memory; the default sink for the HTTP service and demos.
#[derive(Default, Clone)]
pub(crate) struct InMemorySubmissionSink {
    records: Arc<Mutex<Vec<SubmissionRecord>>>,
}

impl InMemorySubmissionSink {
    pub(crate) fn records(&self) -> Vec<SubmissionRecord> {
        self.records
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl SubmissionSink for InMemorySubmissionSink {
    fn deliver(&self, record: SubmissionRecord) -> Result<(), SubmissionError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| SubmissionError::Transport(poisoned("submission buffer")))?;
        guard.push(record);
        Ok(())
    }
}

/// Appends each record as one JSON object per line.
pub(crate) struct JsonLinesSubmissionSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesSubmissionSink {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

impl SubmissionSink for JsonLinesSubmissionSink {
    fn deliver(&self, record: SubmissionRecord) -> Result<(), SubmissionError> {
        let line = serde_json::to_string(&record)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| SubmissionError::Transport(poisoned("submission writer")))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        info!(path = %self.path.display(), "submission appended");
        Ok(())
    }
}

/// Destination for records finalized by the HTTP service.
pub(crate) enum SubmissionTarget {
    JsonLines(JsonLinesSubmissionSink),
    /// Emits each record as a structured log event and keeps nothing.
    Log,
}

impl SubmissionSink for SubmissionTarget {
    fn deliver(&self, record: SubmissionRecord) -> Result<(), SubmissionError> {
        match self {
            Self::JsonLines(sink) => sink.deliver(record),
            Self::Log => {
                let payload = serde_json::to_string(&record)?;
                info!(record = %payload, "submission received");
                Ok(())
            }
        }
    }
}

pub(crate) fn build_submission_target(config: &StorageConfig) -> SubmissionTarget {
    match &config.submissions_path {
        Some(path) => {
            info!(path = %path.display(), "writing submissions as JSON lines");
            SubmissionTarget::JsonLines(JsonLinesSubmissionSink::new(path))
        }
        None => {
            warn!("SUBMISSIONS_PATH not set; finalized records are only logged");
            SubmissionTarget::Log
        }
    }
}

/// Picks the reputation-service verifier when a key is configured, else the local syntax check.
pub(crate) fn build_verifier(config: &EmailValidationConfig) -> Arc<dyn EmailVerifier> {
    let Some(api_key) = config.api_key.as_deref() else {
        warn!("EMAIL_VALIDATION_API_KEY not set; using syntax-only email verification");
        return Arc::new(SyntaxEmailVerifier);
    };

    match AbstractApiEmailVerifier::new(api_key, config.endpoint.as_str(), config.timeout()) {
        Ok(verifier) => Arc::new(verifier),
        Err(err) => {
            warn!(error = %err, "email reputation client unavailable; using syntax-only verification");
            Arc::new(SyntaxEmailVerifier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esg_maturity::config::{DEFAULT_EMAIL_ENDPOINT, DEFAULT_EMAIL_TIMEOUT_SECS};
    use esg_maturity::survey::{ScoreResult, SCORE_TOTAL_KEY};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_path(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("esg-{label}-{nanos}.jsonl"))
    }

    fn finished_record() -> SubmissionRecord {
        SubmissionRecord::new(&Default::default(), &ScoreResult::from_total(34))
    }

    #[test]
    fn repository_rejects_duplicate_insert_and_unknown_update() {
        let repository = InMemorySessionRepository::default();
        let session = SurveySession::new();

        repository.insert(session.clone()).expect("first insert");
        assert!(matches!(
            repository.insert(session.clone()),
            Err(RepositoryError::Conflict)
        ));
        assert!(matches!(
            repository.update(SurveySession::new()),
            Err(RepositoryError::NotFound)
        ));
        assert!(repository.fetch(session.id()).expect("fetch").is_some());
    }

    #[test]
    fn archived_sessions_stay_readable_until_evicted() {
        let repository = InMemorySessionRepository::with_archive_capacity(2);
        let sessions: Vec<SurveySession> = (0..3).map(|_| SurveySession::new()).collect();
        for session in &sessions {
            repository.insert(session.clone()).expect("insert");
            repository.archive(session.id()).expect("archive");
        }

        assert!(repository.fetch(sessions[0].id()).expect("fetch").is_none());
        assert!(repository.fetch(sessions[1].id()).expect("fetch").is_some());
        assert!(repository.fetch(sessions[2].id()).expect("fetch").is_some());
        assert!(matches!(
            repository.update(sessions[2].clone()),
            Err(RepositoryError::NotFound)
        ));

        let store = repository.lock().expect("store lock");
        assert!(store.active.is_empty());
        assert_eq!(store.archived.len(), 2);
    }

    #[test]
    fn zero_capacity_destroys_finalized_sessions() {
        let repository = InMemorySessionRepository::with_archive_capacity(0);
        let session = SurveySession::new();
        repository.insert(session.clone()).expect("insert");

        repository.archive(session.id()).expect("archive");
        assert!(repository.fetch(session.id()).expect("fetch").is_none());
        assert!(matches!(
            repository.archive(session.id()),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn configured_path_writes_submissions_to_file() {
        let path = scratch_path("served");
        let target = build_submission_target(&StorageConfig {
            submissions_path: Some(path.clone()),
            archive_capacity: DEFAULT_ARCHIVE_CAPACITY,
        });
        assert!(matches!(target, SubmissionTarget::JsonLines(_)));

        target.deliver(finished_record()).expect("delivered");
        let contents = std::fs::read_to_string(&path).expect("file written");
        assert_eq!(contents.lines().count(), 1);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unset_path_only_logs_submissions() {
        let target = build_submission_target(&StorageConfig {
            submissions_path: None,
            archive_capacity: DEFAULT_ARCHIVE_CAPACITY,
        });
        assert!(matches!(target, SubmissionTarget::Log));
        target.deliver(finished_record()).expect("delivered");
    }

    #[test]
    fn in_memory_sink_keeps_records() {
        let sink = InMemorySubmissionSink::default();
        sink.deliver(finished_record()).expect("delivered");
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(SCORE_TOTAL_KEY), Some(&serde_json::json!(34)));
    }

    #[test]
    fn json_lines_sink_appends_one_line_per_record() {
        let path = scratch_path("submissions");
        let sink = JsonLinesSubmissionSink::new(&path);

        sink.deliver(finished_record()).expect("first line");
        sink.deliver(finished_record()).expect("second line");

        let contents = std::fs::read_to_string(&path).expect("file written");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).expect("json line");
        assert_eq!(parsed["score_level_name"], "Builder");

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn missing_api_key_falls_back_to_syntax_check() {
        let verifier = build_verifier(&EmailValidationConfig {
            api_key: None,
            endpoint: DEFAULT_EMAIL_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_EMAIL_TIMEOUT_SECS,
        });

        assert!(verifier.verify("ops@example.com").await.is_valid());
        assert!(!verifier.verify("not-an-email").await.is_valid());
    }
}
