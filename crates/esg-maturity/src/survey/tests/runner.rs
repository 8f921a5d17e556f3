use super::common::*;
use std::sync::Arc;

use crate::survey::domain::RawInput;
use crate::survey::pacing::Pacing;
use crate::survey::runner::{RunnerError, SurveyRunner};
use crate::survey::session::{SurveySession, CONFIDENCE_KEY, SCORE_TOTAL_KEY};
use crate::survey::verification::EmailVerifier;

fn runner(
    verifier: Arc<dyn EmailVerifier>,
    sink: Arc<MemorySink>,
) -> SurveyRunner<MemorySink> {
    SurveyRunner::new(sequencer(), verifier, sink).with_pacing(Pacing::disabled())
}

#[tokio::test]
async fn runs_a_leader_profile_end_to_end() {
    let sink = Arc::new(MemorySink::default());
    let runner = runner(Arc::new(FixedVerifier::accepting()), sink.clone());
    let mut session = SurveySession::new();
    let mut presenter = ScriptedPresenter::new(script_at(3));

    let result = runner
        .run(&mut session, &mut presenter)
        .await
        .expect("survey completes");

    assert_eq!(result.total, 102);
    assert_eq!(result.level_name, "Industry Leader");
    assert_eq!(result.confidence, 100.0);
    assert_eq!(presenter.asked, (0..44).collect::<Vec<_>>());
    assert_eq!(presenter.verifying, vec![RESPONDENT_EMAIL.to_string()]);
    assert_eq!(presenter.lead_ins.len(), 1);
    assert!(presenter.lead_ins[0].starts_with("Almost done!"));
    assert_eq!(presenter.result.as_ref(), Some(&result));

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get(SCORE_TOTAL_KEY), Some(&serde_json::json!(102)));
    assert_eq!(records[0].get(CONFIDENCE_KEY), Some(&serde_json::json!(100.0)));
}

#[tokio::test]
async fn invalid_input_is_presented_again() {
    let sink = Arc::new(MemorySink::default());
    let runner = runner(Arc::new(FixedVerifier::accepting()), sink.clone());
    let mut session = SurveySession::new();

    let mut script = script_at(0);
    script.insert(0, RawInput::text(" "));
    script.insert(2, RawInput::choice("Atlantis"));
    let mut presenter = ScriptedPresenter::new(script);

    let result = runner
        .run(&mut session, &mut presenter)
        .await
        .expect("survey completes");

    assert_eq!(result.total, 0);
    assert_eq!(result.level, 1);
    assert_eq!(presenter.rejections.len(), 2);
    assert_eq!(presenter.rejections[0].0, 0);
    assert_eq!(presenter.rejections[1].0, 1);
    assert_eq!(&presenter.asked[..4], &[0, 0, 1, 1]);
    assert_eq!(session.score("nature_based_solutions"), Some(0));
}

#[tokio::test]
async fn rejected_email_is_asked_until_input_runs_out() {
    let sink = Arc::new(MemorySink::default());
    let verifier = Arc::new(FixedVerifier::rejecting());
    let runner = runner(verifier.clone(), sink.clone());
    let mut session = SurveySession::new();
    let mut presenter = ScriptedPresenter::new(script_at(1).into_iter().take(42));

    match runner.run(&mut session, &mut presenter).await {
        Err(RunnerError::Abandoned { step }) => assert_eq!(step, 41),
        other => panic!("expected abandonment, got {other:?}"),
    }

    assert_eq!(verifier.calls(), 1);
    assert_eq!(presenter.rejections.len(), 1);
    assert!(presenter.rejections[0].1.contains("valid email"));
    assert!(sink.records().is_empty());
    assert!(!session.is_finalized());
}

#[tokio::test]
async fn delivery_failure_surfaces_after_finalizing() {
    let runner = SurveyRunner::new(
        sequencer(),
        Arc::new(FixedVerifier::accepting()),
        Arc::new(OfflineSink),
    )
    .with_pacing(Pacing::disabled());
    let mut session = SurveySession::new();
    let mut presenter = ScriptedPresenter::new(script_at(1));

    match runner.run(&mut session, &mut presenter).await {
        Err(RunnerError::Submission(_)) => {}
        other => panic!("expected submission error, got {other:?}"),
    }
    assert!(session.is_finalized());
    assert_eq!(session.result().map(|result| result.total), Some(34));
}
