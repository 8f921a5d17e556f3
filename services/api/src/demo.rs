use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Args, ValueEnum};
use esg_maturity::config::{AppConfig, TelemetryConfig};
use esg_maturity::error::AppError;
use esg_maturity::survey::{
    FlowSequencer, Pacing, QuestionCatalog, QuestionKind, QuestionPrompt, RawInput,
    RunnerError, ScoreResult, SubmissionRecord, SurveyPresenter, SurveyRunner,
    SurveySection, SurveySession, SyntaxEmailVerifier, NONE_SENTINEL,
};
use esg_maturity::telemetry;

use crate::infra::{build_verifier, InMemorySubmissionSink, JsonLinesSubmissionSink};
use crate::terminal::TerminalPresenter;

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Append the finished submission as a JSON line to this file instead of printing it
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Skip the pause between questions
    #[arg(long)]
    pub(crate) no_pacing: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Maturity profile the scripted respondent answers with
    #[arg(long, value_enum, default_value_t = DemoProfile::Builder)]
    pub(crate) profile: DemoProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DemoProfile {
    Starter,
    Builder,
    Performer,
    Leader,
}

impl DemoProfile {
    /// Option index chosen on every scored question.
    fn position(self) -> usize {
        match self {
            Self::Starter => 0,
            Self::Builder => 1,
            Self::Performer => 2,
            Self::Leader => 3,
        }
    }
}

/// Interactive runs log only warnings so tracing output does not interleave with prompts.
fn quiet_telemetry() -> TelemetryConfig {
    TelemetryConfig {
        log_level: "warn".to_string(),
    }
}

pub(crate) fn print_catalog() {
    let catalog = QuestionCatalog::standard();
    println!(
        "ESG maturity survey: {} questions, {} scored (max {} points)",
        catalog.len(),
        catalog.scored_count(),
        catalog.max_total()
    );

    for section in SurveySection::ordered() {
        let questions = catalog.questions_in_section(section);
        if questions.is_empty() {
            continue;
        }

        println!();
        println!("== {} ==", section.label());
        for question in questions {
            let scoring = if question.is_scored() {
                format!("scored 0-{}", question.max_score())
            } else {
                "unscored".to_string()
            };
            println!(
                "  [{:>2}] {} ({}, {})",
                question.step, question.field_key, question.kind, scoring
            );
            println!("       {}", question.prompt);
            for option in &question.options {
                println!("         - {option}");
            }
        }
    }
}

pub(crate) async fn run_interactive(args: RunArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&quiet_telemetry())?;

    let verifier = build_verifier(&config.email);
    let pacing = if args.no_pacing {
        Pacing::disabled()
    } else {
        config.survey.pacing()
    };
    let mut presenter = TerminalPresenter::stdin();
    let mut session = SurveySession::new();

    match args.output {
        Some(path) => {
            let sink = Arc::new(JsonLinesSubmissionSink::new(&path));
            let runner = SurveyRunner::new(FlowSequencer::standard(), verifier, sink)
                .with_pacing(pacing);
            runner.run(&mut session, &mut presenter).await?;
            render_breakdown(runner.sequencer(), &session);
            println!();
            println!("Submission appended to {}", path.display());
        }
        None => {
            let sink = Arc::new(InMemorySubmissionSink::default());
            let runner = SurveyRunner::new(FlowSequencer::standard(), verifier, sink.clone())
                .with_pacing(pacing);
            runner.run(&mut session, &mut presenter).await?;
            render_breakdown(runner.sequencer(), &session);
            for record in sink.records() {
                render_record(&record);
            }
        }
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    telemetry::init(&quiet_telemetry())?;

    let outcome = complete_profile(args.profile).await?;
    let DemoOutcome {
        session,
        result,
        records,
        sequencer,
    } = outcome;

    println!("== ESG Maturity Demo ({:?} profile) ==", args.profile);
    println!("Session          : {}", session.id());
    println!(
        "Started          : {}",
        session.started_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(completed_at) = session.completed_at() {
        println!(
            "Completed        : {}",
            completed_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!("Questions        : {}", session.answers().len());
    println!("Total score      : {}", result.total);
    println!("Maturity level   : {} ({})", result.level_name, result.level);
    println!("Confidence       : {:.2}%", result.confidence);

    render_breakdown(&sequencer, &session);
    for record in &records {
        render_record(record);
    }

    Ok(())
}

struct DemoOutcome {
    session: SurveySession,
    result: ScoreResult,
    records: Vec<SubmissionRecord>,
    sequencer: FlowSequencer,
}

async fn complete_profile(profile: DemoProfile) -> Result<DemoOutcome, RunnerError> {
    let sink = Arc::new(InMemorySubmissionSink::default());
    let runner = SurveyRunner::new(
        FlowSequencer::standard(),
        Arc::new(SyntaxEmailVerifier),
        sink.clone(),
    )
    .with_pacing(Pacing::disabled());

    let mut session = SurveySession::new();
    let mut respondent = ScriptedRespondent {
        position: profile.position(),
    };
    let result = runner.run(&mut session, &mut respondent).await?;

    Ok(DemoOutcome {
        session,
        result,
        records: sink.records(),
        sequencer: runner.sequencer().clone(),
    })
}

fn render_breakdown(sequencer: &FlowSequencer, session: &SurveySession) {
    let sections = sequencer
        .engine()
        .breakdown(sequencer.catalog(), session.scores());

    println!();
    println!("Section breakdown:");
    for section in sections {
        println!(
            "  {:<34} {:>3} / {:<3} ({} of {} answered)",
            section.section_label,
            section.earned,
            section.available,
            section.answered,
            section.questions
        );
    }
}

fn render_record(record: &SubmissionRecord) {
    println!();
    println!("Submission record ({} fields):", record.len());
    for (key, value) in record.as_map() {
        println!("  {key:<32} {value}");
    }
}

/// Respondent that answers every question at one fixed maturity position.
struct ScriptedRespondent {
    position: usize,
}

#[async_trait]
impl SurveyPresenter for ScriptedRespondent {
    async fn ask(&mut self, question: &QuestionPrompt) -> Option<RawInput> {
        Some(scripted_answer(question, self.position))
    }
}

fn scripted_answer(question: &QuestionPrompt, position: usize) -> RawInput {
    match question.kind {
        QuestionKind::FreeText => RawInput::text(sample_text(question.field_key)),
        QuestionKind::SingleSelect => {
            let index = position.min(question.options.len().saturating_sub(1));
            RawInput::choice(question.options.get(index).copied().unwrap_or_default())
        }
        QuestionKind::MultiSelect if position == 0 => RawInput::choices([NONE_SENTINEL]),
        QuestionKind::MultiSelect => RawInput::choices(
            question
                .options
                .iter()
                .filter(|option| **option != NONE_SENTINEL)
                .take(position)
                .copied(),
        ),
    }
}

fn sample_text(field_key: &str) -> &'static str {
    match field_key {
        "company_name" => "Savanna Solar Ltd",
        "major_countries" => "Kenya, Uganda, Rwanda",
        "sector_industry" => "Renewable Energy",
        "total_emissions" => "8400",
        "email" => "esg.lead@example.com",
        "Name" => "Amani Otieno",
        "Phone_number" => "+254 711 000 111",
        _ => "Not disclosed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esg_maturity::survey::{SCORE_LEVEL_NAME_KEY, SCORE_TOTAL_KEY};
    use serde_json::json;

    #[tokio::test]
    async fn profiles_land_in_expected_levels() {
        let cases = [
            (DemoProfile::Starter, 0, "Starter"),
            (DemoProfile::Builder, 34, "Builder"),
            (DemoProfile::Performer, 68, "Performer"),
            (DemoProfile::Leader, 102, "Industry Leader"),
        ];

        for (profile, total, level_name) in cases {
            let outcome = complete_profile(profile).await.expect("profile completes");
            assert_eq!(outcome.result.total, total, "{profile:?}");
            assert_eq!(outcome.result.level_name, level_name, "{profile:?}");
            assert!(outcome.session.is_finalized());
        }
    }

    #[tokio::test]
    async fn demo_delivers_one_flat_record() {
        let outcome = complete_profile(DemoProfile::Leader)
            .await
            .expect("profile completes");

        assert_eq!(outcome.records.len(), 1);
        let record = &outcome.records[0];
        assert_eq!(record.get(SCORE_TOTAL_KEY), Some(&json!(102)));
        assert_eq!(
            record.get(SCORE_LEVEL_NAME_KEY),
            Some(&json!("Industry Leader"))
        );
        assert_eq!(record.get("company_name"), Some(&json!("Savanna Solar Ltd")));
    }

    #[test]
    fn starter_profile_picks_none_for_solutions() {
        let catalog = QuestionCatalog::standard();
        let question = catalog
            .by_field("nature_based_solutions")
            .expect("question exists")
            .to_prompt(catalog.len());

        assert_eq!(
            scripted_answer(&question, 0),
            RawInput::choices([NONE_SENTINEL])
        );
        assert_eq!(
            scripted_answer(&question, 3),
            RawInput::choices(["Rainwater", "Green roofs", "Wetlands"])
        );
    }
}
