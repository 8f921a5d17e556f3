use async_trait::async_trait;
use esg_maturity::survey::{QuestionKind, QuestionPrompt, RawInput, ScoreResult, SurveyPresenter};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

/// Line-oriented presenter: prints prompts to stdout and reads one answer per line.
pub(crate) struct TerminalPresenter<R> {
    lines: Lines<R>,
}

impl TerminalPresenter<BufReader<Stdin>> {
    pub(crate) fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> TerminalPresenter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub(crate) fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R> SurveyPresenter for TerminalPresenter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn ask(&mut self, question: &QuestionPrompt) -> Option<RawInput> {
        println!();
        println!(
            "[{}/{}] {}",
            question.step + 1,
            question.total_steps,
            question.prompt
        );
        for (index, option) in question.options.iter().enumerate() {
            println!("  {}. {}", index + 1, option);
        }
        if question.kind == QuestionKind::MultiSelect {
            println!("  (comma-separated numbers or labels)");
        }

        match self.lines.next_line().await {
            Ok(Some(line)) => Some(parse_terminal_input(question, &line)),
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "failed to read answer from terminal");
                None
            }
        }
    }

    async fn show_lead_in(&mut self, lead_in: &str) {
        println!();
        println!("{lead_in}");
    }

    async fn show_rejection(&mut self, _question: &QuestionPrompt, message: &str) {
        println!("  ! {message}");
    }

    async fn show_verifying(&mut self, email: &str) {
        println!("  Checking {email} ...");
    }

    async fn show_result(&mut self, result: &ScoreResult) {
        println!();
        println!("Survey complete.");
        println!("  Maturity level : {} ({})", result.level_name, result.level);
        println!("  Total score    : {}", result.total);
        println!("  Confidence     : {:.2}%", result.confidence);
    }
}

/// Maps a typed line onto raw input. Option numbers are one-based; anything that is not
/// a valid number is matched against labels case-insensitively and otherwise passed through
/// unchanged for the collector to reject.
pub(crate) fn parse_terminal_input(question: &QuestionPrompt, line: &str) -> RawInput {
    let line = line.trim();
    match question.kind {
        QuestionKind::FreeText => RawInput::text(line),
        QuestionKind::SingleSelect => RawInput::choice(resolve_option(question, line)),
        QuestionKind::MultiSelect => RawInput::choices(
            line.split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| resolve_option(question, token)),
        ),
    }
}

fn resolve_option(question: &QuestionPrompt, token: &str) -> String {
    let by_number = token
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|index| question.options.get(index));
    let by_label = || {
        question
            .options
            .iter()
            .find(|option| option.eq_ignore_ascii_case(token))
    };

    by_number
        .or_else(by_label)
        .map(|option| option.to_string())
        .unwrap_or_else(|| token.to_string())
}
