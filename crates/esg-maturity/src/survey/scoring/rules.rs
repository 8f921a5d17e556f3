use super::super::domain::{Answer, QuestionDefinition, QuestionKind, ScoringRule};

/// Points contributed by a single committed answer, or `None` when the question is informational.
pub(crate) fn score_answer(question: &QuestionDefinition, answer: &Answer) -> Option<u32> {
    if question.kind == QuestionKind::FreeText {
        return None;
    }

    match (question.scoring, answer) {
        (ScoringRule::Unscored, _) => None,
        (ScoringRule::OptionIndex, Answer::Choice { index, .. }) => Some(*index as u32),
        (ScoringRule::SelectionCount { none_sentinel, cap }, Answer::Selections(values)) => {
            let sentinel_picked = none_sentinel
                .map(|sentinel| values.iter().any(|value| value == sentinel))
                .unwrap_or(false);

            if sentinel_picked {
                Some(0)
            } else {
                Some((values.len() as u32).min(cap))
            }
        }
        (rule, answer) => {
            tracing::warn!(
                field = question.field_key,
                ?rule,
                ?answer,
                "answer shape does not match scoring rule; ignoring"
            );
            None
        }
    }
}
