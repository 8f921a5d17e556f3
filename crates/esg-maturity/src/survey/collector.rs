use super::domain::{Answer, QuestionDefinition, QuestionKind, RawInput, ValidationError};

/// Validates raw presentation input against a question and normalizes it into an [`Answer`].
///
/// Select inputs are matched exactly against the option labels. Multi-select answers are
/// de-duplicated and returned in catalog order regardless of the order they were picked in.
pub fn collect(question: &QuestionDefinition, input: RawInput) -> Result<Answer, ValidationError> {
    match question.kind {
        QuestionKind::FreeText => collect_text(input),
        QuestionKind::SingleSelect => collect_choice(question, input),
        QuestionKind::MultiSelect => collect_selections(question, input),
    }
}

fn collect_text(input: RawInput) -> Result<Answer, ValidationError> {
    let raw = match input {
        RawInput::Text(value) | RawInput::Choice(value) => value,
        RawInput::Choices(_) => {
            return Err(ValidationError::UnexpectedShape {
                expected: QuestionKind::FreeText,
            })
        }
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    Ok(Answer::Text(trimmed.to_string()))
}

fn collect_choice(
    question: &QuestionDefinition,
    input: RawInput,
) -> Result<Answer, ValidationError> {
    let value = match input {
        RawInput::Choice(value) | RawInput::Text(value) => value,
        RawInput::Choices(_) => {
            return Err(ValidationError::UnexpectedShape {
                expected: QuestionKind::SingleSelect,
            })
        }
    };

    match question.option_index(&value) {
        Some(index) => Ok(Answer::Choice { value, index }),
        None => Err(ValidationError::UnknownOption { value }),
    }
}

fn collect_selections(
    question: &QuestionDefinition,
    input: RawInput,
) -> Result<Answer, ValidationError> {
    let picked = match input {
        RawInput::Choices(values) => values,
        RawInput::Choice(value) | RawInput::Text(value) => vec![value],
    };

    if let Some(unknown) = picked
        .iter()
        .find(|value| question.option_index(value).is_none())
    {
        return Err(ValidationError::UnknownOption {
            value: unknown.clone(),
        });
    }

    let selections: Vec<String> = question
        .options
        .iter()
        .filter(|option| picked.iter().any(|value| value.as_str() == **option))
        .map(|option| option.to_string())
        .collect();

    if selections.is_empty() && !question.allow_empty_selection {
        return Err(ValidationError::EmptySelection);
    }

    Ok(Answer::Selections(selections))
}
