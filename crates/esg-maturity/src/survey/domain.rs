use serde::{Deserialize, Serialize};
use std::fmt;

/// Thematic grouping of catalog questions, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveySection {
    CompanyProfile,
    StrategyAndGovernance,
    Climate,
    EnergyAndCircularity,
    WaterStewardship,
    SupplyChain,
    PeopleAndCulture,
    DataAndReporting,
    ExternalSignals,
    Contact,
}

impl SurveySection {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::CompanyProfile,
            Self::StrategyAndGovernance,
            Self::Climate,
            Self::EnergyAndCircularity,
            Self::WaterStewardship,
            Self::SupplyChain,
            Self::PeopleAndCulture,
            Self::DataAndReporting,
            Self::ExternalSignals,
            Self::Contact,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::CompanyProfile => "Company Profile",
            Self::StrategyAndGovernance => "Strategy & Governance",
            Self::Climate => "Climate",
            Self::EnergyAndCircularity => "Energy, Resources & Circularity",
            Self::WaterStewardship => "Water Stewardship",
            Self::SupplyChain => "Supply Chain & Procurement",
            Self::PeopleAndCulture => "People, Culture & Training",
            Self::DataAndReporting => "Data, Systems & Reporting",
            Self::ExternalSignals => "External Signals",
            Self::Contact => "Contact",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    FreeText,
    SingleSelect,
    MultiSelect,
}

impl QuestionKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::FreeText => "Free text",
            Self::SingleSelect => "Single select",
            Self::MultiSelect => "Multi select",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a committed answer turns into maturity points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ScoringRule {
    /// Informational question; never contributes to the total.
    Unscored,
    /// Points equal the 0-based position of the chosen option.
    OptionIndex,
    /// Points equal the number of selections, capped. Choosing the sentinel zeroes the score.
    SelectionCount {
        none_sentinel: Option<&'static str>,
        cap: u32,
    },
}

/// Checks that must pass outside the process before an answer commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalCheck {
    EmailDeliverability,
}

/// Immutable definition of a single survey step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionDefinition {
    pub step: usize,
    pub field_key: &'static str,
    pub kind: QuestionKind,
    pub section: SurveySection,
    pub prompt: &'static str,
    pub options: Vec<&'static str>,
    pub scoring: ScoringRule,
    pub allow_empty_selection: bool,
    pub external_check: Option<ExternalCheck>,
    pub lead_in: Option<&'static str>,
}

impl QuestionDefinition {
    pub fn free_text(
        section: SurveySection,
        field_key: &'static str,
        prompt: &'static str,
    ) -> Self {
        Self {
            step: 0,
            field_key,
            kind: QuestionKind::FreeText,
            section,
            prompt,
            options: Vec::new(),
            scoring: ScoringRule::Unscored,
            allow_empty_selection: false,
            external_check: None,
            lead_in: None,
        }
    }

    /// Scored single-select question; options must run from least to most mature.
    pub fn single_select(
        section: SurveySection,
        field_key: &'static str,
        prompt: &'static str,
        options: &[&'static str],
    ) -> Self {
        Self {
            step: 0,
            field_key,
            kind: QuestionKind::SingleSelect,
            section,
            prompt,
            options: options.to_vec(),
            scoring: ScoringRule::OptionIndex,
            allow_empty_selection: false,
            external_check: None,
            lead_in: None,
        }
    }

    pub fn multi_select(
        section: SurveySection,
        field_key: &'static str,
        prompt: &'static str,
        options: &[&'static str],
        scoring: ScoringRule,
    ) -> Self {
        Self {
            step: 0,
            field_key,
            kind: QuestionKind::MultiSelect,
            section,
            prompt,
            options: options.to_vec(),
            scoring,
            allow_empty_selection: false,
            external_check: None,
            lead_in: None,
        }
    }

    pub fn unscored(mut self) -> Self {
        self.scoring = ScoringRule::Unscored;
        self
    }

    pub fn with_lead_in(mut self, lead_in: &'static str) -> Self {
        self.lead_in = Some(lead_in);
        self
    }

    pub fn with_external_check(mut self, check: ExternalCheck) -> Self {
        self.external_check = Some(check);
        self
    }

    pub fn allowing_empty_selection(mut self) -> Self {
        self.allow_empty_selection = true;
        self
    }

    pub fn is_scored(&self) -> bool {
        self.kind != QuestionKind::FreeText && self.scoring != ScoringRule::Unscored
    }

    /// Highest score this question can contribute.
    pub fn max_score(&self) -> u32 {
        if !self.is_scored() {
            return 0;
        }

        match self.scoring {
            ScoringRule::Unscored => 0,
            ScoringRule::OptionIndex => self.options.len().saturating_sub(1) as u32,
            ScoringRule::SelectionCount { cap, .. } => cap,
        }
    }

    pub fn option_index(&self, label: &str) -> Option<usize> {
        self.options.iter().position(|option| *option == label)
    }

    pub fn to_prompt(&self, total_steps: usize) -> QuestionPrompt {
        QuestionPrompt {
            step: self.step,
            total_steps,
            field_key: self.field_key,
            kind: self.kind,
            section: self.section,
            section_label: self.section.label(),
            prompt: self.prompt,
            options: self.options.clone(),
            allow_empty_selection: self.allow_empty_selection,
            lead_in: self.lead_in,
        }
    }
}

/// Everything a presentation layer needs to render a question and collect input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionPrompt {
    pub step: usize,
    pub total_steps: usize,
    pub field_key: &'static str,
    pub kind: QuestionKind,
    pub section: SurveySection,
    pub section_label: &'static str,
    pub prompt: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
    pub allow_empty_selection: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_in: Option<&'static str>,
}

/// Input as handed back by the presentation layer, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawInput {
    Text(String),
    Choice(String),
    Choices(Vec<String>),
}

impl RawInput {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn choice(value: impl Into<String>) -> Self {
        Self::Choice(value.into())
    }

    pub fn choices<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::Choices(values.into_iter().map(Into::into).collect())
    }
}

/// Validated, normalized answer for a single question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Choice { value: String, index: usize },
    Selections(Vec<String>),
}

impl Answer {
    pub fn value(&self) -> AnswerValue {
        match self {
            Answer::Text(text) => AnswerValue::Text(text.clone()),
            Answer::Choice { value, .. } => AnswerValue::Text(value.clone()),
            Answer::Selections(values) => AnswerValue::List(values.clone()),
        }
    }
}

/// Stored form of an answer: a string, or an ordered list for multi-select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Text(text) => f.write_str(text),
            AnswerValue::List(values) => f.write_str(&values.join(", ")),
        }
    }
}

/// Respondent-correctable rejection of a raw input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("please enter a response before continuing")]
    Empty,
    #[error("'{value}' is not one of the available options")]
    UnknownOption { value: String },
    #[error("please select at least one option")]
    EmptySelection,
    #[error("the email address appears to be invalid, please provide a valid email")]
    InvalidEmail,
    #[error("expected {expected} input for this question")]
    UnexpectedShape { expected: QuestionKind },
}
