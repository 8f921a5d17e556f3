mod level;
mod rules;

pub use level::{confidence, MaturityLevel, CONFIDENCE_DENOMINATOR};

use super::catalog::QuestionCatalog;
use super::domain::{Answer, QuestionDefinition, SurveySection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stateless scorer for individual answers and whole score sheets.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, question: &QuestionDefinition, answer: &Answer) -> Option<u32> {
        rules::score_answer(question, answer)
    }

    /// Aggregates the per-field scores. Pure: the same sheet always yields the same result.
    pub fn finalize(&self, scores: &BTreeMap<String, u32>) -> ScoreResult {
        let total: u32 = scores.values().sum();
        ScoreResult::from_total(total)
    }

    /// Per-section earned/available points for reporting. Does not affect [`ScoreResult`].
    pub fn breakdown(
        &self,
        catalog: &QuestionCatalog,
        scores: &BTreeMap<String, u32>,
    ) -> Vec<SectionScore> {
        SurveySection::ordered()
            .into_iter()
            .filter_map(|section| {
                let scored: Vec<&QuestionDefinition> = catalog
                    .questions_in_section(section)
                    .into_iter()
                    .filter(|question| question.is_scored())
                    .collect();

                if scored.is_empty() {
                    return None;
                }

                let mut entry = SectionScore {
                    section,
                    section_label: section.label(),
                    earned: 0,
                    available: 0,
                    answered: 0,
                    questions: scored.len(),
                };

                for question in scored {
                    entry.available += question.max_score();
                    if let Some(score) = scores.get(question.field_key) {
                        entry.earned += score;
                        entry.answered += 1;
                    }
                }

                Some(entry)
            })
            .collect()
    }
}

/// Final maturity outcome; computed once at finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total: u32,
    pub level: u8,
    pub level_name: String,
    pub confidence: f64,
}

impl ScoreResult {
    pub fn from_total(total: u32) -> Self {
        let level = MaturityLevel::from_total(total);
        Self {
            total,
            level: level.number(),
            level_name: level.label().to_string(),
            confidence: confidence(total),
        }
    }

    pub fn maturity(&self) -> MaturityLevel {
        MaturityLevel::from_total(self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionScore {
    pub section: SurveySection,
    pub section_label: &'static str,
    pub earned: u32,
    pub available: u32,
    pub answered: usize,
    pub questions: usize,
}
