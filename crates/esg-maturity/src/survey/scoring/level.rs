use serde::{Deserialize, Serialize};

/// Reference maximum used for the confidence percentage (2 x 102).
pub const CONFIDENCE_DENOMINATOR: f64 = 204.0;

/// Ordinal maturity bands, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaturityLevel {
    Starter,
    Builder,
    Performer,
    IndustryLeader,
}

/// Inclusive total bands, evaluated in ascending order; the first match wins.
const BANDS: [(u32, u32, MaturityLevel); 4] = [
    (0, 5, MaturityLevel::Starter),
    (6, 34, MaturityLevel::Builder),
    (35, 68, MaturityLevel::Performer),
    (69, u32::MAX, MaturityLevel::IndustryLeader),
];

impl MaturityLevel {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Starter,
            Self::Builder,
            Self::Performer,
            Self::IndustryLeader,
        ]
    }

    pub fn from_total(total: u32) -> Self {
        BANDS
            .iter()
            .find(|(floor, ceiling, _)| (*floor..=*ceiling).contains(&total))
            .map(|(_, _, level)| *level)
            .unwrap_or(Self::Starter)
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::Starter => 1,
            Self::Builder => 2,
            Self::Performer => 3,
            Self::IndustryLeader => 4,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Starter => "Starter",
            Self::Builder => "Builder",
            Self::Performer => "Performer",
            Self::IndustryLeader => "Industry Leader",
        }
    }
}

/// Percentage of the reference maximum, rounded to two decimals. Not clamped: totals above the
/// design maximum report more than 100.
pub fn confidence(total: u32) -> f64 {
    let raw = (f64::from(total) * 2.0 / CONFIDENCE_DENOMINATOR) * 100.0;
    (raw * 100.0).round() / 100.0
}
