//! Waste level classification

use serde::{Deserialize, Serialize};

/// Ordinal severity of plate waste
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WasteLevel {
    /// Nothing left on the plate
    #[serde(rename = "None")]
    NoWaste,
    Minimal,
    Moderate,
    Significant,
    #[serde(rename = "Most Left")]
    MostLeft,
}

/// Ascending `(upper bound, level)` table, bounds are waste fractions in [0, 1]
pub const WASTE_LEVEL_THRESHOLDS: [(f64, WasteLevel); 5] = [
    (0.0, WasteLevel::NoWaste),
    (0.1, WasteLevel::Minimal),
    (0.25, WasteLevel::Moderate),
    (0.40, WasteLevel::Significant),
    (1.0, WasteLevel::MostLeft),
];

impl WasteLevel {
    pub fn label(&self) -> &'static str {
        match self {
            WasteLevel::NoWaste => "None",
            WasteLevel::Minimal => "Minimal",
            WasteLevel::Moderate => "Moderate",
            WasteLevel::Significant => "Significant",
            WasteLevel::MostLeft => "Most Left",
        }
    }
}

impl std::fmt::Display for WasteLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for WasteLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WASTE_LEVEL_THRESHOLDS
            .iter()
            .map(|(_, level)| *level)
            .find(|level| level.label() == s)
            .ok_or_else(|| format!("unknown waste level: {}", s))
    }
}

/// Classify a waste fraction: the first threshold at or above it wins
pub fn classify_waste_level(fraction: f64) -> WasteLevel {
    WASTE_LEVEL_THRESHOLDS
        .iter()
        .find(|(threshold, _)| fraction <= *threshold)
        .map(|(_, level)| *level)
        .unwrap_or(WasteLevel::MostLeft)
}
