//! Risk result types.
//!
//! Represents the output of the diabetes risk model and its three-level category.

use serde::{Deserialize, Serialize};

use crate::GlycoscreenError;

/// Risk category for diabetes triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    /// Low risk of diabetes
    Low,
    /// Moderate risk, lifestyle improvement advised
    Moderate,
    /// High risk, clinical follow-up recommended
    High,
}

/// One band of the category table: probabilities at or above `lower_bound`
/// (and below the next band's bound) map to `category`.
#[derive(Debug, Clone, Copy)]
pub struct CategoryBand {
    pub lower_bound: f64,
    pub category: RiskCategory,
}

/// Category bands in ascending order. The first band starts at 0 so every
/// probability in [0, 1] lands in exactly one band.
pub const CATEGORY_BANDS: [CategoryBand; 3] = [
    CategoryBand {
        lower_bound: 0.0,
        category: RiskCategory::Low,
    },
    CategoryBand {
        lower_bound: 0.30,
        category: RiskCategory::Moderate,
    },
    CategoryBand {
        lower_bound: 0.60,
        category: RiskCategory::High,
    },
];

impl RiskCategory {
    /// Category for a probability (lower bounds inclusive).
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        let idx = CATEGORY_BANDS.partition_point(|band| band.lower_bound <= probability);
        CATEGORY_BANDS[idx.saturating_sub(1)].category
    }

    /// Name as stored and shown in text ("Low", "Moderate", "High").
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }

    /// Display label for result cards.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Moderate => "Moderate Risk",
            Self::High => "High Risk",
        }
    }

    /// Short message shown next to the result.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Low => "Low diabetes risk. Maintain healthy lifestyle.",
            Self::Moderate => "Moderate risk detected. Lifestyle improvement advised.",
            Self::High => "High risk detected. Clinical follow-up recommended.",
        }
    }

    /// Hex color for result cards.
    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            Self::Low => "#16a34a",
            Self::Moderate => "#f59e0b",
            Self::High => "#dc2626",
        }
    }

    /// Parse a stored category name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "moderate" => Some(Self::Moderate),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the risk model: probability of the positive class and its category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    /// Probability of diabetes (0.0 to 1.0)
    pub probability: f64,

    /// Category derived from `probability`
    pub category: RiskCategory,
}

impl RiskResult {
    /// Create a risk result from a model probability.
    ///
    /// # Errors
    /// Returns `GlycoscreenError::Scoring` if the probability is not a finite value in [0, 1].
    pub fn from_probability(probability: f64) -> Result<Self, GlycoscreenError> {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(GlycoscreenError::Scoring(format!(
                "Model returned invalid probability {probability}"
            )));
        }
        Ok(Self {
            probability,
            category: RiskCategory::from_probability(probability),
        })
    }

    /// Probability as a percentage.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.probability * 100.0
    }
}
