//! Deterministic factor attribution.
//!
//! Each clinical factor is scored by its own threshold table; the weights are
//! additive relative-importance points, not a decomposition of the model's probability.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{PatientAttributes, SmokingHistory};

/// Clinical factors that can carry a contribution weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskFactor {
    HbA1c,
    Bmi,
    BloodGlucose,
    Smoking,
    Hypertension,
    HeartDisease,
}

impl RiskFactor {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::HbA1c => "HbA1c",
            Self::Bmi => "BMI",
            Self::BloodGlucose => "Blood Glucose",
            Self::Smoking => "Smoking",
            Self::Hypertension => "Hypertension",
            Self::HeartDisease => "Heart Disease",
        }
    }
}

impl std::fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A threshold row: values at or above `min` score `points`.
struct Tier {
    min: f64,
    points: u32,
}

/// Tiers in descending order; the last tier is the floor for anything below.
const HBA1C_TIERS: [Tier; 3] = [
    Tier { min: 6.5, points: 35 },
    Tier { min: 5.7, points: 20 },
    Tier { min: f64::NEG_INFINITY, points: 5 },
];

const BMI_TIERS: [Tier; 3] = [
    Tier { min: 30.0, points: 25 },
    Tier { min: 25.0, points: 15 },
    Tier { min: f64::NEG_INFINITY, points: 5 },
];

const GLUCOSE_TIERS: [Tier; 2] = [
    Tier { min: 140.0, points: 20 },
    Tier { min: f64::NEG_INFINITY, points: 5 },
];

const SMOKING_ACTIVE_POINTS: u32 = 10;
const SMOKING_INACTIVE_POINTS: u32 = 2;
const HYPERTENSION_POINTS: u32 = 8;
const HEART_DISEASE_POINTS: u32 = 10;

fn tier_points(tiers: &[Tier], value: f64) -> u32 {
    tiers
        .iter()
        .find(|t| value >= t.min)
        .map_or(0, |t| t.points)
}

/// Smoking statuses treated as active exposure for attribution and insights.
fn is_active_smoker(history: SmokingHistory) -> bool {
    matches!(history, SmokingHistory::Current | SmokingHistory::Occasional)
}

/// Per-factor weights for one patient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskContributions(BTreeMap<RiskFactor, u32>);

impl RiskContributions {
    #[must_use]
    pub fn get(&self, factor: RiskFactor) -> Option<u32> {
        self.0.get(&factor).copied()
    }

    /// Sum of all weights. Not bounded by 100.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RiskFactor, u32)> + '_ {
        self.0.iter().map(|(f, w)| (*f, *w))
    }

    /// Factors ordered by weight, heaviest first (ties in factor order).
    #[must_use]
    pub fn ranked(&self) -> Vec<(RiskFactor, u32)> {
        let mut out: Vec<_> = self.iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Score each clinical factor independently.
#[must_use]
pub fn contributions(attrs: &PatientAttributes) -> RiskContributions {
    let mut map = BTreeMap::new();

    map.insert(RiskFactor::HbA1c, tier_points(&HBA1C_TIERS, attrs.hba1c_level));
    map.insert(RiskFactor::Bmi, tier_points(&BMI_TIERS, attrs.bmi));
    map.insert(
        RiskFactor::BloodGlucose,
        tier_points(&GLUCOSE_TIERS, attrs.blood_glucose_level),
    );
    map.insert(
        RiskFactor::Smoking,
        if is_active_smoker(attrs.smoking_history) {
            SMOKING_ACTIVE_POINTS
        } else {
            SMOKING_INACTIVE_POINTS
        },
    );
    if attrs.hypertension {
        map.insert(RiskFactor::Hypertension, HYPERTENSION_POINTS);
    }
    if attrs.heart_disease {
        map.insert(RiskFactor::HeartDisease, HEART_DISEASE_POINTS);
    }

    RiskContributions(map)
}

/// Plain-language clinical observations, used by the fallback explanation.
///
/// Never empty: when no rule fires a single "no major drivers" line is returned.
#[must_use]
pub fn clinical_insights(attrs: &PatientAttributes) -> Vec<&'static str> {
    let mut insights = Vec::new();

    if attrs.hba1c_level >= 6.5 {
        insights.push("HbA1c level is elevated, suggesting poor long-term glucose control.");
    }
    if attrs.blood_glucose_level >= 140.0 {
        insights.push("Blood glucose level is above normal range.");
    }
    if attrs.bmi >= 30.0 {
        insights.push("BMI indicates obesity, increasing insulin resistance risk.");
    }
    if attrs.hypertension {
        insights.push("Hypertension present, increasing cardiovascular risk.");
    }
    if attrs.heart_disease {
        insights.push(
            "Existing heart disease increases risk of diabetes-related complications.",
        );
    }
    if is_active_smoker(attrs.smoking_history) {
        insights.push("Smoking history contributes to metabolic and vascular risk.");
    }

    if insights.is_empty() {
        insights.push("No major clinical risk drivers detected from the provided data.");
    }
    insights
}
