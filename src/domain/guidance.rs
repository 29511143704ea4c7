//! Actionable guidance: counterfactual "what-if" advice and clinician next steps.

use super::{PatientAttributes, RiskCategory, SmokingHistory};

pub const ADVICE_LOWER_HBA1C: &str =
    "Lowering HbA1c through diet, exercise, or medication can reduce risk.";
pub const ADVICE_REDUCE_WEIGHT: &str =
    "Reducing body weight by 5–7% can significantly lower diabetes risk.";
pub const ADVICE_QUIT_SMOKING: &str =
    "Quitting smoking is strongly recommended for long-term health.";
pub const ADVICE_MAINTAIN: &str =
    "Continue your current healthy lifestyle and routine health checkups.";

/// Prevention tips for the factors that exceed their advisory threshold.
///
/// Checked in a fixed order (HbA1c, BMI, smoking). Always returns at least one entry.
#[must_use]
pub fn counterfactuals(attrs: &PatientAttributes) -> Vec<&'static str> {
    let mut tips = Vec::new();

    if attrs.hba1c_level > 6.5 {
        tips.push(ADVICE_LOWER_HBA1C);
    }
    if attrs.bmi > 27.0 {
        tips.push(ADVICE_REDUCE_WEIGHT);
    }
    if matches!(
        attrs.smoking_history,
        SmokingHistory::Current | SmokingHistory::Ever
    ) {
        tips.push(ADVICE_QUIT_SMOKING);
    }

    if tips.is_empty() {
        tips.push(ADVICE_MAINTAIN);
    }
    tips
}

/// Clinician follow-up steps for a risk category.
#[must_use]
pub fn next_steps(category: RiskCategory) -> &'static [&'static str] {
    match category {
        RiskCategory::High => &[
            "Order confirmatory laboratory tests (HbA1c, fasting glucose)",
            "Schedule follow-up consultation within 3 months",
            "Provide lifestyle and dietary counselling",
            "Consider referral to specialist if required",
        ],
        RiskCategory::Moderate => &[
            "Advise lifestyle modification",
            "Repeat screening in 6 months",
            "Monitor blood glucose and weight regularly",
        ],
        RiskCategory::Low => &[
            "Continue routine annual screening",
            "Maintain healthy diet and physical activity",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample_attributes;

    #[test]
    fn test_counterfactual_order() {
        let attrs = PatientAttributes {
            smoking_history: SmokingHistory::Current,
            ..sample_attributes()
        };
        assert_eq!(
            counterfactuals(&attrs),
            [ADVICE_LOWER_HBA1C, ADVICE_REDUCE_WEIGHT, ADVICE_QUIT_SMOKING]
        );
    }

    #[test]
    fn test_thresholds_are_strict() {
        let attrs = PatientAttributes {
            hba1c_level: 6.5,
            bmi: 27.0,
            smoking_history: SmokingHistory::Former,
            ..sample_attributes()
        };
        assert_eq!(counterfactuals(&attrs), [ADVICE_MAINTAIN]);
    }

    #[test]
    fn test_ever_smoked_triggers_advice() {
        let attrs = PatientAttributes {
            hba1c_level: 5.0,
            bmi: 22.0,
            smoking_history: SmokingHistory::Ever,
            ..sample_attributes()
        };
        assert_eq!(counterfactuals(&attrs), [ADVICE_QUIT_SMOKING]);
    }

    #[test]
    fn test_next_steps_per_category() {
        assert_eq!(next_steps(RiskCategory::High).len(), 4);
        assert_eq!(next_steps(RiskCategory::Moderate).len(), 3);
        assert_eq!(
            next_steps(RiskCategory::Low),
            [
                "Continue routine annual screening",
                "Maintain healthy diet and physical activity"
            ]
        );
    }
}
