//! Explanation engine: audience-specific text with a deterministic fallback.
//!
//! The remote generator is tried once. Whatever it returns (text or a
//! `GenerationError`) is matched explicitly; every failure lands on the rule-based
//! template, so `explain` always yields non-empty text.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::domain::{clinical_insights, PatientAttributes, RiskCategory};
use crate::ports::TextGenerator;

/// Who the explanation is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    Patient,
    Clinician,
}

impl Audience {
    /// `clinician` (any case) selects the clinician audience; anything else is patient-style.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("clinician") {
            Self::Clinician
        } else {
            Self::Patient
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Clinician => "clinician",
        }
    }
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the explanation text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationSource {
    Remote,
    Fallback,
}

/// Explanation text tagged by audience and source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub audience: Audience,
    pub source: ExplanationSource,
    pub text: String,
}

/// Prompt sent to the remote generator.
#[must_use]
pub fn build_prompt(
    attrs: &PatientAttributes,
    category: RiskCategory,
    probability: f64,
    audience: Audience,
) -> String {
    let mut prompt = String::from("You are a responsible clinical AI assistant.\n\n");
    let _ = writeln!(prompt, "Audience: {audience}\n");
    prompt.push_str("Patient data:\n");
    let _ = writeln!(prompt, "- gender: {}", attrs.gender);
    let _ = writeln!(prompt, "- age: {}", attrs.age);
    let _ = writeln!(prompt, "- hypertension: {}", u8::from(attrs.hypertension));
    let _ = writeln!(prompt, "- heart_disease: {}", u8::from(attrs.heart_disease));
    let _ = writeln!(prompt, "- smoking_history: {}", attrs.smoking_history);
    let _ = writeln!(prompt, "- bmi: {}", attrs.bmi);
    let _ = writeln!(prompt, "- HbA1c_level: {}", attrs.hba1c_level);
    let _ = writeln!(prompt, "- blood_glucose_level: {}\n", attrs.blood_glucose_level);
    let _ = writeln!(prompt, "Predicted diabetes risk level: {category}");
    let _ = writeln!(prompt, "Risk probability: {probability:.2}\n");
    prompt.push_str(
        "Rules:\n\
         - Do NOT diagnose\n\
         - Explain clearly\n\
         - Suggest preventive actions\n\
         - Simple language for patients\n\
         - Clinical tone for doctors\n",
    );
    prompt
}

/// Rule-based explanation. Pure: identical inputs give identical text.
#[must_use]
pub fn fallback_explanation(
    attrs: &PatientAttributes,
    category: RiskCategory,
    probability: f64,
    audience: Audience,
) -> String {
    let pct = probability * 100.0;
    match audience {
        Audience::Clinician => format!(
            "Predicted {category} diabetes risk ({pct:.2}%). \
             Key contributing factors include: {}. \
             This assessment should be used as a screening aid. \
             Recommend lifestyle modification, metabolic monitoring, \
             and appropriate follow-up testing.",
            clinical_insights(attrs).join("; ")
        ),
        Audience::Patient => format!(
            "Based on your health details, your diabetes risk is {} ({pct:.2}%). \
             Some factors affecting this risk include diet, weight, and blood sugar levels. \
             Healthy eating, daily walking, and regular check-ups can help reduce future risk.",
            category.as_str().to_lowercase()
        ),
    }
}

/// Produces explanations, preferring the remote generator.
#[derive(Debug)]
pub struct ExplanationEngine<G: TextGenerator> {
    generator: G,
}

impl<G: TextGenerator> ExplanationEngine<G> {
    #[must_use]
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Explain a risk result. Never fails.
    pub fn explain(
        &self,
        attrs: &PatientAttributes,
        category: RiskCategory,
        probability: f64,
        audience: Audience,
    ) -> Explanation {
        let prompt = build_prompt(attrs, category, probability, audience);

        match self.generator.generate(&prompt) {
            Ok(text) if !text.trim().is_empty() => {
                tracing::debug!("Remote explanation generated for {audience} audience");
                Explanation {
                    audience,
                    source: ExplanationSource::Remote,
                    text: text.trim().to_string(),
                }
            }
            outcome => {
                match outcome {
                    Err(crate::ports::GenerationError::NotConfigured) => {
                        tracing::debug!("Remote generator disabled, using fallback explanation");
                    }
                    Err(e) => tracing::warn!("Remote explanation failed, using fallback: {e}"),
                    Ok(_) => tracing::warn!("Remote explanation was blank, using fallback"),
                }
                Explanation {
                    audience,
                    source: ExplanationSource::Fallback,
                    text: fallback_explanation(attrs, category, probability, audience),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample_attributes;
    use crate::ports::{DisabledGenerator, GenerationError};
    use std::sync::Mutex;

    /// Returns a fixed outcome and records the prompts it saw.
    struct ScriptedGenerator {
        outcome: Result<String, GenerationError>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(outcome: Result<String, GenerationError>) -> Self {
            Self {
                outcome,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().expect("lock").push(prompt.to_string());
            self.outcome.clone()
        }
    }

    #[test]
    fn test_audience_parse() {
        assert_eq!(Audience::parse("clinician"), Audience::Clinician);
        assert_eq!(Audience::parse(" CLINICIAN "), Audience::Clinician);
        assert_eq!(Audience::parse("patient"), Audience::Patient);
        assert_eq!(Audience::parse("doctor"), Audience::Patient);
        assert_eq!(Audience::parse(""), Audience::Patient);
    }

    #[test]
    fn test_remote_text_is_used() {
        let engine = ExplanationEngine::new(ScriptedGenerator::new(Ok(" Remote text. ".into())));
        let explanation = engine.explain(
            &sample_attributes(),
            RiskCategory::High,
            0.6534,
            Audience::Clinician,
        );
        assert_eq!(explanation.source, ExplanationSource::Remote);
        assert_eq!(explanation.text, "Remote text.");

        let prompts = engine.generator.prompts.lock().expect("lock");
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Audience: clinician"));
        assert!(prompts[0].contains("Predicted diabetes risk level: High"));
        assert!(prompts[0].contains("Risk probability: 0.65"));
        assert!(prompts[0].contains("- Do NOT diagnose"));
    }

    #[test]
    fn test_every_failure_falls_back() {
        let failures = [
            Err(GenerationError::Timeout(15)),
            Err(GenerationError::Connection("http://localhost".into())),
            Err(GenerationError::Transport("reset".into())),
            Err(GenerationError::Status {
                status: 503,
                body: "unavailable".into(),
            }),
            Err(GenerationError::Malformed("eof".into())),
            Err(GenerationError::EmptyResponse),
            Ok("   ".into()),
        ];

        for outcome in failures {
            let engine = ExplanationEngine::new(ScriptedGenerator::new(outcome));
            for audience in [Audience::Patient, Audience::Clinician] {
                let explanation =
                    engine.explain(&sample_attributes(), RiskCategory::Moderate, 0.42, audience);
                assert_eq!(explanation.source, ExplanationSource::Fallback);
                assert!(!explanation.text.is_empty());
                assert!(explanation.text.to_lowercase().contains("moderate"));
            }
        }
    }

    #[test]
    fn test_disabled_generator_falls_back() {
        let engine = ExplanationEngine::new(DisabledGenerator);
        let explanation =
            engine.explain(&sample_attributes(), RiskCategory::Low, 0.05, Audience::Patient);
        assert_eq!(explanation.source, ExplanationSource::Fallback);
        assert!(explanation.text.contains("your diabetes risk is low (5.00%)"));
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let attrs = sample_attributes();
        for audience in [Audience::Patient, Audience::Clinician] {
            assert_eq!(
                fallback_explanation(&attrs, RiskCategory::High, 0.65, audience),
                fallback_explanation(&attrs, RiskCategory::High, 0.65, audience)
            );
        }
    }

    #[test]
    fn test_clinician_fallback_lists_insights() {
        let text = fallback_explanation(
            &sample_attributes(),
            RiskCategory::High,
            0.65,
            Audience::Clinician,
        );
        assert!(text.starts_with("Predicted High diabetes risk (65.00%)."));
        assert!(text.contains(
            "HbA1c level is elevated, suggesting poor long-term glucose control.; \
             Blood glucose level is above normal range.; \
             BMI indicates obesity, increasing insulin resistance risk."
        ));
    }
}
