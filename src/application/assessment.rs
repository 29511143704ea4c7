//! Assessment service: Orchestrates one screening end to end.
//!
//! This service coordinates:
//! - Attribute validation
//! - Feature encoding and risk scoring
//! - Severity triage, factor contributions and counterfactual advice
//! - Explanation (remote or fallback)
//! - Record persistence (best effort)

use std::sync::Arc;

use serde::Serialize;

use crate::application::explanation::{Audience, Explanation, ExplanationEngine};
use crate::application::scoring::RiskScorer;
use crate::domain::{
    classify, contributions, counterfactuals, next_steps, PatientAttributes, PatientIdentity,
    PatientRecord, RiskContributions, RiskResult, SeverityResult,
};
use crate::ports::{RecordPage, RecordStore, ReportInput, ReportRenderer, TextGenerator};
use crate::GlycoscreenError;

/// Everything produced by one assessment.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    /// The record as appended to the store (probability rounded for storage)
    pub record: PatientRecord,
    /// Unrounded model output; everything shown to a reader uses this
    pub risk: RiskResult,
    pub severity: SeverityResult,
    pub contributions: RiskContributions,
    pub counterfactuals: Vec<&'static str>,
    pub explanation: Explanation,
    pub next_steps: &'static [&'static str],
    /// Whether the record reached the store
    pub persisted: bool,
}

impl Assessment {
    /// Borrow this assessment as report input, stamped with the current local time.
    #[must_use]
    pub fn report_input(&self) -> ReportInput<'_> {
        ReportInput {
            identity: &self.record.identity,
            attributes: &self.record.attributes,
            risk: &self.risk,
            severity: &self.severity,
            explanation: &self.explanation.text,
            next_steps: self.next_steps,
            generated_at: chrono::Local::now(),
        }
    }
}

/// Service running the screening pipeline.
pub struct AssessmentService<G, S>
where
    G: TextGenerator,
    S: RecordStore,
{
    scorer: RiskScorer,
    explainer: ExplanationEngine<G>,
    store: Arc<S>,
}

impl<G, S> AssessmentService<G, S>
where
    G: TextGenerator,
    S: RecordStore,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a new assessment service.
    pub fn new(scorer: RiskScorer, generator: G, store: Arc<S>) -> Self {
        Self {
            scorer,
            explainer: ExplanationEngine::new(generator),
            store,
        }
    }

    #[must_use]
    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    /// Run one assessment.
    ///
    /// Performs the full pipeline:
    /// 1. Validate attributes
    /// 2. Encode and score
    /// 3. Severity, contributions, counterfactuals
    /// 4. Explain for `audience`
    /// 5. Append the record (a store failure is logged, not returned)
    ///
    /// # Errors
    /// Returns `Validation` for out-of-range attributes and `Scoring` for a rejected vector.
    pub fn assess(
        &self,
        identity: PatientIdentity,
        attrs: PatientAttributes,
        audience: Audience,
    ) -> Result<Assessment, GlycoscreenError> {
        let attrs = attrs.validated()?;

        tracing::info!("Starting risk assessment...");

        tracing::debug!("Step 1: Encoding features...");
        let vector = self.scorer.encode(&attrs)?;

        tracing::debug!("Step 2: Scoring {} features...", vector.len());
        let risk = self.scorer.score(&vector)?;

        tracing::debug!("Step 3: Severity and factor attribution...");
        let severity = classify(risk.probability);
        let contributions = contributions(&attrs);
        let counterfactuals = counterfactuals(&attrs);

        tracing::debug!("Step 4: Explaining for {audience}...");
        let explanation = self
            .explainer
            .explain(&attrs, risk.category, risk.probability, audience);

        tracing::debug!("Step 5: Saving record...");
        let record = PatientRecord::new(identity, attrs, risk);
        let persisted = match self.store.append_record(&record) {
            Ok(()) => true,
            Err(e) => {
                let e: crate::adapters::StorageError = e.into();
                tracing::warn!("Failed to save record: {e}");
                false
            }
        };

        tracing::info!(
            "Assessment complete: probability={:.2}%, category={}, severity={}, explanation={:?}",
            risk.percent(),
            risk.category,
            severity.label,
            explanation.source
        );

        Ok(Assessment {
            record,
            risk,
            severity,
            contributions,
            counterfactuals,
            explanation,
            next_steps: next_steps(risk.category),
            persisted,
        })
    }

    /// All assessments of one patient, oldest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn history(&self, patient_id: &str) -> Result<Vec<PatientRecord>, GlycoscreenError> {
        self.store
            .load_history(patient_id)
            .map_err(|e| GlycoscreenError::Storage(e.into()))
    }

    /// Distinct patient ids in order of first assessment.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn patient_ids(&self) -> Result<Vec<String>, GlycoscreenError> {
        self.store
            .patient_ids()
            .map_err(|e| GlycoscreenError::Storage(e.into()))
    }

    /// Get recent records from storage.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn recent(&self, limit: usize) -> Result<Vec<PatientRecord>, GlycoscreenError> {
        self.store
            .load_recent(limit)
            .map_err(|e| GlycoscreenError::Storage(e.into()))
    }

    /// One page of records, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn page(&self, offset: usize, limit: usize) -> Result<RecordPage, GlycoscreenError> {
        self.store
            .load_paginated(offset, limit)
            .map_err(|e| GlycoscreenError::Storage(e.into()))
    }

}

/// Render an assessment's report with `renderer`.
///
/// # Errors
/// Returns `GlycoscreenError::Report` if the renderer fails.
pub fn render_report<R: ReportRenderer>(
    renderer: &R,
    assessment: &Assessment,
) -> Result<Vec<u8>, GlycoscreenError> {
    renderer
        .render(&assessment.report_input())
        .map_err(|e| GlycoscreenError::Report(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::report::TextReportRenderer;
    use crate::adapters::sqlite::SqliteRecordStore;
    use crate::adapters::StorageError;
    use crate::application::explanation::ExplanationSource;
    use crate::application::scoring::stubs::fixed_artifact;
    use crate::domain::{sample_attributes, RiskCategory, RiskFactor, ADVICE_MAINTAIN};
    use crate::ports::DisabledGenerator;

    fn service(probability: f64) -> AssessmentService<DisabledGenerator, SqliteRecordStore> {
        let store = Arc::new(SqliteRecordStore::in_memory().expect("Should create db"));
        AssessmentService::new(
            RiskScorer::new(fixed_artifact(probability)),
            DisabledGenerator,
            store,
        )
    }

    /// Store whose appends always fail.
    struct BrokenStore;

    impl RecordStore for BrokenStore {
        type Error = StorageError;

        fn append_record(&self, _record: &PatientRecord) -> Result<(), Self::Error> {
            Err(StorageError::LockPoisoned)
        }
        fn load_history(&self, _patient_id: &str) -> Result<Vec<PatientRecord>, Self::Error> {
            Err(StorageError::LockPoisoned)
        }
        fn load_recent(&self, _limit: usize) -> Result<Vec<PatientRecord>, Self::Error> {
            Err(StorageError::LockPoisoned)
        }
        fn load_paginated(&self, _offset: usize, _limit: usize) -> Result<RecordPage, Self::Error> {
            Err(StorageError::LockPoisoned)
        }
        fn patient_ids(&self) -> Result<Vec<String>, Self::Error> {
            Err(StorageError::LockPoisoned)
        }
    }

    #[test]
    fn test_high_risk_pipeline() {
        let service = service(0.65);
        let assessment = service
            .assess(
                PatientIdentity::with_id("PID-20251016-1234"),
                sample_attributes(),
                Audience::Clinician,
            )
            .expect("Should assess");

        assert_eq!(assessment.record.risk.category, RiskCategory::High);
        assert_eq!(assessment.severity.label, "High Risk");
        assert_eq!(assessment.severity.urgency, "High");

        let c = &assessment.contributions;
        assert_eq!(c.get(RiskFactor::HbA1c), Some(35));
        assert_eq!(c.get(RiskFactor::Bmi), Some(25));
        assert_eq!(c.get(RiskFactor::BloodGlucose), Some(20));
        assert_eq!(c.get(RiskFactor::Smoking), Some(2));
        assert_eq!(c.get(RiskFactor::Hypertension), None);

        assert_eq!(assessment.explanation.source, ExplanationSource::Fallback);
        assert!(assessment.explanation.text.contains("High"));
        assert_eq!(assessment.next_steps.len(), 4);
        assert!(assessment.persisted);

        let history = service.history("PID-20251016-1234").expect("Should load");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, assessment.record.id);
        assert_eq!(service.page(0, 10).expect("Should page").total, 1);
    }

    #[test]
    fn test_low_risk_pipeline() {
        let service = service(0.05);
        let healthy = PatientAttributes {
            bmi: 22.0,
            hba1c_level: 5.2,
            blood_glucose_level: 95.0,
            ..sample_attributes()
        };
        let assessment = service
            .assess(PatientIdentity::with_id("PID-L"), healthy, Audience::Patient)
            .expect("Should assess");

        assert_eq!(assessment.record.risk.category, RiskCategory::Low);
        assert_eq!(assessment.severity.label, "Normal");
        assert!(assessment.explanation.text.contains("low"));
        assert_eq!(assessment.counterfactuals, [ADVICE_MAINTAIN]);
        assert_eq!(assessment.next_steps.len(), 2);
    }

    #[test]
    fn test_low_risk_with_elevated_factors_keeps_specific_advice() {
        let service = service(0.05);
        let assessment = service
            .assess(
                PatientIdentity::with_id("PID-L2"),
                sample_attributes(),
                Audience::Patient,
            )
            .expect("Should assess");
        assert!(!assessment.counterfactuals.contains(&ADVICE_MAINTAIN));
    }

    #[test]
    fn test_invalid_attributes_are_rejected_before_scoring() {
        let service = service(0.5);
        let attrs = PatientAttributes {
            age: 12,
            hba1c_level: 20.0,
            ..sample_attributes()
        };
        let err = service
            .assess(PatientIdentity::with_id("PID-V"), attrs, Audience::Patient)
            .expect_err("Should reject");
        match err {
            GlycoscreenError::Validation(problems) => assert_eq!(problems.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(service.page(0, 10).expect("Should page").records.is_empty());
    }

    #[test]
    fn test_store_failure_does_not_fail_assessment() {
        let service = AssessmentService::new(
            RiskScorer::new(fixed_artifact(0.45)),
            DisabledGenerator,
            Arc::new(BrokenStore),
        );
        let assessment = service
            .assess(
                PatientIdentity::with_id("PID-S"),
                sample_attributes(),
                Audience::Patient,
            )
            .expect("Should still assess");
        assert!(!assessment.persisted);
        assert_eq!(assessment.record.risk.category, RiskCategory::Moderate);
        assert!(matches!(
            service.history("PID-S"),
            Err(GlycoscreenError::Storage(_))
        ));
    }

    #[test]
    fn test_patient_ids_and_report() {
        let service = service(0.65);
        for pid in ["PID-B", "PID-A", "PID-B"] {
            service
                .assess(PatientIdentity::with_id(pid), sample_attributes(), Audience::Patient)
                .expect("Should assess");
        }
        assert_eq!(
            service.patient_ids().expect("Should list"),
            vec!["PID-B".to_string(), "PID-A".to_string()]
        );
        assert_eq!(service.recent(10).expect("Should load").len(), 3);
        assert_eq!(service.page(0, 2).expect("Should page").records.len(), 2);

        let assessment = service
            .assess(PatientIdentity::with_id("PID-R"), sample_attributes(), Audience::Patient)
            .expect("Should assess");
        let bytes = render_report(&TextReportRenderer, &assessment).expect("Should render");
        let text = String::from_utf8(bytes).expect("utf8");
        assert!(text.contains("Patient ID: PID-R"));
        assert!(text.contains("Risk Probability: 65.00 %"));
    }

    #[test]
    fn test_shown_probability_matches_explanation() {
        // 0.634_94 rounds to 0.635 in storage; readers must still see 63.49 %.
        let service = service(0.634_94);
        let assessment = service
            .assess(
                PatientIdentity::with_id("PID-P"),
                sample_attributes(),
                Audience::Clinician,
            )
            .expect("Should assess");

        assert!((assessment.record.risk.probability - 0.635).abs() < 1e-12);
        assert!((assessment.risk.probability - 0.634_94).abs() < 1e-12);
        assert!(assessment
            .explanation
            .text
            .starts_with("Predicted High diabetes risk (63.49%)."));

        let bytes = render_report(&TextReportRenderer, &assessment).expect("Should render");
        let text = String::from_utf8(bytes).expect("utf8");
        assert!(text.contains("Risk Probability: 63.49 %"));
        assert!(!text.contains("63.50"));
    }
}
