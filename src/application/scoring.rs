//! Risk scoring: encoded features to probability and category.
//!
//! The model artifact is built once at startup and shared read-only. The scorer
//! receives it by construction, so tests can inject stub classifiers.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{
    encode, EncodedFeatureVector, PatientAttributes, RiskResult, NUMERIC_COLUMNS,
};
use crate::ports::{Classifier, FeatureScaler};
use crate::GlycoscreenError;

/// The trained triple: classifier, scaler and the ordered training columns.
pub struct ModelArtifact {
    feature_columns: Vec<String>,
    classifier: Box<dyn Classifier>,
    scaler: Box<dyn FeatureScaler>,
}

impl ModelArtifact {
    /// Assemble an artifact, checking that all three parts agree on the feature count
    /// and that the columns cover every numeric measurement.
    ///
    /// Only one-hot category columns may be absent from the encoder's output; a missing
    /// measurement column would silently drop a patient value.
    ///
    /// # Errors
    /// Returns `GlycoscreenError::Configuration` on an empty or duplicated column list,
    /// a missing measurement column, or any length mismatch.
    pub fn new(
        feature_columns: Vec<String>,
        classifier: Box<dyn Classifier>,
        scaler: Box<dyn FeatureScaler>,
    ) -> Result<Self, GlycoscreenError> {
        let n = feature_columns.len();
        if n == 0 {
            return Err(GlycoscreenError::Configuration(
                "Model artifact has no feature columns".into(),
            ));
        }
        if classifier.n_features() != n || scaler.n_features() != n {
            return Err(GlycoscreenError::Configuration(format!(
                "Model artifact disagrees on feature count: columns={n}, classifier={}, scaler={}",
                classifier.n_features(),
                scaler.n_features()
            )));
        }

        let mut seen = HashSet::with_capacity(n);
        if let Some(dup) = feature_columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(GlycoscreenError::Configuration(format!(
                "Model artifact lists column '{dup}' more than once"
            )));
        }
        let missing: Vec<&str> = NUMERIC_COLUMNS
            .iter()
            .copied()
            .filter(|c| !seen.contains(c))
            .collect();
        if !missing.is_empty() {
            return Err(GlycoscreenError::Configuration(format!(
                "Model artifact is missing measurement columns: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            feature_columns,
            classifier,
            scaler,
        })
    }

    #[must_use]
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// The `k` features with the largest absolute model weight, heaviest first.
    ///
    /// Empty when the classifier exposes no coefficients.
    #[must_use]
    pub fn top_factors(&self, k: usize) -> Vec<(String, f64)> {
        let Some(coefficients) = self.classifier.coefficients() else {
            return Vec::new();
        };
        let mut ranked: Vec<(String, f64)> = self
            .feature_columns
            .iter()
            .cloned()
            .zip(coefficients.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        ranked.truncate(k);
        ranked
    }
}

impl std::fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("feature_columns", &self.feature_columns)
            .finish_non_exhaustive()
    }
}

/// Applies the scaler and classifier to encoded features.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    artifact: Arc<ModelArtifact>,
}

impl RiskScorer {
    #[must_use]
    pub fn new(artifact: Arc<ModelArtifact>) -> Self {
        Self { artifact }
    }

    #[must_use]
    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Encode attributes onto this artifact's column layout.
    ///
    /// # Errors
    /// Propagates encoder configuration errors.
    pub fn encode(&self, attrs: &PatientAttributes) -> Result<EncodedFeatureVector, GlycoscreenError> {
        encode(attrs, &self.artifact.feature_columns)
    }

    /// Score an encoded vector.
    ///
    /// # Errors
    /// Returns `GlycoscreenError::Scoring` if the vector does not match the artifact's
    /// columns or the classifier yields an invalid probability.
    pub fn score(&self, vector: &EncodedFeatureVector) -> Result<RiskResult, GlycoscreenError> {
        let expected = &self.artifact.feature_columns;
        if vector.columns() != expected.as_slice() {
            return Err(GlycoscreenError::Scoring(format!(
                "Feature vector layout does not match the model: got {} columns, expected {}",
                vector.len(),
                expected.len()
            )));
        }

        let scaled = self.artifact.scaler.transform(vector.values());
        let probability = self.artifact.classifier.predict_proba(&scaled);
        let result = RiskResult::from_probability(probability)?;

        tracing::debug!(
            "Scored vector: probability={:.4}, category={}",
            result.probability,
            result.category
        );
        Ok(result)
    }

    /// Encode then score.
    ///
    /// # Errors
    /// See [`RiskScorer::encode`] and [`RiskScorer::score`].
    pub fn assess(&self, attrs: &PatientAttributes) -> Result<RiskResult, GlycoscreenError> {
        let vector = self.encode(attrs)?;
        self.score(&vector)
    }
}


#[cfg(test)]
mod tests {
    use super::stubs::*;
    use super::*;
    use crate::domain::{sample_attributes, RiskCategory};

    #[test]
    fn test_stub_probability_maps_to_category() {
        let scorer = RiskScorer::new(fixed_artifact(0.65));
        let risk = scorer.assess(&sample_attributes()).expect("Should score");
        assert!((risk.probability - 0.65).abs() < f64::EPSILON);
        assert_eq!(risk.category, RiskCategory::High);

        let scorer = RiskScorer::new(fixed_artifact(0.05));
        let risk = scorer.assess(&sample_attributes()).expect("Should score");
        assert_eq!(risk.category, RiskCategory::Low);
    }

    #[test]
    fn test_mismatched_vector_is_scoring_error() {
        let scorer = RiskScorer::new(fixed_artifact(0.5));
        let vector = EncodedFeatureVector::from_parts(vec!["age".into()], vec![45.0])
            .expect("aligned parts");
        let err = scorer.score(&vector).expect_err("Should reject");
        assert!(matches!(err, GlycoscreenError::Scoring(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_invalid_probability_is_scoring_error() {
        let scorer = RiskScorer::new(fixed_artifact(f64::NAN));
        assert!(matches!(
            scorer.assess(&sample_attributes()),
            Err(GlycoscreenError::Scoring(_))
        ));
    }

    #[test]
    fn test_artifact_rejects_disagreeing_parts() {
        let err = ModelArtifact::new(
            training_columns(),
            Box::new(FixedClassifier {
                n: 3,
                probability: 0.5,
            }),
            Box::new(IdentityScaler(13)),
        )
        .expect_err("Should reject");
        assert!(err.is_fatal());

        let err = ModelArtifact::new(
            Vec::new(),
            Box::new(FixedClassifier {
                n: 0,
                probability: 0.5,
            }),
            Box::new(IdentityScaler(0)),
        )
        .expect_err("Should reject");
        assert!(matches!(err, GlycoscreenError::Configuration(_)));
    }

    #[test]
    fn test_top_factors_empty_without_coefficients() {
        assert!(fixed_artifact(0.5).top_factors(5).is_empty());
    }

    fn artifact_over(columns: Vec<String>) -> Result<ModelArtifact, GlycoscreenError> {
        let n = columns.len();
        ModelArtifact::new(
            columns,
            Box::new(FixedClassifier {
                n,
                probability: 0.5,
            }),
            Box::new(IdentityScaler(n)),
        )
    }

    #[test]
    fn test_artifact_requires_measurement_columns() {
        let mut columns = training_columns();
        let bmi = columns.iter().position(|c| c == "bmi").expect("bmi column");
        columns[bmi] = "BMI".into();

        let err = artifact_over(columns).expect_err("Should reject");
        assert!(matches!(err, GlycoscreenError::Configuration(_)));
        assert!(err.to_string().contains("bmi"));
        assert!(err.is_fatal());

        let without_glucose: Vec<String> = training_columns()
            .into_iter()
            .filter(|c| c != "blood_glucose_level")
            .collect();
        assert!(artifact_over(without_glucose).is_err());
    }

    #[test]
    fn test_artifact_allows_missing_category_columns() {
        let columns: Vec<String> = training_columns()
            .into_iter()
            .filter(|c| c != "smoking_history_ever")
            .collect();
        assert!(artifact_over(columns).is_ok());
    }

    #[test]
    fn test_artifact_rejects_duplicate_columns() {
        let mut columns = training_columns();
        columns.push("age".into());

        let err = artifact_over(columns).expect_err("Should reject");
        assert!(matches!(err, GlycoscreenError::Configuration(_)));
        assert!(err.to_string().contains("'age'"));
    }
}
