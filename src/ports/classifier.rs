//! Model port: Traits for the trained classifier and its fitted scaler.
//!
//! The scorer only sees these traits, so the artifact loaded at startup and the
//! stubs used in tests are interchangeable.

/// Fitted feature scaler.
pub trait FeatureScaler: Send + Sync {
    /// Number of features the scaler was fitted on.
    fn n_features(&self) -> usize;

    /// Apply the learned affine transform.
    ///
    /// Callers guarantee `features.len() == self.n_features()`.
    fn transform(&self, features: &[f64]) -> Vec<f64>;
}

/// Binary classifier producing a probability for the positive class.
pub trait Classifier: Send + Sync {
    /// Number of (scaled) features the classifier expects.
    fn n_features(&self) -> usize;

    /// Probability of the positive class for one scaled feature row.
    ///
    /// Callers guarantee `scaled.len() == self.n_features()`.
    fn predict_proba(&self, scaled: &[f64]) -> f64;

    /// Per-feature weights, when the model exposes them (linear models).
    fn coefficients(&self) -> Option<&[f64]> {
        None
    }
}
