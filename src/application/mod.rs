//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the screening pipeline: scoring, explanation and the assessment service.

mod assessment;
mod explanation;
mod scoring;

pub use assessment::{render_report, Assessment, AssessmentService};
pub use explanation::{
    build_prompt, fallback_explanation, Audience, Explanation, ExplanationEngine,
    ExplanationSource,
};
pub use scoring::{ModelArtifact, RiskScorer};
