//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundaries between
//! the screening pipeline and the model artifact, the remote text generator,
//! the record store and the report renderer.

mod classifier;
mod report;
mod storage;
mod text_generator;

pub use classifier::{Classifier, FeatureScaler};
pub use report::{ReportInput, ReportRenderer};
pub use storage::{RecordPage, RecordStore};
pub use text_generator::{DisabledGenerator, GenerationError, TextGenerator};
