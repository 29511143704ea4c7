//! Text generation port: Trait for the remote explanation service.
//!
//! Every call yields an explicit outcome. The explanation engine branches on it and
//! never relies on unwinding for its fallback path.

/// Why a remote generation attempt produced no usable text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("Text generation is not configured")]
    NotConfigured,

    #[error("Cannot reach generation service at {0}")]
    Connection(String),

    #[error("Generation request timed out after {0}s")]
    Timeout(u64),

    #[error("Generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed generation response: {0}")]
    Malformed(String),

    #[error("Generation service returned no text")]
    EmptyResponse,

    #[error("Generation request failed: {0}")]
    Transport(String),
}

/// Remote natural-language generator.
///
/// Implementations make exactly one attempt per call and must bound it with a timeout.
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt.
    ///
    /// # Errors
    /// Returns the reason no usable text was produced.
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Generator used when no remote service is configured; always declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

impl TextGenerator for DisabledGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}
