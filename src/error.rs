use thiserror::Error;

/// Failures callers may want to tell apart from generic I/O or HTTP errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("API key not found in environment variable: {0}")]
    MissingApiKey(String),

    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid mode: {0}. Use 'diagram' or 'plot'")]
    InvalidMode(String),

    #[error("model returned no image for {0}")]
    NoImage(String),

    #[error("prompt was blocked by the model: {0}")]
    Blocked(String),
}
