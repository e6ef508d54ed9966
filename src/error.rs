//! Error types for the scrivener generation pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Descriptor store, key pool and artifact I/O errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to serialize {path}: {message}")]
    Serialize { path: PathBuf, message: String },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        StoreError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Generation backend errors. Every variant is a per-descriptor failure.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Provider request failed: {0}")]
    RequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    AuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Provider model not found: {0}")]
    ModelNotFound(String),

    #[error("Backend returned no usable content: {0}")]
    EmptyResponse(String),

    #[error("Backend response could not be interpreted: {0}")]
    UnusableResponse(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),
}

/// Pipeline errors: the per-descriptor taxonomy plus configuration failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Key pool exhausted: no unused keys remain in {0}")]
    PoolExhausted(PathBuf),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Malformed descriptor: {0}")]
    MalformedDescriptor(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::Config(err.to_string())
    }
}

impl PipelineError {
    /// Stable short name used in run summaries.
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::PoolExhausted(_) => "pool_exhausted",
            PipelineError::Generation(_) => "generation",
            PipelineError::MalformedDescriptor(_) => "malformed_descriptor",
            PipelineError::Store(_) => "store_io",
            PipelineError::Config(_) => "config",
        }
    }
}
