use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification used by callers that report engine failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The parameters cannot support the requested operation.
    Configuration,
    /// Encrypt, evaluate, or decrypt rejected its inputs.
    Evaluation,
    /// An error type the engine does not define itself.
    Foreign,
}

/// Errors raised by an encryption context.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("missing evaluation key: {0}")]
    MissingEvalKey(String),

    #[error("key mismatch: {0}")]
    KeyMismatch(String),

    #[error("multiplicative depth exhausted: result needs level {needed}, limit is {limit}")]
    DepthExhausted { needed: usize, limit: usize },

    #[error("operation not supported: {0}")]
    Unsupported(String),

    #[error("crypto context has been released")]
    ContextReleased,

    #[error("{type_name}: {message}")]
    Foreign { type_name: String, message: String },
}

impl EngineError {
    /// Wrap an error from outside the engine's taxonomy, keeping its type name.
    pub fn foreign<E: std::error::Error + ?Sized>(err: &E) -> Self {
        EngineError::Foreign {
            type_name: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidParameters(_)
            | EngineError::DepthExhausted { .. }
            | EngineError::Unsupported(_) => ErrorKind::Configuration,
            EngineError::Encoding(_)
            | EngineError::MissingEvalKey(_)
            | EngineError::KeyMismatch(_)
            | EngineError::ContextReleased => ErrorKind::Evaluation,
            EngineError::Foreign { .. } => ErrorKind::Foreign,
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
