use serde::{Deserialize, Serialize};
use she_engine::{EngineError, ErrorKind};
use thiserror::Error;

/// Which bucket a failed case falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The context could not be built, or the parameters cannot carry the operation.
    Configuration,
    /// Encrypt, evaluate, or decrypt failed.
    Evaluation,
    /// The engine reported an error type it does not define itself.
    Foreign,
    /// The verifier or engine panicked.
    Panic,
}

/// Why a case did not complete.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("Exception thrown from {verifier}(): {message}")]
pub struct CaseFailure {
    pub kind: FailureKind,
    pub verifier: String,
    pub message: String,
}

impl CaseFailure {
    /// Classify an engine error raised while the verifier ran.
    pub fn from_engine(verifier: &str, err: &EngineError) -> Self {
        let kind = match err.kind() {
            ErrorKind::Configuration => FailureKind::Configuration,
            ErrorKind::Evaluation => FailureKind::Evaluation,
            ErrorKind::Foreign => FailureKind::Foreign,
        };
        let message = match err {
            EngineError::Foreign { type_name, message } => {
                format!("Unknown exception: type {type_name} -> {message}")
            }
            other => other.to_string(),
        };
        Self {
            kind,
            verifier: verifier.to_string(),
            message,
        }
    }

    /// Context construction failed before the verifier started.
    pub fn configuration(verifier: &str, err: &EngineError) -> Self {
        Self {
            kind: FailureKind::Configuration,
            ..Self::from_engine(verifier, err)
        }
    }

    pub fn panic(verifier: &str, message: String) -> Self {
        Self {
            kind: FailureKind::Panic,
            verifier: verifier.to_string(),
            message: format!("Unknown exception: {message}"),
        }
    }
}

/// Runner and CLI errors.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("unknown operation kind: {0}")]
    UnknownKind(String),

    #[error("registry has duplicate case names: {0}")]
    DuplicateNames(String),

    #[error("failed to write report: {0}")]
    Report(#[from] std::io::Error),

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
