//! Error types for tokenspan

use crate::types::TaskKind;

/// Result type alias using tokenspan's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tokenspan operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Decode attempt against a handle whose load failed
    #[error("model for task {task} is not ready ({path}): {cause}")]
    ModelNotReady {
        task: TaskKind,
        path: String,
        cause: String,
    },

    /// Model loading errors
    #[error("model failed to load for task {task} ({path}): {cause}")]
    Load {
        task: TaskKind,
        path: String,
        cause: String,
    },

    /// Logits/token-sequence mismatches during decoding
    #[error("decode error for task {task}: {cause}")]
    Decode { task: TaskKind, cause: String },

    /// Tokenizer failures
    #[error("tokenization error: {0}")]
    Tokenize(String),

    /// Graph execution failures
    #[error("inference error: {0}")]
    Inference(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new not-ready error
    pub fn not_ready(task: TaskKind, path: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::ModelNotReady {
            task,
            path: path.into(),
            cause: cause.into(),
        }
    }

    /// Create a new load error
    pub fn load(task: TaskKind, path: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Load {
            task,
            path: path.into(),
            cause: cause.into(),
        }
    }

    /// Create a new decode error
    pub fn decode(task: TaskKind, cause: impl Into<String>) -> Self {
        Self::Decode {
            task,
            cause: cause.into(),
        }
    }

    /// Create a new tokenization error
    pub fn tokenize(msg: impl Into<String>) -> Self {
        Self::Tokenize(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
