use thiserror::Error;

/// Errors produced by document model operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid value for property `{key}`: {reason}")]
    InvalidProperty { key: String, reason: String },

    #[error("property `{0}` cannot be set directly")]
    ReservedProperty(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TypeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
