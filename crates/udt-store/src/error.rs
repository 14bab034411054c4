use udt_types::{SampleId, TypeError};

/// Errors from dataset manager operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced sample does not exist in the current document.
    #[error("sample not found: {0}")]
    NotFound(SampleId),

    /// Mutations are not permitted right now.
    #[error("dataset is not writable")]
    NotWritable,

    /// The backing dataset cannot be reached or is not loaded.
    #[error("dataset is not ready")]
    NotReady,

    /// A property update was rejected.
    #[error("invalid property `{key}`: {reason}")]
    InvalidProperty { key: String, reason: String },

    /// A sample replacement would break id uniqueness.
    #[error("invalid sample {id}: {reason}")]
    InvalidSample { id: SampleId, reason: String },

    /// The id source kept producing ids that are already taken.
    #[error("could not allocate a unique sample id after {attempts} attempts")]
    IdExhausted { attempts: usize },

    /// Store configuration is malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Type(TypeError),
}

impl From<TypeError> for StoreError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidProperty { key, reason } => Self::InvalidProperty { key, reason },
            TypeError::ReservedProperty(key) => Self::InvalidProperty {
                key,
                reason: "samples are changed through the sample operations".to_string(),
            },
            other => Self::Type(other),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias for dataset manager operations.
pub type StoreResult<T> = Result<T, StoreError>;
