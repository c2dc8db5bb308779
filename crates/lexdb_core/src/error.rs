//! Error types for LexDB core.

use lexdb_codec::CodecError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in LexDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] lexdb_storage::StorageError),

    /// A record could not be serialized, or does not match its entity.
    #[error("encoding error: {message}")]
    Encoding {
        /// Description of the problem.
        message: String,
    },

    /// A stored payload does not deserialize into its entity's shape.
    #[error("decoding error: {message}")]
    Decoding {
        /// Description of the problem.
        message: String,
    },

    /// Key bytes do not hold a valid order-preserving encoding.
    #[error("malformed encoding: {message}")]
    MalformedEncoding {
        /// Description of the problem.
        message: String,
    },

    /// No record with this identifier exists.
    #[error("record not found: {entity}/{id}")]
    NotFound {
        /// Entity searched.
        entity: String,
        /// Identifier that was not found.
        id: i64,
    },

    /// An index entry names an identifier without a live record.
    #[error("dangling index entry: {entity}.{index} -> {id}")]
    DanglingIndexEntry {
        /// Entity owning the index.
        entity: String,
        /// Index name.
        index: String,
        /// Identifier the entry points to.
        id: i64,
    },

    /// The schema is invalid.
    #[error("invalid schema: {message}")]
    Schema {
        /// Description of the problem.
        message: String,
    },

    /// The entity is not declared in the schema.
    #[error("unknown entity: {name}")]
    UnknownEntity {
        /// Name of the entity.
        name: String,
    },

    /// The index is not declared for the entity.
    #[error("unknown index {index} on entity {entity}")]
    UnknownIndex {
        /// Entity searched.
        entity: String,
        /// Name of the index.
        index: String,
    },

    /// No free identifier was found within the configured attempts.
    #[error("no free identifier for {entity} after {attempts} attempts")]
    IdSpaceExhausted {
        /// Entity being created.
        entity: String,
        /// Number of draws made.
        attempts: u32,
    },

    /// An argument is out of range.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Creates a decoding error.
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }

    /// Creates a malformed encoding error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEncoding {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(entity: impl Into<String>, id: i64) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id,
        }
    }

    /// Creates a dangling index entry error.
    pub fn dangling(entity: impl Into<String>, index: impl Into<String>, id: i64) -> Self {
        Self::DanglingIndexEntry {
            entity: entity.into(),
            index: index.into(),
            id,
        }
    }

    /// Creates a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Creates an unknown entity error.
    pub fn unknown_entity(name: impl Into<String>) -> Self {
        Self::UnknownEntity { name: name.into() }
    }

    /// Creates an unknown index error.
    pub fn unknown_index(entity: impl Into<String>, index: impl Into<String>) -> Self {
        Self::UnknownIndex {
            entity: entity.into(),
            index: index.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns true for [`CoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<CodecError> for CoreError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::MalformedEncoding { message } => Self::MalformedEncoding { message },
            CodecError::EncodingFailed { message } => Self::Encoding { message },
            CodecError::DecodingFailed { message } => Self::Decoding { message },
        }
    }
}
