//! Error types for the collapse simulation.
//!
//! Only configuration and persistence paths are fallible. Degenerate runtime
//! state (missing centers, unknown field ids, unloaded chunks) is handled in
//! place and never surfaces as an error.

/// Errors raised while building configuration or loading saved state.
#[derive(Debug, thiserror::Error)]
pub enum CollapseError {
    /// A value failed validation at construction time.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Explanation of what is wrong with the value.
        reason: String,
    },

    /// A growth field was given a value of the wrong type.
    #[error("field {field} expects a {expected} value, got {actual}")]
    FieldTypeMismatch {
        /// Field name.
        field: &'static str,
        /// Type the field accepts.
        expected: &'static str,
        /// Type that was supplied.
        actual: &'static str,
    },

    /// A growth field name did not match any known field.
    #[error("unknown growth field: {0}")]
    UnknownField(String),

    /// Failed to encode or decode saved JSON.
    #[error("persistence error: {source}")]
    Persistence {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Reading or writing a save file failed.
    #[error("i/o error at {path}: {source}")]
    Io {
        /// File involved.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A save envelope was written by an incompatible version.
    #[error("unsupported save version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the envelope.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },
}

impl CollapseError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CollapseError>;
