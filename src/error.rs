//! Error types for escoba.

/// Result type alias for escoba operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in escoba operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Arrow error during data processing.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// A column selector did not match any column in the input schema.
    #[error("Column '{name}' not found in schema")]
    ColumnNotFound {
        /// The name of the missing column.
        name: String,
    },

    /// A tabulated column's type is outside the supported kinds
    /// (boolean, integer, float, utf8, dictionary of utf8).
    #[error("Column '{name}' has unsupported type {data_type} for tabulation")]
    UnsupportedColumnKind {
        /// The name of the offending column.
        name: String,
        /// Display form of the Arrow data type.
        data_type: String,
    },

    /// A tabulation call was given an unusable number of column selectors.
    #[error(
        "Tabulation requires between one and three column selectors, got {got}; \
         call one_way, two_way, or three_way (or pass 1-3 selectors to tabulate)"
    )]
    MissingArguments {
        /// Number of selectors supplied.
        got: usize,
    },

    /// Row counts disagreed while assembling a result batch.
    #[error("Internal length mismatch: {message}")]
    LengthMismatch {
        /// Description of the mismatch.
        message: String,
    },
}

impl Error {
    /// Create a column not found error.
    pub fn column_not_found(name: impl Into<String>) -> Self {
        Self::ColumnNotFound { name: name.into() }
    }

    /// Create an unsupported column kind error.
    pub fn unsupported_kind(
        name: impl Into<String>,
        data_type: &arrow::datatypes::DataType,
    ) -> Self {
        Self::UnsupportedColumnKind {
            name: name.into(),
            data_type: data_type.to_string(),
        }
    }

    /// Create a missing arguments error.
    #[must_use]
    pub fn missing_arguments(got: usize) -> Self {
        Self::MissingArguments { got }
    }

    /// Create an internal length mismatch error.
    pub fn length_mismatch(message: impl Into<String>) -> Self {
        Self::LengthMismatch {
            message: message.into(),
        }
    }
}
