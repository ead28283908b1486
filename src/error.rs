use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type used across loading, aggregation and export.
pub type ReportResult<T> = Result<T, ReportError>;

/// Low-level failure while decoding a single source file.
///
/// Always surfaced to callers wrapped in [`ReportError::SourceRead`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding error (including invalid UTF-8).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "excel")]
    /// Spreadsheet decoding error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// The file decoded but its shape is unusable (no header, ragged rows, missing sheet, ...).
    #[error("{message}")]
    Malformed { message: String },
}

impl SourceError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// Error type returned by the public API.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The file extension is neither a delimited-text nor a spreadsheet extension.
    #[error("unsupported file format '{extension}'")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The file has a supported extension but could not be decoded.
    #[error("read error: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: SourceError,
    },

    /// A grouping key is not a column of the table being aggregated.
    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    /// Restoring a column to the nullable-integer kind would lose information.
    #[error("cannot cast column '{column}' to integer: {message}")]
    IntegerCast { column: String, message: String },

    /// An integer sum does not fit in 64 bits.
    #[error("integer overflow while summing column '{column}'")]
    SumOverflow { column: String },

    /// Failure while concatenating per-file results or running the final aggregation pass.
    #[error("merge failed: {0}")]
    Merge(#[source] Box<ReportError>),

    /// `project.json` could not be decoded or encoded.
    #[error("project config error: {0}")]
    Config(#[from] serde_json::Error),

    /// I/O error outside of source decoding (listing, export, config files).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error while exporting.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl ReportError {
    pub(crate) fn source_read(path: impl Into<PathBuf>, source: impl Into<SourceError>) -> Self {
        Self::SourceRead {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Returns `true` if this error (or the error it wraps) was caused by an I/O failure.
    pub fn is_io(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::SourceRead {
                source: SourceError::Io(_),
                ..
            } => true,
            Self::SourceRead {
                source: SourceError::Csv(err),
                ..
            } => matches!(err.kind(), csv::ErrorKind::Io(_)),
            Self::Csv(err) => matches!(err.kind(), csv::ErrorKind::Io(_)),
            Self::Merge(inner) => inner.is_io(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ReportError, SourceError};

    #[test]
    fn merge_error_display_includes_inner_message() {
        let err = ReportError::Merge(Box::new(ReportError::UnknownColumn {
            column: "id".to_string(),
        }));
        assert_eq!(err.to_string(), "merge failed: unknown column 'id'");
    }

    #[test]
    fn io_detection_looks_through_wrappers() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ReportError::source_read("a.csv", SourceError::Io(io));
        assert!(err.is_io());
        assert!(ReportError::Merge(Box::new(err)).is_io());

        let malformed = ReportError::source_read("a.csv", SourceError::malformed("bad"));
        assert!(!malformed.is_io());
    }
}
