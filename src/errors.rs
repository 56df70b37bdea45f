use thiserror::Error;

/// Failure taxonomy of an analysis run.
///
/// Cooperative cancellation is not an error; it is reported through
/// [`crate::classify::driver::RunStatus`]. Unknown class ids are not errors
/// either, they are coerced to the unassigned sentinel during streaming.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Any failure reading the read stream, the mate reader, or committing
    /// the assignment table. Fatal to the run; no partial persistence.
    #[error("archive I/O error: {0}")]
    Archive(#[from] std::io::Error),

    /// Malformed hierarchy file for a classification scheme.
    #[error("scheme '{scheme}': {message}")]
    Scheme { scheme: String, message: String },

    /// A configuration that cannot be honored, detected before streaming
    /// begins (e.g. mate-pair mode against an archive without random access).
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
