use thiserror::Error;

/// Errors returned when loading or saving cluster state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    #[error("dsu: corrupt cluster state: {0}")]
    CorruptState(String),

    #[error("dsu: read {path}: {message}")]
    ReadFailure { path: String, message: String },

    #[error("dsu: write {path}: {message}")]
    WriteFailure { path: String, message: String },
}
