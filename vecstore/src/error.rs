use thiserror::Error;

#[derive(Error, Debug)]
pub enum VecError {
    #[error("vecstore: dimension mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    #[error("vecstore: empty vector")]
    EmptyVector,

    #[error("vecstore: request failed: {0}")]
    Transport(String),

    #[error("vecstore: API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("vecstore: invalid response: {0}")]
    InvalidFormat(String),
}
