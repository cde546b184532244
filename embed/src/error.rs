use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("embed: empty input")]
    EmptyInput,

    #[error("embed: request failed: {0}")]
    Transport(String),

    #[error("embed: API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("embed: invalid response: {0}")]
    Decode(String),

    #[error("embed: missing embedding for index {0}")]
    MissingIndex(usize),

    #[error("embed: unexpected embedding index {index} for batch size {batch_size}")]
    UnexpectedIndex { index: usize, batch_size: usize },
}
