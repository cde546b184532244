pub mod config;
pub mod embed;
pub mod error;
pub(crate) mod http;
pub mod openai;
pub mod voyage;

pub use config::EmbedConfig;
pub use embed::Embedder;
pub use error::EmbedError;
pub use openai::OpenAI;
pub use voyage::{InputType, Voyage};
