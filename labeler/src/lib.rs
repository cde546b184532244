//! Classification oracle: turns free text into a short category label.
//!
//! The [`Labeler`] trait is what the classifier consumes. [`OpenAILabeler`]
//! implements it over the chat completions API with exponential backoff on
//! transient failures.

pub mod error;
pub mod labeler;
pub mod openai;
pub mod prompt;
pub mod retry;

pub use error::LabelerError;
pub use labeler::{Labeler, normalize_label};
pub use openai::{OpenAILabeler, OpenAILabelerConfig};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use retry::RetryPolicy;
