//! Consistent classification engine.
//!
//! A [`Classifier`] answers `classify(text)` from a semantic cache when a
//! near-identical text was classified before, and otherwise asks a
//! [`Labeler`](conclass_labeler::Labeler) for a fresh label. Every fresh
//! label is merged into a union-find of labels so that near-duplicates
//! ("tech_question", "technical_question") resolve to one canonical root.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use conclass_classifier::{Classifier, ClassifierConfig};
//!
//! let classifier = Classifier::new(ClassifierConfig::new(
//!     embedder, content_index, label_index, labeler, persistence,
//! ))?;
//! let result = classifier.classify("how do I reset my password?").await?;
//! println!("{} (hit={})", result.label, result.cache_hit);
//! classifier.shutdown().await?;
//! ```

mod classifier;
mod config;
mod entry;
mod error;
mod gate;
mod maintenance;
mod types;

pub use classifier::Classifier;
pub use config::{ClassifierConfig, DEFAULT_CONTENT_THRESHOLD, DEFAULT_LABEL_THRESHOLD};
pub use entry::{ContentEntry, CorruptEntry, LabelEntry};
pub use error::{ClassifierError, MaintenanceError, MaintenanceJob};
pub use types::{Classification, EngineMetrics};

pub use tokio_util::sync::CancellationToken;
