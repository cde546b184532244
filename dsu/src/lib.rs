//! Union-find over classification labels.
//!
//! Every label gets a stable index the first time it is seen. Labels that
//! are found to mean the same thing are unioned, and the root of each set
//! is the canonical label for the whole cluster.
//!
//! # Usage
//!
//! ```
//! use conclass_dsu::LabelClusters;
//!
//! let clusters = LabelClusters::new();
//! let a = clusters.find_or_create("technical_question");
//! let b = clusters.find_or_create("tech_question");
//! clusters.union(a, b);
//!
//! assert!(clusters.connected(a, b));
//! assert_eq!(clusters.count_sets(), 1);
//! assert_eq!(clusters.root_label("tech_question"), "technical_question");
//! ```
//!
//! State is persisted through a [`ClusterPersistence`] implementation.
//! [`FilePersistence`] stores the three structural tables as JSON; all
//! derived state is rebuilt on load.

mod clusters;
mod error;
mod persist;

pub use clusters::{ClusterSnapshot, LabelClusters};
pub use error::PersistError;
pub use persist::{
    ClusterPersistence, DEFAULT_STATE_PATH, FilePersistence, MemoryPersistence, decode, encode,
};
