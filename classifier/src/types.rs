use std::time::Duration;

use serde::Serialize;

/// Result of one `classify` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Trimmed, lowercase, never empty. On a hit this is the cluster root.
    pub label: String,
    pub cache_hit: bool,
    /// Similarity of the matched text on a hit; `None` on a miss.
    pub confidence: Option<f32>,
    /// From call start until the label was known.
    pub user_facing_latency: Duration,
    /// Time spent on maintenance after a miss; zero on a hit.
    pub background_latency: Duration,
}

/// Snapshot of engine counters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EngineMetrics {
    pub total_classifications: u64,
    pub cache_hits: u64,
    /// `cache_hits / total_classifications`, 0 when nothing was classified.
    pub hit_rate: f64,
    pub unique_labels: usize,
    pub clusters: usize,
}
