use std::sync::Arc;

use conclass_dsu::ClusterPersistence;
use conclass_embed::Embedder;
use conclass_labeler::Labeler;
use conclass_vecstore::VecIndex;

use crate::error::ClassifierError;

/// Minimum content similarity for a cache hit.
pub const DEFAULT_CONTENT_THRESHOLD: f32 = 0.80;

/// Minimum label similarity for two labels to be clustered.
pub const DEFAULT_LABEL_THRESHOLD: f32 = 0.80;

/// Configures a [Classifier](crate::Classifier).
pub struct ClassifierConfig {
    /// Embeds both texts and labels.
    pub embedder: Arc<dyn Embedder>,

    /// Text vectors tagged with their label.
    pub content_index: Arc<dyn VecIndex>,

    /// Label vectors tagged with their cluster root.
    pub label_index: Arc<dyn VecIndex>,

    /// Oracle consulted on cache misses.
    pub labeler: Arc<dyn Labeler>,

    /// Loads cluster state at construction, saves it on shutdown.
    pub persistence: Arc<dyn ClusterPersistence>,

    /// 0 means [DEFAULT_CONTENT_THRESHOLD].
    pub content_threshold: f32,

    /// 0 means [DEFAULT_LABEL_THRESHOLD].
    pub label_threshold: f32,
}

impl ClassifierConfig {
    /// Config with default thresholds.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        content_index: Arc<dyn VecIndex>,
        label_index: Arc<dyn VecIndex>,
        labeler: Arc<dyn Labeler>,
        persistence: Arc<dyn ClusterPersistence>,
    ) -> Self {
        Self {
            embedder,
            content_index,
            label_index,
            labeler,
            persistence,
            content_threshold: 0.0,
            label_threshold: 0.0,
        }
    }

    pub fn with_content_threshold(mut self, threshold: f32) -> Self {
        self.content_threshold = threshold;
        self
    }

    pub fn with_label_threshold(mut self, threshold: f32) -> Self {
        self.label_threshold = threshold;
        self
    }

    /// Replaces zero thresholds with their defaults.
    pub(crate) fn with_defaults(mut self) -> Self {
        if self.content_threshold == 0.0 {
            self.content_threshold = DEFAULT_CONTENT_THRESHOLD;
        }
        if self.label_threshold == 0.0 {
            self.label_threshold = DEFAULT_LABEL_THRESHOLD;
        }
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ClassifierError> {
        check_threshold("content_threshold", self.content_threshold)?;
        check_threshold("label_threshold", self.label_threshold)
    }
}

fn check_threshold(name: &str, value: f32) -> Result<(), ClassifierError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ClassifierError::InvalidConfig(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use conclass_dsu::MemoryPersistence;
    use conclass_labeler::LabelerError;
    use conclass_vecstore::MemoryIndex;

    use super::*;

    struct NoEmbedder;

    #[async_trait::async_trait]
    impl Embedder for NoEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, conclass_embed::EmbedError> {
            Err(conclass_embed::EmbedError::EmptyInput)
        }

        async fn embed_batch(
            &self,
            _texts: &[&str],
        ) -> Result<Vec<Vec<f32>>, conclass_embed::EmbedError> {
            Err(conclass_embed::EmbedError::EmptyInput)
        }

        fn dimension(&self) -> usize {
            0
        }
    }

    struct NoLabeler;

    #[async_trait::async_trait]
    impl Labeler for NoLabeler {
        async fn label(&self, _text: &str) -> Result<String, LabelerError> {
            Err(LabelerError::EmptyResponse)
        }
    }

    fn config() -> ClassifierConfig {
        ClassifierConfig::new(
            Arc::new(NoEmbedder),
            Arc::new(MemoryIndex::new()),
            Arc::new(MemoryIndex::new()),
            Arc::new(NoLabeler),
            Arc::new(MemoryPersistence::new()),
        )
    }

    #[test]
    fn zero_threshold_uses_default() {
        let cfg = config().with_label_threshold(0.65).with_defaults();
        assert_eq!(cfg.content_threshold, DEFAULT_CONTENT_THRESHOLD);
        assert_eq!(cfg.label_threshold, 0.65);
        assert!(cfg.validate().is_ok());
        assert!(config().with_content_threshold(1.0).with_defaults().validate().is_ok());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        for bad in [-0.1, 1.01, f32::NAN, f32::INFINITY] {
            let err = config()
                .with_content_threshold(bad)
                .with_defaults()
                .validate()
                .unwrap_err();
            assert!(
                matches!(err, ClassifierError::InvalidConfig(ref m) if m.contains("content_threshold")),
                "{bad}: {err:?}"
            );
        }
    }
}
