use async_trait::async_trait;

use crate::error::LabelerError;

/// A classification oracle.
///
/// Implementations return the raw label text; callers normalize it with
/// [`normalize_label`] before use.
#[async_trait]
pub trait Labeler: Send + Sync {
    async fn label(&self, text: &str) -> Result<String, LabelerError>;
}

/// Trims surrounding whitespace and lowercases.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize() {
        assert_eq!(normalize_label("  Technical_Question\n"), "technical_question");
        assert_eq!(normalize_label(" \t "), "");
    }
}
