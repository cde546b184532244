//! Benchmark input loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

/// One text to classify, with an optional reference category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetItem {
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Loads at most `limit` items from `path`.
///
/// JSON Lines by default: one `{"text": ..., "category": ...}` object per
/// line. With `plain`, every non-blank line is a text.
pub fn load(path: &Path, plain: bool, limit: usize) -> Result<Vec<DatasetItem>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    let items = if plain {
        parse_lines(&data)
    } else {
        parse_jsonl(&data)
    };
    if items.is_empty() {
        anyhow::bail!("dataset {} has no usable rows", path.display());
    }
    Ok(items.into_iter().take(limit).collect())
}

fn parse_lines(data: &str) -> Vec<DatasetItem> {
    data.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| DatasetItem {
            text: l.to_string(),
            category: None,
        })
        .collect()
}

fn parse_jsonl(data: &str) -> Vec<DatasetItem> {
    let mut items = Vec::new();
    for (n, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<DatasetItem>(line) {
            Ok(item) if !item.text.trim().is_empty() => items.push(item),
            Ok(_) => warn!("dataset: line {}: empty text, skipped", n + 1),
            Err(e) => warn!("dataset: line {}: {e}, skipped", n + 1),
        }
    }
    items
}
