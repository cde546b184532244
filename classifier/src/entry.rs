//! Typed views of the metadata stored in the two vector indexes.

use conclass_vecstore::{Match, Metadata};
use serde_json::Value;
use thiserror::Error;

const VECTOR_TEXT: &str = "vector_text";
const LABEL: &str = "label";
const ROOT: &str = "root";

/// A stored match whose metadata does not have the expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("entry {id:?}: {reason}")]
pub struct CorruptEntry {
    pub id: String,
    pub reason: String,
}

/// Metadata of a content-index vector: the text and the label it got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    pub vector_text: String,
    pub label: String,
}

/// Metadata of a label-index vector: the label and its cluster root at
/// the time it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub vector_text: String,
    pub label: String,
    pub root: Option<String>,
}

impl ContentEntry {
    pub fn from_match(m: &Match) -> Result<Self, CorruptEntry> {
        Ok(Self {
            vector_text: optional_str(m, VECTOR_TEXT)?.unwrap_or_default(),
            label: required_label(m)?,
        })
    }

    pub fn to_metadata(&self) -> Metadata {
        let mut meta = Metadata::new();
        meta.insert(VECTOR_TEXT.into(), Value::String(self.vector_text.clone()));
        meta.insert(LABEL.into(), Value::String(self.label.clone()));
        meta
    }
}

impl LabelEntry {
    pub fn from_match(m: &Match) -> Result<Self, CorruptEntry> {
        Ok(Self {
            vector_text: optional_str(m, VECTOR_TEXT)?.unwrap_or_default(),
            label: required_label(m)?,
            root: optional_str(m, ROOT)?.filter(|r| !r.is_empty()),
        })
    }

    pub fn to_metadata(&self) -> Metadata {
        let mut meta = Metadata::new();
        meta.insert(VECTOR_TEXT.into(), Value::String(self.vector_text.clone()));
        meta.insert(LABEL.into(), Value::String(self.label.clone()));
        if let Some(root) = &self.root {
            meta.insert(ROOT.into(), Value::String(root.clone()));
        }
        meta
    }
}

fn corrupt(m: &Match, reason: String) -> CorruptEntry {
    CorruptEntry {
        id: m.id.clone(),
        reason,
    }
}

fn required_str(m: &Match, key: &str) -> Result<String, CorruptEntry> {
    optional_str(m, key)?.ok_or_else(|| corrupt(m, format!("missing {key:?}")))
}

fn required_label(m: &Match) -> Result<String, CorruptEntry> {
    let label = required_str(m, LABEL)?;
    if label.trim().is_empty() {
        return Err(corrupt(m, "label is empty".into()));
    }
    Ok(label)
}

/// Missing and null are both absent; any other non-string is corrupt.
fn optional_str(m: &Match, key: &str) -> Result<Option<String>, CorruptEntry> {
    match m.metadata.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(corrupt(m, format!("{key:?} is not a string: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn m(metadata: Value) -> Match {
        Match {
            id: "v1".into(),
            score: 0.9,
            metadata: metadata.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn content_entry_from_metadata() {
        let e = ContentEntry::from_match(&m(json!({"vector_text": "hi", "label": "greeting"})))
            .unwrap();
        assert_eq!(e.label, "greeting");
        assert_eq!(e.vector_text, "hi");
        assert_eq!(ContentEntry::from_match(&Match { metadata: e.to_metadata(), ..m(json!({})) }).unwrap(), e);
    }

    #[test]
    fn missing_label_is_corrupt() {
        let err = ContentEntry::from_match(&m(json!({"vector_text": "hi"}))).unwrap_err();
        assert_eq!(err.id, "v1");
        assert!(err.reason.contains("label"));
    }

    #[test]
    fn non_string_label_is_corrupt() {
        assert!(ContentEntry::from_match(&m(json!({"label": 42}))).is_err());
        assert!(LabelEntry::from_match(&m(json!({"label": ["a"]}))).is_err());
    }

    #[test]
    fn blank_label_is_corrupt() {
        let err = ContentEntry::from_match(&m(json!({"label": ""}))).unwrap_err();
        assert_eq!(err.reason, "label is empty");
        assert!(ContentEntry::from_match(&m(json!({"label": "  "}))).is_err());
        assert!(LabelEntry::from_match(&m(json!({"label": " ", "root": "a"}))).is_err());
    }

    #[test]
    fn label_entry_root_is_optional() {
        let e = LabelEntry::from_match(&m(json!({"label": "tech_question"}))).unwrap();
        assert_eq!(e.root, None);
        assert_eq!(e.vector_text, "");

        let e = LabelEntry::from_match(&m(json!({"label": "a", "root": ""}))).unwrap();
        assert_eq!(e.root, None);

        let e = LabelEntry::from_match(&m(
            json!({"vector_text": "a", "label": "a", "root": "b"}),
        ))
        .unwrap();
        assert_eq!(e.root.as_deref(), Some("b"));
        assert_eq!(e.to_metadata()["root"], "b");
    }
}
