//! Label vocabulary: the fixed set of tags authoring may assign.

use crate::error::StoreError;
use serde_yaml::Value;
use std::path::Path;
use tracing::warn;

/// Marker every label token starts with.
pub const LABEL_MARKER: char = '#';

/// Allowed labels, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
}

impl LabelVocabulary {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary = Self::default();
        for label in labels {
            vocabulary.insert(label.into());
        }
        vocabulary
    }

    /// Load from a YAML file holding either a sequence of labels or a
    /// `labels:` sequence.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        let document: Value =
            serde_yaml::from_str(&content).map_err(|e| StoreError::parse(path, e))?;

        let items = match document {
            Value::Sequence(items) => items,
            Value::Mapping(mut map) => match map.remove("labels") {
                Some(Value::Sequence(items)) => items,
                _ => {
                    return Err(StoreError::parse(
                        path,
                        "label file must contain a 'labels' sequence",
                    ))
                }
            },
            Value::Null => Vec::new(),
            _ => {
                return Err(StoreError::parse(
                    path,
                    "label file must be a sequence or a mapping with 'labels'",
                ))
            }
        };

        let mut vocabulary = Self::default();
        for item in items {
            match item {
                Value::String(label) => vocabulary.insert(label),
                other => warn!(path = %path.display(), item = ?other, "Ignoring non-string label"),
            }
        }
        Ok(vocabulary)
    }

    fn insert(&mut self, label: String) {
        let label = label.trim().to_string();
        if !label.starts_with(LABEL_MARKER) {
            warn!(label = %label, "Ignoring label without '{}' marker", LABEL_MARKER);
            return;
        }
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Keep only proposed labels that are strings, carry the marker and are
    /// in the vocabulary. Order of first appearance wins; duplicates drop.
    /// Falls back to `default_label` when nothing survives.
    pub fn filter_proposed(&self, proposed: &[Value], default_label: &str) -> Vec<String> {
        let mut kept: Vec<String> = Vec::new();
        for value in proposed {
            let Value::String(label) = value else {
                continue;
            };
            let label = label.trim();
            if label.starts_with(LABEL_MARKER)
                && self.contains(label)
                && !kept.iter().any(|k| k == label)
            {
                kept.push(label.to_string());
            }
        }
        if kept.is_empty() {
            kept.push(default_label.to_string());
        }
        kept
    }
}
