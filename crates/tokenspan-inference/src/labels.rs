//! Label vocabulary for token classification models
//!
//! Parses `id2label` from a model directory's `config.json` and decodes label
//! ids into BIO tags. When the config carries no usable mapping, falls back
//! to the standard CoNLL-03 layout.

use std::collections::HashMap;
use std::path::Path;

use tokenspan_core::{Error, Result, TaskKind};

/// A single decoded BIO tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BioTag {
    /// Background position; closes any open entity
    Outside,
    /// Starts a new entity of the given type
    Begin(String),
    /// Continues an open entity of the given type
    Inside(String),
}

/// Maps model output indices to label strings
#[derive(Debug, Clone)]
pub struct LabelMap {
    labels: HashMap<usize, String>,
}

impl Default for LabelMap {
    /// The CoNLL-03 layout, for models shipped without a config
    fn default() -> Self {
        Self {
            labels: conll03_labels(),
        }
    }
}

impl LabelMap {
    /// Build from an explicit id → label table
    pub fn new(labels: HashMap<usize, String>) -> Self {
        Self { labels }
    }

    /// Extract `id2label` from a parsed `config.json` value
    pub fn from_config_value(config: &serde_json::Value) -> Self {
        let mut labels = HashMap::new();
        if let Some(obj) = config.get("id2label").and_then(|v| v.as_object()) {
            for (id, label) in obj {
                if let (Ok(id), Some(label)) = (id.parse::<usize>(), label.as_str()) {
                    labels.insert(id, label.to_string());
                }
            }
        }
        if labels.is_empty() {
            labels = conll03_labels();
        }
        Self { labels }
    }

    /// Read and parse a model directory's `config.json`
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        Ok(Self::from_config_value(&value))
    }

    /// Number of known labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label string for an output index
    pub fn label(&self, id: usize) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    /// Decode an output index into its BIO reading.
    ///
    /// Labels without a `B-`/`I-` prefix (including bare `O`) read as
    /// background: they contribute no entity and close any open one.
    pub fn tag(&self, id: usize) -> Result<BioTag> {
        let label = self.labels.get(&id).ok_or_else(|| {
            Error::decode(
                TaskKind::Ner,
                format!("label id {} outside the model's label map", id),
            )
        })?;
        Ok(parse_bio(label))
    }
}

fn parse_bio(label: &str) -> BioTag {
    if let Some(ty) = label.strip_prefix("B-") {
        BioTag::Begin(ty.to_string())
    } else if let Some(ty) = label.strip_prefix("I-") {
        BioTag::Inside(ty.to_string())
    } else {
        BioTag::Outside
    }
}

/// Standard CoNLL-03 label layout used when a config has no `id2label`
fn conll03_labels() -> HashMap<usize, String> {
    [
        (0, "O"),
        (1, "B-MISC"),
        (2, "I-MISC"),
        (3, "B-PER"),
        (4, "I-PER"),
        (5, "B-ORG"),
        (6, "I-ORG"),
        (7, "B-LOC"),
        (8, "I-LOC"),
    ]
    .into_iter()
    .map(|(id, label)| (id, label.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_id2label_from_config() {
        let config = serde_json::json!({
            "id2label": { "0": "O", "1": "B-PER", "2": "I-PER" }
        });
        let map = LabelMap::from_config_value(&config);
        assert_eq!(map.len(), 3);
        assert_eq!(map.label(1), Some("B-PER"));
        assert_eq!(map.tag(2).unwrap(), BioTag::Inside("PER".to_string()));
        assert_eq!(map.tag(0).unwrap(), BioTag::Outside);
    }

    #[test]
    fn missing_id2label_falls_back_to_conll03() {
        let map = LabelMap::from_config_value(&serde_json::json!({}));
        assert_eq!(map.len(), 9);
        assert_eq!(map.label(3), Some("B-PER"));
        assert_eq!(map.label(8), Some("I-LOC"));
    }

    #[test]
    fn unknown_label_id_is_a_decode_error() {
        let map = LabelMap::from_config_value(&serde_json::json!({
            "id2label": { "0": "O" }
        }));
        let err = map.tag(7).unwrap_err();
        assert!(matches!(err, Error::Decode { task: TaskKind::Ner, .. }));
    }

    #[test]
    fn unprefixed_labels_read_as_background() {
        let config = serde_json::json!({
            "id2label": { "0": "LABEL_0", "1": "B-ORG" }
        });
        let map = LabelMap::from_config_value(&config);
        assert_eq!(map.tag(0).unwrap(), BioTag::Outside);
        assert_eq!(map.tag(1).unwrap(), BioTag::Begin("ORG".to_string()));
    }
}
