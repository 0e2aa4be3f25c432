//! Registry configuration
//!
//! Model sources and inference settings, deserializable from YAML with
//! per-field defaults. The environment variables `TOKENSPAN_NER_MODEL` and
//! `TOKENSPAN_ZERO_SHOT_MODEL` override the configured sources, selecting a
//! local directory when the value names an existing path and a HuggingFace
//! Hub repo otherwise.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokenspan_core::{Error, Result};

use crate::session::SessionConfig;

/// Where a model's files come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModelSource {
    /// Load from a local directory holding `model.onnx`, `tokenizer.json`,
    /// and `config.json`
    Local { path: PathBuf },

    /// Download from HuggingFace Hub
    HuggingFace {
        repo: String,
        #[serde(default = "default_revision")]
        revision: String,
    },
}

fn default_revision() -> String {
    "main".to_string()
}

impl ModelSource {
    /// Interpret a free-form override value: an existing local path selects
    /// a local source, anything else is treated as a Hub repo id
    pub fn parse(value: &str) -> Self {
        if Path::new(value).exists() {
            ModelSource::Local {
                path: PathBuf::from(value),
            }
        } else {
            ModelSource::HuggingFace {
                repo: value.to_string(),
                revision: default_revision(),
            }
        }
    }

    /// Identity string used in errors, logs, and status reports
    pub fn describe(&self) -> String {
        match self {
            ModelSource::Local { path } => path.display().to_string(),
            ModelSource::HuggingFace { repo, revision } => format!("{}@{}", repo, revision),
        }
    }
}

/// One task's model entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Model source
    pub source: ModelSource,

    /// Maximum sequence length the encoder truncates to
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_max_length() -> usize {
    512
}

impl ModelSpec {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            source: ModelSource::Local { path: path.into() },
            max_length: default_max_length(),
        }
    }
}

/// Decode-time settings shared by both tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceSettings {
    /// Byte length above which NER input splits on blank lines
    #[serde(default = "default_chunk_bytes")]
    pub chunk_bytes: usize,

    /// Hypothesis pairs scored per graph run in zero-shot mode
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Recover from orphan `I-` tags by starting a new entity
    #[serde(default = "default_lenient")]
    pub lenient_decoding: bool,
}

fn default_chunk_bytes() -> usize {
    5000
}

fn default_batch_size() -> usize {
    8
}

fn default_lenient() -> bool {
    true
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            chunk_bytes: default_chunk_bytes(),
            batch_size: default_batch_size(),
            lenient_decoding: default_lenient(),
        }
    }
}

/// Top-level registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// NER model entry
    #[serde(default = "default_ner_spec")]
    pub ner: ModelSpec,

    /// Zero-shot model entry
    #[serde(default = "default_zero_shot_spec")]
    pub zero_shot: ModelSpec,

    /// Session execution settings shared by both tasks
    #[serde(default)]
    pub session: SessionConfig,

    /// Decode-time settings
    #[serde(default)]
    pub inference: InferenceSettings,
}

fn default_ner_spec() -> ModelSpec {
    ModelSpec::local("models/ner")
}

fn default_zero_shot_spec() -> ModelSpec {
    ModelSpec::local("models/zero-shot")
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ner: default_ner_spec(),
            zero_shot: default_zero_shot_spec(),
            session: SessionConfig::default(),
            inference: InferenceSettings::default(),
        }
    }
}

impl RegistryConfig {
    /// Parse from a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse configuration: {}", e)))
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Apply `TOKENSPAN_NER_MODEL` / `TOKENSPAN_ZERO_SHOT_MODEL` overrides
    pub fn apply_env_overrides(&mut self) {
        self.override_sources(|name| std::env::var(name).ok());
    }

    fn override_sources(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("TOKENSPAN_NER_MODEL") {
            self.ner.source = ModelSource::parse(&value);
        }
        if let Some(value) = lookup("TOKENSPAN_ZERO_SHOT_MODEL") {
            self.zero_shot.source = ModelSource::parse(&value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = RegistryConfig::from_yaml("{}").unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.ner.max_length, 512);
        assert_eq!(config.inference.chunk_bytes, 5000);
        assert_eq!(config.inference.batch_size, 8);
        assert!(config.inference.lenient_decoding);
    }

    #[test]
    fn parses_a_full_document() {
        let yaml = r#"
ner:
  source:
    type: local
    path: "/opt/models/ner"
  max_length: 256
zero_shot:
  source:
    type: huggingface
    repo: "facebook/bart-large-mnli"
session:
  optimization_level: basic
  intra_threads: 2
inference:
  chunk_bytes: 2000
  batch_size: 4
  lenient_decoding: false
"#;
        let config = RegistryConfig::from_yaml(yaml).unwrap();
        match &config.ner.source {
            ModelSource::Local { path } => {
                assert_eq!(path.to_str().unwrap(), "/opt/models/ner");
            }
            other => panic!("Expected local source, got {:?}", other),
        }
        assert_eq!(config.ner.max_length, 256);
        match &config.zero_shot.source {
            ModelSource::HuggingFace { repo, revision } => {
                assert_eq!(repo, "facebook/bart-large-mnli");
                assert_eq!(revision, "main");
            }
            other => panic!("Expected hub source, got {:?}", other),
        }
        assert_eq!(config.session.intra_threads, Some(2));
        assert_eq!(config.inference.chunk_bytes, 2000);
        assert!(!config.inference.lenient_decoding);
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let err = RegistryConfig::from_yaml("ner: [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn env_overrides_replace_sources() {
        let mut config = RegistryConfig::default();
        config.override_sources(|name| match name {
            "TOKENSPAN_NER_MODEL" => Some("dslim/bert-base-NER".to_string()),
            _ => None,
        });
        assert_eq!(
            config.ner.source,
            ModelSource::HuggingFace {
                repo: "dslim/bert-base-NER".to_string(),
                revision: "main".to_string(),
            }
        );
        assert_eq!(config.zero_shot, RegistryConfig::default().zero_shot);
    }

    #[test]
    fn override_naming_an_existing_path_selects_local() {
        let dir = tempfile::tempdir().unwrap();
        let value = dir.path().to_str().unwrap().to_string();
        let mut config = RegistryConfig::default();
        config.override_sources(|name| {
            (name == "TOKENSPAN_ZERO_SHOT_MODEL").then(|| value.clone())
        });
        assert_eq!(
            config.zero_shot.source,
            ModelSource::Local {
                path: PathBuf::from(&value),
            }
        );
    }

    #[test]
    fn describe_names_the_source() {
        assert_eq!(ModelSource::parse("org/repo").describe(), "org/repo@main");
        let local = ModelSource::Local {
            path: PathBuf::from("models/ner"),
        };
        assert_eq!(local.describe(), "models/ner");
    }
}
