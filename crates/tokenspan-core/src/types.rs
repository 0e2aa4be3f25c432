//! Core types for tokenspan

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default probability threshold for multi-label zero-shot inclusion
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// The inference tasks the engine serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Token classification decoded into named entities
    Ner,
    /// NLI-based zero-shot label scoring
    ZeroShot,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Ner => write!(f, "ner"),
            TaskKind::ZeroShot => write!(f, "zero-shot"),
        }
    }
}

/// A decoded named entity with its character span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity type label, e.g. PER/ORG/LOC
    pub entity_group: String,

    /// Merged surface text
    pub word: String,

    /// Confidence in [0,1], from member-token softmax probabilities
    pub score: f32,

    /// Byte offset of the span start in the original text
    pub start: usize,

    /// Byte offset one past the span end
    pub end: usize,
}

impl Entity {
    /// Create a new entity
    pub fn new(
        entity_group: impl Into<String>,
        word: impl Into<String>,
        score: f32,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            entity_group: entity_group.into(),
            word: word.into(),
            score,
            start,
            end,
        }
    }
}

/// One distinct surface form within an entity type bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedEntity {
    /// Canonical surface text (first-seen casing)
    pub word: String,

    /// Entity type label shared by all mentions
    pub entity_group: String,

    /// Number of mentions across the text
    pub count: usize,

    /// The underlying decoded mentions
    pub mentions: Vec<Entity>,
}

/// Zero-shot scoring result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroShotResult {
    /// The original input text, echoed
    pub sequence: String,

    /// Ranked labels (single-label) or labels above threshold (multi-label)
    pub labels: Vec<String>,

    /// Scores parallel to the ranked candidate list
    pub scores: Vec<f32>,
}

impl ZeroShotResult {
    /// Create a new zero-shot result
    pub fn new(sequence: impl Into<String>, labels: Vec<String>, scores: Vec<f32>) -> Self {
        Self {
            sequence: sequence.into(),
            labels,
            scores,
        }
    }
}

/// Mode options for zero-shot scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZeroShotOptions {
    /// Score each label independently instead of normalizing across the set
    #[serde(default)]
    pub multi_label: bool,

    /// Inclusion threshold for multi-label mode
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

impl Default for ZeroShotOptions {
    fn default() -> Self {
        Self {
            multi_label: false,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ZeroShotOptions {
    /// Multi-label mode with the given inclusion threshold
    pub fn multi_label(threshold: f32) -> Self {
        Self {
            multi_label: true,
            threshold,
        }
    }
}

/// How decoded entities are post-processed into the final list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationStrategy {
    /// Raw per-token merge, no adjacency pass
    None,
    /// Merge adjacent same-type contiguous spans
    #[default]
    Simple,
    /// Confidence from the first member token
    First,
    /// Confidence from the highest-probability member token
    Max,
    /// Confidence averaged over member tokens
    Average,
}

impl fmt::Display for AggregationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregationStrategy::None => "none",
            AggregationStrategy::Simple => "simple",
            AggregationStrategy::First => "first",
            AggregationStrategy::Max => "max",
            AggregationStrategy::Average => "average",
        };
        write!(f, "{}", name)
    }
}

/// Readiness of one registry-managed model handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleState {
    /// No load attempted yet
    NotLoaded,
    /// Loaded and serving
    Ready,
    /// Load failed; the recorded cause is surfaced on every decode attempt
    Failed(String),
}

/// Per-task readiness report from the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Which task this handle serves
    pub task: TaskKind,

    /// Model source (local directory or hub repo id)
    pub source: String,

    /// Current handle readiness
    pub state: HandleState,
}
