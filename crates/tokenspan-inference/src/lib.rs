//! Tokenspan Inference
//!
//! ONNX-backed token-level NLP inference.
//!
//! This crate provides:
//! - BIO entity decoding with character spans
//! - Zero-shot label scoring via natural language inference
//! - A lazy model registry caching one handle per task
//!
//! The decoding cores are pure functions behind small traits (`TextEncoder`,
//! `TokenClassifier`, `PairClassifier`), so everything above the runtime
//! boundary runs in tests with synthetic encodings and logits.

mod chunking;
mod offsets;
mod scoring;

pub mod config;
pub mod encoding;
pub mod grouping;
pub mod labels;
pub mod loader;
pub mod ner;
pub mod onnx;
pub mod registry;
pub mod runtime;
pub mod session;
pub mod zero_shot;

pub use config::{InferenceSettings, ModelSource, ModelSpec, RegistryConfig};
pub use encoding::{EncodedText, HfEncoder, TextEncoder};
pub use grouping::group_entities;
pub use labels::{BioTag, LabelMap};
pub use loader::{ModelProvider, OnnxModelProvider};
pub use ner::{decode_entities, DecodeOptions, NerModel};
pub use onnx::{OnnxPairClassifier, OnnxTokenClassifier};
pub use registry::ModelRegistry;
pub use runtime::{PairClassifier, TokenClassifier};
pub use session::{OptimizationLevel, SessionConfig};
pub use zero_shot::{hypothesis_for, ZeroShotModel};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::RegistryConfig;
    pub use crate::grouping::group_entities;
    pub use crate::ner::NerModel;
    pub use crate::registry::ModelRegistry;
    pub use crate::zero_shot::ZeroShotModel;
    pub use tokenspan_core::prelude::*;
}
