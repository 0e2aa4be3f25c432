//! Model loading
//!
//! Resolves a model source to its on-disk files, then assembles the
//! tokenizer, session, and label metadata into a ready task handle. Loading
//! sits behind the `ModelProvider` trait so the registry lifecycle is
//! testable with fake providers.

use std::path::PathBuf;
use std::sync::Arc;

use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenspan_core::{Error, Result, TaskKind};
use tracing::debug;

use crate::config::{InferenceSettings, ModelSource, ModelSpec};
use crate::encoding::HfEncoder;
use crate::labels::LabelMap;
use crate::ner::{DecodeOptions, NerModel};
use crate::onnx::{OnnxPairClassifier, OnnxTokenClassifier};
use crate::session::SessionConfig;
use crate::zero_shot::ZeroShotModel;

/// Builds ready task handles from model specs
#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    /// Load the NER handle
    async fn load_ner(
        &self,
        spec: &ModelSpec,
        session: &SessionConfig,
        inference: &InferenceSettings,
    ) -> Result<NerModel>;

    /// Load the zero-shot handle
    async fn load_zero_shot(
        &self,
        spec: &ModelSpec,
        session: &SessionConfig,
        inference: &InferenceSettings,
    ) -> Result<ZeroShotModel>;
}

/// Production provider backed by ONNX Runtime sessions, HuggingFace
/// tokenizer files, and the Hub download cache
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxModelProvider;

#[async_trait::async_trait]
impl ModelProvider for OnnxModelProvider {
    async fn load_ner(
        &self,
        spec: &ModelSpec,
        session: &SessionConfig,
        inference: &InferenceSettings,
    ) -> Result<NerModel> {
        let spec = spec.clone();
        let session = session.clone();
        let inference = inference.clone();
        tokio::task::spawn_blocking(move || build_ner(&spec, &session, &inference))
            .await
            .map_err(|e| Error::internal(format!("Load task aborted: {}", e)))?
    }

    async fn load_zero_shot(
        &self,
        spec: &ModelSpec,
        session: &SessionConfig,
        inference: &InferenceSettings,
    ) -> Result<ZeroShotModel> {
        let spec = spec.clone();
        let session = session.clone();
        let inference = inference.clone();
        tokio::task::spawn_blocking(move || build_zero_shot(&spec, &session, &inference))
            .await
            .map_err(|e| Error::internal(format!("Load task aborted: {}", e)))?
    }
}

fn build_ner(
    spec: &ModelSpec,
    session: &SessionConfig,
    inference: &InferenceSettings,
) -> Result<NerModel> {
    let source = spec.source.describe();
    assemble_ner(spec, session, inference)
        .map_err(|e| Error::load(TaskKind::Ner, &source, e.to_string()))
}

fn build_zero_shot(
    spec: &ModelSpec,
    session: &SessionConfig,
    inference: &InferenceSettings,
) -> Result<ZeroShotModel> {
    let source = spec.source.describe();
    assemble_zero_shot(spec, session, inference)
        .map_err(|e| Error::load(TaskKind::ZeroShot, &source, e.to_string()))
}

fn assemble_ner(
    spec: &ModelSpec,
    session: &SessionConfig,
    inference: &InferenceSettings,
) -> Result<NerModel> {
    let files = resolve_files(&spec.source)?;
    let encoder = HfEncoder::from_file(&files.tokenizer, spec.max_length)?;
    let graph = session.build_session(&files.graph)?;
    let labels = match read_model_config(&files)? {
        Some(value) => LabelMap::from_config_value(&value),
        None => LabelMap::default(),
    };
    let options = DecodeOptions {
        lenient: inference.lenient_decoding,
    };
    Ok(NerModel::new(
        Arc::new(encoder),
        Arc::new(OnnxTokenClassifier::new(graph)),
        labels,
        options,
        inference.chunk_bytes,
    ))
}

fn assemble_zero_shot(
    spec: &ModelSpec,
    session: &SessionConfig,
    inference: &InferenceSettings,
) -> Result<ZeroShotModel> {
    let files = resolve_files(&spec.source)?;
    let encoder = HfEncoder::from_file(&files.tokenizer, spec.max_length)?;
    let graph = session.build_session(&files.graph)?;
    let entailment = entailment_index(read_model_config(&files)?.as_ref());
    Ok(ZeroShotModel::new(
        Arc::new(encoder),
        Arc::new(OnnxPairClassifier::new(graph)),
        entailment,
        inference.batch_size,
    ))
}

/// On-disk files backing one model
#[derive(Debug)]
struct ModelFiles {
    graph: PathBuf,
    tokenizer: PathBuf,
    config: Option<PathBuf>,
}

/// Locate the compiled graph, tokenizer file, and optional model config.
///
/// Local sources are validated before any session work so a missing file
/// surfaces as a clear cause; Hub sources go through the client's local
/// cache, downloading on first use.
fn resolve_files(source: &ModelSource) -> Result<ModelFiles> {
    match source {
        ModelSource::Local { path } => {
            let graph = path.join("model.onnx");
            if !graph.is_file() {
                return Err(Error::config(format!(
                    "Missing compiled graph: {}",
                    graph.display()
                )));
            }
            let tokenizer = path.join("tokenizer.json");
            if !tokenizer.is_file() {
                return Err(Error::config(format!(
                    "Missing tokenizer file: {}",
                    tokenizer.display()
                )));
            }
            let config = path.join("config.json");
            let config = config.is_file().then_some(config);
            Ok(ModelFiles {
                graph,
                tokenizer,
                config,
            })
        }
        ModelSource::HuggingFace { repo, revision } => {
            let api = Api::new()
                .map_err(|e| Error::config(format!("Failed to initialize Hub client: {}", e)))?;
            let remote = api.repo(Repo::with_revision(
                repo.clone(),
                RepoType::Model,
                revision.clone(),
            ));
            let graph = remote
                .get("model.onnx")
                .or_else(|_| remote.get("onnx/model.onnx"))
                .map_err(|e| {
                    Error::config(format!("Failed to download compiled graph: {}", e))
                })?;
            let tokenizer = remote
                .get("tokenizer.json")
                .map_err(|e| Error::config(format!("Failed to download tokenizer: {}", e)))?;
            let config = remote.get("config.json").ok();
            debug!("Fetched {} from the Hub", repo);
            Ok(ModelFiles {
                graph,
                tokenizer,
                config,
            })
        }
    }
}

fn read_model_config(files: &ModelFiles) -> Result<Option<serde_json::Value>> {
    match &files.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(Some(serde_json::from_str(&raw)?))
        }
        None => Ok(None),
    }
}

/// Index of the class named "entailment" in the model's label map; `None`
/// defers to the last-class convention
fn entailment_index(config: Option<&serde_json::Value>) -> Option<usize> {
    let labels = config?.get("id2label")?.as_object()?;
    for (id, label) in labels {
        let is_entailment = label
            .as_str()
            .map_or(false, |name| name.eq_ignore_ascii_case("entailment"));
        if is_entailment {
            return id.parse().ok();
        }
    }
    None
}
