//! Model registry
//!
//! Lazily loads and caches one handle per (task, source) pair for the
//! process lifetime. A failed load is cached as not-ready with its recorded
//! cause and is not retried until an explicit `refresh`. Decode work runs on
//! the blocking thread pool, off the async request path.

use std::collections::HashMap;
use std::sync::Arc;

use tokenspan_core::{
    AggregationStrategy, Entity, Error, HandleState, Result, TaskKind, TaskStatus,
    ZeroShotOptions, ZeroShotResult,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::RegistryConfig;
use crate::loader::{ModelProvider, OnnxModelProvider};
use crate::ner::NerModel;
use crate::zero_shot::ZeroShotModel;

/// Cached load outcome for one (task, source) pair
enum LoadState<T> {
    Ready(Arc<T>),
    Failed(String),
}

impl<T> Clone for LoadState<T> {
    fn clone(&self) -> Self {
        match self {
            LoadState::Ready(handle) => LoadState::Ready(Arc::clone(handle)),
            LoadState::Failed(cause) => LoadState::Failed(cause.clone()),
        }
    }
}

/// Process-wide model cache and decode dispatcher.
///
/// Construct one registry at startup and share it by reference; handles load
/// on first use and live until `refresh`.
pub struct ModelRegistry {
    config: RegistryConfig,
    provider: Arc<dyn ModelProvider>,
    ner: RwLock<HashMap<String, LoadState<NerModel>>>,
    zero_shot: RwLock<HashMap<String, LoadState<ZeroShotModel>>>,
}

impl ModelRegistry {
    /// Registry backed by the production ONNX provider
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_provider(config, Arc::new(OnnxModelProvider))
    }

    /// Registry with a custom provider
    pub fn with_provider(config: RegistryConfig, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            config,
            provider,
            ner: RwLock::new(HashMap::new()),
            zero_shot: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Decode entities from `text`, loading the NER model on first use
    pub async fn decode_entities(
        &self,
        text: &str,
        strategy: AggregationStrategy,
    ) -> Result<Vec<Entity>> {
        let model = self.ner_handle().await?;
        let text = text.to_string();
        tokio::task::spawn_blocking(move || model.decode(&text, strategy))
            .await
            .map_err(|e| Error::internal(format!("Decode task aborted: {}", e)))?
    }

    /// Score candidate labels against `text`, loading the zero-shot model on
    /// first use
    pub async fn score_labels(
        &self,
        text: &str,
        candidate_labels: &[String],
        options: ZeroShotOptions,
    ) -> Result<ZeroShotResult> {
        let model = self.zero_shot_handle().await?;
        let text = text.to_string();
        let labels = candidate_labels.to_vec();
        tokio::task::spawn_blocking(move || model.score(&text, &labels, &options))
            .await
            .map_err(|e| Error::internal(format!("Scoring task aborted: {}", e)))?
    }

    /// Load both task handles up front instead of on first request.
    ///
    /// The loads run concurrently and both settle before this returns, so a
    /// failure in one still leaves the other cached; the first error is
    /// surfaced and `status` carries the causes.
    pub async fn warm_up(&self) -> Result<()> {
        let (ner, zero_shot) =
            futures::future::join(self.ner_handle(), self.zero_shot_handle()).await;
        ner?;
        zero_shot?;
        Ok(())
    }

    /// Drop every cached handle so the next request reloads from disk
    pub async fn refresh(&self) {
        self.ner.write().await.clear();
        self.zero_shot.write().await.clear();
        info!("Model registry refreshed; handles reload on next use");
    }

    /// Readiness of each configured task
    pub async fn status(&self) -> Vec<TaskStatus> {
        let ner_source = self.config.ner.source.describe();
        let zero_shot_source = self.config.zero_shot.source.describe();
        let ner_state = state_of(&*self.ner.read().await, &ner_source);
        let zero_shot_state = state_of(&*self.zero_shot.read().await, &zero_shot_source);
        vec![
            TaskStatus {
                task: TaskKind::Ner,
                source: ner_source,
                state: ner_state,
            },
            TaskStatus {
                task: TaskKind::ZeroShot,
                source: zero_shot_source,
                state: zero_shot_state,
            },
        ]
    }

    async fn ner_handle(&self) -> Result<Arc<NerModel>> {
        let source = self.config.ner.source.describe();

        // Fast path: a previous attempt already resolved this source
        {
            let cache = self.ner.read().await;
            if let Some(state) = cache.get(&source) {
                return resolve_state(TaskKind::Ner, &source, state);
            }
        }

        let outcome = self
            .provider
            .load_ner(&self.config.ner, &self.config.session, &self.config.inference)
            .await;
        let state = record_outcome(TaskKind::Ner, &source, outcome.map(Arc::new));

        // Concurrent callers may race to load; the first write wins and the
        // cache never holds a partial handle
        let mut cache = self.ner.write().await;
        let state = cache.entry(source.clone()).or_insert(state);
        resolve_state(TaskKind::Ner, &source, state)
    }

    async fn zero_shot_handle(&self) -> Result<Arc<ZeroShotModel>> {
        let source = self.config.zero_shot.source.describe();

        {
            let cache = self.zero_shot.read().await;
            if let Some(state) = cache.get(&source) {
                return resolve_state(TaskKind::ZeroShot, &source, state);
            }
        }

        let outcome = self
            .provider
            .load_zero_shot(
                &self.config.zero_shot,
                &self.config.session,
                &self.config.inference,
            )
            .await;
        let state = record_outcome(TaskKind::ZeroShot, &source, outcome.map(Arc::new));

        let mut cache = self.zero_shot.write().await;
        let state = cache.entry(source.clone()).or_insert(state);
        resolve_state(TaskKind::ZeroShot, &source, state)
    }
}

fn record_outcome<T>(task: TaskKind, source: &str, outcome: Result<Arc<T>>) -> LoadState<T> {
    match outcome {
        Ok(handle) => {
            info!("✓ Loaded {} model from {}", task, source);
            LoadState::Ready(handle)
        }
        Err(e) => {
            let cause = load_cause(&e);
            warn!("✗ Failed to load {} model from {}: {}", task, source, cause);
            LoadState::Failed(cause)
        }
    }
}

fn resolve_state<T>(task: TaskKind, source: &str, state: &LoadState<T>) -> Result<Arc<T>> {
    match state {
        LoadState::Ready(handle) => Ok(Arc::clone(handle)),
        LoadState::Failed(cause) => Err(Error::not_ready(task, source, cause.clone())),
    }
}

fn state_of<T>(cache: &HashMap<String, LoadState<T>>, source: &str) -> HandleState {
    match cache.get(source) {
        None => HandleState::NotLoaded,
        Some(LoadState::Ready(_)) => HandleState::Ready,
        Some(LoadState::Failed(cause)) => HandleState::Failed(cause.clone()),
    }
}

fn load_cause(error: &Error) -> String {
    match error {
        Error::Load { cause, .. } => cause.clone(),
        other => other.to_string(),
    }
}
