//! ONNX Runtime session configuration
//!
//! Execution settings are resolved once per process and applied to every
//! session build: graph optimization level and intra-op thread count. The
//! runtime's execution ordering is left at its sequential default.

use std::path::Path;

use ort::session::{builder::GraphOptimizationLevel, Session};
use serde::{Deserialize, Serialize};
use tokenspan_core::{Error, Result};

/// Graph optimization setting applied when a session is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    /// No graph rewrites
    Disable,
    /// Basic rewrites (constant folding, redundant node removal)
    Basic,
    /// Extended rewrites including node fusions
    Extended,
    /// All available rewrites
    #[default]
    All,
}

/// Session execution settings, resolved once per process
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Graph optimization level
    #[serde(default)]
    pub optimization_level: OptimizationLevel,

    /// Intra-op thread count; unset selects half the logical CPUs (min 1)
    #[serde(default)]
    pub intra_threads: Option<usize>,
}

impl SessionConfig {
    /// Effective intra-op thread count after applying the CPU default
    pub fn effective_threads(&self) -> usize {
        self.intra_threads.unwrap_or_else(default_intra_threads)
    }

    /// Build a session for the compiled graph at `path` with these settings
    pub fn build_session(&self, path: &Path) -> Result<Session> {
        let level = match self.optimization_level {
            OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
            OptimizationLevel::Basic => GraphOptimizationLevel::Level1,
            OptimizationLevel::Extended => GraphOptimizationLevel::Level2,
            OptimizationLevel::All => GraphOptimizationLevel::Level3,
        };
        Session::builder()
            .map_err(|e| Error::inference(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(level)
            .map_err(|e| Error::inference(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(self.effective_threads())
            .map_err(|e| Error::inference(format!("Failed to set intra-op threads: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| Error::inference(format!("Failed to load compiled graph: {}", e)))
    }
}

/// Half the logical CPUs, minimum 1
fn default_intra_threads() -> usize {
    let cpus = num_cpus::get();
    if cpus > 1 {
        cpus / 2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thread_count_is_at_least_one() {
        let config = SessionConfig::default();
        assert!(config.effective_threads() >= 1);
    }

    #[test]
    fn explicit_thread_count_wins() {
        let config = SessionConfig {
            intra_threads: Some(3),
            ..Default::default()
        };
        assert_eq!(config.effective_threads(), 3);
    }

    #[test]
    fn optimization_level_parses_lowercase_names() {
        let level: OptimizationLevel = serde_json::from_str("\"extended\"").unwrap();
        assert_eq!(level, OptimizationLevel::Extended);
        assert_eq!(OptimizationLevel::default(), OptimizationLevel::All);
    }
}
