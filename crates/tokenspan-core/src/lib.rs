//! Tokenspan Core
//!
//! Shared types and error handling for the tokenspan inference engine.
//!
//! This crate provides:
//! - Output types for decoded entities and zero-shot label scores
//! - The task and aggregation vocabulary shared across components
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    AggregationStrategy, Entity, GroupedEntity, HandleState, TaskKind, TaskStatus,
    ZeroShotOptions, ZeroShotResult,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{
        AggregationStrategy, Entity, TaskKind, ZeroShotOptions, ZeroShotResult,
    };
}
