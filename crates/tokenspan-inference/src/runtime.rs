//! Inference runtime seam
//!
//! The decoders talk to the compiled graph through these traits so their
//! logic can be driven by synthetic logits in tests. Production
//! implementations live in [`crate::onnx`].

use ndarray::Array2;
use tokenspan_core::Result;

use crate::encoding::EncodedText;

/// Produces per-token classification logits for one sequence
pub trait TokenClassifier: Send + Sync {
    /// Logits with shape `[sequence_len, label_count]`
    fn token_logits(&self, encoding: &EncodedText) -> Result<Array2<f32>>;
}

/// Produces sequence-pair classification logits for a batch of pairs
pub trait PairClassifier: Send + Sync {
    /// One class-logit row per input pair
    fn pair_logits(&self, encodings: &[EncodedText]) -> Result<Vec<Vec<f32>>>;
}
