//! ONNX Runtime backends
//!
//! `ort` sessions behind a mutex (running a session takes `&mut self`).
//! Inputs are stacked into `[batch, seq]` i64 tensors; `token_type_ids` is
//! only fed to graphs that declare that input. Output extraction prefers the
//! tensor named `logits` and falls back to the graph's first output.

use std::sync::Mutex;

use ndarray::{Array2, ArrayD, Axis, Ix2};
use ort::session::Session;
use ort::value::Tensor;
use tokenspan_core::{Error, Result};

use crate::encoding::EncodedText;
use crate::runtime::{PairClassifier, TokenClassifier};

/// Token classification graph
pub struct OnnxTokenClassifier {
    session: Mutex<Session>,
    wants_token_type_ids: bool,
}

impl OnnxTokenClassifier {
    pub fn new(session: Session) -> Self {
        let wants_token_type_ids = declares_token_type_ids(&session);
        Self {
            session: Mutex::new(session),
            wants_token_type_ids,
        }
    }
}

impl TokenClassifier for OnnxTokenClassifier {
    fn token_logits(&self, encoding: &EncodedText) -> Result<Array2<f32>> {
        let inputs = stack_inputs(std::slice::from_ref(encoding))?;
        let logits = run_graph(&self.session, self.wants_token_type_ids, inputs)?;
        if logits.ndim() != 3 || logits.shape()[0] != 1 {
            return Err(Error::inference(format!(
                "Expected token logits of shape [1, seq, labels], got {:?}",
                logits.shape()
            )));
        }
        logits
            .index_axis(Axis(0), 0)
            .to_owned()
            .into_dimensionality::<Ix2>()
            .map_err(|e| Error::inference(format!("Failed to view token logits as 2-D: {}", e)))
    }
}

/// Sequence-pair classification graph (NLI)
pub struct OnnxPairClassifier {
    session: Mutex<Session>,
    wants_token_type_ids: bool,
}

impl OnnxPairClassifier {
    pub fn new(session: Session) -> Self {
        let wants_token_type_ids = declares_token_type_ids(&session);
        Self {
            session: Mutex::new(session),
            wants_token_type_ids,
        }
    }
}

impl PairClassifier for OnnxPairClassifier {
    fn pair_logits(&self, encodings: &[EncodedText]) -> Result<Vec<Vec<f32>>> {
        if encodings.is_empty() {
            return Ok(Vec::new());
        }
        let inputs = stack_inputs(encodings)?;
        let logits = run_graph(&self.session, self.wants_token_type_ids, inputs)?;
        if logits.ndim() != 2 || logits.shape()[0] != encodings.len() {
            return Err(Error::inference(format!(
                "Expected pair logits of shape [{}, classes], got {:?}",
                encodings.len(),
                logits.shape()
            )));
        }
        Ok(logits
            .outer_iter()
            .map(|row| row.iter().copied().collect())
            .collect())
    }
}

fn declares_token_type_ids(session: &Session) -> bool {
    session
        .inputs
        .iter()
        .any(|input| input.name == "token_type_ids")
}

struct StackedInputs {
    ids: Array2<i64>,
    attention: Array2<i64>,
    type_ids: Array2<i64>,
}

/// Stack encodings into `[batch, max_len]` tensors, zero-padding short rows
fn stack_inputs(encodings: &[EncodedText]) -> Result<StackedInputs> {
    let max_len = encodings.iter().map(EncodedText::len).max().unwrap_or(0);
    if max_len == 0 {
        return Err(Error::tokenize("Cannot run inference on an empty encoding"));
    }
    let batch = encodings.len();
    let mut ids = Array2::<i64>::zeros((batch, max_len));
    let mut attention = Array2::<i64>::zeros((batch, max_len));
    let mut type_ids = Array2::<i64>::zeros((batch, max_len));
    for (row, encoding) in encodings.iter().enumerate() {
        for (col, &id) in encoding.ids.iter().enumerate() {
            ids[[row, col]] = id as i64;
        }
        for (col, &mask) in encoding.attention_mask.iter().enumerate() {
            attention[[row, col]] = mask as i64;
        }
        for (col, &segment) in encoding.type_ids.iter().enumerate() {
            type_ids[[row, col]] = segment as i64;
        }
    }
    Ok(StackedInputs {
        ids,
        attention,
        type_ids,
    })
}

/// Run the graph and return the logits tensor as an owned array
fn run_graph(
    session: &Mutex<Session>,
    wants_token_type_ids: bool,
    inputs: StackedInputs,
) -> Result<ArrayD<f32>> {
    let mut session = session
        .lock()
        .map_err(|_| Error::inference("Inference session lock poisoned"))?;

    let input_ids = Tensor::from_array(inputs.ids)
        .map_err(|e| Error::inference(format!("Failed to build input_ids tensor: {}", e)))?;
    let attention_mask = Tensor::from_array(inputs.attention)
        .map_err(|e| Error::inference(format!("Failed to build attention_mask tensor: {}", e)))?;

    let outputs = if wants_token_type_ids {
        let token_type_ids = Tensor::from_array(inputs.type_ids).map_err(|e| {
            Error::inference(format!("Failed to build token_type_ids tensor: {}", e))
        })?;
        session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids,
            ])
            .map_err(|e| Error::inference(format!("Graph execution failed: {}", e)))?
    } else {
        session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
            ])
            .map_err(|e| Error::inference(format!("Graph execution failed: {}", e)))?
    };

    // Prefer the named logits output, fall back to the first output
    let logits = if let Some(value) = outputs.get("logits") {
        value
            .try_extract_array::<f32>()
            .map_err(|e| Error::inference(format!("Failed to extract logits tensor: {}", e)))?
    } else {
        let first_key = outputs
            .keys()
            .next()
            .ok_or_else(|| Error::inference("Graph produced no outputs"))?;
        outputs[first_key]
            .try_extract_array::<f32>()
            .map_err(|e| Error::inference(format!("Failed to extract output tensor: {}", e)))?
    };
    Ok(logits.to_owned())
}
