//! Zero-shot label scoring through natural language inference
//!
//! Every candidate label becomes an entailment hypothesis paired with the
//! input text. The pair classifier's class logits reduce to per-label
//! probabilities in one of two modes: a softmax across the whole label set
//! (single-label), or an independent per-pair softmax with threshold
//! filtering (multi-label).

use std::cmp::Ordering;
use std::sync::Arc;

use tokenspan_core::{Error, Result, ZeroShotOptions, ZeroShotResult};

use crate::encoding::TextEncoder;
use crate::runtime::PairClassifier;
use crate::scoring::softmax;

/// Hypothesis text for one candidate label
pub fn hypothesis_for(label: &str) -> String {
    format!("This text is about {}.", label)
}

/// A loaded zero-shot handle: encoder and NLI pair classifier
pub struct ZeroShotModel {
    encoder: Arc<dyn TextEncoder>,
    backend: Arc<dyn PairClassifier>,
    entailment_index: Option<usize>,
    batch_size: usize,
}

impl ZeroShotModel {
    /// `entailment_index` pins the entailment slot in the classifier's
    /// output vector; `None` falls back to the last class, the common NLI
    /// head layout.
    pub fn new(
        encoder: Arc<dyn TextEncoder>,
        backend: Arc<dyn PairClassifier>,
        entailment_index: Option<usize>,
        batch_size: usize,
    ) -> Self {
        Self {
            encoder,
            backend,
            entailment_index,
            batch_size: batch_size.max(1),
        }
    }

    /// Score candidate labels against `text`.
    ///
    /// Returns scores sorted descending. Single-label mode lists every
    /// candidate; multi-label mode lists only candidates above the threshold
    /// while keeping the full score list. Empty candidates produce an empty
    /// result without running inference.
    pub fn score(
        &self,
        text: &str,
        candidate_labels: &[String],
        options: &ZeroShotOptions,
    ) -> Result<ZeroShotResult> {
        if candidate_labels.is_empty() {
            return Ok(ZeroShotResult::new(text.to_string(), Vec::new(), Vec::new()));
        }

        let mut class_logits: Vec<Vec<f32>> = Vec::with_capacity(candidate_labels.len());
        for batch in candidate_labels.chunks(self.batch_size) {
            let hypotheses: Vec<String> = batch.iter().map(|label| hypothesis_for(label)).collect();
            let encodings = self.encoder.encode_pairs(text, &hypotheses)?;
            let logits = self.backend.pair_logits(&encodings)?;
            if logits.len() != batch.len() {
                return Err(Error::inference(format!(
                    "Expected one logit row per hypothesis, got {} rows for {}",
                    logits.len(),
                    batch.len()
                )));
            }
            class_logits.extend(logits);
        }

        let probabilities = if options.multi_label {
            self.independent_probabilities(&class_logits)?
        } else {
            self.normalized_probabilities(&class_logits)?
        };

        let mut ranked: Vec<(&str, f32)> = candidate_labels
            .iter()
            .map(String::as_str)
            .zip(probabilities)
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let scores: Vec<f32> = ranked.iter().map(|(_, prob)| *prob).collect();
        let labels: Vec<String> = if options.multi_label {
            ranked
                .iter()
                .take_while(|(_, prob)| *prob > options.threshold)
                .map(|(label, _)| label.to_string())
                .collect()
        } else {
            ranked.iter().map(|(label, _)| label.to_string()).collect()
        };

        Ok(ZeroShotResult::new(text.to_string(), labels, scores))
    }

    /// Softmax over the raw entailment logits of the whole label set
    fn normalized_probabilities(&self, rows: &[Vec<f32>]) -> Result<Vec<f32>> {
        let mut entailment = Vec::with_capacity(rows.len());
        for row in rows {
            entailment.push(row[self.entailment_slot(row)?]);
        }
        Ok(softmax(&entailment))
    }

    /// Per-pair softmax over the class vector, keeping the entailment slot
    fn independent_probabilities(&self, rows: &[Vec<f32>]) -> Result<Vec<f32>> {
        let mut probabilities = Vec::with_capacity(rows.len());
        for row in rows {
            let slot = self.entailment_slot(row)?;
            probabilities.push(softmax(row)[slot]);
        }
        Ok(probabilities)
    }

    fn entailment_slot(&self, row: &[f32]) -> Result<usize> {
        if row.is_empty() {
            return Err(Error::inference("Classifier returned an empty class vector"));
        }
        let slot = self.entailment_index.unwrap_or(row.len() - 1);
        if slot >= row.len() {
            return Err(Error::inference(format!(
                "Entailment class index {} outside a {}-way output",
                slot,
                row.len()
            )));
        }
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodedText;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    /// Encodes a pair as two pseudo tokens so the scripted classifier can
    /// recover the hypothesis
    struct PairEncoder {
        batches: AtomicUsize,
    }

    impl PairEncoder {
        fn new() -> Self {
            Self {
                batches: AtomicUsize::new(0),
            }
        }
    }

    impl TextEncoder for PairEncoder {
        fn encode(&self, text: &str) -> Result<EncodedText> {
            Ok(EncodedText {
                tokens: vec![text.to_string()],
                ..Default::default()
            })
        }

        fn encode_pairs(&self, premise: &str, hypotheses: &[String]) -> Result<Vec<EncodedText>> {
            self.batches.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(hypotheses
                .iter()
                .map(|hypothesis| EncodedText {
                    tokens: vec![premise.to_string(), hypothesis.clone()],
                    ..Default::default()
                })
                .collect())
        }
    }

    /// Returns a scripted logit row per hypothesis text
    struct ScriptedPairs {
        rows: HashMap<String, Vec<f32>>,
    }

    impl ScriptedPairs {
        fn new(rows: &[(&str, Vec<f32>)]) -> Self {
            Self {
                rows: rows
                    .iter()
                    .map(|(label, row)| (hypothesis_for(label), row.clone()))
                    .collect(),
            }
        }
    }

    impl PairClassifier for ScriptedPairs {
        fn pair_logits(&self, encodings: &[EncodedText]) -> Result<Vec<Vec<f32>>> {
            encodings
                .iter()
                .map(|encoding| {
                    self.rows
                        .get(&encoding.tokens[1])
                        .cloned()
                        .ok_or_else(|| Error::inference("unexpected hypothesis"))
                })
                .collect()
        }
    }

    fn model(rows: &[(&str, Vec<f32>)], entailment_index: Option<usize>) -> ZeroShotModel {
        ZeroShotModel::new(
            Arc::new(PairEncoder::new()),
            Arc::new(ScriptedPairs::new(rows)),
            entailment_index,
            8,
        )
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn hypothesis_template_mentions_the_label() {
        assert_eq!(hypothesis_for("sports"), "This text is about sports.");
    }

    #[test]
    fn single_label_scores_sum_to_one_and_rank_descending() {
        let model = model(
            &[
                ("technology", vec![0.0, 0.0, 3.0]),
                ("sports", vec![0.0, 0.0, 0.5]),
                ("politics", vec![0.0, 0.0, -1.0]),
            ],
            None,
        );
        let result = model
            .score(
                "This new phone has an incredible camera.",
                &labels(&["technology", "sports", "politics"]),
                &ZeroShotOptions::default(),
            )
            .unwrap();

        assert_eq!(result.sequence, "This new phone has an incredible camera.");
        assert_eq!(result.labels[0], "technology");
        assert_eq!(result.labels.len(), 3);
        assert_eq!(result.scores.len(), 3);
        let sum: f32 = result.scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        for pair in result.scores.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn multi_label_keeps_only_labels_above_the_threshold() {
        let model = model(
            &[
                ("urgent", vec![-2.0, 0.0, 2.0]),
                ("spam", vec![2.0, 0.0, -2.0]),
            ],
            None,
        );
        let result = model
            .score(
                "Please respond today.",
                &labels(&["urgent", "spam"]),
                &ZeroShotOptions::multi_label(0.5),
            )
            .unwrap();

        assert_eq!(result.labels, vec!["urgent".to_string()]);
        assert_eq!(result.scores.len(), 2);
        assert!(result.scores[0] > 0.5);
        assert!(result.scores[1] < 0.5);
    }

    #[test]
    fn multi_label_with_nothing_above_threshold_returns_empty_subset() {
        let model = model(
            &[
                ("urgent", vec![2.0, 0.0, -2.0]),
                ("spam", vec![2.0, 0.0, -2.0]),
            ],
            None,
        );
        let result = model
            .score(
                "Nothing remarkable.",
                &labels(&["urgent", "spam"]),
                &ZeroShotOptions::multi_label(0.5),
            )
            .unwrap();

        assert!(result.labels.is_empty());
        assert_eq!(result.scores.len(), 2);
    }

    #[test]
    fn empty_candidates_produce_an_empty_result() {
        let model = model(&[], None);
        let result = model
            .score("anything", &[], &ZeroShotOptions::default())
            .unwrap();
        assert!(result.labels.is_empty());
        assert!(result.scores.is_empty());
        assert_eq!(result.sequence, "anything");
    }

    #[test]
    fn binary_head_uses_the_last_class_by_default() {
        let model = model(
            &[("yes", vec![0.0, 3.0]), ("no", vec![3.0, 0.0])],
            None,
        );
        let result = model
            .score("check", &labels(&["yes", "no"]), &ZeroShotOptions::default())
            .unwrap();
        assert_eq!(result.labels[0], "yes");
    }

    #[test]
    fn explicit_entailment_index_overrides_the_convention() {
        let model = model(
            &[
                ("first", vec![3.0, 0.0, 0.0]),
                ("second", vec![0.0, 0.0, 3.0]),
            ],
            Some(0),
        );
        let result = model
            .score(
                "check",
                &labels(&["first", "second"]),
                &ZeroShotOptions::default(),
            )
            .unwrap();
        assert_eq!(result.labels[0], "first");
    }

    #[test]
    fn hypotheses_run_in_batches() {
        let encoder = Arc::new(PairEncoder::new());
        let model = ZeroShotModel::new(
            encoder.clone(),
            Arc::new(ScriptedPairs::new(&[
                ("a", vec![0.0, 0.0, 1.0]),
                ("b", vec![0.0, 0.0, 1.0]),
                ("c", vec![0.0, 0.0, 1.0]),
                ("d", vec![0.0, 0.0, 1.0]),
                ("e", vec![0.0, 0.0, 1.0]),
            ])),
            None,
            2,
        );
        model
            .score(
                "text",
                &labels(&["a", "b", "c", "d", "e"]),
                &ZeroShotOptions::default(),
            )
            .unwrap();
        assert_eq!(encoder.batches.load(AtomicOrdering::SeqCst), 3);
    }
}
