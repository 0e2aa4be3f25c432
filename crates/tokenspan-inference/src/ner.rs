//! Entity decoding for token classification output
//!
//! Greedy arg-max BIO decoding over per-token logits, followed by an
//! aggregation pass. The decode core is a pure function over the original
//! text, one encoding, and a logits matrix, so the full algorithm runs in
//! tests without a model.
//!
//! Single-sequence inputs are the supported case: special tokens are skipped
//! per position without closing an open entity, so multi-segment encodings
//! are not handled.

use std::sync::Arc;

use ndarray::Array2;
use tokenspan_core::{AggregationStrategy, Entity, Error, Result, TaskKind};

use crate::chunking::paragraph_chunks;
use crate::encoding::{EncodedText, TextEncoder};
use crate::labels::{BioTag, LabelMap};
use crate::offsets::SpanResolver;
use crate::runtime::TokenClassifier;
use crate::scoring::{argmax, softmax};

/// Decode behavior switches
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Recover from an `I-` tag with no matching open entity by starting a
    /// new entity of that type; when off, such orphan tokens are dropped
    pub lenient: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { lenient: true }
    }
}

/// Confidence observations for one entity's member tokens
#[derive(Debug, Clone)]
struct ScoreStats {
    first: f32,
    max: f32,
    sum: f32,
    count: usize,
}

impl ScoreStats {
    fn new(prob: f32) -> Self {
        Self {
            first: prob,
            max: prob,
            sum: prob,
            count: 1,
        }
    }

    fn push(&mut self, prob: f32) {
        self.max = self.max.max(prob);
        self.sum += prob;
        self.count += 1;
    }

    fn absorb(&mut self, other: &ScoreStats) {
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    fn resolve(&self, strategy: AggregationStrategy) -> f32 {
        match strategy {
            AggregationStrategy::First => self.first,
            AggregationStrategy::Average => self.sum / self.count as f32,
            _ => self.max,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingEntity {
    entity_group: String,
    word: String,
    stats: ScoreStats,
    start: usize,
    end: usize,
}

/// Decode per-token logits into an ordered entity list.
///
/// Logits must have one row per token position. Padding and special
/// positions are skipped. Confidence is the softmax probability of each
/// token's arg-max label, combined per the aggregation strategy.
pub fn decode_entities(
    text: &str,
    encoding: &EncodedText,
    logits: &Array2<f32>,
    labels: &LabelMap,
    strategy: AggregationStrategy,
    options: DecodeOptions,
) -> Result<Vec<Entity>> {
    if logits.nrows() != encoding.len() {
        return Err(Error::decode(
            TaskKind::Ner,
            format!(
                "logits rows ({}) do not match token positions ({})",
                logits.nrows(),
                encoding.len()
            ),
        ));
    }

    let mut resolver = SpanResolver::new(text);
    let mut pending: Vec<PendingEntity> = Vec::new();
    let mut current: Option<PendingEntity> = None;

    for position in 0..encoding.len() {
        if encoding.is_padding(position) {
            continue;
        }
        if encoding.is_special(position) {
            continue;
        }

        let row = logits.row(position).to_vec();
        let label_id = argmax(&row).ok_or_else(|| {
            Error::decode(TaskKind::Ner, "logits row has no label dimension")
        })?;
        let prob = softmax(&row)[label_id];
        let tag = labels.tag(label_id)?;

        let piece = encoding.piece(position);
        let continuation = encoding.is_continuation(position);
        let offset = encoding.offset(position);

        match tag {
            BioTag::Outside => {
                if let Some(entity) = current.take() {
                    pending.push(entity);
                }
            }
            BioTag::Begin(entity_type) => {
                if let Some(entity) = current.take() {
                    pending.push(entity);
                }
                current = Some(open_entity(entity_type, piece, prob, offset, &mut resolver));
            }
            BioTag::Inside(entity_type) => match current.as_mut() {
                Some(entity) if entity.entity_group == entity_type => {
                    extend_entity(entity, piece, continuation, prob, offset, &mut resolver);
                }
                _ if options.lenient => {
                    if let Some(entity) = current.take() {
                        pending.push(entity);
                    }
                    current = Some(open_entity(entity_type, piece, prob, offset, &mut resolver));
                }
                // Strict mode drops the orphan token without touching the
                // open entity
                _ => {}
            },
        }
    }

    if let Some(entity) = current.take() {
        pending.push(entity);
    }

    let merged = match strategy {
        AggregationStrategy::None => pending,
        _ => merge_adjacent(pending),
    };

    Ok(merged
        .into_iter()
        .map(|entity| {
            Entity::new(
                entity.entity_group,
                entity.word,
                entity.stats.resolve(strategy),
                entity.start,
                entity.end,
            )
        })
        .collect())
}

fn open_entity(
    entity_type: String,
    piece: &str,
    prob: f32,
    offset: Option<(usize, usize)>,
    resolver: &mut SpanResolver<'_>,
) -> PendingEntity {
    let (start, end) = resolver
        .resolve(piece, offset)
        .unwrap_or((resolver.cursor(), resolver.cursor()));
    PendingEntity {
        entity_group: entity_type,
        word: piece.to_string(),
        stats: ScoreStats::new(prob),
        start,
        end,
    }
}

fn extend_entity(
    entity: &mut PendingEntity,
    piece: &str,
    continuation: bool,
    prob: f32,
    offset: Option<(usize, usize)>,
    resolver: &mut SpanResolver<'_>,
) {
    if !continuation {
        entity.word.push(' ');
    }
    entity.word.push_str(piece);
    if let Some((_, end)) = resolver.resolve(piece, offset) {
        entity.end = entity.end.max(end);
    }
    entity.stats.push(prob);
}

/// Merge adjacent same-type entities whose spans touch, overlap, or are
/// separated by at most one character
fn merge_adjacent(pending: Vec<PendingEntity>) -> Vec<PendingEntity> {
    let mut merged: Vec<PendingEntity> = Vec::new();
    for entity in pending {
        match merged.last_mut() {
            Some(last)
                if last.entity_group == entity.entity_group
                    && entity.start as i64 - last.end as i64 <= 1 =>
            {
                last.word.push(' ');
                last.word.push_str(&entity.word);
                last.end = last.end.max(entity.end);
                last.stats.absorb(&entity.stats);
            }
            _ => merged.push(entity),
        }
    }
    merged
}

/// A loaded NER handle: encoder, token classification graph, and label map
pub struct NerModel {
    encoder: Arc<dyn TextEncoder>,
    backend: Arc<dyn TokenClassifier>,
    labels: LabelMap,
    options: DecodeOptions,
    chunk_bytes: usize,
}

impl NerModel {
    pub fn new(
        encoder: Arc<dyn TextEncoder>,
        backend: Arc<dyn TokenClassifier>,
        labels: LabelMap,
        options: DecodeOptions,
        chunk_bytes: usize,
    ) -> Self {
        Self {
            encoder,
            backend,
            labels,
            options,
            chunk_bytes,
        }
    }

    /// Decode entities from `text` with the given aggregation strategy.
    ///
    /// Texts beyond the chunk limit are split on blank lines; spans are
    /// shifted back to positions in the original text.
    pub fn decode(&self, text: &str, strategy: AggregationStrategy) -> Result<Vec<Entity>> {
        let mut all = Vec::new();
        for (chunk_start, chunk) in paragraph_chunks(text, self.chunk_bytes) {
            let encoding = self.encoder.encode(chunk)?;
            let logits = self.backend.token_logits(&encoding)?;
            let mut entities = decode_entities(
                chunk,
                &encoding,
                &logits,
                &self.labels,
                strategy,
                self.options,
            )?;
            if chunk_start > 0 {
                for entity in &mut entities {
                    entity.start += chunk_start;
                    entity.end += chunk_start;
                }
            }
            all.extend(entities);
        }
        Ok(all)
    }
}
