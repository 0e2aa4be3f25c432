//! Entity decode benchmarks
//!
//! Measures the pure decode path over synthetic logits: sequence length
//! scaling for both span resolution paths (tokenizer offsets present vs.
//! substring search fallback), and the relative cost of the aggregation
//! strategies.
//!
//! Run with: cargo bench -p tokenspan-inference

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;

use tokenspan_core::AggregationStrategy;
use tokenspan_inference::{decode_entities, DecodeOptions, EncodedText, LabelMap};

const O: usize = 0;
const B_PER: usize = 3;
const I_PER: usize = 4;

/// Synthetic word sequence: every seventh word opens a two-word entity
fn build_case(words: usize, with_offsets: bool) -> (String, EncodedText, Array2<f32>) {
    let tokens: Vec<String> = (0..words).map(|i| format!("word{}", i)).collect();
    let text = tokens.join(" ");

    let mut offsets = Vec::with_capacity(words);
    let mut pos = 0;
    for token in &tokens {
        offsets.push((pos, pos + token.len()));
        pos += token.len() + 1;
    }

    let mut logits = Array2::<f32>::zeros((words, 9));
    for row in 0..words {
        let label = match row % 7 {
            3 => B_PER,
            4 => I_PER,
            _ => O,
        };
        logits[[row, label]] = 8.0;
    }

    let encoding = EncodedText {
        ids: vec![0; words],
        attention_mask: vec![1; words],
        type_ids: vec![0; words],
        tokens,
        special_mask: vec![0; words],
        word_ids: Vec::new(),
        offsets: with_offsets.then_some(offsets),
    };
    (text, encoding, logits)
}

fn benchmark_decode_lengths(c: &mut Criterion) {
    let map = LabelMap::default();
    let mut group = c.benchmark_group("Entity_Decode");
    group.sample_size(100);

    for &words in &[16usize, 64, 256, 512] {
        let (text, encoding, logits) = build_case(words, true);
        group.bench_with_input(BenchmarkId::new("offsets", words), &words, |b, _| {
            b.iter(|| {
                decode_entities(
                    black_box(&text),
                    &encoding,
                    &logits,
                    &map,
                    AggregationStrategy::Simple,
                    DecodeOptions::default(),
                )
                .unwrap()
            });
        });

        let (text, encoding, logits) = build_case(words, false);
        group.bench_with_input(BenchmarkId::new("search", words), &words, |b, _| {
            b.iter(|| {
                decode_entities(
                    black_box(&text),
                    &encoding,
                    &logits,
                    &map,
                    AggregationStrategy::Simple,
                    DecodeOptions::default(),
                )
                .unwrap()
            });
        });
    }

    group.finish();
}

fn benchmark_aggregation_strategies(c: &mut Criterion) {
    let map = LabelMap::default();
    let (text, encoding, logits) = build_case(256, true);

    let strategies = [
        ("none", AggregationStrategy::None),
        ("simple", AggregationStrategy::Simple),
        ("average", AggregationStrategy::Average),
    ];

    let mut group = c.benchmark_group("Aggregation_Strategies");
    group.sample_size(100);

    for (name, strategy) in strategies {
        group.bench_with_input(BenchmarkId::new("strategy", name), &strategy, |b, strategy| {
            b.iter(|| {
                decode_entities(
                    black_box(&text),
                    &encoding,
                    &logits,
                    &map,
                    *strategy,
                    DecodeOptions::default(),
                )
                .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_decode_lengths, benchmark_aggregation_strategies);
criterion_main!(benches);
