//! Text encoding adapter
//!
//! Wraps the tokenizer behind a small trait so the decoders can be driven by
//! synthetic encodings in tests. The production encoder uses HuggingFace
//! `tokenizers` with truncation to the configured maximum length and
//! batch-longest padding for premise/hypothesis batches.

use std::path::Path;

use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tokenspan_core::{Error, Result};

/// Marker prefix for WordPiece continuation tokens
const WORDPIECE_CONTINUATION: &str = "##";
/// Word-start marker used by SentencePiece tokenizers
const SENTENCEPIECE_WORD_START: char = '\u{2581}';
/// Word-start marker used by byte-level BPE tokenizers
const BYTE_BPE_WORD_START: char = '\u{0120}';

/// One tokenized sequence with everything the decoders need
#[derive(Debug, Clone, Default)]
pub struct EncodedText {
    /// Token ids
    pub ids: Vec<u32>,

    /// Attention mask, 1 for real tokens and 0 for padding
    pub attention_mask: Vec<u32>,

    /// Segment ids (all zero for single sequences)
    pub type_ids: Vec<u32>,

    /// Surface strings as produced by the tokenizer (may carry subword markers)
    pub tokens: Vec<String>,

    /// 1 for special tokens (sequence sentinels, padding)
    pub special_mask: Vec<u32>,

    /// Word index per token, when the tokenizer tracks word boundaries
    pub word_ids: Vec<Option<u32>>,

    /// Character offsets into the original text, when the tokenizer provides
    /// them; `None` switches the decoder to its substring-search fallback
    pub offsets: Option<Vec<(usize, usize)>>,
}

impl EncodedText {
    pub(crate) fn from_encoding(encoding: &tokenizers::Encoding) -> Self {
        Self {
            ids: encoding.get_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
            type_ids: encoding.get_type_ids().to_vec(),
            tokens: encoding.get_tokens().to_vec(),
            special_mask: encoding.get_special_tokens_mask().to_vec(),
            word_ids: encoding.get_word_ids().to_vec(),
            offsets: Some(encoding.get_offsets().to_vec()),
        }
    }

    /// Number of token positions
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether position `i` is masked out as padding
    pub fn is_padding(&self, i: usize) -> bool {
        self.attention_mask.get(i).copied().unwrap_or(0) == 0
    }

    /// Whether position `i` is a special token
    pub fn is_special(&self, i: usize) -> bool {
        self.special_mask.get(i).copied().unwrap_or(0) == 1
    }

    /// Whether token `i` continues the previous word.
    ///
    /// Uses tokenizer word ids when present; otherwise falls back to the
    /// WordPiece continuation marker on the surface string.
    pub fn is_continuation(&self, i: usize) -> bool {
        if i == 0 {
            return false;
        }
        if let Some(current) = self.word_ids.get(i).copied().flatten() {
            if let Some(previous) = self.word_ids.get(i - 1).copied().flatten() {
                return current == previous;
            }
            return false;
        }
        self.tokens
            .get(i)
            .map(|t| t.starts_with(WORDPIECE_CONTINUATION))
            .unwrap_or(false)
    }

    /// Surface form of token `i` with subword markers stripped
    pub fn piece(&self, i: usize) -> &str {
        let token = match self.tokens.get(i) {
            Some(t) => t.as_str(),
            None => return "",
        };
        if let Some(rest) = token.strip_prefix(WORDPIECE_CONTINUATION) {
            rest
        } else if let Some(rest) = token.strip_prefix(SENTENCEPIECE_WORD_START) {
            rest
        } else if let Some(rest) = token.strip_prefix(BYTE_BPE_WORD_START) {
            rest
        } else {
            token
        }
    }

    /// Character offsets for token `i`, when the tokenizer provided them
    pub fn offset(&self, i: usize) -> Option<(usize, usize)> {
        self.offsets.as_ref().and_then(|offsets| offsets.get(i).copied())
    }
}

/// Converts raw text into model-ready token sequences
pub trait TextEncoder: Send + Sync {
    /// Encode a single text as one sequence
    fn encode(&self, text: &str) -> Result<EncodedText>;

    /// Encode one premise against several hypotheses as a padded batch
    fn encode_pairs(&self, premise: &str, hypotheses: &[String]) -> Result<Vec<EncodedText>>;
}

/// Production encoder backed by a HuggingFace `tokenizer.json`
pub struct HfEncoder {
    tokenizer: Tokenizer,
}

impl HfEncoder {
    /// Load a tokenizer file and apply truncation to `max_length`.
    ///
    /// Batch-longest padding is enabled unless the tokenizer file already
    /// carries its own padding configuration.
    pub fn from_file(path: &Path, max_length: usize) -> Result<Self> {
        let mut tokenizer = Tokenizer::from_file(path)
            .map_err(|e| Error::tokenize(format!("Failed to load tokenizer: {}", e)))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| Error::tokenize(format!("Failed to configure truncation: {}", e)))?;
        if tokenizer.get_padding().is_none() {
            tokenizer.with_padding(Some(PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                ..Default::default()
            }));
        }
        Ok(Self { tokenizer })
    }
}

impl TextEncoder for HfEncoder {
    fn encode(&self, text: &str) -> Result<EncodedText> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::tokenize(format!("Failed to encode text: {}", e)))?;
        Ok(EncodedText::from_encoding(&encoding))
    }

    fn encode_pairs(&self, premise: &str, hypotheses: &[String]) -> Result<Vec<EncodedText>> {
        let pairs: Vec<(&str, &str)> = hypotheses
            .iter()
            .map(|hypothesis| (premise, hypothesis.as_str()))
            .collect();
        let encodings = self
            .tokenizer
            .encode_batch(pairs, true)
            .map_err(|e| Error::tokenize(format!("Failed to encode pairs: {}", e)))?;
        Ok(encodings.iter().map(EncodedText::from_encoding).collect())
    }
}
