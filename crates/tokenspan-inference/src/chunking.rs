//! Long-input chunking
//!
//! Texts beyond the byte limit are split on blank-line boundaries and
//! decoded chunk by chunk; each chunk's spans are then shifted by the
//! chunk's byte offset in the original text. A single paragraph larger than
//! the limit stays one chunk and is bounded by tokenizer truncation.

/// Split `text` into `(byte_offset, chunk)` pairs when it exceeds `max_bytes`
pub(crate) fn paragraph_chunks(text: &str, max_bytes: usize) -> Vec<(usize, &str)> {
    if text.len() <= max_bytes {
        return vec![(0, text)];
    }
    let mut chunks = Vec::new();
    let mut pos = 0;
    for chunk in text.split("\n\n") {
        if !chunk.is_empty() {
            chunks.push((pos, chunk));
        }
        pos += chunk.len() + 2;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_stays_whole() {
        assert_eq!(paragraph_chunks("hello world", 100), vec![(0, "hello world")]);
    }

    #[test]
    fn long_text_splits_on_blank_lines_with_exact_offsets() {
        let text = "first paragraph\n\nsecond one\n\nthird";
        let chunks = paragraph_chunks(text, 10);
        assert_eq!(chunks.len(), 3);
        for (offset, chunk) in chunks {
            assert_eq!(&text[offset..offset + chunk.len()], chunk);
        }
    }

    #[test]
    fn consecutive_separators_yield_no_empty_chunks() {
        let text = "alpha\n\n\n\nbeta";
        let chunks = paragraph_chunks(text, 4);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], (0, "alpha"));
        let (offset, chunk) = chunks[1];
        assert_eq!(chunk, "beta");
        assert_eq!(&text[offset..offset + chunk.len()], "beta");
    }

    #[test]
    fn oversized_single_paragraph_stays_one_chunk() {
        let text = "no blank lines here at all";
        assert_eq!(paragraph_chunks(text, 5), vec![(0, text)]);
    }
}
