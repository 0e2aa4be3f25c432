//! Character span resolution
//!
//! Prefers offsets carried by the tokenizer encoding. When an encoding has
//! none, spans are recovered by a case-insensitive substring search starting
//! from the last resolved position. The search is an approximation, not
//! ground truth: a piece that also occurs verbatim ahead of its true position
//! can be misplaced. Searching only forward keeps resolved spans monotonic.
//! All offsets are byte indices into the original text.

/// Resolves token pieces to byte spans in the original text
pub(crate) struct SpanResolver<'a> {
    text: &'a str,
    cursor: usize,
}

impl<'a> SpanResolver<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { text, cursor: 0 }
    }

    /// Byte position the next search would start from
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    /// Span for one token piece.
    ///
    /// A non-degenerate tokenizer offset wins; otherwise the piece is
    /// searched for from the current cursor. `None` means the piece could
    /// not be located (the caller keeps its previous bounds).
    pub(crate) fn resolve(
        &mut self,
        piece: &str,
        offset: Option<(usize, usize)>,
    ) -> Option<(usize, usize)> {
        if let Some((start, end)) = offset {
            if end > start {
                self.cursor = self.cursor.max(end);
                return Some((start, end));
            }
        }
        self.search(piece)
    }

    fn search(&mut self, piece: &str) -> Option<(usize, usize)> {
        let start = find_case_insensitive(self.text, piece, self.cursor)?;
        let end = start + piece.len();
        self.cursor = end;
        Some((start, end))
    }
}

/// Byte position of `needle` in `haystack` at or after `from`, comparing
/// ASCII characters case-insensitively and all other bytes exactly
fn find_case_insensitive(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let ndl = needle.as_bytes();
    if ndl.is_empty() || from > hay.len() {
        return None;
    }
    hay[from..]
        .windows(ndl.len())
        .position(|window| window.eq_ignore_ascii_case(ndl))
        .map(|pos| from + pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_offsets_win_over_search() {
        let mut resolver = SpanResolver::new("alpha beta");
        assert_eq!(resolver.resolve("beta", Some((6, 10))), Some((6, 10)));
    }

    #[test]
    fn degenerate_offsets_fall_back_to_search() {
        let mut resolver = SpanResolver::new("alpha beta");
        assert_eq!(resolver.resolve("beta", Some((0, 0))), Some((6, 10)));
    }

    #[test]
    fn search_advances_past_previous_matches() {
        let text = "apple pie and apple cake";
        let mut resolver = SpanResolver::new(text);
        assert_eq!(resolver.resolve("apple", None), Some((0, 5)));
        assert_eq!(resolver.resolve("apple", None), Some((14, 19)));
        assert_eq!(resolver.resolve("apple", None), None);
    }

    #[test]
    fn search_ignores_ascii_case() {
        let mut resolver = SpanResolver::new("Apple Inc. called.");
        assert_eq!(resolver.resolve("apple", None), Some((0, 5)));
        assert_eq!(resolver.resolve("inc", None), Some((6, 9)));
    }

    #[test]
    fn search_handles_multibyte_text_exactly() {
        let text = "met at caf\u{e9} today";
        let mut resolver = SpanResolver::new(text);
        let span = resolver.resolve("caf\u{e9}", None).unwrap();
        assert_eq!(&text[span.0..span.1], "caf\u{e9}");
    }

    #[test]
    fn empty_piece_does_not_resolve() {
        let mut resolver = SpanResolver::new("text");
        assert_eq!(resolver.resolve("", None), None);
    }
}
