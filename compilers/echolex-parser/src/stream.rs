use echolex_protocol::{Token, TokenKind, WordIndex};

/// The tokens of one submitted text, in order.
///
/// Immutable once built; a new text gets a new stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
    /// Positions in `tokens` of the Word tokens, in word-index order.
    word_positions: Vec<usize>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        let word_positions = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_word())
            .map(|(i, _)| i)
            .collect();

        Self {
            tokens,
            word_positions,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn words(&self) -> impl Iterator<Item = &Token> + '_ {
        self.word_positions.iter().map(move |&i| &self.tokens[i])
    }

    pub fn word(&self, index: WordIndex) -> Option<&Token> {
        self.word_positions
            .get(index.as_usize())
            .map(|&i| &self.tokens[i])
    }

    pub fn word_count(&self) -> usize {
        self.word_positions.len()
    }

    /// True when the text has nothing to speak.
    pub fn is_blank(&self) -> bool {
        self.tokens.iter().all(|t| t.kind == TokenKind::Whitespace)
    }

    /// Concatenation of every token, equal to the tokenized input.
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    /// Resolves a UTF-16 offset reported by a speech engine to the word it
    /// falls in. Offsets inside punctuation, whitespace or past the end
    /// resolve to nothing.
    pub fn word_at(&self, offset: usize) -> Option<WordIndex> {
        // Word offsets are strictly increasing, so find the last word that
        // starts at or before `offset`.
        let after = self
            .word_positions
            .partition_point(|&i| self.tokens[i].offset <= offset);
        let candidate = after.checked_sub(1)?;
        let token = &self.tokens[self.word_positions[candidate]];

        if token.contains_offset(offset) {
            token.index
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tokenize;
    use echolex_protocol::WordIndex;

    #[test]
    fn test_offset_resolution() {
        let stream = tokenize("Hello world!");
        assert_eq!(stream.word_at(0), Some(WordIndex(0)));
        assert_eq!(stream.word_at(4), Some(WordIndex(0)));
        assert_eq!(stream.word_at(6), Some(WordIndex(1)));
        assert_eq!(stream.word_at(10), Some(WordIndex(1)));
    }

    #[test]
    fn test_unresolvable_offsets() {
        let stream = tokenize("Hello, world!");
        // ','
        assert_eq!(stream.word_at(5), None);
        // ' '
        assert_eq!(stream.word_at(6), None);
        // '!'
        assert_eq!(stream.word_at(12), None);
        // past the end
        assert_eq!(stream.word_at(99), None);
    }

    #[test]
    fn test_leading_punctuation() {
        let stream = tokenize("\"Quiet,\" she said.");
        assert_eq!(stream.word_at(0), None);
        assert_eq!(stream.word_at(1), Some(WordIndex(0)));
        assert_eq!(stream.word_at(9), Some(WordIndex(1)));
        assert_eq!(stream.word(WordIndex(2)).map(|t| t.text.as_str()), Some("said"));
    }

    #[test]
    fn test_blank_detection() {
        assert!(tokenize("").is_blank());
        assert!(tokenize(" \t\n ").is_blank());
        assert!(!tokenize(" ? ").is_blank());
        assert!(!tokenize("hi").is_blank());
    }
}
