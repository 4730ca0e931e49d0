use crate::ids::WordIndex;
use alloc::string::String;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Byte range of a token inside the text it was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub enum TokenKind {
    /// Letters, digits and apostrophes
    Word,
    /// Any run of characters that are neither word characters nor whitespace
    Punctuation,
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    pub span: Span,
    /// Start offset in UTF-16 code units, the unit speech engines report `charIndex` in.
    pub offset: usize,
    /// Only set for `TokenKind::Word`.
    pub index: Option<WordIndex>,
}

impl Token {
    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    /// Length in UTF-16 code units.
    pub fn utf16_len(&self) -> usize {
        self.text.encode_utf16().count()
    }

    /// Half-open UTF-16 range `[offset, offset + utf16_len)`.
    pub fn contains_offset(&self, offset: usize) -> bool {
        offset >= self.offset && offset < self.offset + self.utf16_len()
    }
}
