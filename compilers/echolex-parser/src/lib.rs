pub mod lexer;
pub mod stream;

pub use stream::TokenStream;

use echolex_protocol::{Token, TokenKind, WordIndex};
use crate::lexer::lex_with_spans;

/// Primary entry point: Text -> Tokens with offsets and word indices.
pub fn tokenize(input: &str) -> TokenStream {
    let mut next_word = 0u32;
    let mut utf16_offset = 0usize;

    let tokens = lex_with_spans(input)
        .into_iter()
        .map(|(span, kind)| {
            let text = &input[span.start..span.end];

            let index = match kind {
                TokenKind::Word => {
                    let index = WordIndex(next_word);
                    next_word += 1;
                    Some(index)
                }
                TokenKind::Punctuation | TokenKind::Whitespace => None,
            };

            let offset = utf16_offset;
            utf16_offset += text.encode_utf16().count();

            Token {
                text: text.to_string(),
                kind,
                span,
                offset,
                index,
            }
        })
        .collect();

    TokenStream::new(tokens)
}
