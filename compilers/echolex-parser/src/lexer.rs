use nom::{
    branch::alt,
    bytes::complete::take_while1,
    combinator::map,
    IResult,
};
use echolex_protocol::{Span, TokenKind};

/// Letters and digits in any script, plus straight and curly apostrophes
/// so that contractions ("don't", "it’s") stay one word.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '\u{2019}'
}

pub fn is_punctuation_char(c: char) -> bool {
    !is_word_char(c) && !c.is_whitespace()
}

fn run(input: &str) -> IResult<&str, TokenKind> {
    alt((
        map(take_while1(is_word_char), |_| TokenKind::Word),
        map(take_while1(char::is_whitespace), |_| TokenKind::Whitespace),
        map(take_while1(is_punctuation_char), |_| TokenKind::Punctuation),
    ))(input)
}

/// Cuts `original_input` into maximal runs of one character class.
///
/// Every character belongs to exactly one class, so the spans tile the
/// input with no gaps.
pub fn lex_with_spans(original_input: &str) -> Vec<(Span, TokenKind)> {
    let mut input = original_input;
    let mut result = Vec::new();

    while !input.is_empty() {
        match run(input) {
            Ok((next_input, kind)) => {
                let start = original_input.len() - input.len();
                let end = original_input.len() - next_input.len();
                result.push((Span::new(start, end), kind));
                input = next_input;
            }
            Err(_) => {
                // Unreachable with the three total classes above, but never loop forever.
                let Some(c) = input.chars().next() else { break };
                let start = original_input.len() - input.len();
                let len = c.len_utf8();
                result.push((Span::new(start, start + len), TokenKind::Punctuation));
                input = &input[len..];
            }
        }
    }

    result
}
