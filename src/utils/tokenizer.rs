use crate::index::Encoding;

/// Maximum token length, in bytes, kept by the tokenizer.
/// Longer runs are likely base64 or other non-searchable content.
const MAX_TOKEN_LENGTH: usize = 128;

/// A whitespace-delimited token and its byte offset in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
}

/// Split `text` on whitespace as defined by `encoding`.
pub fn tokenize(text: &str, encoding: Encoding) -> Vec<Token<'_>> {
    let mut tokens = Vec::with_capacity(text.len() / 6);
    let mut token_start: Option<usize> = None;

    for (i, ch) in text.char_indices() {
        if encoding.is_space(ch) {
            if let Some(start) = token_start.take() {
                push_token(&mut tokens, text, start, i);
            }
        } else if token_start.is_none() {
            token_start = Some(i);
        }
    }

    // Handle last token
    if let Some(start) = token_start {
        push_token(&mut tokens, text, start, text.len());
    }

    tokens
}

fn push_token<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str, start: usize, end: usize) {
    if end - start <= MAX_TOKEN_LENGTH {
        tokens.push(Token {
            text: &text[start..end],
            start,
        });
    }
}

/// Case-fold text the same way for documents and query terms.
pub fn normalize(text: &str) -> String {
    if text.is_ascii() {
        text.to_ascii_lowercase()
    } else {
        text.to_lowercase()
    }
}
