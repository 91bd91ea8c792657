//! Regex-driven tokenizer for path expressions.
//!
//! The lexicon is a single anchored alternation, one capture group per token
//! kind. Token kinds never share a first character, so leftmost-first matching
//! picks the longest token.

use std::sync::OnceLock;

use regex::Regex;

use crate::parser::PathParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or `*`.
    Ident,
    /// Quoted literal, quotes included in the span.
    Literal,
    Open,
    Close,
    Inverse,
    Join,
    And,
    Or,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::Literal => "literal",
            TokenKind::Open => "`(`",
            TokenKind::Close => "`)`",
            TokenKind::Inverse => "`~`",
            TokenKind::Join => "`/`",
            TokenKind::And => "`&`",
            TokenKind::Or => "`|`",
        }
    }
}

/// Capture group `i + 1` of the lexicon matches `KINDS[i]`.
const KINDS: [TokenKind; 8] = [
    TokenKind::Ident,
    TokenKind::Literal,
    TokenKind::Open,
    TokenKind::Close,
    TokenKind::Inverse,
    TokenKind::Join,
    TokenKind::And,
    TokenKind::Or,
];

fn lexicon() -> &'static Regex {
    static LEXICON: OnceLock<Regex> = OnceLock::new();
    LEXICON.get_or_init(|| {
        Regex::new(
            r"^\s*(?:(\*|[A-Za-z_][A-Za-z0-9_]*)|('[^']*')|(\()|(\))|(~)|(/)|(&)|(\|))",
        )
        .expect("path lexicon is a valid regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start..self.end]
    }
}

/// Split `input` into tokens. Whitespace between tokens is ignored.
pub fn tokenize(input: &str) -> Result<Vec<Token>, PathParseError> {
    let re = lexicon();
    let mut tokens = Vec::new();
    let mut offset = 0;
    loop {
        let rest = &input[offset..];
        if rest.trim_start().is_empty() {
            return Ok(tokens);
        }
        let Some(caps) = re.captures(rest) else {
            let skipped = rest.len() - rest.trim_start().len();
            return Err(PathParseError::InvalidCharacter {
                offset: offset + skipped,
            });
        };
        let (index, m) = caps
            .iter()
            .skip(1)
            .enumerate()
            .find_map(|(i, m)| m.map(|m| (i, m)))
            .ok_or(PathParseError::InvalidCharacter { offset })?;
        tokens.push(Token {
            kind: KINDS[index],
            start: offset + m.start(),
            end: offset + m.end(),
        });
        offset += m.end();
    }
}
