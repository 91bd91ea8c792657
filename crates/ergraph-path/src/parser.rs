//! Pratt parser for path expressions.
//!
//! Grammar (loosest to tightest):
//!
//! ```text
//! path  := path ('|' | '&') path      precedence 70, left associative
//!        | path '/' path              precedence 80, right associative
//!        | '~' prefix                 binds to the next atom
//!        | '(' path ')' | IDENT | '*' | LITERAL | '/' IDENT
//! ```
//!
//! `&` and `|` share a precedence level, so `a|b&c` reads as `(a|b)&c`.
//! A leading `/name` continues an implicit chain and parses as `name`.
//!
//! Trees deeper than [`MAX_PATH_DEPTH`] are rejected, so evaluating or
//! printing a parsed path never recurses without bound.

use thiserror::Error;

use crate::ast::Path;
use crate::lexer::{tokenize, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    #[error("unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        offset: usize,
        found: String,
        expected: &'static str,
    },
    #[error("unexpected end of path, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("invalid character at offset {offset}")]
    InvalidCharacter { offset: usize },
}

/// Deepest syntax tree [`parse_path`] accepts.
pub const MAX_PATH_DEPTH: usize = 256;

const TOO_DEEP: &str = "a less deeply nested path";

/// Parse a complete path expression.
pub fn parse_path(input: &str) -> Result<Path, PathParseError> {
    let tokens = tokenize(input)?;
    let mut stream = TokenStream {
        input,
        tokens,
        pos: 0,
        nesting: 0,
    };
    let (path, _) = parse_pratt(&mut stream, 0)?;
    match stream.peek() {
        None => Ok(path),
        Some(token) => Err(stream.unexpected(token, "end of path")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

fn infix_info(kind: TokenKind) -> Option<(u8, Assoc)> {
    match kind {
        TokenKind::Or | TokenKind::And => Some((70, Assoc::Left)),
        TokenKind::Join => Some((80, Assoc::Right)),
        _ => None,
    }
}

struct TokenStream<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    /// Active `parse_pratt` / `~` frames.
    nesting: usize,
}

impl<'a> TokenStream<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn next_or_end(&mut self, expected: &'static str) -> Result<Token, PathParseError> {
        self.advance()
            .ok_or(PathParseError::UnexpectedEnd { expected })
    }

    /// Enter one level of recursion, failing at the next token once the
    /// parser is [`MAX_PATH_DEPTH`] frames deep.
    fn descend(&mut self) -> Result<(), PathParseError> {
        if self.nesting >= MAX_PATH_DEPTH {
            return Err(self.too_deep(self.peek()));
        }
        self.nesting += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.nesting -= 1;
    }

    fn too_deep(&self, at: Option<Token>) -> PathParseError {
        match at {
            Some(token) => self.unexpected(token, TOO_DEEP),
            None => PathParseError::UnexpectedEnd { expected: TOO_DEEP },
        }
    }

    fn unexpected(&self, token: Token, expected: &'static str) -> PathParseError {
        let found = match token.kind {
            TokenKind::Ident | TokenKind::Literal => {
                format!("{} `{}`", token.kind.describe(), token.text(self.input))
            }
            kind => kind.describe().to_string(),
        };
        PathParseError::UnexpectedToken {
            offset: token.start,
            found,
            expected,
        }
    }
}

/// Returns the parsed path and the depth of its tree.
fn parse_pratt(
    stream: &mut TokenStream<'_>,
    min_prec: u8,
) -> Result<(Path, usize), PathParseError> {
    stream.descend()?;
    let parsed = parse_infix(stream, min_prec);
    stream.ascend();
    parsed
}

fn parse_infix(
    stream: &mut TokenStream<'_>,
    min_prec: u8,
) -> Result<(Path, usize), PathParseError> {
    let (mut left, mut depth) = parse_prefix(stream)?;

    while let Some(token) = stream.peek() {
        let Some((prec, assoc)) = infix_info(token.kind) else {
            break;
        };
        if prec < min_prec {
            break;
        }
        stream.advance();

        let next_prec = if assoc == Assoc::Left { prec + 1 } else { prec };
        let (right, right_depth) = parse_pratt(stream, next_prec)?;
        // left-associative chains grow without recursing
        depth = depth.max(right_depth) + 1;
        if depth > MAX_PATH_DEPTH {
            return Err(stream.unexpected(token, TOO_DEEP));
        }
        left = match token.kind {
            TokenKind::Join => Path::join(left, right),
            TokenKind::And => Path::intersection(left, right),
            _ => Path::union(left, right),
        };
    }

    Ok((left, depth))
}

fn parse_prefix(stream: &mut TokenStream<'_>) -> Result<(Path, usize), PathParseError> {
    const EXPECTED: &str = "identifier, literal, `~`, `/` or `(`";

    let token = stream.next_or_end(EXPECTED)?;
    match token.kind {
        TokenKind::Ident => Ok((Path::term(token.text(stream.input)), 1)),
        TokenKind::Literal => {
            let text = token.text(stream.input);
            Ok((Path::value(&text[1..text.len() - 1]), 1))
        }
        TokenKind::Inverse => {
            stream.descend()?;
            let inner = parse_prefix(stream);
            stream.ascend();
            let (path, depth) = inner?;
            Ok((Path::inverse(path), depth + 1))
        }
        TokenKind::Join => {
            let ident = stream.next_or_end("identifier after `/`")?;
            if ident.kind != TokenKind::Ident {
                return Err(stream.unexpected(ident, "identifier after `/`"));
            }
            Ok((Path::term(ident.text(stream.input)), 1))
        }
        TokenKind::Open => {
            let inner = parse_pratt(stream, 0)?;
            let close = stream.next_or_end("`)`")?;
            if close.kind != TokenKind::Close {
                return Err(stream.unexpected(close, "`)`"));
            }
            Ok(inner)
        }
        _ => Err(stream.unexpected(token, EXPECTED)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(name: &str) -> Path {
        Path::term(name)
    }

    #[test]
    fn join_binds_tighter_than_intersection() {
        let p = parse_path("~a/*/c&a/s/~b&b_name/~name").expect("parse");
        let expected = Path::intersection(
            Path::intersection(
                Path::join(
                    Path::inverse(t("a")),
                    Path::join(t("*"), t("c")),
                ),
                Path::join(t("a"), Path::join(t("s"), Path::inverse(t("b")))),
            ),
            Path::join(t("b_name"), Path::inverse(t("name"))),
        );
        assert_eq!(p, expected);
    }

    #[test]
    fn union_and_intersection_share_a_level() {
        let p = parse_path("owner|parent/scope&x").expect("parse");
        assert_eq!(
            p,
            Path::intersection(
                Path::union(t("owner"), Path::join(t("parent"), t("scope"))),
                t("x"),
            )
        );
    }

    #[test]
    fn inverse_applies_to_a_group() {
        let p = parse_path("~(a|b)").expect("parse");
        assert_eq!(p, Path::inverse(Path::union(t("a"), t("b"))));
    }

    #[test]
    fn leading_join_continues_a_chain() {
        assert_eq!(parse_path("/parent").expect("parse"), t("parent"));
    }

    #[test]
    fn literal_drops_quotes() {
        let p = parse_path("kind/~'open'").expect("parse");
        assert_eq!(p, Path::join(t("kind"), Path::inverse(Path::value("open"))));
    }

    #[test]
    fn unmatched_parenthesis_is_an_error() {
        assert_eq!(
            parse_path("(a/b"),
            Err(PathParseError::UnexpectedEnd { expected: "`)`" })
        );
        assert!(matches!(
            parse_path("a/b)"),
            Err(PathParseError::UnexpectedToken { offset: 3, .. })
        ));
    }

    #[test]
    fn dangling_operator_is_an_error() {
        assert!(matches!(
            parse_path("a&"),
            Err(PathParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse_path("&a"),
            Err(PathParseError::UnexpectedToken { offset: 0, .. })
        ));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            parse_path(""),
            Err(PathParseError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        for text in [
            "~".repeat(100_000) + "a",
            "(".repeat(100_000) + "a",
            vec!["a"; 100_000].join("/"),
            vec!["a"; 100_000].join("&"),
        ] {
            assert!(matches!(
                parse_path(&text),
                Err(PathParseError::UnexpectedToken { expected, .. }) if expected == TOO_DEEP
            ));
        }
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        let text = "~".repeat(MAX_PATH_DEPTH - 2) + "a";
        assert!(parse_path(&text).is_ok());
        let chain = vec!["a"; MAX_PATH_DEPTH / 2].join("&");
        assert!(parse_path(&chain).is_ok());
    }
}
