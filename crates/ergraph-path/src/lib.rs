//! ergraph path algebra
//!
//! Path expressions describe routes through an entity-relationship schema:
//!
//! - `name`: an entity type, attribute or relationship (resolved later),
//! - `*`: any entity,
//! - `'text'`: a literal value,
//! - `~p`: `p` walked backwards,
//! - `p/q`: `p` then `q`,
//! - `p&q`: both `p` and `q` hold between the same endpoints,
//! - `p|q`: either holds.
//!
//! This crate owns the AST, the tokenizer, the Pratt parser and a generic
//! evaluator. It is deliberately model-unaware: resolving names against a
//! concrete schema happens in `ergraph-l2p` through the [`Environment`] trait.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{Name, Path, ABSOLUTE_TERM};
pub use eval::{eval, Environment, PathSet};
pub use parser::{parse_path, PathParseError, MAX_PATH_DEPTH};

/// True if `name` can appear as a bare term in path text.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
