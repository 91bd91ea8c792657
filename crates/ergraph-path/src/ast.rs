//! Path expression AST.
//!
//! A path denotes a binary relation over the schema graph. The AST is pure
//! data: names are not checked against any model here (that is the job of an
//! [`crate::Environment`]).
//!
//! The `Display` form is canonical: every binary node is fully parenthesised,
//! so printing and re-parsing yields the same tree.

use serde::{Deserialize, Serialize};

pub type Name = String;

/// The term that stands for "any entity".
pub const ABSOLUTE_TERM: &str = "*";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Path {
    /// A quoted literal, e.g. `'active'`.
    Value { literal: String },
    /// A bare identifier or `*`.
    Term { name: Name },
    Inverse { path: Box<Path> },
    Join { left: Box<Path>, right: Box<Path> },
    Intersection { left: Box<Path>, right: Box<Path> },
    Union { left: Box<Path>, right: Box<Path> },
}

impl Path {
    pub fn value(literal: impl Into<String>) -> Self {
        Self::Value {
            literal: literal.into(),
        }
    }

    pub fn term(name: impl Into<Name>) -> Self {
        Self::Term { name: name.into() }
    }

    pub fn absolute() -> Self {
        Self::term(ABSOLUTE_TERM)
    }

    pub fn inverse(path: Path) -> Self {
        Self::Inverse {
            path: Box::new(path),
        }
    }

    pub fn join(left: Path, right: Path) -> Self {
        Self::Join {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn intersection(left: Path, right: Path) -> Self {
        Self::Intersection {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn union(left: Path, right: Path) -> Self {
        Self::Union {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Every `Term` name in the expression, left to right.
    pub fn terms(&self) -> Vec<&str> {
        fn walk<'a>(path: &'a Path, out: &mut Vec<&'a str>) {
            match path {
                Path::Value { .. } => {}
                Path::Term { name } => out.push(name),
                Path::Inverse { path } => walk(path, out),
                Path::Join { left, right }
                | Path::Intersection { left, right }
                | Path::Union { left, right } => {
                    walk(left, out);
                    walk(right, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Path::Value { literal } => write!(f, "'{literal}'"),
            Path::Term { name } => write!(f, "{name}"),
            Path::Inverse { path } => match path.as_ref() {
                Path::Term { .. } | Path::Value { .. } | Path::Inverse { .. } => {
                    write!(f, "~{path}")
                }
                _ => write!(f, "~({path})"),
            },
            Path::Join { left, right } => write!(f, "({left})/({right})"),
            Path::Intersection { left, right } => write!(f, "({left})&({right})"),
            Path::Union { left, right } => write!(f, "({left})|({right})"),
        }
    }
}
