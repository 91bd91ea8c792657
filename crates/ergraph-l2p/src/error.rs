use ergraph_path::PathParseError;
use thiserror::Error;

use crate::model::AttributeType;

/// Every error means the schema as written cannot be compiled.
///
/// Schema objects are named `Type.name`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum L2pError {
    #[error("syntax error in path of `{relationship}`: {source}")]
    Syntax {
        relationship: String,
        #[source]
        source: PathParseError,
    },
    #[error("no route from source to target of `{relationship}` matches `{path}`")]
    NoPath { relationship: String, path: String },
    #[error("path of `{relationship}` is ambiguous: {}", candidates.join(", "))]
    AmbiguousPath {
        relationship: String,
        candidates: Vec<String>,
    },
    #[error("cyclic dependency through `{node}`")]
    CyclicDependency { node: String },
    #[error("union in path of `{relationship}` has operands with no common route")]
    UnsupportedUnion { relationship: String },
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("`{relationship}` needs `{attribute}` to be {expected}, but it is {found}")]
    AttributeConflict {
        relationship: String,
        attribute: String,
        expected: AttributeType,
        found: AttributeType,
    },
    #[error("`{relationship}` is not physically implemented: {reason}")]
    NotPhysical { relationship: String, reason: String },
    #[error("no fixpoint after {passes} passes")]
    NoFixpoint { passes: usize },
}
