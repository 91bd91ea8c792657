//! Generic evaluation of a [`Path`] against an environment.
//!
//! The algebra itself knows nothing about schemas. An [`Environment`] turns
//! names and literals into sets of candidates, and the [`PathSet`] combinators
//! decide which combinations survive.

use crate::ast::Path;

/// A set of candidate interpretations of a path expression.
pub trait PathSet: Sized {
    type Error;

    fn inverse(self) -> Self;
    fn join(self, right: Self) -> Result<Self, Self::Error>;
    fn intersection(self, right: Self) -> Result<Self, Self::Error>;
    fn union(self, right: Self) -> Result<Self, Self::Error>;
}

/// Name resolution for [`eval`].
pub trait Environment {
    type Set: PathSet;

    fn lookup(&self, name: &str) -> Result<Self::Set, <Self::Set as PathSet>::Error>;
    fn wrap(&self, literal: &str) -> Result<Self::Set, <Self::Set as PathSet>::Error>;
}

/// Interpret `path` bottom-up: terms via `lookup`, literals via `wrap`, and
/// each operator via the matching [`PathSet`] combinator. Both operands of a
/// binary node are evaluated independently before combining.
pub fn eval<E: Environment>(
    path: &Path,
    env: &E,
) -> Result<E::Set, <E::Set as PathSet>::Error> {
    match path {
        Path::Value { literal } => env.wrap(literal),
        Path::Term { name } => env.lookup(name),
        Path::Inverse { path } => Ok(eval(path, env)?.inverse()),
        Path::Join { left, right } => eval(left, env)?.join(eval(right, env)?),
        Path::Intersection { left, right } => {
            eval(left, env)?.intersection(eval(right, env)?)
        }
        Path::Union { left, right } => eval(left, env)?.union(eval(right, env)?),
    }
}
