//! ergraph L2P: logical-to-physical compilation of entity-relationship models
//!
//! A logical model declares entity types, their attributes and named
//! relationships, some of them only approximately ("goes through `parent`").
//! Compilation turns it into a physical model in which every relationship
//! says exactly which source attributes store which target key attributes,
//! and through which chain of other relationships.
//!
//! Pipeline, per pass:
//! 1. [`resolution`]: resolve each relationship's path text against the
//!    model, requiring a unique route from source to target;
//! 2. [`ordering`]: order relationships so that what a relationship refers to
//!    is handled first (cycles are fatal);
//! 3. [`analysis`]: find target key attributes the path does not yet provide;
//! 4. [`driver`]: backfill those on the source, extend the path text, repeat
//!    until nothing is missing, then write implementations.
//!
//! ## Module Organization
//!
//! - `model`: the arena model and its builders
//! - `resolved` / `environment`: resolved paths, routes and name lookup
//! - `physical`: typestate wrapper for compiled models
//! - `digest`: canonical rendering and determinism digest

pub mod analysis;
pub mod digest;
pub mod driver;
pub mod environment;
pub mod error;
pub mod model;
pub mod ordering;
pub mod physical;
pub mod resolution;
pub mod resolved;
pub mod validate;

pub use analysis::{Analyzer, Witness};
pub use digest::{physical_digest_v1, render_physical, PHYSICAL_DIGEST_V1_PREFIX};
pub use driver::{logical_to_physical, CompileReport};
pub use environment::{Candidate, Candidates, ModelEnvironment};
pub use error::L2pError;
pub use model::{
    AttrId, Attribute, AttributeType, Component, Constraint, Dependency, EntityId, EntityModel,
    EntityType, Implementation, RelId, Relationship,
};
pub use ordering::topsort;
pub use physical::{check_physical, PhysicalModel};
pub use resolution::{resolve_all, resolve_relationship};
pub use resolved::{Endpoint, ResolvedPath, ResolvedPaths, Route};
pub use validate::validate;
