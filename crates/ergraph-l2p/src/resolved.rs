//! Paths resolved against a concrete model.

use std::fmt;
use std::ops::Index;

use crate::model::{AttrId, EntityId, EntityModel, RelId};

/// An end of a route: any entity (`*`), a scalar value (`$`) or one entity
/// type. Comparison is exact, `*` only equals `*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Absolute,
    Value,
    Entity(EntityId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    pub source: Endpoint,
    pub target: Endpoint,
}

impl Route {
    pub fn new(source: Endpoint, target: Endpoint) -> Self {
        Self { source, target }
    }

    pub fn inverse(self) -> Self {
        Self {
            source: self.target,
            target: self.source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedPath {
    Absolute,
    Value(String),
    EntityType(EntityId),
    Relationship(RelId),
    Attribute(AttrId),
    Inverse(Box<ResolvedPath>),
    Join(Box<ResolvedPath>, Box<ResolvedPath>),
    Intersection(Box<ResolvedPath>, Box<ResolvedPath>),
    Union(Box<ResolvedPath>, Box<ResolvedPath>),
}

impl ResolvedPath {
    pub fn inverse(path: ResolvedPath) -> Self {
        Self::Inverse(Box::new(path))
    }

    pub fn join(left: ResolvedPath, right: ResolvedPath) -> Self {
        Self::Join(Box::new(left), Box::new(right))
    }

    pub fn intersection(left: ResolvedPath, right: ResolvedPath) -> Self {
        Self::Intersection(Box::new(left), Box::new(right))
    }

    pub fn union(left: ResolvedPath, right: ResolvedPath) -> Self {
        Self::Union(Box::new(left), Box::new(right))
    }

    /// Right-nested join of relationship hops. `None` for no hops.
    pub fn chain(hops: impl IntoIterator<Item = RelId>) -> Option<Self> {
        let mut hops: Vec<RelId> = hops.into_iter().collect();
        let mut acc = Self::Relationship(hops.pop()?);
        while let Some(hop) = hops.pop() {
            acc = Self::join(Self::Relationship(hop), acc);
        }
        Some(acc)
    }

    /// The route this path connects. Binary nodes that were built by the
    /// environment have matching operand routes; `Join` takes the outer ends
    /// and `Intersection` / `Union` take the left operand's route.
    pub fn route(&self, model: &EntityModel) -> Route {
        match self {
            ResolvedPath::Absolute => Route::new(Endpoint::Absolute, Endpoint::Absolute),
            ResolvedPath::Value(_) => Route::new(Endpoint::Absolute, Endpoint::Value),
            ResolvedPath::EntityType(e) => Route::new(Endpoint::Absolute, Endpoint::Entity(*e)),
            ResolvedPath::Relationship(r) => {
                let rel = model.relationship(*r);
                Route::new(Endpoint::Entity(rel.source), Endpoint::Entity(rel.target))
            }
            ResolvedPath::Attribute(a) => {
                Route::new(Endpoint::Entity(model.attribute(*a).owner), Endpoint::Value)
            }
            ResolvedPath::Inverse(p) => p.route(model).inverse(),
            ResolvedPath::Join(l, r) => {
                Route::new(l.route(model).source, r.route(model).target)
            }
            ResolvedPath::Intersection(l, _) | ResolvedPath::Union(l, _) => l.route(model),
        }
    }

    /// Every relationship referenced anywhere in the path, left to right.
    pub fn relationships(&self) -> Vec<RelId> {
        fn walk(path: &ResolvedPath, out: &mut Vec<RelId>) {
            match path {
                ResolvedPath::Relationship(r) => out.push(*r),
                ResolvedPath::Inverse(p) => walk(p, out),
                ResolvedPath::Join(l, r)
                | ResolvedPath::Intersection(l, r)
                | ResolvedPath::Union(l, r) => {
                    walk(l, out);
                    walk(r, out);
                }
                ResolvedPath::Absolute
                | ResolvedPath::Value(_)
                | ResolvedPath::EntityType(_)
                | ResolvedPath::Attribute(_) => {}
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// Render with schema names, e.g. `(b.parent_name)/(~a.name)`.
    pub fn display<'a>(&'a self, model: &'a EntityModel) -> DisplayResolved<'a> {
        DisplayResolved { path: self, model }
    }
}

pub struct DisplayResolved<'a> {
    path: &'a ResolvedPath,
    model: &'a EntityModel,
}

impl fmt::Display for DisplayResolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.model;
        match self.path {
            ResolvedPath::Absolute => f.write_str("*"),
            ResolvedPath::Value(literal) => write!(f, "'{literal}'"),
            ResolvedPath::EntityType(e) => f.write_str(&model.entity(*e).name),
            ResolvedPath::Relationship(r) => f.write_str(&model.relationship_label(*r)),
            ResolvedPath::Attribute(a) => f.write_str(&model.attribute_label(*a)),
            ResolvedPath::Inverse(p) => match p.as_ref() {
                ResolvedPath::Join(..)
                | ResolvedPath::Intersection(..)
                | ResolvedPath::Union(..) => write!(f, "~({})", p.display(model)),
                _ => write!(f, "~{}", p.display(model)),
            },
            ResolvedPath::Join(l, r) => write!(f, "({})/({})", l.display(model), r.display(model)),
            ResolvedPath::Intersection(l, r) => write!(f, "({})&({})", l.display(model), r.display(model)),
            ResolvedPath::Union(l, r) => write!(f, "({})|({})", l.display(model), r.display(model)),
        }
    }
}

/// Resolved path of every relationship, indexed by [`RelId`]. Rebuilt on
/// each compiler pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths(Vec<ResolvedPath>);

impl ResolvedPaths {
    pub(crate) fn new(paths: Vec<ResolvedPath>) -> Self {
        Self(paths)
    }

    pub fn get(&self, rel: RelId) -> Option<&ResolvedPath> {
        self.0.get(rel.index())
    }
}

impl Index<RelId> for ResolvedPaths {
    type Output = ResolvedPath;

    fn index(&self, rel: RelId) -> &ResolvedPath {
        &self.0[rel.index()]
    }
}
