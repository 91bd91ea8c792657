//! Name resolution: evaluating path text against one entity model.
//!
//! A bare name may denote several schema objects at once (an entity type and
//! the attributes and relationships that share its name). Evaluation keeps
//! every interpretation as a [`Candidate`] and the combinators prune those
//! whose routes do not line up.

use ergraph_path::{PathSet, ABSOLUTE_TERM};

use crate::error::L2pError;
use crate::model::{EntityModel, RelId};
use crate::resolved::{ResolvedPath, Route};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: ResolvedPath,
    pub route: Route,
}

/// All interpretations of a (sub)expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidates {
    /// Relationship being resolved, for error reporting.
    owner: String,
    items: Vec<Candidate>,
}

impl Candidates {
    pub fn new(owner: impl Into<String>, items: Vec<Candidate>) -> Self {
        Self {
            owner: owner.into(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Candidate> {
        self.items
    }

    fn pairwise(
        self,
        right: Self,
        keep: impl Fn(&Candidate, &Candidate) -> Option<Candidate>,
    ) -> Self {
        let mut items = Vec::new();
        for l in &self.items {
            for r in &right.items {
                if let Some(c) = keep(l, r) {
                    items.push(c);
                }
            }
        }
        Self {
            owner: self.owner,
            items,
        }
    }
}

impl PathSet for Candidates {
    type Error = L2pError;

    fn inverse(self) -> Self {
        let items = self
            .items
            .into_iter()
            .map(|c| Candidate {
                path: ResolvedPath::inverse(c.path),
                route: c.route.inverse(),
            })
            .collect();
        Self {
            owner: self.owner,
            items,
        }
    }

    fn join(self, right: Self) -> Result<Self, L2pError> {
        Ok(self.pairwise(right, |l, r| {
            (l.route.target == r.route.source).then(|| Candidate {
                path: ResolvedPath::join(l.path.clone(), r.path.clone()),
                route: Route::new(l.route.source, r.route.target),
            })
        }))
    }

    fn intersection(self, right: Self) -> Result<Self, L2pError> {
        Ok(self.pairwise(right, |l, r| {
            (l.route == r.route).then(|| Candidate {
                path: ResolvedPath::intersection(l.path.clone(), r.path.clone()),
                route: l.route,
            })
        }))
    }

    fn union(self, right: Self) -> Result<Self, L2pError> {
        let both = !self.is_empty() && !right.is_empty();
        let owner = self.owner.clone();
        let out = self.pairwise(right, |l, r| {
            (l.route == r.route).then(|| Candidate {
                path: ResolvedPath::union(l.path.clone(), r.path.clone()),
                route: l.route,
            })
        });
        if both && out.is_empty() {
            return Err(L2pError::UnsupportedUnion {
                relationship: owner,
            });
        }
        Ok(out)
    }
}

/// Lookup of names in one model, on behalf of one relationship.
pub struct ModelEnvironment<'m> {
    model: &'m EntityModel,
    owner: String,
}

impl<'m> ModelEnvironment<'m> {
    pub fn new(model: &'m EntityModel, relationship: RelId) -> Self {
        Self {
            model,
            owner: model.relationship_label(relationship),
        }
    }

    fn candidate(&self, path: ResolvedPath) -> Candidate {
        let route = path.route(self.model);
        Candidate { path, route }
    }

    /// A set holding exactly `path`.
    pub fn singleton(&self, path: ResolvedPath) -> Candidates {
        Candidates::new(self.owner.clone(), vec![self.candidate(path)])
    }
}

impl ergraph_path::Environment for ModelEnvironment<'_> {
    type Set = Candidates;

    fn lookup(&self, name: &str) -> Result<Candidates, L2pError> {
        if name == ABSOLUTE_TERM {
            return Ok(self.singleton(ResolvedPath::Absolute));
        }

        let model = self.model;
        let mut items = Vec::new();
        for (id, ty) in model.entity_types() {
            if ty.name == name {
                items.push(self.candidate(ResolvedPath::EntityType(id)));
            }
            for &attr in &ty.attributes {
                if model.attribute(attr).name == name {
                    items.push(self.candidate(ResolvedPath::Attribute(attr)));
                }
            }
            for &rel in &ty.relationships {
                if model.relationship(rel).name == name {
                    items.push(self.candidate(ResolvedPath::Relationship(rel)));
                }
            }
        }
        Ok(Candidates::new(self.owner.clone(), items))
    }

    fn wrap(&self, literal: &str) -> Result<Candidates, L2pError> {
        Ok(self.singleton(ResolvedPath::Value(literal.to_string())))
    }
}
