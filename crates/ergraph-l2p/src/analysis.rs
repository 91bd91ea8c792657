//! Attribute-completion analysis.
//!
//! For a relationship `r: S -> T` and a key attribute `k` of `T`, the
//! analyzer asks whether walking `r`'s resolved path from an `S` entity pins
//! down `k` of the `T` entity at the far end using attributes that are
//! already stored. A positive answer is a [`Witness`]: the stored attribute
//! and the relationship hops leading to the entity that stores it.
//!
//! The walk keeps a stack of [`Context`] frames describing how the current
//! position was reached. Structural rules decompose the path term; the only
//! non-structural rule is "a full key determines every other attribute",
//! which is applied to the entity at the end of a frame and excludes key
//! attributes themselves, so it cannot recurse on the attribute under test.

use crate::model::{AttrId, EntityId, EntityModel, RelId};
use crate::resolved::{Endpoint, ResolvedPath, ResolvedPaths};

/// `attribute`, read from the entity reached by following `base_path` from
/// the relationship's source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    pub attribute: AttrId,
    pub base_path: Vec<RelId>,
}

/// What the far end of the walk must be tied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wanted {
    /// The walk ends on a scalar value.
    Value,
    /// The walk ends on an entity; its attribute is wanted.
    Attribute(AttrId),
}

#[derive(Debug, Clone, Copy)]
enum Frame<'a> {
    /// The relationship's source entity.
    Source(EntityId),
    /// The far end of `path` (walked backwards when `inverted`), starting
    /// from the previous frame.
    Path {
        path: &'a ResolvedPath,
        inverted: bool,
    },
}

#[derive(Debug, Clone, Copy)]
struct Context<'a> {
    prev: Option<&'a Context<'a>>,
    frame: Frame<'a>,
}

impl<'a> Context<'a> {
    fn source(entity: EntityId) -> Self {
        Self {
            prev: None,
            frame: Frame::Source(entity),
        }
    }

    fn push(&'a self, path: &'a ResolvedPath, inverted: bool) -> Context<'a> {
        Context {
            prev: Some(self),
            frame: Frame::Path { path, inverted },
        }
    }

    /// Forward relationship hops from the source to this position.
    fn hops(&self) -> Option<Vec<RelId>> {
        match self.frame {
            Frame::Source(_) => Some(Vec::new()),
            Frame::Path { inverted: true, .. } => None,
            Frame::Path {
                path,
                inverted: false,
            } => {
                let mut hops = self.prev?.hops()?;
                hops.extend(hops_of(path)?);
                Some(hops)
            }
        }
    }
}

fn hops_of(path: &ResolvedPath) -> Option<Vec<RelId>> {
    match path {
        ResolvedPath::Relationship(r) => Some(vec![*r]),
        ResolvedPath::Join(l, r) => {
            let mut hops = hops_of(l)?;
            hops.extend(hops_of(r)?);
            Some(hops)
        }
        ResolvedPath::Intersection(l, r) => hops_of(l).or_else(|| hops_of(r)),
        _ => None,
    }
}

/// Queries over one snapshot of resolved paths.
pub struct Analyzer<'a> {
    model: &'a EntityModel,
    resolved: &'a ResolvedPaths,
}

impl<'a> Analyzer<'a> {
    pub fn new(model: &'a EntityModel, resolved: &'a ResolvedPaths) -> Self {
        Self { model, resolved }
    }

    /// How `rel` already provides `target_attr`, if it does.
    pub fn witness(&self, rel: RelId, target_attr: AttrId) -> Option<Witness> {
        let r = self.model.relationship(rel);
        let ctx = Context::source(r.source);
        self.provides(
            &self.resolved[rel],
            &ctx,
            false,
            Wanted::Attribute(target_attr),
        )
    }

    /// Key attributes of `rel`'s target that nothing on the source provides.
    pub fn missing_attributes(&self, rel: RelId) -> Vec<AttrId> {
        let target = self.model.relationship(rel).target;
        self.model
            .key(target)
            .into_iter()
            .filter(|&k| self.witness(rel, k).is_none())
            .collect()
    }

    fn provides<'c>(
        &self,
        path: &'c ResolvedPath,
        ctx: &'c Context<'c>,
        inverted: bool,
        wanted: Wanted,
    ) -> Option<Witness> {
        match path {
            ResolvedPath::Absolute | ResolvedPath::EntityType(_) | ResolvedPath::Value(_) => None,
            ResolvedPath::Relationship(r) => {
                self.provides(&self.resolved[*r], ctx, inverted, wanted)
            }
            ResolvedPath::Attribute(x) => {
                if inverted {
                    // value -> entity: the entity's `x` is the value we came from
                    if wanted == Wanted::Attribute(*x) {
                        return self.context_provides(ctx, Wanted::Value);
                    }
                } else if wanted == Wanted::Value {
                    return self.context_provides(ctx, Wanted::Attribute(*x));
                }
                None
            }
            ResolvedPath::Inverse(p) => self.provides(p, ctx, !inverted, wanted),
            ResolvedPath::Join(l, r) => {
                let (first, second) = if inverted { (r, l) } else { (l, r) };
                let next = ctx.push(first, inverted);
                self.provides(second, &next, inverted, wanted)
            }
            ResolvedPath::Intersection(l, r) => self
                .provides(l, ctx, inverted, wanted)
                .or_else(|| self.provides(r, ctx, inverted, wanted)),
            ResolvedPath::Union(l, r) => {
                // either branch may have been taken, so both must read the same column
                let left = self.provides(l, ctx, inverted, wanted)?;
                let right = self.provides(r, ctx, inverted, wanted)?;
                (left == right).then_some(left)
            }
        }
    }

    /// Is `wanted` known at the position described by `ctx`?
    fn context_provides<'c>(&self, ctx: &'c Context<'c>, wanted: Wanted) -> Option<Witness> {
        match ctx.frame {
            Frame::Source(entity) => match wanted {
                Wanted::Attribute(x) if self.model.attribute(x).owner == entity => {
                    Some(Witness {
                        attribute: x,
                        base_path: Vec::new(),
                    })
                }
                _ => None,
            },
            Frame::Path { path, inverted } => {
                let prev = ctx.prev?;
                self.provides(path, prev, inverted, wanted)
                    .or_else(|| self.key_determines(ctx, path, prev, inverted, wanted))
            }
        }
    }

    /// A non-key attribute of the entity at `ctx` is known when its whole
    /// key is, provided the entity is reachable by forward hops.
    fn key_determines<'c>(
        &self,
        ctx: &'c Context<'c>,
        path: &'c ResolvedPath,
        prev: &'c Context<'c>,
        inverted: bool,
        wanted: Wanted,
    ) -> Option<Witness> {
        let Wanted::Attribute(x) = wanted else {
            return None;
        };
        let route = path.route(self.model);
        let end = if inverted { route.source } else { route.target };
        let Endpoint::Entity(entity) = end else {
            return None;
        };
        let attr = self.model.attribute(x);
        if attr.owner != entity || attr.identifying {
            return None;
        }

        let key = self.model.key(entity);
        if key.is_empty() {
            return None;
        }
        let known = key
            .iter()
            .all(|&k| self.provides(path, prev, inverted, Wanted::Attribute(k)).is_some());
        if !known {
            return None;
        }

        Some(Witness {
            attribute: x,
            base_path: ctx.hops()?,
        })
    }
}
