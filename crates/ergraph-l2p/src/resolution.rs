//! Relationship resolution.
//!
//! Every relationship denotes exactly one route from its source to its
//! target. The route is the default "source, through anything, to target",
//! narrowed by the user's path text and by every declared constraint.

use ergraph_path::{eval, parse_path, Path, ABSOLUTE_TERM};

use crate::environment::ModelEnvironment;
use crate::error::L2pError;
use crate::model::{Component, Constraint, EntityModel, RelId};
use crate::resolved::{ResolvedPath, ResolvedPaths};

/// `~Source/*/Target`
pub fn default_path(model: &EntityModel, rel: RelId) -> Path {
    let r = model.relationship(rel);
    Path::join(
        Path::inverse(Path::term(&model.entity(r.source).name)),
        Path::join(
            Path::term(ABSOLUTE_TERM),
            Path::term(&model.entity(r.target).name),
        ),
    )
}

/// The default path, intersected with the parsed path text when there is one.
pub fn relationship_path(model: &EntityModel, rel: RelId) -> Result<Path, L2pError> {
    let default = default_path(model, rel);
    let text = model.relationship(rel).path.trim();
    if text.is_empty() {
        return Ok(default);
    }
    let user = parse_path(text).map_err(|source| L2pError::Syntax {
        relationship: model.relationship_label(rel),
        source,
    })?;
    Ok(Path::intersection(default, user))
}

/// `d1/.../dn/~(r1/.../rm)`: from the relationship's source to its target.
pub fn constraint_path(constraint: &Constraint) -> Option<ResolvedPath> {
    let hops = |side: &[Component]| {
        ResolvedPath::chain(side.iter().map(|c| c.relationship))
    };
    match (hops(&constraint.diagonal), hops(&constraint.riser)) {
        (Some(d), Some(r)) => Some(ResolvedPath::join(d, ResolvedPath::inverse(r))),
        (Some(d), None) => Some(d),
        (None, Some(r)) => Some(ResolvedPath::inverse(r)),
        (None, None) => None,
    }
}

/// Resolve one relationship to its unique path.
pub fn resolve_relationship(model: &EntityModel, rel: RelId) -> Result<ResolvedPath, L2pError> {
    let env = ModelEnvironment::new(model, rel);
    let path = relationship_path(model, rel)?;
    let mut set = eval(&path, &env)?;

    for constraint in &model.relationship(rel).constraints {
        if let Some(c) = constraint_path(constraint) {
            set = ergraph_path::PathSet::intersection(set, env.singleton(c))?;
        }
    }

    let mut candidates = set.into_vec();
    match candidates.len() {
        0 => Err(L2pError::NoPath {
            relationship: model.relationship_label(rel),
            path: path.to_string(),
        }),
        1 => Ok(candidates.remove(0).path),
        _ => Err(L2pError::AmbiguousPath {
            relationship: model.relationship_label(rel),
            candidates: candidates
                .iter()
                .map(|c| c.path.display(model).to_string())
                .collect(),
        }),
    }
}

/// Resolve every relationship, in declaration order.
pub fn resolve_all(model: &EntityModel) -> Result<ResolvedPaths, L2pError> {
    let mut paths = vec![ResolvedPath::Absolute; model.relationship_count()];
    for rel in model.relationships() {
        paths[rel.index()] = resolve_relationship(model, rel)?;
    }
    Ok(ResolvedPaths::new(paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeType;
    use crate::resolved::{Endpoint, Route};

    fn triangle() -> (EntityModel, [RelId; 3]) {
        let mut m = EntityModel::new("triangle");
        let a = m.add_entity_type("a");
        let b = m.add_entity_type("b");
        let c = m.add_entity_type("c");
        for t in [a, b, c] {
            m.add_attribute(t, "name", AttributeType::String, true);
        }
        let parent = m.add_relationship(b, "parent", a, false);
        let f = m.add_relationship(b, "f", c, false);
        let c_parent = m.add_relationship(c, "parent", a, true);
        m.add_constraint(f, &[parent], &[c_parent]);
        (m, [parent, f, c_parent])
    }

    #[test]
    fn default_path_text() {
        let (m, [parent, ..]) = triangle();
        assert_eq!(default_path(&m, parent), parse_path("~b/*/a").unwrap());
    }

    #[test]
    fn empty_path_resolves_to_the_default_route() {
        let (m, [parent, ..]) = triangle();
        let p = resolve_relationship(&m, parent).unwrap();
        let b = m.find_entity("b").unwrap();
        let a = m.find_entity("a").unwrap();
        assert_eq!(
            p.route(&m),
            Route::new(Endpoint::Entity(b), Endpoint::Entity(a))
        );
        assert!(p.relationships().is_empty());
    }

    #[test]
    fn constraints_are_intersected_in() {
        let (m, [parent, f, c_parent]) = triangle();
        let p = resolve_relationship(&m, f).unwrap();
        assert_eq!(p.relationships(), vec![parent, c_parent]);
        assert_eq!(
            p.display(&m).to_string(),
            "((~b)/((*)/(c)))&((b.parent)/(~c.parent))"
        );
    }

    #[test]
    fn path_text_narrows_the_default() {
        let (mut m, [parent, ..]) = triangle();
        let b = m.find_entity("b").unwrap();
        m.add_attribute(b, "parent_name", AttributeType::String, false);
        m.set_path(parent, "parent_name/~name");
        let p = resolve_relationship(&m, parent).unwrap();
        assert_eq!(
            p.display(&m).to_string(),
            "((~b)/((*)/(a)))&((b.parent_name)/(~a.name))"
        );
    }

    #[test]
    fn unresolvable_names_are_no_path() {
        let (mut m, [parent, ..]) = triangle();
        m.set_path(parent, "nowhere");
        assert!(matches!(
            resolve_relationship(&m, parent),
            Err(L2pError::NoPath { relationship, .. }) if relationship == "b.parent"
        ));
    }

    #[test]
    fn syntax_errors_name_the_relationship() {
        let (mut m, [parent, ..]) = triangle();
        m.set_path(parent, "a/(b");
        let err = resolve_relationship(&m, parent).unwrap_err();
        assert!(matches!(err, L2pError::Syntax { ref relationship, .. } if relationship == "b.parent"));
        assert!(err.to_string().starts_with("syntax error in path of `b.parent`"));
    }

    #[test]
    fn resolve_all_fills_every_slot() {
        let (m, rels) = triangle();
        let paths = resolve_all(&m).unwrap();
        for rel in rels {
            assert!(paths.get(rel).is_some());
        }
    }
}
