//! The logical-to-physical fixpoint.
//!
//! Each pass works on a fresh snapshot: resolve every relationship, order
//! them, and ask the analyzer which target key attributes are still missing.
//! Missing attributes are backfilled on the source as a batch after the
//! pass. A pass with nothing missing is the fixpoint; it writes the
//! implementations and stops.

use crate::analysis::Analyzer;
use crate::error::L2pError;
use crate::model::{AttrId, Component, EntityModel, Implementation, RelId};
use crate::ordering::topsort;
use crate::resolution::resolve_all;
use crate::validate::validate;
use ergraph_path::parse_path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Passes run, including the final one.
    pub passes: usize,
    /// Attributes appended to the model, in order.
    pub synthesized: Vec<AttrId>,
    /// Relationships whose implementation was written by this run.
    pub implemented: Vec<RelId>,
}

impl CompileReport {
    /// True when the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.synthesized.is_empty() && self.implemented.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Backfill {
    relationship: RelId,
    target: AttrId,
}

/// Upper bound on the number of passes: every pass but the last adds at
/// least one attribute, and each relationship needs at most one attribute
/// per target key attribute.
fn pass_limit(model: &EntityModel) -> usize {
    model
        .relationships()
        .map(|r| model.key(model.relationship(r).target).len())
        .sum::<usize>()
        + 1
}

/// Compile `model` in place.
///
/// On error the model may have been partially extended and must not be
/// treated as physical.
pub fn logical_to_physical(model: &mut EntityModel) -> Result<CompileReport, L2pError> {
    validate(model)?;

    let mut report = CompileReport::default();
    loop {
        report.passes += 1;
        if report.passes > pass_limit(model) {
            return Err(L2pError::NoFixpoint {
                passes: report.passes - 1,
            });
        }

        let resolved = resolve_all(model)?;
        let order = topsort(model, &resolved)?;
        let analyzer = Analyzer::new(model, &resolved);

        let mut edits = Vec::new();
        for &rel in &order {
            for target in analyzer.missing_attributes(rel) {
                edits.push(Backfill {
                    relationship: rel,
                    target,
                });
            }
        }
        tracing::debug!(pass = report.passes, missing = edits.len(), "compiler pass");

        if edits.is_empty() {
            let implementations = implementations(model, &analyzer, &order)?;
            for (rel, implementation) in implementations {
                model.set_implementation(rel, implementation);
                report.implemented.push(rel);
            }
            tracing::info!(
                model = %model.name,
                passes = report.passes,
                synthesized = report.synthesized.len(),
                implemented = report.implemented.len(),
                "model compiled"
            );
            return Ok(report);
        }

        for edit in edits {
            if let Some(attr) = backfill(model, edit)? {
                report.synthesized.push(attr);
            }
        }
    }
}

/// Implementations for every relationship that does not have one yet.
fn implementations(
    model: &EntityModel,
    analyzer: &Analyzer<'_>,
    order: &[RelId],
) -> Result<Vec<(RelId, Vec<Implementation>)>, L2pError> {
    let mut out = Vec::new();
    for &rel in order {
        let r = model.relationship(rel);
        if r.implementation.is_some() {
            continue;
        }

        let mut implementation = Vec::new();
        for target in model.key(r.target) {
            let witness = analyzer
                .witness(rel, target)
                .ok_or_else(|| L2pError::NotPhysical {
                    relationship: model.relationship_label(rel),
                    reason: format!("`{}` is not provided", model.attribute_label(target)),
                })?;

            let expected = model.attribute(target).ty;
            let found = model.attribute(witness.attribute).ty;
            if expected != found {
                return Err(L2pError::AttributeConflict {
                    relationship: model.relationship_label(rel),
                    attribute: model.attribute_label(witness.attribute),
                    expected,
                    found,
                });
            }

            implementation.push(Implementation {
                target,
                source: witness.attribute,
                base_path: witness
                    .base_path
                    .into_iter()
                    .map(|relationship| Component { relationship })
                    .collect(),
            });
        }
        out.push((rel, implementation));
    }
    Ok(out)
}

/// True if a relationship other than `rel` already reads `attr`, through
/// its path text or its implementation.
fn wired_elsewhere(model: &EntityModel, rel: RelId, attr: AttrId) -> Result<bool, L2pError> {
    let name = model.attribute(attr).name.as_str();
    for other in model.relationships().filter(|&o| o != rel) {
        let r = model.relationship(other);
        if r.implementation.iter().flatten().any(|imp| imp.source == attr) {
            return Ok(true);
        }
        let text = r.path.trim();
        if text.is_empty() {
            continue;
        }
        let path = parse_path(text).map_err(|source| L2pError::Syntax {
            relationship: model.relationship_label(other),
            source,
        })?;
        if path.terms().contains(&name) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Store `edit.target` on the relationship's source and describe the wiring
/// in its path. Returns the new attribute, or `None` when an attribute of
/// that name and type already existed and no other relationship uses it.
///
/// A name already taken by another relationship's column gets a numeric
/// suffix (`x_y_z_2`), so two foreign keys never share one column.
fn backfill(model: &mut EntityModel, edit: Backfill) -> Result<Option<AttrId>, L2pError> {
    let rel = model.relationship(edit.relationship);
    let target = model.attribute(edit.target);
    let (source, identifying, ty) = (rel.source, rel.identifying, target.ty);
    let base = format!("{}_{}", rel.name, target.name);
    let target_name = target.name.clone();

    let mut name = base.clone();
    let mut suffix = 1;
    let reused = loop {
        match model.find_attribute(source, &name) {
            None => break None,
            Some(existing) if wired_elsewhere(model, edit.relationship, existing)? => {
                suffix += 1;
                name = format!("{base}_{suffix}");
            }
            Some(existing) => {
                let found = model.attribute(existing).ty;
                if found != ty {
                    return Err(L2pError::AttributeConflict {
                        relationship: model.relationship_label(edit.relationship),
                        attribute: model.attribute_label(existing),
                        expected: ty,
                        found,
                    });
                }
                break Some(existing);
            }
        }
    };

    let conjunct = format!("{name}/~{target_name}");
    let path = {
        let current = &model.relationship(edit.relationship).path;
        if current.trim().is_empty() {
            conjunct
        } else {
            format!("{current}&{conjunct}")
        }
    };

    let synthesized = match reused {
        Some(_) => None,
        None => Some(model.add_attribute(source, name.clone(), ty, identifying)),
    };
    model.set_path(edit.relationship, path);

    tracing::debug!(
        relationship = %model.relationship_label(edit.relationship),
        attribute = %name,
        reused = synthesized.is_none(),
        "backfilled key attribute"
    );
    Ok(synthesized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeType;

    fn names(model: &EntityModel, entity: crate::model::EntityId) -> Vec<&str> {
        model
            .entity(entity)
            .attributes
            .iter()
            .map(|&a| model.attribute(a).name.as_str())
            .collect()
    }

    #[test]
    fn line_backfills_in_dependency_order() {
        let mut m = EntityModel::new("line");
        let a = m.add_entity_type("a");
        let b = m.add_entity_type("b");
        let c = m.add_entity_type("c");
        for t in [a, b, c] {
            m.add_attribute(t, "name", AttributeType::String, true);
        }
        let parent = m.add_relationship(b, "parent", a, false);
        let f = m.add_relationship(b, "f", c, false);
        m.add_relationship(c, "parent", a, true);

        let report = logical_to_physical(&mut m).unwrap();
        assert_eq!(report.passes, 3);
        assert_eq!(
            names(&m, b),
            vec!["name", "parent_name", "f_name", "f_parent_name"]
        );
        assert_eq!(names(&m, c), vec!["name", "parent_name"]);
        assert_eq!(m.relationship(parent).path, "parent_name/~name");
        assert_eq!(
            m.relationship(f).path,
            "f_name/~name&f_parent_name/~parent_name"
        );
    }

    #[test]
    fn identifying_relationship_extends_the_key() {
        let mut m = EntityModel::new("nest");
        let a = m.add_entity_type("a");
        let c = m.add_entity_type("c");
        m.add_attribute(a, "name", AttributeType::String, true);
        m.add_attribute(c, "seq", AttributeType::Int, true);
        m.add_relationship(c, "parent", a, true);

        logical_to_physical(&mut m).unwrap();
        let key: Vec<_> = m
            .key(c)
            .into_iter()
            .map(|k| m.attribute(k).name.clone())
            .collect();
        assert_eq!(key, vec!["seq", "parent_name"]);
    }

    #[test]
    fn existing_attribute_of_the_same_type_is_reused() {
        let mut m = EntityModel::new("reuse");
        let a = m.add_entity_type("a");
        let b = m.add_entity_type("b");
        m.add_attribute(a, "name", AttributeType::String, true);
        let declared = m.add_attribute(b, "parent_name", AttributeType::String, false);
        let parent = m.add_relationship(b, "parent", a, false);

        let report = logical_to_physical(&mut m).unwrap();
        assert!(report.synthesized.is_empty());
        let implementation = m.relationship(parent).implementation.clone().unwrap();
        assert_eq!(implementation[0].source, declared);
    }

    #[test]
    fn colliding_names_get_separate_columns() {
        // `x -> t1 (key y_z)` and `x_y -> t2 (key z)` both synthesize `x_y_z`.
        let mut m = EntityModel::new("collide");
        let t1 = m.add_entity_type("t1");
        let t2 = m.add_entity_type("t2");
        let b = m.add_entity_type("b");
        m.add_attribute(t1, "y_z", AttributeType::String, true);
        m.add_attribute(t2, "z", AttributeType::String, true);
        let x = m.add_relationship(b, "x", t1, false);
        let x_y = m.add_relationship(b, "x_y", t2, false);

        let report = logical_to_physical(&mut m).unwrap();
        assert_eq!(report.synthesized.len(), 2);
        assert_eq!(names(&m, b), vec!["x_y_z", "x_y_z_2"]);

        let column = |rel| m.relationship(rel).implementation.as_ref().unwrap()[0].source;
        assert_ne!(column(x), column(x_y));
        for rel in [x, x_y] {
            let name = &m.attribute(column(rel)).name;
            assert!(m.relationship(rel).path.starts_with(&format!("{name}/~")));
        }
        assert!(crate::physical::check_physical(&m).is_ok());
    }

    #[test]
    fn declared_column_used_by_another_relationship_is_not_shared() {
        let mut m = EntityModel::new("shared");
        let a = m.add_entity_type("a");
        let b = m.add_entity_type("b");
        m.add_attribute(a, "name", AttributeType::String, true);
        m.add_attribute(b, "parent_name", AttributeType::String, false);
        let owner = m.add_relationship(b, "owner", a, false);
        let parent = m.add_relationship(b, "parent", a, false);
        m.set_path(owner, "parent_name/~name");

        logical_to_physical(&mut m).unwrap();
        assert_eq!(names(&m, b), vec!["parent_name", "parent_name_2"]);
        let column = |rel| m.relationship(rel).implementation.as_ref().unwrap()[0].source;
        assert_eq!(m.attribute_label(column(owner)), "b.parent_name");
        assert_eq!(m.attribute_label(column(parent)), "b.parent_name_2");
    }

    #[test]
    fn existing_attribute_of_another_type_conflicts() {
        let mut m = EntityModel::new("conflict");
        let a = m.add_entity_type("a");
        let b = m.add_entity_type("b");
        m.add_attribute(a, "name", AttributeType::String, true);
        m.add_attribute(b, "parent_name", AttributeType::Int, false);
        m.add_relationship(b, "parent", a, false);

        assert_eq!(
            logical_to_physical(&mut m),
            Err(L2pError::AttributeConflict {
                relationship: "b.parent".to_string(),
                attribute: "b.parent_name".to_string(),
                expected: AttributeType::String,
                found: AttributeType::Int,
            })
        );
    }

    #[test]
    fn user_wiring_with_the_wrong_type_conflicts() {
        let mut m = EntityModel::new("wiring");
        let a = m.add_entity_type("a");
        let b = m.add_entity_type("b");
        m.add_attribute(a, "name", AttributeType::String, true);
        m.add_attribute(b, "owner_id", AttributeType::Int, false);
        let parent = m.add_relationship(b, "parent", a, false);
        m.set_path(parent, "owner_id/~name");

        assert!(matches!(
            logical_to_physical(&mut m),
            Err(L2pError::AttributeConflict { found: AttributeType::Int, .. })
        ));
    }

    #[test]
    fn second_run_is_a_noop() {
        let mut m = EntityModel::new("line");
        let a = m.add_entity_type("a");
        let b = m.add_entity_type("b");
        m.add_attribute(a, "name", AttributeType::String, true);
        m.add_relationship(b, "parent", a, false);

        logical_to_physical(&mut m).unwrap();
        let compiled = m.clone();
        let report = logical_to_physical(&mut m).unwrap();
        assert!(report.is_noop());
        assert_eq!(report.passes, 1);
        assert_eq!(m, compiled);
    }

    #[test]
    fn keyless_target_needs_nothing() {
        let mut m = EntityModel::new("keyless");
        let a = m.add_entity_type("a");
        let b = m.add_entity_type("b");
        let parent = m.add_relationship(b, "parent", a, false);

        let report = logical_to_physical(&mut m).unwrap();
        assert_eq!(report.passes, 1);
        assert_eq!(m.relationship(parent).implementation, Some(vec![]));
    }
}
