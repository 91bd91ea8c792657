//! Structural checks on a logical model, run before the first pass.

use std::collections::HashSet;

use ergraph_path::is_identifier;

use crate::error::L2pError;
use crate::model::{Component, EntityId, EntityModel, RelId};

fn invalid(message: String) -> L2pError {
    L2pError::InvalidModel(message)
}

fn check_name(kind: &str, name: &str) -> Result<(), L2pError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(invalid(format!("{kind} name `{name}` is not an identifier")))
    }
}

/// Follow `hops` from `start`; the entity type the chain ends on.
fn chain_end(
    model: &EntityModel,
    owner: RelId,
    side: &str,
    start: EntityId,
    hops: &[Component],
) -> Result<EntityId, L2pError> {
    let mut at = start;
    for hop in hops {
        let rel = model.relationship(hop.relationship);
        if rel.source != at {
            return Err(invalid(format!(
                "{side} of a constraint on `{}` does not chain: `{}` starts at `{}`, expected `{}`",
                model.relationship_label(owner),
                model.relationship_label(hop.relationship),
                model.entity(rel.source).name,
                model.entity(at).name,
            )));
        }
        at = rel.target;
    }
    Ok(at)
}

pub fn validate(model: &EntityModel) -> Result<(), L2pError> {
    let mut type_names = HashSet::new();
    for (id, ty) in model.entity_types() {
        check_name("entity type", &ty.name)?;
        if !type_names.insert(ty.name.as_str()) {
            return Err(invalid(format!("duplicate entity type `{}`", ty.name)));
        }

        let mut attr_names = HashSet::new();
        for &attr in &ty.attributes {
            let a = model.attribute(attr);
            check_name("attribute", &a.name)?;
            if a.owner != id {
                return Err(invalid(format!(
                    "attribute `{}` is listed on `{}` but owned by `{}`",
                    a.name,
                    ty.name,
                    model.entity(a.owner).name
                )));
            }
            if !attr_names.insert(a.name.as_str()) {
                return Err(invalid(format!(
                    "duplicate attribute `{}`",
                    model.attribute_label(attr)
                )));
            }
        }

        let mut rel_names = HashSet::new();
        for &rel in &ty.relationships {
            let r = model.relationship(rel);
            check_name("relationship", &r.name)?;
            if r.source != id {
                return Err(invalid(format!(
                    "relationship `{}` is listed on `{}` but starts at `{}`",
                    r.name,
                    ty.name,
                    model.entity(r.source).name
                )));
            }
            if !rel_names.insert(r.name.as_str()) {
                return Err(invalid(format!(
                    "duplicate relationship `{}`",
                    model.relationship_label(rel)
                )));
            }

            for constraint in &r.constraints {
                if constraint.diagonal.is_empty() && constraint.riser.is_empty() {
                    return Err(invalid(format!(
                        "empty constraint on `{}`",
                        model.relationship_label(rel)
                    )));
                }
                let d = chain_end(model, rel, "diagonal", r.source, &constraint.diagonal)?;
                let e = chain_end(model, rel, "riser", r.target, &constraint.riser)?;
                if d != e {
                    return Err(invalid(format!(
                        "constraint on `{}` ends on `{}` (diagonal) and `{}` (riser)",
                        model.relationship_label(rel),
                        model.entity(d).name,
                        model.entity(e).name
                    )));
                }
            }
        }

        if let Some(dep) = ty.dependency {
            if model.relationship(dep.relationship).source != id {
                return Err(invalid(format!(
                    "`{}` depends on `{}`, which is not one of its relationships",
                    ty.name,
                    model.relationship_label(dep.relationship)
                )));
            }
        }
    }
    Ok(())
}
