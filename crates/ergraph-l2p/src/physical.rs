//! Typestate wrapper for compiled models.
//!
//! A [`PhysicalModel`] can only be obtained by compiling a logical model or
//! by checking one that claims to be compiled already, so code that holds
//! one can rely on every relationship carrying a complete implementation.

use crate::driver::{logical_to_physical, CompileReport};
use crate::error::L2pError;
use crate::model::{EntityModel, Implementation, RelId};

/// An `EntityModel` whose relationships are all implemented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalModel(EntityModel);

impl PhysicalModel {
    /// Compile a logical model and check the result.
    pub fn compile(mut model: EntityModel) -> Result<(Self, CompileReport), L2pError> {
        let report = logical_to_physical(&mut model)?;
        check_physical(&model)?;
        Ok((Self(model), report))
    }

    /// Accept an already-compiled model after checking it.
    pub fn new_checked(model: EntityModel) -> Result<Self, L2pError> {
        check_physical(&model)?;
        Ok(Self(model))
    }

    pub fn as_model(&self) -> &EntityModel {
        &self.0
    }

    pub fn into_model(self) -> EntityModel {
        self.0
    }

    pub fn implementation(&self, rel: RelId) -> &[Implementation] {
        self.0
            .relationship(rel)
            .implementation
            .as_deref()
            .unwrap_or_default()
    }
}

/// Check key completeness: every relationship has one implementation entry
/// per target key attribute, in key order, each read from a source-side
/// attribute of the same type.
pub fn check_physical(model: &EntityModel) -> Result<(), L2pError> {
    for rel in model.relationships() {
        let r = model.relationship(rel);
        let not_physical = |reason: String| L2pError::NotPhysical {
            relationship: model.relationship_label(rel),
            reason,
        };

        let implementation = r
            .implementation
            .as_ref()
            .ok_or_else(|| not_physical("no implementation".to_string()))?;
        let key = model.key(r.target);
        if implementation.len() != key.len() {
            return Err(not_physical(format!(
                "{} implementation entries for {} key attributes",
                implementation.len(),
                key.len()
            )));
        }

        for (entry, &k) in implementation.iter().zip(&key) {
            if entry.target != k {
                return Err(not_physical(format!(
                    "entry for `{}` where `{}` was expected",
                    model.attribute_label(entry.target),
                    model.attribute_label(k)
                )));
            }

            let mut at = r.source;
            for hop in &entry.base_path {
                let h = model.relationship(hop.relationship);
                if h.source != at {
                    return Err(not_physical(format!(
                        "base path of `{}` does not chain at `{}`",
                        model.attribute_label(k),
                        model.relationship_label(hop.relationship)
                    )));
                }
                at = h.target;
            }
            let source = model.attribute(entry.source);
            if source.owner != at {
                return Err(not_physical(format!(
                    "`{}` is not on `{}`",
                    model.attribute_label(entry.source),
                    model.entity(at).name
                )));
            }

            let expected = model.attribute(k).ty;
            if source.ty != expected {
                return Err(L2pError::AttributeConflict {
                    relationship: model.relationship_label(rel),
                    attribute: model.attribute_label(entry.source),
                    expected,
                    found: source.ty,
                });
            }
        }
    }
    Ok(())
}
