//! JSON schema documents (`*.er.json`).
//!
//! The document is the CLI's interchange form for entity models. Entity
//! types, attributes and relationships are listed in declaration order; every
//! cross reference is by name: relationship targets by type name, constraint
//! hops as `Type.relationship`, implementation attributes as
//! `Type.attribute`.
//!
//! ```json
//! {
//!   "name": "triangle",
//!   "entities": [
//!     { "name": "a", "attributes": [{ "name": "name", "type": "string", "identifying": true }] },
//!     { "name": "b",
//!       "attributes": [{ "name": "name", "type": "string", "identifying": true }],
//!       "relationships": [
//!         { "name": "parent", "target": "a" },
//!         { "name": "f", "target": "c",
//!           "constraints": [{ "diagonal": ["b.parent"], "riser": ["c.parent"] }] }
//!       ] }
//!   ]
//! }
//! ```

use anyhow::{anyhow, Result};
use ergraph_l2p::{
    AttrId, AttributeType, Component, EntityId, EntityModel, Implementation, RelId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct SchemaDocument {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) entities: Vec<EntityDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct EntityDoc {
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) attributes: Vec<AttributeDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) relationships: Vec<RelationshipDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) dependency: Option<DependencyDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct AttributeDoc {
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) ty: AttributeType,
    #[serde(default)]
    pub(crate) identifying: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct RelationshipDoc {
    pub(crate) name: String,
    pub(crate) target: String,
    #[serde(default)]
    pub(crate) identifying: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub(crate) path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) constraints: Vec<ConstraintDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) implementation: Option<Vec<ImplementationDoc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct ConstraintDoc {
    #[serde(default)]
    pub(crate) diagonal: Vec<String>,
    #[serde(default)]
    pub(crate) riser: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct ImplementationDoc {
    pub(crate) target: String,
    pub(crate) source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) base_path: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct DependencyDoc {
    pub(crate) relationship: String,
    #[serde(default)]
    pub(crate) sequence: bool,
}

impl SchemaDocument {
    pub(crate) fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub(crate) fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the arena model. Types come first so that relationships may
    /// point forward; constraints, dependencies and implementations last so
    /// that they may name any relationship.
    pub(crate) fn to_model(&self) -> Result<EntityModel> {
        let mut model = EntityModel::new(self.name.clone());

        let types: Vec<EntityId> = self
            .entities
            .iter()
            .map(|e| model.add_entity_type(e.name.clone()))
            .collect();

        for (doc, &ty) in self.entities.iter().zip(&types) {
            for a in &doc.attributes {
                model.add_attribute(ty, a.name.clone(), a.ty, a.identifying);
            }
        }

        let mut rels: Vec<(RelId, &RelationshipDoc)> = Vec::new();
        for (doc, &ty) in self.entities.iter().zip(&types) {
            for r in &doc.relationships {
                let target = model.find_entity(&r.target).ok_or_else(|| {
                    anyhow!(
                        "relationship `{}.{}` targets unknown entity type `{}`",
                        doc.name,
                        r.name,
                        r.target
                    )
                })?;
                let id = model.add_relationship(ty, r.name.clone(), target, r.identifying);
                model.set_path(id, r.path.clone());
                rels.push((id, r));
            }
        }

        for &(id, r) in &rels {
            for c in &r.constraints {
                let diagonal = relationship_refs(&model, &c.diagonal)?;
                let riser = relationship_refs(&model, &c.riser)?;
                model.add_constraint(id, &diagonal, &riser);
            }
            if let Some(entries) = &r.implementation {
                let implementation = entries
                    .iter()
                    .map(|e| {
                        Ok(Implementation {
                            target: attribute_ref(&model, &e.target)?,
                            source: attribute_ref(&model, &e.source)?,
                            base_path: relationship_refs(&model, &e.base_path)?
                                .into_iter()
                                .map(|relationship| Component { relationship })
                                .collect(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                model.set_implementation(id, implementation);
            }
        }

        for (doc, &ty) in self.entities.iter().zip(&types) {
            if let Some(dep) = &doc.dependency {
                let rel = model.find_relationship(ty, &dep.relationship).ok_or_else(|| {
                    anyhow!(
                        "entity type `{}` depends on unknown relationship `{}`",
                        doc.name,
                        dep.relationship
                    )
                })?;
                model.set_dependency(ty, rel, dep.sequence);
            }
        }

        Ok(model)
    }

    pub(crate) fn from_model(model: &EntityModel) -> Self {
        let hops = |components: &[Component]| {
            components
                .iter()
                .map(|c| model.relationship_label(c.relationship))
                .collect::<Vec<_>>()
        };

        let entities = model
            .entity_types()
            .map(|(_, ty)| EntityDoc {
                name: ty.name.clone(),
                attributes: ty
                    .attributes
                    .iter()
                    .map(|&a| {
                        let attr = model.attribute(a);
                        AttributeDoc {
                            name: attr.name.clone(),
                            ty: attr.ty,
                            identifying: attr.identifying,
                        }
                    })
                    .collect(),
                relationships: ty
                    .relationships
                    .iter()
                    .map(|&r| {
                        let rel = model.relationship(r);
                        RelationshipDoc {
                            name: rel.name.clone(),
                            target: model.entity(rel.target).name.clone(),
                            identifying: rel.identifying,
                            path: rel.path.clone(),
                            constraints: rel
                                .constraints
                                .iter()
                                .map(|c| ConstraintDoc {
                                    diagonal: hops(&c.diagonal),
                                    riser: hops(&c.riser),
                                })
                                .collect(),
                            implementation: rel.implementation.as_ref().map(|entries| {
                                entries
                                    .iter()
                                    .map(|e| ImplementationDoc {
                                        target: model.attribute_label(e.target),
                                        source: model.attribute_label(e.source),
                                        base_path: hops(&e.base_path),
                                    })
                                    .collect()
                            }),
                        }
                    })
                    .collect(),
                dependency: ty.dependency.map(|d| DependencyDoc {
                    relationship: model.relationship(d.relationship).name.clone(),
                    sequence: d.sequence,
                }),
            })
            .collect();

        Self {
            name: model.name.clone(),
            entities,
        }
    }
}

fn split_label(label: &str) -> Result<(&str, &str)> {
    label
        .split_once('.')
        .ok_or_else(|| anyhow!("expected `Type.name`, got `{label}`"))
}

fn relationship_refs(model: &EntityModel, labels: &[String]) -> Result<Vec<RelId>> {
    labels
        .iter()
        .map(|label| {
            let (ty, name) = split_label(label)?;
            model
                .find_entity(ty)
                .and_then(|t| model.find_relationship(t, name))
                .ok_or_else(|| anyhow!("unknown relationship `{label}`"))
        })
        .collect()
}

fn attribute_ref(model: &EntityModel, label: &str) -> Result<AttrId> {
    let (ty, name) = split_label(label)?;
    model
        .find_entity(ty)
        .and_then(|t| model.find_attribute(t, name))
        .ok_or_else(|| anyhow!("unknown attribute `{label}`"))
}
