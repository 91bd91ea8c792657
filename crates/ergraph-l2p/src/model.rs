//! Logical / physical entity model.
//!
//! The model is an arena: entity types, attributes and relationships live in
//! three vectors and refer to each other by index. Entity types keep the
//! declaration order of their attributes and relationships; that order is
//! the primary-key order and the processing order of the compiler.
//!
//! Compilation mutates the model in place, but only by appending attributes,
//! extending relationship paths and filling in implementations.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Ids
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelId(pub u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl AttrId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl RelId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

fn next_id(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

// ============================================================================
// Schema objects
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int,
    Float,
    Bool,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeType::String => "string",
            AttributeType::Int => "int",
            AttributeType::Float => "float",
            AttributeType::Bool => "bool",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    pub name: String,
    pub attributes: Vec<AttrId>,
    /// Relationships whose source is this type.
    pub relationships: Vec<RelId>,
    pub dependency: Option<Dependency>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub ty: AttributeType,
    /// Part of the owner's primary key.
    pub identifying: bool,
    pub owner: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub name: String,
    pub source: EntityId,
    pub target: EntityId,
    /// The implementing attributes join the source's primary key.
    pub identifying: bool,
    /// Path expression text; empty means "any route from source to target".
    pub path: String,
    pub constraints: Vec<Constraint>,
    /// One entry per key attribute of `target`, once compiled.
    pub implementation: Option<Vec<Implementation>>,
}

/// One hop along a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Component {
    pub relationship: RelId,
}

/// `diagonal` (from the source) and `riser` (from the target) reach the same
/// entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Constraint {
    pub diagonal: Vec<Component>,
    pub riser: Vec<Component>,
}

/// `target` (a key attribute of the relationship's target) is stored as
/// `source`, read from the entity reached by following `base_path` from the
/// relationship's source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Implementation {
    pub target: AttrId,
    pub source: AttrId,
    pub base_path: Vec<Component>,
}

/// Structural nesting of an entity type inside another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub relationship: RelId,
    /// The nesting also carries a position in a sequence.
    pub sequence: bool,
}

// ============================================================================
// EntityModel
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityModel {
    pub name: String,
    types: Vec<EntityType>,
    attributes: Vec<Attribute>,
    relationships: Vec<Relationship>,
}

impl EntityModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_entity_type(&mut self, name: impl Into<String>) -> EntityId {
        let id = EntityId(next_id(self.types.len()));
        self.types.push(EntityType {
            name: name.into(),
            attributes: Vec::new(),
            relationships: Vec::new(),
            dependency: None,
        });
        id
    }

    pub fn add_attribute(
        &mut self,
        owner: EntityId,
        name: impl Into<String>,
        ty: AttributeType,
        identifying: bool,
    ) -> AttrId {
        let id = AttrId(next_id(self.attributes.len()));
        self.attributes.push(Attribute {
            name: name.into(),
            ty,
            identifying,
            owner,
        });
        self.types[owner.index()].attributes.push(id);
        id
    }

    pub fn add_relationship(
        &mut self,
        source: EntityId,
        name: impl Into<String>,
        target: EntityId,
        identifying: bool,
    ) -> RelId {
        let id = RelId(next_id(self.relationships.len()));
        self.relationships.push(Relationship {
            name: name.into(),
            source,
            target,
            identifying,
            path: String::new(),
            constraints: Vec::new(),
            implementation: None,
        });
        self.types[source.index()].relationships.push(id);
        id
    }

    pub fn set_path(&mut self, rel: RelId, path: impl Into<String>) {
        self.relationships[rel.index()].path = path.into();
    }

    pub fn add_constraint(&mut self, rel: RelId, diagonal: &[RelId], riser: &[RelId]) {
        let hops = |rels: &[RelId]| {
            rels.iter()
                .map(|&relationship| Component { relationship })
                .collect::<Vec<_>>()
        };
        self.relationships[rel.index()].constraints.push(Constraint {
            diagonal: hops(diagonal),
            riser: hops(riser),
        });
    }

    pub fn set_dependency(&mut self, entity: EntityId, relationship: RelId, sequence: bool) {
        self.types[entity.index()].dependency = Some(Dependency {
            relationship,
            sequence,
        });
    }

    pub fn set_implementation(&mut self, rel: RelId, implementation: Vec<Implementation>) {
        self.relationships[rel.index()].implementation = Some(implementation);
    }

    pub fn entity(&self, id: EntityId) -> &EntityType {
        &self.types[id.index()]
    }

    pub fn attribute(&self, id: AttrId) -> &Attribute {
        &self.attributes[id.index()]
    }

    pub fn relationship(&self, id: RelId) -> &Relationship {
        &self.relationships[id.index()]
    }

    /// Entity types in declaration order.
    pub fn entity_types(&self) -> impl Iterator<Item = (EntityId, &EntityType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (EntityId(next_id(i)), t))
    }

    /// All relationships: entity types in order, each type's relationships
    /// in order.
    pub fn relationships(&self) -> impl Iterator<Item = RelId> + '_ {
        self.types
            .iter()
            .flat_map(|t| t.relationships.iter().copied())
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn find_entity(&self, name: &str) -> Option<EntityId> {
        self.entity_types()
            .find(|(_, t)| t.name == name)
            .map(|(id, _)| id)
    }

    pub fn find_attribute(&self, owner: EntityId, name: &str) -> Option<AttrId> {
        self.entity(owner)
            .attributes
            .iter()
            .copied()
            .find(|&a| self.attribute(a).name == name)
    }

    pub fn find_relationship(&self, source: EntityId, name: &str) -> Option<RelId> {
        self.entity(source)
            .relationships
            .iter()
            .copied()
            .find(|&r| self.relationship(r).name == name)
    }

    /// Identifying attributes of `entity`, in declaration order.
    pub fn key(&self, entity: EntityId) -> Vec<AttrId> {
        self.entity(entity)
            .attributes
            .iter()
            .copied()
            .filter(|&a| self.attribute(a).identifying)
            .collect()
    }

    /// `Type.attribute`
    pub fn attribute_label(&self, id: AttrId) -> String {
        let attr = self.attribute(id);
        format!("{}.{}", self.entity(attr.owner).name, attr.name)
    }

    /// `Type.relationship`
    pub fn relationship_label(&self, id: RelId) -> String {
        let rel = self.relationship(id);
        format!("{}.{}", self.entity(rel.source).name, rel.name)
    }
}
