//! Dependency ordering of relationships.
//!
//! A relationship is processed after:
//! - its target type, which in turn comes after the target's identifying
//!   relationships (they make up the target's key);
//! - every relationship its resolved path mentions.
//!
//! Nodes are visited in insertion order, so the result is deterministic for
//! a given declaration order.

use std::collections::HashMap;

use crate::error::L2pError;
use crate::model::{EntityId, EntityModel, RelId};
use crate::resolved::ResolvedPaths;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Node {
    Entity(EntityId),
    Relationship(RelId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

#[derive(Default)]
struct Graph {
    nodes: Vec<Node>,
    index: HashMap<Node, usize>,
    /// `precursors[i]` must come before `nodes[i]`.
    precursors: Vec<Vec<usize>>,
}

impl Graph {
    fn node(&mut self, node: Node) -> usize {
        if let Some(&i) = self.index.get(&node) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(node);
        self.index.insert(node, i);
        self.precursors.push(Vec::new());
        i
    }

    fn edge(&mut self, before: Node, after: Node) {
        let after = self.node(after);
        let before = self.node(before);
        if !self.precursors[after].contains(&before) {
            self.precursors[after].push(before);
        }
    }

    fn visit(
        &self,
        i: usize,
        marks: &mut [Mark],
        out: &mut Vec<Node>,
    ) -> Result<(), usize> {
        match marks[i] {
            Mark::Done => return Ok(()),
            Mark::Visiting => return Err(i),
            Mark::Unvisited => {}
        }
        marks[i] = Mark::Visiting;
        for &p in &self.precursors[i] {
            self.visit(p, marks, out)?;
        }
        marks[i] = Mark::Done;
        out.push(self.nodes[i]);
        Ok(())
    }

    fn sort(&self) -> Result<Vec<Node>, Node> {
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut out = Vec::with_capacity(self.nodes.len());
        for i in 0..self.nodes.len() {
            self.visit(i, &mut marks, &mut out)
                .map_err(|cycle| self.nodes[cycle])?;
        }
        Ok(out)
    }
}

/// Relationships of `model` in an order where everything a relationship
/// depends on comes first.
pub fn topsort(model: &EntityModel, resolved: &ResolvedPaths) -> Result<Vec<RelId>, L2pError> {
    let mut graph = Graph::default();

    for rel in model.relationships() {
        let r = model.relationship(rel);
        graph.edge(Node::Entity(r.target), Node::Relationship(rel));

        for &s in &model.entity(r.source).relationships {
            if model.relationship(s).identifying {
                graph.edge(Node::Relationship(s), Node::Entity(r.source));
            }
        }

        for referenced in resolved[rel].relationships() {
            graph.edge(Node::Relationship(referenced), Node::Relationship(rel));
        }
    }

    let order = graph.sort().map_err(|node| L2pError::CyclicDependency {
        node: match node {
            Node::Entity(e) => model.entity(e).name.clone(),
            Node::Relationship(r) => model.relationship_label(r),
        },
    })?;

    Ok(order
        .into_iter()
        .filter_map(|node| match node {
            Node::Relationship(r) => Some(r),
            Node::Entity(_) => None,
        })
        .collect())
}
