//! Canonical rendering and digest of a (compiled) model.
//!
//! The rendering lists entity types, attributes and relationships in
//! declaration order, with every relationship's path text, constraints and
//! implementation. Two compilations of the same logical model must render
//! identically, so the digest is a cheap determinism check.
//!
//! - algorithm: **FNV-1a 64-bit** over the UTF-8 rendering
//! - output: `"fnv1a64:<16 lowercase hex digits>"`
//!
//! This is an identity tool, not a security primitive.

use crate::model::{Component, EntityModel};

/// Prefix used in serialized digests.
pub const PHYSICAL_DIGEST_V1_PREFIX: &str = "fnv1a64:";

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x00000100000001b3;

    let mut hash = FNV_OFFSET_BASIS;
    for b in bytes {
        hash ^= (*b) as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn hops(model: &EntityModel, components: &[Component]) -> String {
    components
        .iter()
        .map(|c| model.relationship_label(c.relationship))
        .collect::<Vec<_>>()
        .join("/")
}

/// Text form of the physical schema.
pub fn render_physical(model: &EntityModel) -> String {
    let mut out = String::new();
    out.push_str(&format!("model {}\n", model.name));

    for (_, ty) in model.entity_types() {
        out.push_str(&format!("type {}\n", ty.name));

        for &attr in &ty.attributes {
            let a = model.attribute(attr);
            let key = if a.identifying { " key" } else { "" };
            out.push_str(&format!("  attr {} {}{key}\n", a.name, a.ty));
        }

        for &rel in &ty.relationships {
            let r = model.relationship(rel);
            let key = if r.identifying { " key" } else { "" };
            out.push_str(&format!(
                "  rel {} -> {}{key}\n",
                r.name,
                model.entity(r.target).name
            ));
            if !r.path.is_empty() {
                out.push_str(&format!("    path {}\n", r.path));
            }
            for c in &r.constraints {
                out.push_str(&format!(
                    "    constraint {} = {}\n",
                    hops(model, &c.diagonal),
                    hops(model, &c.riser)
                ));
            }
            for imp in r.implementation.iter().flatten() {
                let via = if imp.base_path.is_empty() {
                    String::new()
                } else {
                    format!(" via {}", hops(model, &imp.base_path))
                };
                out.push_str(&format!(
                    "    impl {} <- {}{via}\n",
                    model.attribute_label(imp.target),
                    model.attribute_label(imp.source)
                ));
            }
        }

        if let Some(dep) = ty.dependency {
            let seq = if dep.sequence { " sequence" } else { "" };
            out.push_str(&format!(
                "  depends {}{seq}\n",
                model.relationship(dep.relationship).name
            ));
        }
    }
    out
}

/// Digest of [`render_physical`].
pub fn physical_digest_v1(model: &EntityModel) -> String {
    let hash = fnv1a64(render_physical(model).as_bytes());
    format!("{PHYSICAL_DIGEST_V1_PREFIX}{hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::logical_to_physical;
    use crate::model::AttributeType;

    fn triangle() -> EntityModel {
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
        m.set_dependency(c, c_parent, false);
        m
    }

    #[test]
    fn fnv_matches_reference_values() {
        assert_eq!(fnv1a64(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a64(b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn digest_has_expected_prefix_and_width() {
        let d = physical_digest_v1(&triangle());
        assert!(d.starts_with(PHYSICAL_DIGEST_V1_PREFIX));
        assert_eq!(d.len(), PHYSICAL_DIGEST_V1_PREFIX.len() + 16);
    }

    #[test]
    fn rendering_shows_the_compiled_wiring() {
        let mut m = triangle();
        logical_to_physical(&mut m).unwrap();
        let text = render_physical(&m);
        assert!(text.contains("  attr parent_name string key\n"));
        assert!(text.contains("    constraint b.parent = c.parent\n"));
        assert!(text.contains("    impl c.parent_name <- b.parent_name\n"));
        assert!(text.contains("  depends parent\n"));
    }

    #[test]
    fn digest_changes_when_the_model_changes() {
        let mut m = triangle();
        let before = physical_digest_v1(&m);
        logical_to_physical(&mut m).unwrap();
        assert_ne!(before, physical_digest_v1(&m));
    }
}
