use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Record keys owned by [`Entity`] itself. Attribute maps are flattened into the
/// same JSON object, so these names cannot be used as attribute keys.
pub const RESERVED_KEYS: [&str; 6] = [
    "id",
    "generation",
    "parentIds",
    "spouseIds",
    "childIds",
    "size",
];

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A canvas with no constraint on either axis.
    pub const fn unbounded() -> Self {
        Self {
            width: f32::INFINITY,
            height: f32::INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }
}

/// A person (or org unit) in the tree.
///
/// Entities are treated as values: the edit model never mutates a stored
/// record, it builds a replacement (`Entity { field, ..old.clone() }` or the
/// `with_*` builders) and swaps it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub generation: i32,
    #[serde(default)]
    pub parent_ids: Vec<String>,
    #[serde(default)]
    pub spouse_ids: Vec<String>,
    #[serde(default)]
    pub child_ids: Vec<String>,
    #[serde(default)]
    pub size: Size,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Entity {
    pub fn new(id: impl Into<String>, generation: i32) -> Self {
        Self {
            id: id.into(),
            generation,
            parent_ids: Vec::new(),
            spouse_ids: Vec::new(),
            child_ids: Vec::new(),
            size: Size::default(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_parents<I, S>(self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parent_ids: parents.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn with_spouses<I, S>(self, spouses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            spouse_ids: spouses.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn with_children<I, S>(self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            child_ids: children.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn with_size(self, width: f32, height: f32) -> Self {
        Self {
            size: Size::new(width, height),
            ..self
        }
    }

    pub fn with_generation(self, generation: i32) -> Self {
        Self { generation, ..self }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn has_parent(&self, id: &str) -> bool {
        self.parent_ids.iter().any(|p| p == id)
    }

    pub fn has_spouse(&self, id: &str) -> bool {
        self.spouse_ids.iter().any(|s| s == id)
    }

    pub fn has_child(&self, id: &str) -> bool {
        self.child_ids.iter().any(|c| c == id)
    }

    pub fn display_name(&self) -> &str {
        self.attributes
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or(self.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipKind {
    Spouse,
    ParentChild,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub from: String,
    pub to: String,
    pub kind: RelationshipKind,
}

impl Relationship {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: RelationshipKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }
}

/// Relationships implied by the entity records themselves.
///
/// One parent→child edge per present parent, and one spouse edge per unordered
/// pair no matter whether the link is stored on one side or both. References to
/// ids outside `entities` are dropped.
pub fn derive_relationships(entities: &[Entity]) -> Vec<Relationship> {
    let present: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();
    let mut seen_pairs: HashSet<(&str, &str)> = HashSet::new();
    let mut relationships = Vec::new();

    for entity in entities {
        for parent in &entity.parent_ids {
            if present.contains(parent.as_str()) {
                relationships.push(Relationship::new(
                    parent.clone(),
                    entity.id.clone(),
                    RelationshipKind::ParentChild,
                ));
            }
        }
        for spouse in &entity.spouse_ids {
            if spouse == &entity.id || !present.contains(spouse.as_str()) {
                continue;
            }
            let key = if entity.id.as_str() < spouse.as_str() {
                (entity.id.as_str(), spouse.as_str())
            } else {
                (spouse.as_str(), entity.id.as_str())
            };
            if seen_pairs.insert(key) {
                relationships.push(Relationship::new(
                    entity.id.clone(),
                    spouse.clone(),
                    RelationshipKind::Spouse,
                ));
            }
        }
    }

    relationships
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_replace_fields() {
        let e = Entity::new("a", 1)
            .with_parents(["p"])
            .with_spouses(["s"])
            .with_size(100.0, 50.0)
            .with_attribute("name", serde_json::json!("Ada"));
        assert_eq!(e.parent_ids, vec!["p".to_string()]);
        assert!(e.has_spouse("s"));
        assert_eq!(e.size, Size::new(100.0, 50.0));
        assert_eq!(e.display_name(), "Ada");
        assert_eq!(Entity::new("b", 0).display_name(), "b");
    }

    #[test]
    fn spouse_pairs_are_deduplicated_across_storage_order() {
        let entities = vec![
            Entity::new("a", 0).with_spouses(["b"]),
            Entity::new("b", 0).with_spouses(["a"]),
            Entity::new("c", 0).with_spouses(["a"]),
        ];
        let rels = derive_relationships(&entities);
        let spouse: Vec<_> = rels
            .iter()
            .filter(|r| r.kind == RelationshipKind::Spouse)
            .collect();
        assert_eq!(spouse.len(), 2);
        assert_eq!((spouse[0].from.as_str(), spouse[0].to.as_str()), ("a", "b"));
        assert_eq!((spouse[1].from.as_str(), spouse[1].to.as_str()), ("c", "a"));
    }

    #[test]
    fn dangling_references_are_not_related() {
        let entities = vec![Entity::new("kid", 1).with_parents(["ghost", "mum"]), Entity::new("mum", 0)];
        let rels = derive_relationships(&entities);
        assert_eq!(rels, vec![Relationship::new("mum", "kid", RelationshipKind::ParentChild)]);
    }
}
