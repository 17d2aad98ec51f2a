use std::collections::{HashMap, HashSet};

use crate::ir::Entity;

/// A primary entity and the spouses it claimed, laid out side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpouseGroup {
    pub primary: String,
    pub members: Vec<String>,
}

/// Partition of the laid-out entities into spouse groups.
///
/// Group formation depends on the input order: the first entity of a couple
/// encountered becomes the primary. Membership does not depend on the order as
/// long as spouse links are stored on both sides.
#[derive(Debug, Clone, Default)]
pub struct SpouseGroups {
    pub groups: Vec<SpouseGroup>,
    by_primary: HashMap<String, usize>,
    owner: HashMap<String, usize>,
}

impl SpouseGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Index of the group `member` belongs to.
    pub fn index_of(&self, member: &str) -> Option<usize> {
        self.owner.get(member).copied()
    }

    pub fn primary_of(&self, member: &str) -> Option<&str> {
        self.index_of(member)
            .map(|idx| self.groups[idx].primary.as_str())
    }

    pub fn members(&self, primary: &str) -> Option<&[String]> {
        self.by_primary
            .get(primary)
            .map(|idx| self.groups[*idx].members.as_slice())
    }
}

/// Greedily groups each unclaimed entity with its unclaimed spouses.
///
/// Spouse ids that are not in `entities` are skipped, and a spouse listed only
/// on one side still joins the group of whoever lists it first.
pub fn build_spouse_groups(entities: &[&Entity]) -> SpouseGroups {
    let present: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();
    let mut result = SpouseGroups::default();

    for entity in entities {
        if result.owner.contains_key(&entity.id) {
            continue;
        }
        let idx = result.groups.len();
        let mut members = vec![entity.id.clone()];
        result.owner.insert(entity.id.clone(), idx);
        for spouse in &entity.spouse_ids {
            if !present.contains(spouse.as_str()) || result.owner.contains_key(spouse) {
                continue;
            }
            result.owner.insert(spouse.clone(), idx);
            members.push(spouse.clone());
        }
        result.by_primary.insert(entity.id.clone(), idx);
        result.groups.push(SpouseGroup {
            primary: entity.id.clone(),
            members,
        });
    }

    result
}
