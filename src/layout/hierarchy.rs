use std::collections::{HashMap, HashSet};

use crate::config::LayoutConfig;
use crate::ir::{Entity, Size};

use super::groups::SpouseGroups;

/// Parent group → child groups, by group index.
#[derive(Debug, Clone, Default)]
pub struct GroupHierarchy {
    pub children: Vec<Vec<usize>>,
    pub roots: Vec<usize>,
}

/// Assigns every child group to exactly one parent group.
///
/// The first parent group (in group order) that references a member of a child
/// group claims it. This is a tie-break policy, not a genealogical rule: a child
/// of co-parents who sit in different spouse groups ends up under whichever
/// group comes first.
pub fn resolve_child_groups(entities: &[&Entity], groups: &SpouseGroups) -> GroupHierarchy {
    let mut children_of: HashMap<&str, Vec<&str>> = HashMap::new();
    for entity in entities {
        for parent in &entity.parent_ids {
            children_of
                .entry(parent.as_str())
                .or_default()
                .push(entity.id.as_str());
        }
    }

    let mut claimed = vec![false; groups.len()];
    let mut children = vec![Vec::new(); groups.len()];

    for (idx, group) in groups.groups.iter().enumerate() {
        let mut seen: HashSet<usize> = HashSet::new();
        for member in &group.members {
            let Some(kids) = children_of.get(member.as_str()) else {
                continue;
            };
            for kid in kids {
                let Some(child_idx) = groups.index_of(kid) else {
                    continue;
                };
                if child_idx == idx || !seen.insert(child_idx) || claimed[child_idx] {
                    continue;
                }
                claimed[child_idx] = true;
                children[idx].push(child_idx);
            }
        }
    }

    let mut roots: Vec<usize> = (0..groups.len()).filter(|idx| !claimed[*idx]).collect();

    // A cycle in the group graph leaves groups that no root reaches.
    let mut reached = vec![false; groups.len()];
    for root in &roots {
        mark_reachable(*root, &children, &mut reached);
    }
    for idx in 0..groups.len() {
        if !reached[idx] {
            tracing::warn!(group = %groups.groups[idx].primary, "group unreachable from any root, promoting");
            roots.push(idx);
            mark_reachable(idx, &children, &mut reached);
        }
    }

    GroupHierarchy { children, roots }
}

fn mark_reachable(start: usize, children: &[Vec<usize>], reached: &mut [bool]) {
    let mut stack = vec![start];
    while let Some(idx) = stack.pop() {
        if reached[idx] {
            continue;
        }
        reached[idx] = true;
        stack.extend(children[idx].iter().copied());
    }
}

/// Width of the group's own members placed side by side.
pub fn own_width(members: &[String], sizes: &HashMap<&str, Size>, config: &LayoutConfig) -> f32 {
    if members.is_empty() {
        return 0.0;
    }
    let total: f32 = members
        .iter()
        .filter_map(|id| sizes.get(id.as_str()))
        .map(|size| size.width)
        .sum();
    total + config.spouse_spacing * (members.len() as f32 - 1.0)
}

/// Horizontal space each group's subtree needs, by group index.
pub fn subtree_widths(
    groups: &SpouseGroups,
    hierarchy: &GroupHierarchy,
    sizes: &HashMap<&str, Size>,
    config: &LayoutConfig,
) -> Vec<f32> {
    let mut memo: HashMap<usize, f32> = HashMap::new();
    let mut visiting: HashSet<usize> = HashSet::new();
    for idx in 0..groups.len() {
        subtree_width(idx, groups, hierarchy, sizes, config, &mut memo, &mut visiting);
    }
    (0..groups.len())
        .map(|idx| memo.get(&idx).copied().unwrap_or(0.0))
        .collect()
}

fn subtree_width(
    idx: usize,
    groups: &SpouseGroups,
    hierarchy: &GroupHierarchy,
    sizes: &HashMap<&str, Size>,
    config: &LayoutConfig,
    memo: &mut HashMap<usize, f32>,
    visiting: &mut HashSet<usize>,
) -> f32 {
    if let Some(value) = memo.get(&idx) {
        return *value;
    }
    let own = own_width(&groups.groups[idx].members, sizes, config);
    if !visiting.insert(idx) {
        // Re-entered through a cycle: size it as a leaf.
        return own;
    }
    let kids = &hierarchy.children[idx];
    let mut width = own;
    if !kids.is_empty() {
        let mut total = 0.0;
        for child in kids {
            total += subtree_width(*child, groups, hierarchy, sizes, config, memo, visiting);
        }
        total += config.sibling_spacing * (kids.len() as f32 - 1.0);
        width = width.max(total);
    }
    visiting.remove(&idx);
    memo.insert(idx, width);
    width
}
