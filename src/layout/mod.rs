//! Tree layout: spouse groups, child-group claiming, subtree widths and
//! top-down placement, followed by edge routing.

pub mod groups;
pub mod hierarchy;
mod placement;
pub mod routing;
pub(crate) mod types;
pub use groups::{SpouseGroup, SpouseGroups, build_spouse_groups};
pub use hierarchy::{GroupHierarchy, resolve_child_groups, subtree_widths};
pub use routing::compute_edge_paths;
pub use types::*;

use crate::config::LayoutConfig;
use crate::ir::{Entity, Size};
use placement::{Placer, bounds, canvas_offset};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Distinct generations present, sorted top to bottom and cut to `max_depth`.
pub fn visible_generations(entities: &[Entity], max_depth: Option<usize>) -> Vec<i32> {
    let mut generations: Vec<i32> = entities.iter().map(|e| e.generation).collect();
    generations.sort_unstable();
    generations.dedup();
    if let Some(max) = max_depth {
        generations.truncate(max);
    }
    generations
}

/// Size used for layout: the record's own, or the style default when unset.
pub fn effective_size(entity: &Entity, config: &LayoutConfig) -> Size {
    if entity.size.is_empty() {
        config.node_style.default_size()
    } else {
        entity.size
    }
}

/// Parent and spouse ids that name no entity in the input.
fn count_dangling(entities: &[Entity]) -> usize {
    let present: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();
    entities
        .iter()
        .flat_map(|e| e.parent_ids.iter().chain(&e.spouse_ids))
        .filter(|id| !present.contains(id.as_str()))
        .count()
}

/// Computes positions for every entity in a visible generation.
///
/// Deterministic for a given entity order: calling it twice on the same input
/// yields identical output. Entities in generations cut by `max_depth` get no
/// position; callers treat that as "not rendered", not as an error.
pub fn compute_layout(entities: &[Entity], config: &LayoutConfig, canvas: Size) -> TreeLayout {
    let generations = visible_generations(entities, config.max_depth);
    let row_of: HashMap<i32, usize> = generations
        .iter()
        .enumerate()
        .map(|(idx, generation)| (*generation, idx))
        .collect();

    let visible: Vec<&Entity> = entities
        .iter()
        .filter(|e| row_of.contains_key(&e.generation))
        .collect();
    if visible.is_empty() {
        return TreeLayout {
            generations,
            ..TreeLayout::empty()
        };
    }

    let dangling = count_dangling(entities);
    if dangling > 0 {
        tracing::warn!(dangling, "references to unknown entities ignored");
    }

    let sizes: HashMap<&str, Size> = visible
        .iter()
        .map(|e| (e.id.as_str(), effective_size(e, config)))
        .collect();
    let by_id: HashMap<&str, &Entity> = visible.iter().map(|e| (e.id.as_str(), *e)).collect();

    let groups = build_spouse_groups(&visible);
    let hierarchy = resolve_child_groups(&visible, &groups);
    let widths = subtree_widths(&groups, &hierarchy, &sizes, config);
    let rows: Vec<usize> = groups
        .groups
        .iter()
        .map(|group| {
            by_id
                .get(group.primary.as_str())
                .and_then(|e| row_of.get(&e.generation))
                .copied()
                .unwrap_or(0)
        })
        .collect();

    let placer = Placer::new(&groups, &hierarchy, &widths, &sizes, &rows, config);
    let (mut positions, mut group_layouts) = placer.place_roots();

    let Some(bbox) = bounds(&positions, &sizes) else {
        return TreeLayout {
            generations,
            ..TreeLayout::empty()
        };
    };
    let (dx, dy) = canvas_offset(bbox, canvas, config);
    for pos in positions.values_mut() {
        pos.x += dx;
        pos.y += dy;
    }
    for group in group_layouts.values_mut() {
        group.band_x += dx;
    }

    let (_, _, max_x, max_y) = bbox;
    let mut width = max_x + dx + config.padding_left;
    let mut height = max_y + dy + config.padding_top;
    if canvas.width.is_finite() {
        width = width.max(canvas.width);
    }
    if canvas.height.is_finite() {
        height = height.max(canvas.height);
    }

    tracing::debug!(
        entities = entities.len(),
        positioned = positions.len(),
        groups = groups.len(),
        roots = hierarchy.roots.len(),
        rows = generations.len(),
        "layout pass complete"
    );

    let sizes = positions
        .keys()
        .filter_map(|id| sizes.get(id.as_str()).map(|size| (id.clone(), *size)))
        .collect::<BTreeMap<_, _>>();

    TreeLayout {
        positions,
        sizes,
        generations,
        groups: group_layouts,
        width,
        height,
    }
}
