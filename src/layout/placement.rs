use std::collections::{BTreeMap, HashMap};

use crate::config::LayoutConfig;
use crate::ir::Size;

use super::groups::SpouseGroups;
use super::hierarchy::{GroupHierarchy, own_width};
use super::types::{GroupLayout, Position};

/// Inputs shared by every recursive placement call.
pub(super) struct Placer<'a> {
    pub groups: &'a SpouseGroups,
    pub hierarchy: &'a GroupHierarchy,
    pub widths: &'a [f32],
    pub sizes: &'a HashMap<&'a str, Size>,
    /// Row index of each group, by group index.
    pub rows: &'a [usize],
    pub config: &'a LayoutConfig,
    placed: Vec<bool>,
    positions: BTreeMap<String, Position>,
    layouts: BTreeMap<String, GroupLayout>,
}

impl<'a> Placer<'a> {
    pub fn new(
        groups: &'a SpouseGroups,
        hierarchy: &'a GroupHierarchy,
        widths: &'a [f32],
        sizes: &'a HashMap<&'a str, Size>,
        rows: &'a [usize],
        config: &'a LayoutConfig,
    ) -> Self {
        Self {
            groups,
            hierarchy,
            widths,
            sizes,
            rows,
            config,
            placed: vec![false; groups.len()],
            positions: BTreeMap::new(),
            layouts: BTreeMap::new(),
        }
    }

    /// Lays out every root subtree left to right, then returns the raw
    /// (untranslated) positions and group bands.
    pub fn place_roots(mut self) -> (BTreeMap<String, Position>, BTreeMap<String, GroupLayout>) {
        let hierarchy = self.hierarchy;
        let mut cursor = 0.0;
        for root in &hierarchy.roots {
            if self.placed[*root] {
                continue;
            }
            self.place_group(*root, cursor);
            cursor += self.widths[*root] + self.config.branch_spacing;
        }
        (self.positions, self.layouts)
    }

    fn place_group(&mut self, idx: usize, left_x: f32) {
        if self.placed[idx] {
            return;
        }
        self.placed[idx] = true;

        let groups = self.groups;
        let hierarchy = self.hierarchy;
        let group = &groups.groups[idx];
        let subtree = self.widths[idx];
        let own = own_width(&group.members, self.sizes, self.config);
        let row = self.rows[idx];
        let y = row as f32 * self.config.generation_height;

        let mut cursor = left_x + (subtree - own) / 2.0;
        for member in &group.members {
            let width = self
                .sizes
                .get(member.as_str())
                .map(|size| size.width)
                .unwrap_or(0.0);
            self.positions.insert(member.clone(), Position::new(cursor, y));
            cursor += width + self.config.spouse_spacing;
        }

        let kids = &hierarchy.children[idx];
        let child_primaries = kids
            .iter()
            .map(|child| groups.groups[*child].primary.clone())
            .collect();
        self.layouts.insert(
            group.primary.clone(),
            GroupLayout {
                primary: group.primary.clone(),
                members: group.members.clone(),
                band_x: left_x,
                subtree_width: subtree,
                own_width: own,
                row,
                children: child_primaries,
            },
        );

        let mut child_left = left_x;
        for child in kids {
            self.place_group(*child, child_left);
            child_left += self.widths[*child] + self.config.sibling_spacing;
        }
    }
}

/// Bounding box of all placed boxes as `(min_x, min_y, max_x, max_y)`.
pub(super) fn bounds(
    positions: &BTreeMap<String, Position>,
    sizes: &HashMap<&str, Size>,
) -> Option<(f32, f32, f32, f32)> {
    let mut iter = positions.iter();
    let (first_id, first) = iter.next()?;
    let first_size = sizes.get(first_id.as_str()).copied().unwrap_or_default();
    let mut min_x = first.x;
    let mut min_y = first.y;
    let mut max_x = first.x + first_size.width;
    let mut max_y = first.y + first_size.height;
    for (id, pos) in iter {
        let size = sizes.get(id.as_str()).copied().unwrap_or_default();
        min_x = min_x.min(pos.x);
        min_y = min_y.min(pos.y);
        max_x = max_x.max(pos.x + size.width);
        max_y = max_y.max(pos.y + size.height);
    }
    Some((min_x, min_y, max_x, max_y))
}

/// Offset that centers the content in the canvas, then keeps it clear of the
/// configured padding.
///
/// On an unconstrained axis there is nothing to center against, so the content
/// is pinned to the padding. On a constrained axis it only moves when centering
/// pushed it into the padding.
pub(super) fn canvas_offset(
    bbox: (f32, f32, f32, f32),
    canvas: Size,
    config: &LayoutConfig,
) -> (f32, f32) {
    let (min_x, min_y, max_x, max_y) = bbox;
    let dx = axis_offset(min_x, max_x, canvas.width, config.padding_left);
    let dy = axis_offset(min_y, max_y, canvas.height, config.padding_top);
    (dx, dy)
}

fn axis_offset(min: f32, max: f32, extent: f32, padding: f32) -> f32 {
    if !extent.is_finite() {
        return padding - min;
    }
    let centered = (extent - (max - min)) / 2.0 - min;
    let shifted_min = min + centered;
    if shifted_min < padding {
        centered + (padding - shifted_min)
    } else {
        centered
    }
}
