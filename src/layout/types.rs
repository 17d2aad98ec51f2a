use std::collections::BTreeMap;

use serde::Serialize;

use crate::ir::{RelationshipKind, Size};

/// Top-left corner of an entity box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A spouse group that was placed during the pass.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLayout {
    pub primary: String,
    pub members: Vec<String>,
    /// Left edge of the horizontal band reserved for this group's subtree.
    pub band_x: f32,
    pub subtree_width: f32,
    pub own_width: f32,
    pub row: usize,
    pub children: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeLayout {
    pub positions: BTreeMap<String, Position>,
    pub sizes: BTreeMap<String, Size>,
    /// Generations that received a row, top to bottom.
    pub generations: Vec<i32>,
    /// Placed groups keyed by primary id.
    pub groups: BTreeMap<String, GroupLayout>,
    pub width: f32,
    pub height: f32,
}

impl TreeLayout {
    pub fn empty() -> Self {
        Self {
            positions: BTreeMap::new(),
            sizes: BTreeMap::new(),
            generations: Vec::new(),
            groups: BTreeMap::new(),
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied()
    }

    pub fn is_positioned(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgePath {
    pub from: String,
    pub to: String,
    pub kind: RelationshipKind,
    pub points: Vec<(f32, f32)>,
}
