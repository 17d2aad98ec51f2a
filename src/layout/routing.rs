use std::collections::BTreeMap;

use crate::ir::{Relationship, RelationshipKind, Size};

use super::types::{EdgePath, Position};

/// Routes every relationship whose endpoints were both positioned.
///
/// Relationships touching an entity without a position (depth-limited or
/// dangling) or without a size are skipped.
pub fn compute_edge_paths(
    positions: &BTreeMap<String, Position>,
    relationships: &[Relationship],
    sizes: &BTreeMap<String, Size>,
) -> Vec<EdgePath> {
    let mut paths = Vec::with_capacity(relationships.len());
    for rel in relationships {
        let (Some(from_pos), Some(to_pos)) = (positions.get(&rel.from), positions.get(&rel.to))
        else {
            continue;
        };
        let (Some(from_size), Some(to_size)) = (sizes.get(&rel.from), sizes.get(&rel.to)) else {
            continue;
        };
        let from = (rel.from.as_str(), *from_pos, *from_size);
        let to = (rel.to.as_str(), *to_pos, *to_size);
        let path = match rel.kind {
            RelationshipKind::Spouse => route_spouse(from, to),
            RelationshipKind::ParentChild => route_parent_child(from, to),
            RelationshipKind::Generic => route_generic(from, to),
        };
        paths.push(path);
    }
    paths
}

type Endpoint<'a> = (&'a str, Position, Size);

fn center(pos: Position, size: Size) -> (f32, f32) {
    (pos.x + size.width / 2.0, pos.y + size.height / 2.0)
}

/// Left box's right edge to right box's left edge, decided by resolved x so
/// the stored direction of the link does not matter.
fn route_spouse(a: Endpoint<'_>, b: Endpoint<'_>) -> EdgePath {
    let (left, right) = if (b.1.x, b.0) < (a.1.x, a.0) {
        (b, a)
    } else {
        (a, b)
    };
    let y = left.1.y + left.2.height / 2.0;
    EdgePath {
        from: left.0.to_string(),
        to: right.0.to_string(),
        kind: RelationshipKind::Spouse,
        points: vec![(left.1.x + left.2.width, y), (right.1.x, y)],
    }
}

fn route_parent_child(parent: Endpoint<'_>, child: Endpoint<'_>) -> EdgePath {
    let (_, ppos, psize) = parent;
    let (_, cpos, csize) = child;
    let start = (ppos.x + psize.width / 2.0, ppos.y + psize.height);
    let end = (cpos.x + csize.width / 2.0, cpos.y);
    let mid_y = (start.1 + end.1) / 2.0;
    EdgePath {
        from: parent.0.to_string(),
        to: child.0.to_string(),
        kind: RelationshipKind::ParentChild,
        points: vec![start, (start.0, mid_y), (end.0, mid_y), end],
    }
}

fn route_generic(a: Endpoint<'_>, b: Endpoint<'_>) -> EdgePath {
    EdgePath {
        from: a.0.to_string(),
        to: b.0.to_string(),
        kind: RelationshipKind::Generic,
        points: vec![center(a.1, a.2), center(b.1, b.2)],
    }
}
