use crate::config::Config;
use crate::ir::{Entity, RelationshipKind, derive_relationships};
use crate::layout::{EdgePath, TreeLayout, compute_edge_paths, compute_layout};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Everything a renderer needs for one pass, in a stable JSON shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub generations: Vec<i32>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    /// Ids present in the input that received no position this pass.
    pub hidden: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub label: String,
    pub generation: i32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub kind: RelationshipKind,
    pub points: Vec<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &TreeLayout, edges: &[EdgePath], entities: &[Entity]) -> Self {
        let by_id: HashMap<&str, &Entity> = entities.iter().map(|e| (e.id.as_str(), e)).collect();

        let nodes = layout
            .positions
            .iter()
            .map(|(id, pos)| {
                let size = layout.sizes.get(id).copied().unwrap_or_default();
                let entity = by_id.get(id.as_str());
                NodeDump {
                    id: id.clone(),
                    label: entity
                        .map(|e| e.display_name().to_string())
                        .unwrap_or_else(|| id.clone()),
                    generation: entity.map(|e| e.generation).unwrap_or_default(),
                    x: pos.x,
                    y: pos.y,
                    width: size.width,
                    height: size.height,
                }
            })
            .collect();

        let edges = edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                kind: edge.kind,
                points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
            })
            .collect();

        let hidden = entities
            .iter()
            .filter(|e| !layout.is_positioned(&e.id))
            .map(|e| e.id.clone())
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            generations: layout.generations.clone(),
            nodes,
            edges,
            hidden,
        }
    }
}

/// Runs a full layout pass over `entities` and packages the result.
pub fn build_layout_dump(entities: &[Entity], config: &Config) -> LayoutDump {
    let layout = compute_layout(entities, &config.layout, config.canvas.size());
    let relationships = derive_relationships(entities);
    let edges = compute_edge_paths(&layout.positions, &relationships, &layout.sizes);
    tracing::info!(
        nodes = layout.positions.len(),
        edges = edges.len(),
        "layout computed"
    );
    LayoutDump::from_layout(&layout, &edges, entities)
}

pub fn write_layout_dump_to<W: Write>(writer: W, dump: &LayoutDump) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, dump)?;
    Ok(())
}

pub fn write_layout_dump(path: &Path, dump: &LayoutDump) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    write_layout_dump_to(writer, dump)
}
