//! Flat record storage for entity lists.
//!
//! A document is a JSON array of records. Order is preserved on both read and
//! write, since spouse grouping depends on it. References are written verbatim:
//! dangling ids and one-sided spouse links survive a round trip.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;

use crate::ir::Entity;

pub fn to_json(entities: &[Entity]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(entities)
}

pub fn from_json(input: &str) -> serde_json::Result<Vec<Entity>> {
    serde_json::from_str(input)
}

pub fn read_entities<R: Read>(reader: R) -> anyhow::Result<Vec<Entity>> {
    let entities = serde_json::from_reader(reader).context("invalid entity document")?;
    Ok(entities)
}

pub fn write_entities<W: Write>(writer: W, entities: &[Entity]) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, entities)?;
    Ok(())
}

pub fn load_entities(path: &Path) -> anyhow::Result<Vec<Entity>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_entities(std::io::BufReader::new(file))
}

pub fn save_entities(path: &Path, entities: &[Entity]) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_entities(std::io::BufWriter::new(file), entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<Entity> {
        vec![
            Entity::new("a", -1)
                .with_spouses(["b"])
                .with_children(["c"])
                .with_size(120.5, 60.0)
                .with_attribute("name", json!("Alma"))
                .with_attribute("born", json!({ "year": 1880, "place": null })),
            // one-sided spouse link
            Entity::new("b", -1),
            Entity::new("c", 0).with_parents(["a", "missing"]),
        ]
    }

    #[test]
    fn round_trip_preserves_everything() {
        let entities = sample();
        let text = to_json(&entities).unwrap();
        assert_eq!(from_json(&text).unwrap(), entities);
    }

    #[test]
    fn records_are_flat() {
        let text = to_json(&sample()[..1]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let record = &value[0];
        assert_eq!(record["id"], json!("a"));
        assert_eq!(record["parentIds"], json!([]));
        assert_eq!(record["spouseIds"], json!(["b"]));
        assert_eq!(record["name"], json!("Alma"));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let entities = from_json(r#"[{ "id": "solo", "nickname": "S" }]"#).unwrap();
        assert_eq!(entities[0].generation, 0);
        assert!(entities[0].parent_ids.is_empty());
        assert!(entities[0].size.is_empty());
        assert_eq!(entities[0].attributes["nickname"], json!("S"));
    }

    #[test]
    fn reader_and_writer_agree() {
        let mut buf = Vec::new();
        write_entities(&mut buf, &sample()).unwrap();
        let back = read_entities(buf.as_slice()).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn malformed_documents_are_errors() {
        assert!(read_entities(r#"{"id": 3}"#.as_bytes()).is_err());
    }
}
