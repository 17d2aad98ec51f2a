use lineage_rs::config::{Config, NodeStyle};
use lineage_rs::layout_dump::build_layout_dump;
use lineage_rs::persist::from_json;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeLayoutOptions {
    width: Option<f32>,
    height: Option<f32>,
    max_depth: Option<usize>,
    style: Option<String>,
    sibling_spacing: Option<f32>,
    spouse_spacing: Option<f32>,
    generation_height: Option<f32>,
}

fn build_config(options: TreeLayoutOptions) -> Result<Config, String> {
    let mut config = Config::default();
    if let Some(width) = options.width {
        config.canvas.width = width;
    }
    if let Some(height) = options.height {
        config.canvas.height = height;
    }
    if options.max_depth.is_some() {
        config.layout.max_depth = options.max_depth;
    }
    if let Some(style) = options.style {
        config.layout.node_style =
            NodeStyle::from_token(&style).ok_or_else(|| format!("unknown style `{style}`"))?;
    }
    if let Some(spacing) = options.sibling_spacing {
        config.layout.sibling_spacing = spacing;
    }
    if let Some(spacing) = options.spouse_spacing {
        config.layout.spouse_spacing = spacing;
    }
    if let Some(height) = options.generation_height {
        config.layout.generation_height = height;
    }
    Ok(config)
}

fn layout_json(entities_json: &str, options_json: Option<&str>) -> Result<String, String> {
    let options = match options_json {
        Some(raw) => {
            serde_json::from_str::<TreeLayoutOptions>(raw).map_err(|error| error.to_string())?
        }
        None => TreeLayoutOptions::default(),
    };
    let config = build_config(options)?;
    let entities = from_json(entities_json).map_err(|error| error.to_string())?;
    let dump = build_layout_dump(&entities, &config);
    serde_json::to_string(&dump).map_err(|error| error.to_string())
}

/// Lays out an entity document and returns the layout dump as JSON.
#[wasm_bindgen]
pub fn compute_tree_layout(
    entities_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    layout_json(entities_json, options_json.as_deref()).map_err(|error| JsValue::from_str(&error))
}

#[cfg(test)]
mod tests {
    use crate::layout_json;

    #[test]
    fn lays_out_a_small_family() {
        let entities = r#"[
            { "id": "a", "spouseIds": ["b"], "name": "Ada" },
            { "id": "b" },
            { "id": "c", "generation": 1, "parentIds": ["a", "b"] }
        ]"#;
        let out = layout_json(entities, Some(r#"{ "style": "compact" }"#))
            .expect("family should lay out");
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(value["nodes"][0]["label"], "Ada");
        assert_eq!(value["nodes"][0]["width"], 80.0);
    }

    #[test]
    fn bad_options_are_reported() {
        assert!(layout_json("[]", Some(r#"{ "style": "huge" }"#)).is_err());
        assert!(layout_json("not json", None).is_err());
    }
}
