use crate::ir::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Card sizes used when an entity record carries no size of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeStyle {
    Compact,
    #[default]
    Standard,
    Detailed,
}

impl NodeStyle {
    pub fn default_size(self) -> Size {
        match self {
            NodeStyle::Compact => Size::new(80.0, 40.0),
            NodeStyle::Standard => Size::new(120.0, 60.0),
            NodeStyle::Detailed => Size::new(160.0, 90.0),
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "compact" => Some(Self::Compact),
            "standard" => Some(Self::Standard),
            "detailed" => Some(Self::Detailed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Gap between sibling subtrees under the same parent group.
    pub sibling_spacing: f32,
    /// Gap between members of one spouse group.
    pub spouse_spacing: f32,
    /// Gap between independent root subtrees.
    pub branch_spacing: f32,
    /// Vertical distance between consecutive generation rows.
    pub generation_height: f32,
    pub padding_left: f32,
    pub padding_top: f32,
    /// Number of generation rows kept, counted from the topmost one.
    pub max_depth: Option<usize>,
    pub node_style: NodeStyle,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sibling_spacing: 40.0,
            spouse_spacing: 20.0,
            branch_spacing: 80.0,
            generation_height: 160.0,
            padding_left: 50.0,
            padding_top: 50.0,
            max_depth: None,
            node_style: NodeStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
}

impl CanvasConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: f32::INFINITY,
            height: f32::INFINITY,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EditConfig {
    pub max_history_size: usize,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            max_history_size: 50,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub canvas: CanvasConfig,
    pub edit: EditConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    sibling_spacing: Option<f32>,
    spouse_spacing: Option<f32>,
    branch_spacing: Option<f32>,
    generation_height: Option<f32>,
    padding_left: Option<f32>,
    padding_top: Option<f32>,
    max_depth: Option<usize>,
    node_style: Option<NodeStyle>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanvasConfigFile {
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditConfigFile {
    max_history_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    layout: Option<LayoutConfigFile>,
    canvas: Option<CanvasConfigFile>,
    #[serde(alias = "history")]
    edit: Option<EditConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;
    apply_config_file(&mut config, parsed);
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn apply_config_file(config: &mut Config, parsed: ConfigFile) {
    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.sibling_spacing {
            config.layout.sibling_spacing = v;
        }
        if let Some(v) = layout.spouse_spacing {
            config.layout.spouse_spacing = v;
        }
        if let Some(v) = layout.branch_spacing {
            config.layout.branch_spacing = v;
        }
        if let Some(v) = layout.generation_height {
            config.layout.generation_height = v;
        }
        if let Some(v) = layout.padding_left {
            config.layout.padding_left = v;
        }
        if let Some(v) = layout.padding_top {
            config.layout.padding_top = v;
        }
        if layout.max_depth.is_some() {
            config.layout.max_depth = layout.max_depth;
        }
        if let Some(v) = layout.node_style {
            config.layout.node_style = v;
        }
    }

    if let Some(canvas) = parsed.canvas {
        if let Some(v) = canvas.width {
            config.canvas.width = v;
        }
        if let Some(v) = canvas.height {
            config.canvas.height = v;
        }
    }

    if let Some(edit) = parsed.edit
        && let Some(v) = edit.max_history_size
    {
        config.edit.max_history_size = v;
    }
}
