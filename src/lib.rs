#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod edit;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod persist;
pub mod worker;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{CanvasConfig, Config, EditConfig, LayoutConfig, NodeStyle, load_config};
pub use edit::{ChangeEvent, ChangeKind, EditError, EditModel};
pub use ir::{Entity, Relationship, RelationshipKind, Size, derive_relationships};
pub use layout::{EdgePath, Position, TreeLayout, compute_edge_paths, compute_layout};
pub use persist::{from_json, to_json};
