use crate::config::{Config, NodeStyle, load_config};
use crate::ir::Entity;
use crate::layout_dump::{build_layout_dump, write_layout_dump, write_layout_dump_to};
use crate::persist::{load_entities, read_entities};
use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "lineage", version, about = "Lay out a family or org tree as JSON positions and edge paths")]
pub struct Args {
    /// Input entity document (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Canvas width; omit for an unconstrained canvas
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Canvas height; omit for an unconstrained canvas
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Number of generation rows to lay out, counted from the top
    #[arg(short = 'd', long = "maxDepth", alias = "max-depth")]
    pub max_depth: Option<usize>,

    /// Card size preset for entities without an explicit size
    #[arg(short = 's', long = "style", value_parser = parse_style)]
    pub style: Option<NodeStyle>,
}

fn parse_style(token: &str) -> std::result::Result<NodeStyle, String> {
    NodeStyle::from_token(token)
        .ok_or_else(|| format!("unknown style `{token}` (expected compact, standard or detailed)"))
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = resolve_config(&args)?;
    let entities = read_input(args.input.as_deref())?;

    let dump = build_layout_dump(&entities, &config);
    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, &dump)?,
        None => write_layout_dump_to(io::stdout().lock(), &dump)?,
    }
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.canvas.width = width;
    }
    if let Some(height) = args.height {
        config.canvas.height = height;
    }
    if args.max_depth.is_some() {
        config.layout.max_depth = args.max_depth;
    }
    if let Some(style) = args.style {
        config.layout.node_style = style;
    }
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<Vec<Entity>> {
    match path {
        Some(path) if path != Path::new("-") => load_entities(path),
        _ => read_entities(io::stdin().lock()),
    }
}
