use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use graphspace::SpaceView;
use graphspace::config::SpaceConfig;
use graphspace::graph_file::{GraphData, PositionsFile};
use tracing::{info, warn};

/// Lay out graphs in 3D and inspect their spatial index.
#[derive(Parser)]
#[command(name = "graphspace")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Space configuration file (.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the force layout and write node positions
    Layout {
        /// Input graph file (.json)
        #[arg(short, long)]
        input: PathBuf,

        /// Output positions file (.json); printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of layout iterations
        #[arg(short = 'n', long, default_value = "100")]
        iterations: u32,

        /// Step length per iteration (overrides the configuration)
        #[arg(short, long)]
        temperature: Option<f32>,
    },
    /// Print a summary of a graph after indexing it
    Inspect {
        /// Input graph file (.json)
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SpaceConfig> {
    match path {
        Some(path) => SpaceConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(SpaceConfig::default()),
    }
}

fn load_view(input: &Path, config: SpaceConfig) -> anyhow::Result<SpaceView> {
    let graph = GraphData::from_json_file(input)
        .with_context(|| format!("failed to read graph {}", input.display()))?;
    let mut view = SpaceView::new(config);
    graph
        .load_into(&mut view)
        .with_context(|| format!("invalid graph {}", input.display()))?;
    Ok(view)
}

fn layout(
    input: &Path,
    output: Option<&Path>,
    iterations: u32,
    temperature: Option<f32>,
    config: SpaceConfig,
) -> anyhow::Result<()> {
    let mut view = load_view(input, config)?;
    if view.nodes().is_empty() {
        warn!(input = %input.display(), "graph has no nodes");
    }
    if let Some(temperature) = temperature {
        view.set_temperature(temperature);
    }

    view.set_max_iterations(iterations, true);
    view.play();
    while view.layout().can_step() {
        view.idle();
    }
    view.pause();
    view.idle();
    info!(summary = %view.summary(), "layout finished");

    let positions = PositionsFile {
        iterations: view.layout().iterations().saturating_sub(1),
        positions: view.positions(),
    };
    let json = serde_json::to_string_pretty(&positions)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Laid out {} nodes in {} iterations -> {}",
                positions.positions.len(),
                positions.iterations,
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn inspect(input: &Path, config: SpaceConfig) -> anyhow::Result<()> {
    let mut view = load_view(input, config)?;
    view.idle();

    let frustum = view.camera().frustum();
    let visible = view.query_visible(&frustum, |_| {});
    println!("{}", view.summary());
    println!("{visible} elements visible from the default camera");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Layout {
            input,
            output,
            iterations,
            temperature,
        } => layout(&input, output.as_deref(), iterations, temperature, config)?,
        Commands::Inspect { input } => inspect(&input, config)?,
    }

    Ok(())
}
