//! # Deepwild Command Line Entry Point
//!
//! Generates caves, overworld graphs and whole worlds from the terminal.

use clap::{Parser, Subcommand};
use deepwild::generation::background::generate_new_game;
use deepwild::generation::utils::rng_from_seed;
use deepwild::{
    AreaMap, CaveGenerator, DeepwildError, DeepwildResult, GameState, GenerationConfig,
    OverworldGraphGenerator, Position,
};
use log::{error, info};
use rand::seq::SliceRandom;
use std::path::PathBuf;

/// Command line arguments for Deepwild.
#[derive(Parser, Debug)]
#[command(name = "deepwild")]
#[command(about = "Cave and overworld generation for a top-down action RPG")]
#[command(version)]
struct Args {
    /// Random seed for generation (overrides the config file)
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// JSON generation config; missing fields take defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one cave and print it
    Cave {
        /// Grid width in cells
        #[arg(long)]
        width: Option<u32>,
        /// Grid height in cells
        #[arg(long)]
        height: Option<u32>,
    },
    /// Generate an overworld graph and print its nodes and edges
    Overworld {
        /// Print the graph as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start a game and wander the overworld
    World {
        /// Number of random travels to make
        #[arg(short, long, default_value_t = 3)]
        travels: u32,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = initialize_logging(&args.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!("Starting Deepwild v{}", deepwild::VERSION);

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> DeepwildResult<()> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::from_json_file(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    match args.command {
        Command::Cave { width, height } => {
            if let Some(width) = width {
                config.map_width = width;
            }
            if let Some(height) = height {
                config.map_height = height;
            }
            run_cave(&config)
        }
        Command::Overworld { json } => run_overworld(&config, json),
        Command::World { travels } => run_world(config, travels).await,
    }
}

fn run_cave(config: &GenerationConfig) -> DeepwildResult<()> {
    config.validate()?;
    let mut rng = rng_from_seed(config.seed);
    let grid = CaveGenerator::new().generate_grid(
        config.map_width,
        config.map_height,
        &config.cave,
        &mut rng,
    )?;

    println!("{}", grid);
    println!(
        "{}x{} cave, seed {}: {} floor cells in {} regions",
        grid.width,
        grid.height,
        config.seed,
        grid.floor_count(),
        grid.regions().len()
    );
    for (index, region) in grid.regions().iter().enumerate() {
        println!(
            "  region {}: {} cells, anchor {}",
            index,
            region.len(),
            region.representative()
        );
    }
    Ok(())
}

fn run_overworld(config: &GenerationConfig, json: bool) -> DeepwildResult<()> {
    let mut rng = rng_from_seed(config.seed);
    let (graph, report) =
        OverworldGraphGenerator::new().generate_with_report(&config.overworld, &mut rng)?;

    if json {
        println!("{}", graph.export_json()?);
        return Ok(());
    }

    println!(
        "Overworld, seed {}: {} nodes, {} edges after {} attempt(s)",
        config.seed,
        graph.node_count(),
        graph.edge_count(),
        report.attempts
    );
    for node in graph.nodes() {
        let marker = if node == graph.current_node() { "*" } else { " " };
        let enemy = graph
            .node_attr(node)
            .map(|attrs| attrs.enemy_type.name())
            .unwrap_or("?");
        println!("{} {} [{}] degree {}", marker, node, enemy, graph.degree(node));
    }
    for edge in graph.edges() {
        println!("  {} -- {} ({:.2})", edge.a, edge.b, edge.weight);
    }
    Ok(())
}

async fn run_world(config: GenerationConfig, travels: u32) -> DeepwildResult<()> {
    let mut rng = rng_from_seed(config.seed);
    let mut game = generate_new_game(config).await?;
    print_area(game.current_area()?);

    for _ in 0..travels {
        let current = game.overworld().current_node();
        let neighbors: Vec<Position> = game.overworld().neighbors(current).collect();
        let next = *neighbors.choose(&mut rng).ok_or_else(|| {
            DeepwildError::InvalidTravel(format!("Node {} has no neighbours", current))
        })?;

        game.set_destination(next)?;
        print_area(game.travel()?);
        if game.reached_goal() {
            println!("Reached the goal at {}", next);
            break;
        }
    }

    print_summary(&game);
    Ok(())
}

fn print_area(area: &AreaMap) {
    println!(
        "Area {} ({}): {} floor cells, start {}, {} packs, {} enemies",
        area.node,
        area.enemy_type.name(),
        area.grid.floor_count(),
        area.player_start,
        area.clusters.len(),
        area.enemy_count()
    );
}

fn print_summary(game: &GameState) {
    println!(
        "Visited {} of {} nodes",
        game.visited_count(),
        game.overworld().node_count()
    );
}

/// Initializes logging based on the specified level.
fn initialize_logging(log_level: &str) -> DeepwildResult<()> {
    #[cfg(feature = "dev-tools")]
    {
        use tracing_subscriber::EnvFilter;

        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(log_level.to_lowercase()))
            .with_target(false)
            .try_init()
            .map_err(|e| DeepwildError::InvalidState(e.to_string()))?;
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .try_init()
            .map_err(|e| DeepwildError::InvalidState(e.to_string()))?;
    }

    Ok(())
}
