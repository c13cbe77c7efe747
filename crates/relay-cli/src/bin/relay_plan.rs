//! Plan relay paths or a POP backbone from a local tower file.
//!
//! Usage:
//!   relay-plan path --towers towers.geojson --start 25.3790,49.5883 --end 25.2856,49.4850
//!   relay-plan pop --towers towers.geojson --pop 25.3790,49.5883 \
//!       --dest 25.3713,49.5810 --dest 25.2856,49.4850 --topology ring

use anyhow::Result;
use clap::{Parser, Subcommand};
use relay_cli::{load_inventory, parse_coordinate, planner_config};
use relay_core::{Coordinate, Planner, Topology};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline relay tower link planner")]
struct Args {
    /// GeoJSON FeatureCollection or JSON array of towers
    #[arg(long, global = true)]
    towers: Option<PathBuf>,

    /// Maximum single-hop link distance in km
    #[arg(long, global = true)]
    link_range_km: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Point-to-point relay path
    Path {
        #[arg(long, value_parser = parse_coordinate)]
        start: Coordinate,
        #[arg(long, value_parser = parse_coordinate)]
        end: Coordinate,
    },
    /// Shared backbone from one POP to many destinations
    Pop {
        #[arg(long, value_parser = parse_coordinate)]
        pop: Coordinate,
        #[arg(long = "dest", value_parser = parse_coordinate, required = true)]
        destinations: Vec<Coordinate>,
        #[arg(long, default_value = "tree")]
        topology: Topology,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let inventory = load_inventory(args.towers.as_deref())?;
    let config = planner_config(args.link_range_km);
    tracing::info!(
        towers = inventory.len(),
        link_range_km = config.link_range_km,
        "inventory loaded"
    );
    let planner = Planner::with_config(inventory, config);

    let output = match args.command {
        Command::Path { start, end } => {
            tracing::info!(?start, ?end, "planning relay path");
            serde_json::to_string_pretty(&planner.find_path(start, end)?)?
        }
        Command::Pop {
            pop,
            destinations,
            topology,
        } => {
            tracing::info!(?pop, destinations = destinations.len(), %topology, "planning backbone");
            let report = planner.find_backbone_network(pop, &destinations, topology)?;
            serde_json::to_string_pretty(&report)?
        }
    };
    println!("{output}");
    Ok(())
}
