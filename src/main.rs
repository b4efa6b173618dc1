//! Headless driver: solve one grid or a square of chunks from a catalog file.

mod error;
mod report;

use clap::{Parser, Subcommand};
use error::CliError;
use glam::{IVec2, IVec3};
use log::{error, info};
use modular_core::{Catalog, NoNeighbors, SolveOutcome, Solver, SolverConfig};
use modular_world::{PathBlueprintSource, World, WorldConfig};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "modular_wfc", about = "Fill 3D grids with compatible building modules")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a single grid
    Solve {
        /// Module catalog (JSON)
        #[arg(long)]
        catalog: PathBuf,
        /// Grid size (X Y Z)
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        size: Vec<i32>,
        /// Only these Y levels get cells
        #[arg(long, num_args = 1..)]
        layers: Option<Vec<i32>>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        max_retries: Option<u32>,
        /// Solver config file (JSON), overridden by explicit flags
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write collapsed cells as JSON
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Generate a square of chunks around the origin
    World {
        #[arg(long)]
        catalog: PathBuf,
        /// Chunk size (X Y Z)
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        chunk_size: Option<Vec<i32>>,
        /// Chunks on each side of the center
        #[arg(long)]
        radius: Option<i32>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        max_retries: Option<u32>,
        /// World config file (JSON), overridden by explicit flags
        #[arg(long)]
        config: Option<PathBuf>,
        /// Force a straight path of this module through every chunk at y = 0
        #[arg(long)]
        path_module: Option<String>,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn load_catalog(path: &Path) -> Result<Arc<Catalog>, CliError> {
    let catalog = Catalog::from_json_reader(BufReader::new(File::open(path)?))?;
    info!("loaded {} modules from {}", catalog.len(), path.display());
    Ok(Arc::new(catalog))
}

fn triple(values: &[i32], flag: &str) -> Result<IVec3, CliError> {
    match values {
        [x, y, z] => Ok(IVec3::new(*x, *y, *z)),
        _ => Err(CliError::Usage(format!("--{} takes three integers", flag))),
    }
}

fn apply_overrides(config: &mut SolverConfig, seed: Option<u64>, max_retries: Option<u32>) {
    if let Some(seed) = seed {
        config.seed = Some(seed);
    }
    if let Some(max_retries) = max_retries {
        config.max_retries = max_retries;
    }
}

#[allow(clippy::too_many_arguments)]
fn solve(
    catalog: &Path,
    size: &[i32],
    layers: Option<&[i32]>,
    seed: Option<u64>,
    max_retries: Option<u32>,
    config: Option<&Path>,
    output: Option<&Path>,
) -> Result<bool, CliError> {
    let catalog = load_catalog(catalog)?;
    let size = triple(size, "size")?;
    let mut solver_config = match config {
        Some(path) => read_json::<SolverConfig>(path)?,
        None => SolverConfig::default(),
    };
    apply_overrides(&mut solver_config, seed, max_retries);

    let mut solver = Solver::new(solver_config);
    solver.initialize(size, catalog.clone(), layers)?;
    let outcome = solver.run(&NoNeighbors)?;
    let stats = solver.stats();
    info!(
        "{:?} after {} attempts, {} collapses",
        outcome, stats.attempts, stats.collapses
    );

    if let Some(grid) = solver.grid() {
        print!("{}", report::render_layers(grid, &catalog));
        if let Some(path) = output {
            let records = report::cell_records(grid, &catalog, solver.origin());
            report::write_records(path, &records)?;
            info!("wrote {} cells to {}", records.len(), path.display());
        }
    }
    Ok(outcome == SolveOutcome::Success)
}

#[allow(clippy::too_many_arguments)]
fn world(
    catalog: &Path,
    chunk_size: Option<&[i32]>,
    radius: Option<i32>,
    seed: Option<u64>,
    max_retries: Option<u32>,
    config: Option<&Path>,
    path_module: Option<&str>,
    output: Option<&Path>,
) -> Result<bool, CliError> {
    let catalog = load_catalog(catalog)?;
    let mut world_config = match config {
        Some(path) => read_json::<WorldConfig>(path)?,
        None => WorldConfig::default(),
    };
    if let Some(values) = chunk_size {
        world_config.chunk_size = triple(values, "chunk-size")?.to_array();
    }
    if let Some(radius) = radius {
        world_config.view_distance = radius;
    }
    apply_overrides(&mut world_config.solver, seed, max_retries);

    let path = match path_module {
        Some(name) => {
            let module = catalog
                .id_of(name)
                .ok_or_else(|| CliError::Usage(format!("unknown path module '{}'", name)))?;
            Some(PathBlueprintSource {
                module,
                y: 0,
                seed: world_config.solver.seed.unwrap_or(0) as i32,
            })
        }
        None => None,
    };

    let mut world = World::new(world_config, catalog.clone())?;
    if let Some(source) = path {
        world = world.with_blueprints(Box::new(source));
    }

    let mut reports = world.generate(IVec2::ZERO)?;
    reports.sort_by_key(|r| (r.coord.y, r.coord.x));
    for r in &reports {
        println!(
            "chunk ({:>3}, {:>3}): {:?} in {} attempts",
            r.coord.x, r.coord.y, r.outcome, r.attempts
        );
    }

    if let Some(path) = output {
        let mut records = Vec::new();
        for chunk in world.chunks() {
            if let Some(grid) = chunk.solver().grid() {
                records.extend(report::cell_records(grid, &catalog, chunk.origin()));
            }
        }
        records.sort_by_key(|r| (r.pos[2], r.pos[1], r.pos[0]));
        report::write_records(path, &records)?;
        info!("wrote {} cells to {}", records.len(), path.display());
    }

    Ok(reports.iter().all(|r| r.outcome == SolveOutcome::Success))
}

fn run(cli: Cli) -> Result<bool, CliError> {
    match cli.command {
        Command::Solve {
            catalog,
            size,
            layers,
            seed,
            max_retries,
            config,
            output,
        } => solve(
            &catalog,
            &size,
            layers.as_deref(),
            seed,
            max_retries,
            config.as_deref(),
            output.as_deref(),
        ),
        Command::World {
            catalog,
            chunk_size,
            radius,
            seed,
            max_retries,
            config,
            path_module,
            output,
        } => world(
            &catalog,
            chunk_size.as_deref(),
            radius,
            seed,
            max_retries,
            config.as_deref(),
            path_module.as_deref(),
            output.as_deref(),
        ),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("solve failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "modules": [
            { "name": "ground", "role": "base", "sockets": { "pos_y": "floor" } },
            { "name": "wall", "sockets": { "neg_y": "floor", "pos_y": "floor" } },
            { "name": "roof", "role": "roof", "sockets": { "neg_y": "floor" } },
            { "name": "air", "role": "air" }
        ]
    }"#;

    #[test]
    fn test_cli_parses_solve() {
        let cli = Cli::try_parse_from([
            "modular_wfc", "solve", "--catalog", "c.json", "--size", "4", "3", "4", "--layers",
            "0", "2", "--seed", "7",
        ])
        .unwrap();
        match cli.command {
            Command::Solve {
                size, layers, seed, ..
            } => {
                assert_eq!(size, vec![4, 3, 4]);
                assert_eq!(layers, Some(vec![0, 2]));
                assert_eq!(seed, Some(7));
            }
            Command::World { .. } => panic!("expected solve"),
        }
    }

    #[test]
    fn test_triple_rejects_wrong_arity() {
        assert!(matches!(triple(&[1, 2], "size"), Err(CliError::Usage(_))));
        assert_eq!(triple(&[1, 2, 3], "size").unwrap(), IVec3::new(1, 2, 3));
    }

    #[test]
    fn test_solve_and_world_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("catalog.json");
        std::fs::write(&catalog, CATALOG).unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(&config, r#"{ "seed": 1, "max_retries": 2 }"#).unwrap();
        let out = dir.path().join("out.json");

        let ok = solve(&catalog, &[3, 3, 3], None, Some(9), None, Some(&config), Some(&out))
            .unwrap();
        assert!(ok);
        let records: Vec<report::CellRecord> = read_json(&out).unwrap();
        assert_eq!(records.len(), 27);

        let world_out = dir.path().join("world.json");
        let ok = world(
            &catalog,
            Some(&[2, 3, 2]),
            Some(1),
            Some(4),
            None,
            None,
            Some("ground"),
            Some(&world_out),
        )
        .unwrap();
        assert!(ok);
        let records: Vec<report::CellRecord> = read_json(&world_out).unwrap();
        assert_eq!(records.len(), 9 * 12);
        assert!(records.iter().any(|r| r.pos == [-2, 0, -2]));
    }

    #[test]
    fn test_demo_catalog_builds_world() {
        let demos = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
        let ok = world(
            &demos.join("house.json"),
            None,
            Some(1),
            None,
            None,
            Some(&demos.join("world.json")),
            Some("path"),
            None,
        )
        .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_missing_catalog_is_io_error() {
        let err = solve(
            Path::new("/nonexistent/catalog.json"),
            &[1, 1, 1],
            None,
            None,
            None,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn test_unknown_path_module() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("catalog.json");
        std::fs::write(&catalog, CATALOG).unwrap();
        let err = world(&catalog, None, Some(0), None, None, None, Some("moat"), None)
            .unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }
}
