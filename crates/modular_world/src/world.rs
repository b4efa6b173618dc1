//! Multi-chunk world.
//!
//! Chunks tile the XZ plane; Y is not chunked. Each chunk owns a solver over
//! a shared catalog. A new chunk is stitched against its loaded cardinal
//! neighbors before solving, and once solved those neighbors re-resolve the
//! variants on the edge they share with it.

use crate::blueprint::BlueprintSource;
use crate::chunk::Chunk;
use crate::error::WorldError;
use crate::stitch::{EdgePacket, EdgeSide};
use crate::ChunkCoord;
use glam::{IVec2, IVec3};
use log::{debug, info, warn};
use modular_core::{
    active_layer_heights, Catalog, Cell, Direction, ModuleId, NeighborProvider, SocketId,
    SolveOutcome, Solver, SolverConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub chunk_size: [i32; 3],
    /// Chunks generated on each side of the center
    pub view_distance: i32,
    pub solver: SolverConfig,
    /// Restrict new chunks' boundary cells to what solved neighbors allow
    pub stitch_edges: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: [8, 4, 8],
            view_distance: 1,
            solver: SolverConfig::default(),
            stitch_edges: true,
        }
    }
}

/// Outcome of one chunk during [`World::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkReport {
    pub coord: ChunkCoord,
    pub outcome: SolveOutcome,
    pub attempts: u32,
}

/// Global cell lookup over a set of loaded chunks.
pub struct WorldNeighbors<'a> {
    chunks: &'a HashMap<ChunkCoord, Chunk>,
    chunk_size: IVec3,
}

impl<'a> WorldNeighbors<'a> {
    pub fn new(chunks: &'a HashMap<ChunkCoord, Chunk>, chunk_size: IVec3) -> Self {
        Self { chunks, chunk_size }
    }

    pub fn cell(&self, global: IVec3) -> Option<&'a Cell> {
        let (coord, local) = split_global(global, self.chunk_size);
        self.chunks.get(&coord)?.solver().cell_at(local)
    }
}

impl NeighborProvider for WorldNeighbors<'_> {
    fn socket_toward(&self, global: IVec3, face: Direction) -> Option<SocketId> {
        let (coord, local) = split_global(global, self.chunk_size);
        let solver = self.chunks.get(&coord)?.solver();
        let module = solver.cell_at(local)?.module()?;
        Some(solver.catalog()?.module(module)?.socket(face))
    }
}

/// Chunk coordinate and local position of a global position.
pub fn split_global(global: IVec3, chunk_size: IVec3) -> (ChunkCoord, IVec3) {
    let coord = IVec2::new(
        global.x.div_euclid(chunk_size.x),
        global.z.div_euclid(chunk_size.z),
    );
    let local = IVec3::new(
        global.x.rem_euclid(chunk_size.x),
        global.y,
        global.z.rem_euclid(chunk_size.z),
    );
    (coord, local)
}

/// Global position of a chunk's local (0, 0, 0).
pub fn chunk_origin(coord: ChunkCoord, chunk_size: IVec3) -> IVec3 {
    IVec3::new(coord.x * chunk_size.x, 0, coord.y * chunk_size.z)
}

/// Per-chunk seed derived from the world seed.
fn chunk_seed(seed: u64, coord: ChunkCoord) -> u64 {
    let packed = ((coord.x as u32 as u64) << 32) | coord.y as u32 as u64;
    seed ^ packed.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

pub struct World {
    config: WorldConfig,
    chunk_size: IVec3,
    catalog: Arc<Catalog>,
    chunks: HashMap<ChunkCoord, Chunk>,
    blueprints: Option<Box<dyn BlueprintSource>>,
}

impl World {
    pub fn new(config: WorldConfig, catalog: Arc<Catalog>) -> Result<Self, WorldError> {
        let [x, y, z] = config.chunk_size;
        if x <= 0 || y <= 0 || z <= 0 {
            return Err(WorldError::InvalidChunkSize(config.chunk_size));
        }
        Ok(Self {
            chunk_size: IVec3::new(x, y, z),
            config,
            catalog,
            chunks: HashMap::new(),
            blueprints: None,
        })
    }

    pub fn with_blueprints(mut self, source: Box<dyn BlueprintSource>) -> Self {
        self.blueprints = Some(source);
        self
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn chunk_size(&self) -> IVec3 {
        self.chunk_size
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn neighbors(&self) -> WorldNeighbors<'_> {
        WorldNeighbors::new(&self.chunks, self.chunk_size)
    }

    /// Cell at a global position, if its chunk is loaded.
    pub fn global_cell(&self, global: IVec3) -> Option<&Cell> {
        self.neighbors().cell(global)
    }

    pub fn global_module(&self, global: IVec3) -> Option<ModuleId> {
        self.global_cell(global).and_then(Cell::module)
    }

    /// Create every missing chunk within `view_distance` of `center`.
    pub fn generate(&mut self, center: ChunkCoord) -> Result<Vec<ChunkReport>, WorldError> {
        let r = self.config.view_distance.max(0);
        let mut reports = Vec::new();
        for dx in -r..=r {
            for dz in -r..=r {
                let coord = center + IVec2::new(dx, dz);
                if self.chunks.contains_key(&coord) {
                    continue;
                }
                reports.push(self.create_chunk(coord)?);
            }
        }
        let failed = reports
            .iter()
            .filter(|r| r.outcome == SolveOutcome::Failure)
            .count();
        info!(
            "generated {} chunks around ({}, {}), {} failed",
            reports.len(),
            center.x,
            center.y,
            failed
        );
        Ok(reports)
    }

    /// Build, stitch and solve the chunk at `coord`, replacing any loaded one.
    pub fn create_chunk(&mut self, coord: ChunkCoord) -> Result<ChunkReport, WorldError> {
        self.chunks.remove(&coord);

        let mut solver_config = self.config.solver.clone();
        if let Some(seed) = solver_config.seed {
            solver_config.seed = Some(chunk_seed(seed, coord));
        }
        let mut solver = Solver::new(solver_config);
        solver.set_origin(chunk_origin(coord, self.chunk_size));

        let mut blueprint = self.blueprints.as_mut().map(|s| s.blueprint(coord));
        if let Some(stitcher) = blueprint.as_mut().and_then(|b| b.stitchable_mut()) {
            stitcher.clear_stitching();
            for side in EdgeSide::ALL {
                let neighbor = coord + side.chunk_offset();
                let data = self
                    .chunks
                    .get(&neighbor)
                    .and_then(Chunk::blueprint)
                    .and_then(|b| b.stitchable())
                    .and_then(|s| s.edge_data(side.opposite()));
                if let Some(data) = data {
                    debug!(
                        "stitching {} edge of ({}, {}) with ({}, {})",
                        side, coord.x, coord.y, neighbor.x, neighbor.y
                    );
                    stitcher.inject_edge_data(&data.mirrored(), side);
                }
            }
        }

        let layers = blueprint
            .as_mut()
            .map(|b| b.layers(self.chunk_size))
            .unwrap_or_default();
        let strict = blueprint.as_ref().is_some_and(|b| b.strict_layers());
        let active = if strict && !layers.is_empty() {
            Some(active_layer_heights(&layers))
        } else {
            None
        };

        solver.initialize(self.chunk_size, self.catalog.clone(), active.as_deref())?;
        solver.apply_layers(&layers)?;

        if self.config.stitch_edges {
            for side in EdgeSide::ALL {
                let Some(neighbor) = self.chunks.get(&(coord + side.chunk_offset())) else {
                    continue;
                };
                if !neighbor.is_solved() {
                    continue;
                }
                let packet = EdgePacket::from_solver(neighbor.solver(), side.opposite());
                packet.inject(&mut solver, &self.catalog)?;
            }
        }

        let outcome = solver.run(&self.neighbors())?;
        let attempts = solver.stats().attempts;
        if outcome == SolveOutcome::Failure {
            warn!(
                "chunk ({}, {}) failed after {} attempts",
                coord.x, coord.y, attempts
            );
        }

        let mut chunk = Chunk::new(coord, solver, blueprint);
        chunk.set_outcome(outcome);
        self.chunks.insert(coord, chunk);

        if outcome == SolveOutcome::Success {
            self.refresh_neighbors(coord)?;
        }

        Ok(ChunkReport {
            coord,
            outcome,
            attempts,
        })
    }

    /// Re-resolve variants on the edges cardinal neighbors share with `coord`.
    pub fn refresh_neighbors(&mut self, coord: ChunkCoord) -> Result<(), WorldError> {
        if !self.chunks.contains_key(&coord) {
            return Err(WorldError::ChunkNotLoaded(coord));
        }
        for side in EdgeSide::ALL {
            let neighbor_coord = coord + side.chunk_offset();
            // taken out so the rest of the world stays readable while it updates
            let Some(mut neighbor) = self.chunks.remove(&neighbor_coord) else {
                continue;
            };
            let result = if neighbor.is_solved() {
                let provider = WorldNeighbors::new(&self.chunks, self.chunk_size);
                neighbor
                    .solver_mut()
                    .refresh_boundary(side.opposite().direction(), &provider)
                    .map(|_| ())
            } else {
                Ok(())
            };
            self.chunks.insert(neighbor_coord, neighbor);
            result?;
        }
        Ok(())
    }

    pub fn unload(&mut self, coord: ChunkCoord) -> bool {
        self.chunks.remove(&coord).is_some()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("chunk_size", &self.chunk_size)
            .field("chunks", &self.chunks.len())
            .field("blueprints", &self.blueprints.is_some())
            .finish()
    }
}
