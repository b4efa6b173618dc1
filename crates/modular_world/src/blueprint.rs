//! Blueprints: per-chunk producers of forced build layers.
//!
//! A [`BlueprintSource`] hands out one [`Blueprint`] per chunk. The world
//! lets a stitchable blueprint read its loaded neighbors' edge anchors, then
//! asks it for the layers it wants forced into the chunk's solver.

use crate::stitch::{EdgeAnchors, EdgeSide, NeighborStitchable};
use crate::ChunkCoord;
use glam::IVec3;
use modular_core::{BuildLayer, DotNetRandom, ForcedPlacementMap, ModuleId, SolverRng};
use std::collections::HashMap;

pub trait Blueprint {
    /// Build layers for a chunk of `size`.
    fn layers(&mut self, size: IVec3) -> Vec<BuildLayer>;

    /// When true only the layers' Y levels get cells.
    fn strict_layers(&self) -> bool {
        false
    }

    fn stitchable(&self) -> Option<&dyn NeighborStitchable> {
        None
    }

    fn stitchable_mut(&mut self) -> Option<&mut dyn NeighborStitchable> {
        None
    }
}

pub trait BlueprintSource {
    fn blueprint(&mut self, coord: ChunkCoord) -> Box<dyn Blueprint>;
}

/// A straight path of one module crossing each chunk along X.
///
/// The path enters on the left edge and leaves on the right edge at the
/// same row. Without stitched neighbors the row comes from the chunk
/// coordinate and seed; with them it continues the neighbor's row.
#[derive(Debug, Clone)]
pub struct PathBlueprint {
    coord: ChunkCoord,
    module: ModuleId,
    y: i32,
    seed: i32,
    row: Option<i32>,
    injected: HashMap<EdgeSide, EdgeAnchors>,
}

impl PathBlueprint {
    pub fn new(coord: ChunkCoord, module: ModuleId, y: i32, seed: i32) -> Self {
        Self {
            coord,
            module,
            y,
            seed,
            row: None,
            injected: HashMap::new(),
        }
    }

    /// Row chosen by the last `layers` call.
    pub fn row(&self) -> Option<i32> {
        self.row
    }

    fn stitched_row(&self) -> Option<i32> {
        let from_left = self
            .injected
            .get(&EdgeSide::Left)
            .and_then(|a| a.starts.first().copied());
        let from_right = self
            .injected
            .get(&EdgeSide::Right)
            .and_then(|a| a.ends.first().copied());
        from_left.or(from_right)
    }
}

impl Blueprint for PathBlueprint {
    fn layers(&mut self, size: IVec3) -> Vec<BuildLayer> {
        let row = match self.stitched_row() {
            Some(row) => row.clamp(0, size.z - 1),
            None => {
                let key = IVec3::new(self.coord.x, self.seed, self.coord.y);
                DotNetRandom::for_position(key).next_int_max(size.z)
            }
        };
        self.row = Some(row);

        let mut map = ForcedPlacementMap::new(size.x, size.z);
        for x in 0..size.x {
            map.set(x, row, Some(self.module));
        }
        vec![BuildLayer::new("path", self.y, map)]
    }

    fn stitchable(&self) -> Option<&dyn NeighborStitchable> {
        Some(self)
    }

    fn stitchable_mut(&mut self) -> Option<&mut dyn NeighborStitchable> {
        Some(self)
    }
}

impl NeighborStitchable for PathBlueprint {
    fn edge_data(&self, side: EdgeSide) -> Option<EdgeAnchors> {
        let row = self.row?;
        match side {
            EdgeSide::Left => Some(EdgeAnchors {
                starts: vec![row],
                ends: Vec::new(),
            }),
            EdgeSide::Right => Some(EdgeAnchors {
                starts: Vec::new(),
                ends: vec![row],
            }),
            EdgeSide::Back | EdgeSide::Front => None,
        }
    }

    fn inject_edge_data(&mut self, data: &EdgeAnchors, side: EdgeSide) {
        self.injected.insert(side, data.clone());
    }

    fn clear_stitching(&mut self) {
        self.injected.clear();
    }
}

/// Hands every chunk a [`PathBlueprint`].
#[derive(Debug, Clone, Copy)]
pub struct PathBlueprintSource {
    pub module: ModuleId,
    pub y: i32,
    pub seed: i32,
}

impl BlueprintSource for PathBlueprintSource {
    fn blueprint(&mut self, coord: ChunkCoord) -> Box<dyn Blueprint> {
        Box::new(PathBlueprint::new(coord, self.module, self.y, self.seed))
    }
}
