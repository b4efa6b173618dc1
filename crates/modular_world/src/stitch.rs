//! Edge stitching between adjacent chunks.
//!
//! Two kinds of data cross a chunk seam:
//! - [`EdgePacket`]: the collapsed modules along a solved chunk's edge. The
//!   chunk being created restricts its own boundary cells to what those
//!   modules allow toward it, so the seam stays arc consistent.
//! - [`EdgeAnchors`]: a blueprint generator's own boundary points (path
//!   starts and ends), exchanged through [`NeighborStitchable`] before the
//!   blueprint builds its layers.

use crate::ChunkCoord;
use glam::{IVec2, IVec3};
use log::trace;
use modular_core::{Catalog, Direction, ModuleId, SolveError, Solver};
use serde::{Deserialize, Serialize};

/// One horizontal edge of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeSide {
    /// -X
    Left,
    /// +X
    Right,
    /// -Z
    Back,
    /// +Z
    Front,
}

impl EdgeSide {
    pub const ALL: [EdgeSide; 4] = [
        EdgeSide::Left,
        EdgeSide::Right,
        EdgeSide::Back,
        EdgeSide::Front,
    ];

    pub fn opposite(self) -> EdgeSide {
        match self {
            EdgeSide::Left => EdgeSide::Right,
            EdgeSide::Right => EdgeSide::Left,
            EdgeSide::Back => EdgeSide::Front,
            EdgeSide::Front => EdgeSide::Back,
        }
    }

    /// Outward direction of this edge.
    pub fn direction(self) -> Direction {
        match self {
            EdgeSide::Left => Direction::NegX,
            EdgeSide::Right => Direction::PosX,
            EdgeSide::Back => Direction::NegZ,
            EdgeSide::Front => Direction::PosZ,
        }
    }

    /// Offset to the chunk across this edge.
    pub fn chunk_offset(self) -> ChunkCoord {
        match self {
            EdgeSide::Left => IVec2::new(-1, 0),
            EdgeSide::Right => IVec2::new(1, 0),
            EdgeSide::Back => IVec2::new(0, -1),
            EdgeSide::Front => IVec2::new(0, 1),
        }
    }

    /// Local position of the boundary cell at (`along`, `y`) on this edge.
    pub fn boundary_position(self, along: i32, y: i32, size: IVec3) -> IVec3 {
        match self {
            EdgeSide::Left => IVec3::new(0, y, along),
            EdgeSide::Right => IVec3::new(size.x - 1, y, along),
            EdgeSide::Back => IVec3::new(along, y, 0),
            EdgeSide::Front => IVec3::new(along, y, size.z - 1),
        }
    }

    /// Coordinate along the edge: z for Left/Right, x for Back/Front.
    pub fn along(self, pos: IVec3) -> i32 {
        match self {
            EdgeSide::Left | EdgeSide::Right => pos.z,
            EdgeSide::Back | EdgeSide::Front => pos.x,
        }
    }
}

impl std::fmt::Display for EdgeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EdgeSide::Left => "left",
            EdgeSide::Right => "right",
            EdgeSide::Back => "back",
            EdgeSide::Front => "front",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeEntry {
    pub along: i32,
    pub y: i32,
    pub module: ModuleId,
}

/// Collapsed modules on one edge of a solved chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgePacket {
    pub side: EdgeSide,
    pub entries: Vec<EdgeEntry>,
}

impl EdgePacket {
    /// Collect the collapsed boundary cells of `solver` on `side`.
    pub fn from_solver(solver: &Solver, side: EdgeSide) -> Self {
        let entries = solver
            .grid()
            .map(|grid| {
                grid.face_indices(side.direction())
                    .into_iter()
                    .filter_map(|i| {
                        let cell = grid.cell(i);
                        cell.module().map(|module| EdgeEntry {
                            along: side.along(cell.position()),
                            y: cell.position().y,
                            module,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { side, entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restrict the facing boundary of `solver` to what this edge allows.
    ///
    /// The packet describes the neighbor's `side`; the receiving chunk lies
    /// beyond it, so its `side.opposite()` cells get
    /// `module.allowed[side.direction()]`. Returns how many cells shrank.
    pub fn inject(&self, solver: &mut Solver, catalog: &Catalog) -> Result<usize, SolveError> {
        let size = solver.size().ok_or(SolveError::NotInitialized)?;
        let my_side = self.side.opposite();
        let toward_me = self.side.direction();
        let mut shrank = 0;

        for entry in &self.entries {
            let Some(module) = catalog.module(entry.module) else {
                return Err(SolveError::UnknownModule(entry.module));
            };
            let pos = my_side.boundary_position(entry.along, entry.y, size);
            if solver.restrict(pos, module.allowed(toward_me))? {
                shrank += 1;
            }
        }
        trace!(
            "{} edge entries injected on {}, {} cells narrowed",
            self.entries.len(),
            my_side,
            shrank
        );
        Ok(shrank)
    }
}

/// Boundary points of a blueprint generator on one edge, as offsets along it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeAnchors {
    pub starts: Vec<i32>,
    pub ends: Vec<i32>,
}

impl EdgeAnchors {
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty() && self.ends.is_empty()
    }

    /// What the chunk across the seam should use: its starts are my ends
    /// and the other way round.
    pub fn mirrored(&self) -> EdgeAnchors {
        EdgeAnchors {
            starts: self.ends.clone(),
            ends: self.starts.clone(),
        }
    }
}

/// A blueprint generator that can line up its features with a neighbor's.
pub trait NeighborStitchable {
    /// Anchors currently on `side`.
    fn edge_data(&self, side: EdgeSide) -> Option<EdgeAnchors>;

    /// Accept a neighbor's anchors for my `side` (already mirrored).
    fn inject_edge_data(&mut self, data: &EdgeAnchors, side: EdgeSide);

    /// Drop injected anchors before a fresh build.
    fn clear_stitching(&mut self);
}
