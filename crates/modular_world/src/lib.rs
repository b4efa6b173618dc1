//! Multi-chunk host for the modular solver.
//!
//! Chunks are independent [`modular_core::Solver`]s laid out on the XZ plane.
//! This crate maps chunk-local and global coordinates, supplies neighbor
//! lookups across chunk borders, stitches new chunks to solved ones, and
//! feeds blueprint build layers into each chunk before it solves.

pub mod blueprint;
pub mod chunk;
pub mod error;
pub mod stitch;
pub mod world;

/// Chunk position on the XZ plane (`x`, `z` stored as `x`, `y`).
pub type ChunkCoord = glam::IVec2;

pub use blueprint::{Blueprint, BlueprintSource, PathBlueprint, PathBlueprintSource};
pub use chunk::Chunk;
pub use error::WorldError;
pub use stitch::{EdgeAnchors, EdgeEntry, EdgePacket, EdgeSide, NeighborStitchable};
pub use world::{chunk_origin, split_global, ChunkReport, World, WorldConfig, WorldNeighbors};
