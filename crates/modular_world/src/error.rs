use crate::ChunkCoord;
use modular_core::SolveError;
use std::fmt;

/// Error type for world operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// A chunk solver was misused
    Solve(SolveError),
    /// The chunk is not loaded
    ChunkNotLoaded(ChunkCoord),
    /// Chunk size has a non-positive axis
    InvalidChunkSize([i32; 3]),
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::Solve(e) => write!(f, "solver error: {}", e),
            WorldError::ChunkNotLoaded(coord) => {
                write!(f, "chunk ({}, {}) is not loaded", coord.x, coord.y)
            }
            WorldError::InvalidChunkSize(size) => write!(
                f,
                "invalid chunk size {}x{}x{}",
                size[0], size[1], size[2]
            ),
        }
    }
}

impl std::error::Error for WorldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorldError::Solve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SolveError> for WorldError {
    fn from(e: SolveError) -> Self {
        WorldError::Solve(e)
    }
}
