//! Error types for catalog construction and solver misuse.
//!
//! Contradictions are not errors: a failed attempt is an ordinary outcome
//! reported through `StepStatus`/`SolveOutcome`. The enums here cover bad
//! input data and calls made in the wrong order.

use crate::domain::ModuleId;
use glam::IVec3;
use std::fmt;

/// Error type for building a module catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// Two modules share a name
    DuplicateModule(String),
    /// An explicit neighbor list names a module that does not exist
    UnknownNeighbor { module: String, neighbor: String },
    /// Spawn weight is negative or not finite
    InvalidSpawnWeight { module: String, weight: f32 },
    /// A variant is malformed
    InvalidVariant {
        module: String,
        variant: String,
        reason: String,
    },
    /// More modules or sockets than the ID space allows
    TooMany(&'static str),
    /// The catalog document could not be parsed
    Parse(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::DuplicateModule(name) => write!(f, "duplicate module name '{}'", name),
            CatalogError::UnknownNeighbor { module, neighbor } => {
                write!(
                    f,
                    "module '{}' lists unknown neighbor '{}'",
                    module, neighbor
                )
            }
            CatalogError::InvalidSpawnWeight { module, weight } => {
                write!(f, "module '{}' has invalid spawn weight {}", module, weight)
            }
            CatalogError::InvalidVariant {
                module,
                variant,
                reason,
            } => write!(
                f,
                "variant '{}' of module '{}' is invalid: {}",
                variant, module, reason
            ),
            CatalogError::TooMany(what) => write!(f, "too many {} for the ID space", what),
            CatalogError::Parse(msg) => write!(f, "catalog parse error: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse(e.to_string())
    }
}

/// Error type for structural misuse of the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// `initialize` has not been called
    NotInitialized,
    /// Constraints can only change between runs
    RunInProgress,
    /// Module ID is not part of the active catalog
    UnknownModule(ModuleId),
    /// Every grid axis must be at least 1
    InvalidSize(IVec3),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::NotInitialized => write!(f, "solver used before initialize()"),
            SolveError::RunInProgress => {
                write!(f, "constraints cannot change while a run is in progress")
            }
            SolveError::UnknownModule(id) => write!(f, "module {} is not in the catalog", id),
            SolveError::InvalidSize(size) => write!(f, "invalid grid size {}", size),
        }
    }
}

impl std::error::Error for SolveError {}
