//! Modular WFC core: fills a sparse 3D grid with compatible building modules.
//!
//! The pieces, leaves first:
//! - [`catalog`]: modules, sockets and per-direction compatibility
//! - [`grid`] and [`cell`]: sparse per-position domains
//! - [`propagator`]: breadth-first domain narrowing
//! - [`solver`]: collapse scheduling, retries and constraint injection
//! - [`variant`]: post-collapse visual variant selection
//!
//! ```ignore
//! use modular_core::{Catalog, NoNeighbors, Solver, SolverConfig};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(Catalog::from_json_str(json)?);
//! let mut solver = Solver::new(SolverConfig::default().with_seed(7));
//! solver.initialize(glam::IVec3::new(8, 4, 8), catalog, None)?;
//! let outcome = solver.run(&NoNeighbors)?;
//! ```

pub mod catalog;
pub mod cell;
pub mod config;
pub mod constraints;
pub mod direction;
pub mod domain;
pub mod error;
pub mod grid;
pub mod propagator;
pub mod rng;
pub mod selection;
pub mod socket;
pub mod solver;
pub mod variant;

pub use catalog::{
    Catalog, CatalogDef, FaceSockets, Module, ModuleDef, ModuleRole, NeighborOverrides, Variant,
    VariantDef, VariantRule,
};
pub use cell::Cell;
pub use config::{SolverConfig, ZeroWeightPolicy};
pub use constraints::{active_layer_heights, BuildLayer, ForceOutcome, ForcedPlacementMap};
pub use direction::Direction;
pub use domain::{ModuleId, ModuleSet};
pub use error::{CatalogError, SolveError};
pub use grid::GridStore;
pub use rng::{DotNetRandom, SolverRng, StdRandom};
pub use socket::SocketId;
pub use solver::{SolveOutcome, SolveStats, Solver, SolverPhase, StepStatus};
pub use variant::{NeighborProvider, NoNeighbors};

/// Re-export so hosts can name positions without depending on glam directly.
pub use glam::IVec3;
