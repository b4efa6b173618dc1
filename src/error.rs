use modular_core::{CatalogError, SolveError};
use modular_world::WorldError;
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Catalog(CatalogError),
    Solve(SolveError),
    World(WorldError),
    /// A flag value that parsed but makes no sense
    Usage(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "io error: {}", e),
            CliError::Json(e) => write!(f, "json error: {}", e),
            CliError::Catalog(e) => write!(f, "catalog error: {}", e),
            CliError::Solve(e) => write!(f, "solve error: {}", e),
            CliError::World(e) => write!(f, "world error: {}", e),
            CliError::Usage(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Catalog(e) => Some(e),
            CliError::Solve(e) => Some(e),
            CliError::World(e) => Some(e),
            CliError::Usage(_) => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        CliError::Catalog(e)
    }
}

impl From<SolveError> for CliError {
    fn from(e: SolveError) -> Self {
        CliError::Solve(e)
    }
}

impl From<WorldError> for CliError {
    fn from(e: WorldError) -> Self {
        CliError::World(e)
    }
}
