use crate::blueprint::Blueprint;
use crate::ChunkCoord;
use glam::IVec3;
use modular_core::{SolveOutcome, Solver};

/// One independently solved grid of the world.
pub struct Chunk {
    coord: ChunkCoord,
    solver: Solver,
    blueprint: Option<Box<dyn Blueprint>>,
    outcome: Option<SolveOutcome>,
}

impl Chunk {
    pub(crate) fn new(
        coord: ChunkCoord,
        solver: Solver,
        blueprint: Option<Box<dyn Blueprint>>,
    ) -> Self {
        Self {
            coord,
            solver,
            blueprint,
            outcome: None,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Global position of local cell (0, 0, 0).
    pub fn origin(&self) -> IVec3 {
        self.solver.origin()
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    pub(crate) fn solver_mut(&mut self) -> &mut Solver {
        &mut self.solver
    }

    pub fn blueprint(&self) -> Option<&dyn Blueprint> {
        self.blueprint.as_deref()
    }

    pub fn outcome(&self) -> Option<SolveOutcome> {
        self.outcome
    }

    pub(crate) fn set_outcome(&mut self, outcome: SolveOutcome) {
        self.outcome = Some(outcome);
    }

    pub fn is_solved(&self) -> bool {
        self.outcome == Some(SolveOutcome::Success)
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("coord", &self.coord)
            .field("outcome", &self.outcome)
            .field("blueprint", &self.blueprint.is_some())
            .finish()
    }
}
