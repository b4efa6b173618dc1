//! The resumable solver: grid, constraints, scheduling and retries.
//!
//! A solve is a sequence of attempts. Each attempt resets the grid, re-applies
//! the persistent constraints, then repeatedly collapses the lowest cell with
//! the fewest candidates and propagates. A contradiction ends the attempt;
//! the solve fails after `max_retries + 1` of them. On success the variant
//! pass runs once and the completion callback fires once.
//!
//! [`Solver::step`] does a bounded amount of work so a host loop can
//! interleave solving with other work; [`Solver::run`] drives it to the end.

use crate::catalog::Catalog;
use crate::cell::Cell;
use crate::config::{SolverConfig, ZeroWeightPolicy};
use crate::constraints::{apply_force, BuildLayer, ConstraintSet, ForceOutcome};
use crate::direction::Direction;
use crate::domain::{ModuleId, ModuleSet};
use crate::error::SolveError;
use crate::grid::GridStore;
use crate::propagator::{PropagationReport, Propagator};
use crate::rng::{SolverRng, StdRandom};
use crate::selection::{module_weight, weighted_index};
use crate::variant::{resolve_cells, NeighborProvider};
use glam::IVec3;
use log::{debug, error, info, trace, warn};
use std::sync::Arc;

/// Result of one [`Solver::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Budget spent, more work remains
    Running,
    Success,
    /// Every attempt ended in contradiction
    Failure,
}

/// Final result of [`Solver::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    Success,
    Failure,
}

/// Lifecycle of a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverPhase {
    /// `initialize` not called yet
    Uninitialized,
    /// Grid built, no attempt in flight
    Ready,
    Running,
    Succeeded,
    Failed,
}

/// Counters for the current (or last) solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Attempts started, including the current one
    pub attempts: u32,
    /// Weighted collapses across all attempts
    pub collapses: usize,
    pub propagation_visits: usize,
    pub removed_candidates: usize,
    /// Collapses that fell back to the first candidate of an all-zero-weight domain
    pub zero_weight_fallbacks: usize,
}

impl SolveStats {
    fn absorb(&mut self, report: PropagationReport) {
        self.propagation_visits += report.visits;
        self.removed_candidates += report.removed;
    }
}

/// Per-attempt bookkeeping. Everything else an attempt touches is reset
/// from scratch when the next one starts.
#[derive(Debug, Clone, Copy)]
struct Attempt {
    number: u32,
    collapses: usize,
}

/// Outcome of one scheduling step inside an attempt.
enum Advance {
    Collapsed,
    Complete,
    Contradiction,
}

/// State that exists once `initialize` has been called.
struct Loaded {
    catalog: Arc<Catalog>,
    grid: GridStore,
    propagator: Propagator,
}

type FinishedCallback = Box<dyn FnMut(&GridStore)>;

pub struct Solver {
    config: SolverConfig,
    rng: Box<dyn SolverRng>,
    loaded: Option<Loaded>,
    constraints: ConstraintSet,
    origin: IVec3,
    phase: SolverPhase,
    attempt: Option<Attempt>,
    stats: SolveStats,
    on_finished: Option<FinishedCallback>,
    candidates: Vec<ModuleId>,
    weights: Vec<f64>,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        let rng = Box::new(StdRandom::from_optional_seed(config.seed));
        Self {
            config,
            rng,
            loaded: None,
            constraints: ConstraintSet::default(),
            origin: IVec3::ZERO,
            phase: SolverPhase::Uninitialized,
            attempt: None,
            stats: SolveStats::default(),
            on_finished: None,
            candidates: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Replace the random source used for selection and collapse.
    pub fn with_rng(mut self, rng: Box<dyn SolverRng>) -> Self {
        self.rng = rng;
        self
    }

    /// Global position of local cell (0, 0, 0). Seeds variant choice and
    /// translates out-of-grid lookups.
    pub fn set_origin(&mut self, origin: IVec3) {
        self.origin = origin;
    }

    pub fn origin(&self) -> IVec3 {
        self.origin
    }

    /// Called with the finished grid once per successful solve.
    pub fn on_finished<F>(&mut self, callback: F)
    where
        F: FnMut(&GridStore) + 'static,
    {
        self.on_finished = Some(Box::new(callback));
    }

    /// (Re)build the grid for `size`. Only Y levels in `active_layers`
    /// get cells when given. Clears all recorded constraints.
    pub fn initialize(
        &mut self,
        size: IVec3,
        catalog: Arc<Catalog>,
        active_layers: Option<&[i32]>,
    ) -> Result<(), SolveError> {
        let grid = GridStore::build(size, catalog.len(), active_layers)?;
        let propagator = Propagator::new(grid.len(), catalog.len());
        debug!(
            "initialized {}x{}x{} grid: {} cells, {} modules",
            size.x,
            size.y,
            size.z,
            grid.len(),
            catalog.len()
        );
        self.loaded = Some(Loaded {
            catalog,
            grid,
            propagator,
        });
        self.constraints.clear();
        self.phase = SolverPhase::Ready;
        self.attempt = None;
        self.stats = SolveStats::default();
        Ok(())
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn phase(&self) -> SolverPhase {
        self.phase
    }

    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    /// Number of the attempt in flight (or the last one), starting at 1.
    pub fn attempt_number(&self) -> Option<u32> {
        self.attempt.map(|a| a.number)
    }

    /// Collapses made by the attempt in flight (or the last one).
    pub fn attempt_collapses(&self) -> usize {
        self.attempt.map(|a| a.collapses).unwrap_or(0)
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn catalog(&self) -> Option<&Arc<Catalog>> {
        self.loaded.as_ref().map(|l| &l.catalog)
    }

    pub fn grid(&self) -> Option<&GridStore> {
        self.loaded.as_ref().map(|l| &l.grid)
    }

    pub fn size(&self) -> Option<IVec3> {
        self.grid().map(GridStore::size)
    }

    /// Cell at local `pos`, if the grid has one there.
    pub fn cell_at(&self, pos: IVec3) -> Option<&Cell> {
        self.grid().and_then(|g| g.get(pos))
    }

    /// Module chosen at local `pos`, once collapsed.
    pub fn module_at(&self, pos: IVec3) -> Option<ModuleId> {
        self.cell_at(pos).and_then(Cell::module)
    }

    /// Record `module` as forced at `pos` and apply it to the live grid
    /// if the cell still allows it.
    pub fn force_collapse(
        &mut self,
        pos: IVec3,
        module: ModuleId,
    ) -> Result<ForceOutcome, SolveError> {
        self.prepare_constraint_change()?;
        let loaded = self.loaded.as_mut().ok_or(SolveError::NotInitialized)?;
        if !loaded.catalog.contains(module) {
            return Err(SolveError::UnknownModule(module));
        }

        self.constraints.force(pos, module);
        let outcome = apply_force(loaded.grid.get_mut(pos), module);
        match outcome {
            ForceOutcome::Applied => {
                if let Some(i) = loaded.grid.index_of(pos) {
                    loaded.propagator.enqueue(i);
                }
            }
            ForceOutcome::Deferred => {
                debug!("forced {} at {} deferred", module, pos);
            }
        }
        Ok(outcome)
    }

    /// Record a persistent domain restriction at `pos`. Every attempt
    /// intersects the cell's domain with `modules` before solving.
    pub fn restrict(&mut self, pos: IVec3, modules: &ModuleSet) -> Result<bool, SolveError> {
        self.prepare_constraint_change()?;
        let loaded = self.loaded.as_mut().ok_or(SolveError::NotInitialized)?;
        let allowed = ModuleSet::from_ids(loaded.catalog.len(), modules.iter());

        let shrank = match loaded.grid.get_mut(pos) {
            Some(cell) => cell.restrict(&allowed),
            None => false,
        };
        if shrank {
            if let Some(i) = loaded.grid.index_of(pos) {
                loaded.propagator.enqueue(i);
            }
        }
        self.constraints.restrict(pos, allowed);
        Ok(shrank)
    }

    /// Force every placement of every active layer.
    pub fn apply_layers(&mut self, layers: &[BuildLayer]) -> Result<usize, SolveError> {
        let mut applied = 0;
        for layer in layers {
            for (pos, module) in layer.placements() {
                if self.force_collapse(pos, module)? == ForceOutcome::Applied {
                    applied += 1;
                }
            }
        }
        Ok(applied)
    }

    /// Forget every forced module and restriction.
    pub fn clear_constraints(&mut self) -> Result<(), SolveError> {
        self.prepare_constraint_change()?;
        self.constraints.clear();
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.grid.reset();
            loaded.propagator.clear();
        }
        Ok(())
    }

    /// Back to `Ready` so the next `step` starts a fresh solve.
    pub fn restart(&mut self) -> Result<(), SolveError> {
        let loaded = self.loaded.as_mut().ok_or(SolveError::NotInitialized)?;
        loaded.grid.reset();
        loaded.propagator.clear();
        self.phase = SolverPhase::Ready;
        self.attempt = None;
        Ok(())
    }

    fn prepare_constraint_change(&mut self) -> Result<(), SolveError> {
        match self.phase {
            SolverPhase::Uninitialized => Err(SolveError::NotInitialized),
            SolverPhase::Running => Err(SolveError::RunInProgress),
            SolverPhase::Succeeded | SolverPhase::Failed => self.restart(),
            SolverPhase::Ready => Ok(()),
        }
    }

    /// Do at most `budget` collapse steps (at least one).
    pub fn step(
        &mut self,
        budget: usize,
        neighbors: &dyn NeighborProvider,
    ) -> Result<StepStatus, SolveError> {
        match self.phase {
            SolverPhase::Uninitialized => return Err(SolveError::NotInitialized),
            SolverPhase::Succeeded => return Ok(StepStatus::Success),
            SolverPhase::Failed => return Ok(StepStatus::Failure),
            SolverPhase::Ready => self.start_solve()?,
            SolverPhase::Running => {}
        }

        for _ in 0..budget.max(1) {
            match self.advance()? {
                Advance::Collapsed => {}
                Advance::Complete => {
                    self.finish(neighbors)?;
                    return Ok(StepStatus::Success);
                }
                Advance::Contradiction => {
                    let number = self.attempt.map(|a| a.number).unwrap_or(1);
                    let max = self.config.max_attempts();
                    warn!("contradiction on attempt {}/{}", number, max);
                    if number >= max {
                        error!("no solution after {} attempts", max);
                        self.phase = SolverPhase::Failed;
                        return Ok(StepStatus::Failure);
                    }
                    self.begin_attempt(number + 1)?;
                }
            }
        }
        Ok(StepStatus::Running)
    }

    /// Step until the solve ends, `yield_every` steps at a time.
    pub fn run(&mut self, neighbors: &dyn NeighborProvider) -> Result<SolveOutcome, SolveError> {
        let budget = self.config.yield_every.max(1);
        loop {
            match self.step(budget, neighbors)? {
                StepStatus::Running => continue,
                StepStatus::Success => return Ok(SolveOutcome::Success),
                StepStatus::Failure => return Ok(SolveOutcome::Failure),
            }
        }
    }

    /// Re-run variant selection on the cells of one grid face.
    pub fn refresh_boundary(
        &mut self,
        direction: Direction,
        neighbors: &dyn NeighborProvider,
    ) -> Result<usize, SolveError> {
        let origin = self.origin;
        let loaded = self.loaded.as_mut().ok_or(SolveError::NotInitialized)?;
        let face = loaded.grid.face_indices(direction);
        let assigned = resolve_cells(
            &mut loaded.grid,
            &loaded.catalog,
            origin,
            neighbors,
            &face,
        );
        trace!("refreshed {} face: {} variants", direction, assigned);
        Ok(assigned)
    }

    fn start_solve(&mut self) -> Result<(), SolveError> {
        let loaded = self.loaded.as_ref().ok_or(SolveError::NotInitialized)?;
        info!(
            "solving {} cells with {} modules ({} forced, {} restricted)",
            loaded.grid.len(),
            loaded.catalog.len(),
            self.constraints.forced_len(),
            self.constraints.restricted_len()
        );
        self.stats = SolveStats::default();
        self.phase = SolverPhase::Running;
        self.begin_attempt(1)
    }

    /// Reset the grid and re-apply constraints: restrictions first, then
    /// forced modules one at a time with propagation in between.
    fn begin_attempt(&mut self, number: u32) -> Result<(), SolveError> {
        let loaded = self.loaded.as_mut().ok_or(SolveError::NotInitialized)?;
        let Loaded {
            catalog,
            grid,
            propagator,
        } = loaded;
        let catalog: &Catalog = catalog;

        grid.reset();
        propagator.clear();
        self.attempt = Some(Attempt {
            number,
            collapses: 0,
        });
        self.stats.attempts = number;

        for (pos, allowed) in self.constraints.restrictions() {
            if let Some(i) = grid.index_of(pos) {
                if grid.cell_mut(i).restrict(allowed) {
                    propagator.enqueue(i);
                }
            }
        }
        self.stats.absorb(propagator.propagate(grid, catalog));

        for (pos, module) in self.constraints.forced() {
            match apply_force(grid.get_mut(pos), module) {
                ForceOutcome::Applied => {
                    if let Some(i) = grid.index_of(pos) {
                        propagator.enqueue(i);
                    }
                    self.stats.absorb(propagator.propagate(grid, catalog));
                }
                ForceOutcome::Deferred => {
                    debug!(
                        "attempt {}: forced {} at {} not applicable",
                        number, module, pos
                    );
                }
            }
        }
        Ok(())
    }

    /// Pick one cell, collapse it and propagate.
    fn advance(&mut self) -> Result<Advance, SolveError> {
        let loaded = self.loaded.as_mut().ok_or(SolveError::NotInitialized)?;
        let Loaded {
            catalog,
            grid,
            propagator,
        } = loaded;
        let catalog: &Catalog = catalog;

        // Lowest y, then fewest candidates, then a uniform pick among ties
        let mut best: Option<(usize, i32, usize)> = None;
        let mut ties = 0usize;
        let mut any_open = false;
        for (i, cell) in grid.iter().enumerate() {
            if cell.is_collapsed() {
                continue;
            }
            any_open = true;
            let entropy = cell.entropy();
            if entropy == 0 {
                // cannot recover within this attempt
                return Ok(Advance::Contradiction);
            }
            let key = (cell.position().y, entropy);
            match best {
                Some((_, y, e)) if key > (y, e) => {}
                Some((_, y, e)) if key == (y, e) => {
                    ties += 1;
                    if self.rng.next_usize_max(ties) == 0 {
                        best = Some((i, key.0, key.1));
                    }
                }
                _ => {
                    best = Some((i, key.0, key.1));
                    ties = 1;
                }
            }
        }

        let Some((index, _, _)) = best else {
            return Ok(if any_open {
                Advance::Contradiction
            } else {
                Advance::Complete
            });
        };

        let cell = grid.cell(index);
        let pos = cell.position();
        let height = grid.size().y;
        self.candidates.clear();
        self.candidates.extend(cell.domain().iter());
        self.weights.clear();
        for &m in &self.candidates {
            let w = catalog
                .module(m)
                .map(|module| module_weight(module, cell, height))
                .unwrap_or(0.0);
            self.weights.push(w);
        }

        let chosen = match weighted_index(&self.weights, self.rng.as_mut()) {
            Some(i) => self.candidates[i],
            None => match self.config.zero_weight_policy {
                ZeroWeightPolicy::FirstCandidate => {
                    debug!(
                        "all {} candidates at {} weigh zero, taking the first",
                        self.candidates.len(),
                        pos
                    );
                    self.stats.zero_weight_fallbacks += 1;
                    self.candidates[0]
                }
                ZeroWeightPolicy::Contradiction => {
                    debug!("all candidates at {} weigh zero", pos);
                    return Ok(Advance::Contradiction);
                }
            },
        };
        trace!(
            "collapse {} to {} ({} candidates)",
            pos,
            chosen,
            self.candidates.len()
        );

        grid.cell_mut(index).collapse_to(chosen);
        propagator.enqueue(index);
        self.stats.absorb(propagator.propagate(grid, catalog));
        self.stats.collapses += 1;
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.collapses += 1;
        }
        Ok(Advance::Collapsed)
    }

    fn finish(&mut self, neighbors: &dyn NeighborProvider) -> Result<(), SolveError> {
        let origin = self.origin;
        let loaded = self.loaded.as_mut().ok_or(SolveError::NotInitialized)?;
        let all: Vec<usize> = (0..loaded.grid.len()).collect();
        let variants = resolve_cells(&mut loaded.grid, &loaded.catalog, origin, neighbors, &all);

        self.phase = SolverPhase::Succeeded;
        info!(
            "solved after {} attempt(s): {} collapses, {} variants",
            self.stats.attempts, self.stats.collapses, variants
        );
        if let Some(callback) = self.on_finished.as_mut() {
            callback(&loaded.grid);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("phase", &self.phase)
            .field("origin", &self.origin)
            .field("size", &self.size())
            .field("stats", &self.stats)
            .finish()
    }
}
