//! Breadth-first constraint propagation.
//!
//! For each dequeued cell `c` and direction `d`, the live neighbor's domain
//! is intersected with the union of `m.allowed[d]` over every `m` still in
//! `c`'s domain. A neighbor that shrank is queued in turn. Empty domains are
//! left for the scheduler to notice.

use crate::catalog::Catalog;
use crate::direction::Direction;
use crate::domain::ModuleSet;
use crate::grid::GridStore;
use std::collections::VecDeque;

/// Work done by one [`Propagator::propagate`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Cells dequeued
    pub visits: usize,
    /// Candidates removed from neighbor domains
    pub removed: usize,
}

#[derive(Debug, Clone)]
pub struct Propagator {
    queue: VecDeque<usize>,
    /// `pending[i]` while cell `i` sits in the queue
    pending: Vec<bool>,
    /// Reused union buffer
    scratch: ModuleSet,
}

impl Propagator {
    pub fn new(cell_count: usize, module_count: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            pending: vec![false; cell_count],
            scratch: ModuleSet::empty(module_count),
        }
    }

    /// Drop everything queued.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.fill(false);
    }

    /// Queue cell `index` unless it is already pending.
    pub fn enqueue(&mut self, index: usize) {
        if let Some(flag) = self.pending.get_mut(index) {
            if !*flag {
                *flag = true;
                self.queue.push_back(index);
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Run until the queue is empty.
    pub fn propagate(&mut self, grid: &mut GridStore, catalog: &Catalog) -> PropagationReport {
        let mut report = PropagationReport::default();

        while let Some(current) = self.queue.pop_front() {
            self.pending[current] = false;
            report.visits += 1;

            for d in Direction::ALL {
                let Some(n) = grid.neighbor_index(current, d) else {
                    continue;
                };
                if grid.cell(n).is_collapsed() {
                    continue;
                }

                self.scratch.clear();
                for m in grid.cell(current).domain().iter() {
                    if let Some(module) = catalog.module(m) {
                        self.scratch.union_with(module.allowed(d));
                    }
                }

                let neighbor = grid.cell_mut(n);
                let before = neighbor.entropy();
                if neighbor.restrict(&self.scratch) {
                    report.removed += before - neighbor.entropy();
                    self.enqueue(n);
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ModuleDef, ModuleRole};
    use crate::domain::ModuleId;
    use glam::IVec3;

    /// "a" and "b" alternate along X; everything else is air.
    fn alternating() -> Catalog {
        Catalog::from_defs(&[
            ModuleDef::new("a", ModuleRole::Body)
                .with_socket(Direction::PosX, "ab")
                .with_socket(Direction::NegX, "ba"),
            ModuleDef::new("b", ModuleRole::Body)
                .with_socket(Direction::PosX, "ba")
                .with_socket(Direction::NegX, "ab"),
        ])
        .unwrap()
    }

    #[test]
    fn test_chain_reaction_along_line() {
        let catalog = alternating();
        let mut grid = GridStore::build(IVec3::new(4, 1, 1), catalog.len(), None).unwrap();
        let mut prop = Propagator::new(grid.len(), catalog.len());

        grid.cell_mut(0).collapse_to(ModuleId(0));
        prop.enqueue(0);
        let report = prop.propagate(&mut grid, &catalog);

        assert!(prop.is_idle());
        assert_eq!(report.removed, 3);
        let picks: Vec<_> = grid.iter().map(|c| c.domain().first()).collect();
        assert_eq!(
            picks,
            vec![
                Some(ModuleId(0)),
                Some(ModuleId(1)),
                Some(ModuleId(0)),
                Some(ModuleId(1))
            ]
        );
        // uncollapsed neighbors are narrowed, not collapsed
        assert!(!grid.cell(1).is_collapsed());
    }

    #[test]
    fn test_empty_queue_changes_nothing() {
        let catalog = alternating();
        let mut grid = GridStore::build(IVec3::new(3, 2, 1), catalog.len(), None).unwrap();
        let mut prop = Propagator::new(grid.len(), catalog.len());
        let before = grid.cells().to_vec();
        let report = prop.propagate(&mut grid, &catalog);
        assert_eq!(report, PropagationReport::default());
        assert_eq!(grid.cells(), &before[..]);
    }

    #[test]
    fn test_enqueue_is_deduplicated() {
        let mut prop = Propagator::new(3, 1);
        prop.enqueue(1);
        prop.enqueue(1);
        prop.enqueue(7);
        assert_eq!(prop.queued(), 1);
        prop.clear();
        assert!(prop.is_idle());
    }

    #[test]
    fn test_collapsed_neighbors_are_skipped() {
        let catalog = alternating();
        let mut grid = GridStore::build(IVec3::new(2, 1, 1), catalog.len(), None).unwrap();
        let mut prop = Propagator::new(grid.len(), catalog.len());
        grid.cell_mut(0).collapse_to(ModuleId(0));
        grid.cell_mut(1).collapse_to(ModuleId(0));
        prop.enqueue(0);
        prop.propagate(&mut grid, &catalog);
        assert_eq!(grid.cell(1).module(), Some(ModuleId(0)));
    }
}
