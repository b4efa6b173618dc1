//! Post-collapse variant selection.
//!
//! Runs once after a successful solve, and again on one face when a
//! neighboring chunk appears. Each collapsed cell whose module declares
//! variants keeps the variants whose height gate and neighbor-socket rules
//! pass, then picks one by weight with a generator seeded from the cell's
//! global position. Domains and collapse flags are never touched.

use crate::catalog::{Catalog, Variant};
use crate::direction::Direction;
use crate::grid::GridStore;
use crate::rng::DotNetRandom;
use crate::selection::weighted_index;
use crate::socket::SocketId;
use glam::IVec3;

/// Read-only view of cells outside the local grid.
pub trait NeighborProvider {
    /// Socket the collapsed cell at `global` exposes on `face`.
    ///
    /// `None` when no such cell is known; callers treat that as air.
    fn socket_toward(&self, global: IVec3, face: Direction) -> Option<SocketId>;
}

/// Provider for a standalone grid: nothing exists outside it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNeighbors;

impl NeighborProvider for NoNeighbors {
    fn socket_toward(&self, _global: IVec3, _face: Direction) -> Option<SocketId> {
        None
    }
}

/// Socket facing back at `pos` from its neighbor in `direction`.
fn neighbor_socket(
    grid: &GridStore,
    catalog: &Catalog,
    origin: IVec3,
    pos: IVec3,
    direction: Direction,
    neighbors: &dyn NeighborProvider,
) -> SocketId {
    let npos = pos + direction.offset();
    let face = direction.opposite();
    if grid.in_bounds(npos) {
        grid.get(npos)
            .and_then(|c| c.module())
            .and_then(|m| catalog.module(m))
            .map(|m| m.socket(face))
            .unwrap_or(SocketId::AIR)
    } else {
        neighbors
            .socket_toward(origin + npos, face)
            .unwrap_or(SocketId::AIR)
    }
}

fn variant_passes(
    variant: &Variant,
    grid: &GridStore,
    catalog: &Catalog,
    origin: IVec3,
    pos: IVec3,
    neighbors: &dyn NeighborProvider,
) -> bool {
    variant.allows_height(pos.y)
        && variant.rules.iter().all(|rule| {
            rule.passes(neighbor_socket(
                grid,
                catalog,
                origin,
                pos,
                rule.direction,
                neighbors,
            ))
        })
}

/// Choose variants for the cells at `indices`. Returns how many got one.
pub(crate) fn resolve_cells(
    grid: &mut GridStore,
    catalog: &Catalog,
    origin: IVec3,
    neighbors: &dyn NeighborProvider,
    indices: &[usize],
) -> usize {
    // Decide everything against a stable grid, then write.
    let mut choices: Vec<(usize, Option<usize>)> = Vec::with_capacity(indices.len());
    let mut passing: Vec<usize> = Vec::new();
    let mut weights: Vec<f64> = Vec::new();

    for &index in indices {
        let cell = grid.cell(index);
        let Some(module) = cell.module().and_then(|m| catalog.module(m)) else {
            continue;
        };
        if module.variants().is_empty() {
            continue;
        }
        let pos = cell.position();

        passing.clear();
        passing.extend(
            module
                .variants()
                .iter()
                .enumerate()
                .filter(|(_, v)| variant_passes(v, grid, catalog, origin, pos, neighbors))
                .map(|(i, _)| i),
        );

        let choice = if passing.is_empty() {
            None
        } else {
            weights.clear();
            weights.extend(passing.iter().map(|&i| module.variants()[i].weight as f64));
            let mut rng = DotNetRandom::for_position(origin + pos);
            let pick = weighted_index(&weights, &mut rng).unwrap_or(0);
            Some(passing[pick])
        };
        choices.push((index, choice));
    }

    let mut assigned = 0;
    for (index, choice) in choices {
        if choice.is_some() {
            assigned += 1;
        }
        grid.cell_mut(index).set_variant(choice);
    }
    assigned
}
