//! Height-biased collapse weights and weighted sampling.

use crate::catalog::{Module, ModuleRole};
use crate::cell::Cell;
use crate::rng::SolverRng;

pub const BASE_GROUND_WEIGHT: f64 = 100.0;
pub const ROOF_TOP_WEIGHT: f64 = 100_000.0;
pub const AIR_TOP_WEIGHT: f64 = 50_000.0;
pub const ROOF_HEIGHT_BIAS: f64 = 50.0;
pub const BODY_HEIGHT_BIAS: f64 = 20.0;

/// Selection weight of `module` for `cell` in a grid `grid_height` tall.
///
/// Scaled by the module's spawn weight, except Air on the top level.
pub fn module_weight(module: &Module, cell: &Cell, grid_height: i32) -> f64 {
    let y = cell.position().y;
    let top = grid_height - 1;
    let h = cell.height_ratio(grid_height);

    let role_weight = match module.role() {
        ModuleRole::Base => {
            if y == 0 {
                BASE_GROUND_WEIGHT
            } else {
                0.0
            }
        }
        ModuleRole::Roof => {
            if y == 0 {
                0.0
            } else if y == top {
                ROOF_TOP_WEIGHT
            } else {
                1.0 + ROOF_HEIGHT_BIAS * h
            }
        }
        ModuleRole::Body => {
            if y == top {
                0.0
            } else if module.supports_roof() {
                1.0 + BODY_HEIGHT_BIAS * h
            } else {
                1.0
            }
        }
        ModuleRole::Air => {
            if y == top {
                return AIR_TOP_WEIGHT;
            }
            1.0
        }
    };

    role_weight * module.spawn_weight() as f64
}

/// Pick an index with probability proportional to its weight.
///
/// Draws `r` uniformly in `[0, Σw)` and returns the first index whose
/// cumulative weight exceeds `r`. Returns `None` when the total is not
/// positive; the caller decides what an all-zero domain means.
pub fn weighted_index(weights: &[f64], rng: &mut dyn SolverRng) -> Option<usize> {
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }

    let threshold = rng.next_double() * total;
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        cumulative += w;
        last_positive = Some(i);
        if cumulative > threshold {
            return Some(i);
        }
    }
    // rounding can leave the threshold at the very top
    last_positive
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, ModuleDef};
    use crate::direction::Direction;
    use crate::domain::ModuleSet;
    use crate::rng::StdRandom;
    use glam::IVec3;

    fn at(y: i32) -> Cell {
        Cell::new(IVec3::new(0, y, 0), ModuleSet::full(5))
    }

    fn catalog() -> Catalog {
        Catalog::from_defs(&[
            ModuleDef::new("ground", ModuleRole::Base),
            ModuleDef::new("roof", ModuleRole::Roof).with_socket(Direction::NegY, "top"),
            ModuleDef::new("wall", ModuleRole::Body).with_socket(Direction::PosY, "top"),
            ModuleDef::new("post", ModuleRole::Body).with_spawn_weight(2.0),
            ModuleDef::new("air", ModuleRole::Air).with_spawn_weight(0.5),
        ])
        .unwrap()
    }

    #[test]
    fn test_role_weights() {
        let c = catalog();
        let w = |name: &str, y: i32| module_weight(c.by_name(name).unwrap(), &at(y), 5);

        assert_eq!(w("ground", 0), 100.0);
        assert_eq!(w("ground", 1), 0.0);

        assert_eq!(w("roof", 0), 0.0);
        assert_eq!(w("roof", 4), 100_000.0);
        assert_eq!(w("roof", 2), 1.0 + 50.0 * 0.5);

        assert_eq!(w("wall", 4), 0.0);
        assert_eq!(w("wall", 2), 1.0 + 20.0 * 0.5);
        assert_eq!(w("post", 2), 2.0);

        assert_eq!(w("air", 1), 0.5);
    }

    #[test]
    fn test_air_top_weight_ignores_spawn_weight() {
        let c = catalog();
        let air = c.by_name("air").unwrap();
        assert_eq!(air.spawn_weight(), 0.5);
        assert_eq!(module_weight(air, &at(4), 5), AIR_TOP_WEIGHT);
        assert_eq!(module_weight(air, &at(0), 1), AIR_TOP_WEIGHT);
        assert_eq!(module_weight(air, &at(3), 5), 0.5);
    }

    #[test]
    fn test_single_layer_grid() {
        let c = catalog();
        // y == 0 is also the top: ground rule and roof's y == 0 rule come first
        assert_eq!(module_weight(c.by_name("ground").unwrap(), &at(0), 1), 100.0);
        assert_eq!(module_weight(c.by_name("roof").unwrap(), &at(0), 1), 0.0);
        assert_eq!(module_weight(c.by_name("wall").unwrap(), &at(0), 1), 0.0);
    }

    #[test]
    fn test_weighted_index_zero_total() {
        let mut rng = StdRandom::from_u64_seed(1);
        assert_eq!(weighted_index(&[0.0, 0.0], &mut rng), None);
        assert_eq!(weighted_index(&[], &mut rng), None);
    }

    #[test]
    fn test_weighted_index_skips_zero_weights() {
        let mut rng = StdRandom::from_u64_seed(3);
        for _ in 0..200 {
            assert_eq!(weighted_index(&[0.0, 5.0, 0.0], &mut rng), Some(1));
        }
    }

    #[test]
    fn test_weighted_index_ratio() {
        let mut rng = StdRandom::from_u64_seed(99);
        let mut counts = [0usize; 2];
        for _ in 0..40_000 {
            let i = weighted_index(&[1.0, 3.0], &mut rng).unwrap();
            counts[i] += 1;
        }
        let ratio = counts[1] as f64 / counts[0] as f64;
        assert!((ratio - 3.0).abs() < 0.2, "ratio {}", ratio);
    }
}
