//! Persistent constraints re-applied at the start of every attempt.
//!
//! Two kinds are recorded per position, last write wins:
//! - forced modules (`force_collapse`), from blueprint layers and manual overrides
//! - domain restrictions (`restrict`), from chunk edge stitching
//!
//! Entries keep the order of their first write; that order is the
//! application order, so an earlier force wins against a later one it
//! contradicts.

use crate::cell::Cell;
use crate::domain::{ModuleId, ModuleSet};
use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a forced module reached the live cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceOutcome {
    /// The cell now holds exactly the forced module
    Applied,
    /// Recorded, but the cell is missing, already collapsed, or no longer
    /// allows the module. Retried at the next attempt.
    Deferred,
}

/// Ordered position-keyed map with last-write-wins semantics.
#[derive(Debug, Clone)]
struct Ordered<T> {
    entries: Vec<(IVec3, T)>,
    index: HashMap<IVec3, usize>,
}

impl<T> Default for Ordered<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Ordered<T> {
    fn insert(&mut self, pos: IVec3, value: T) {
        match self.index.get(&pos) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(pos, self.entries.len());
                self.entries.push((pos, value));
            }
        }
    }

    fn get(&self, pos: IVec3) -> Option<&T> {
        self.index.get(&pos).map(|&i| &self.entries[i].1)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    forced: Ordered<ModuleId>,
    restricted: Ordered<ModuleSet>,
}

impl ConstraintSet {
    pub fn force(&mut self, pos: IVec3, module: ModuleId) {
        self.forced.insert(pos, module);
    }

    pub fn restrict(&mut self, pos: IVec3, modules: ModuleSet) {
        self.restricted.insert(pos, modules);
    }

    pub fn forced_at(&self, pos: IVec3) -> Option<ModuleId> {
        self.forced.get(pos).copied()
    }

    /// Forced entries in application order.
    pub fn forced(&self) -> impl Iterator<Item = (IVec3, ModuleId)> + '_ {
        self.forced.entries.iter().map(|(p, m)| (*p, *m))
    }

    pub fn restrictions(&self) -> impl Iterator<Item = (IVec3, &ModuleSet)> + '_ {
        self.restricted.entries.iter().map(|(p, s)| (*p, s))
    }

    pub fn forced_len(&self) -> usize {
        self.forced.entries.len()
    }

    pub fn restricted_len(&self) -> usize {
        self.restricted.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forced.entries.is_empty() && self.restricted.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.forced.clear();
        self.restricted.clear();
    }
}

/// Collapse `cell` to `module` if it is uncollapsed and still allows it.
pub(crate) fn apply_force(cell: Option<&mut Cell>, module: ModuleId) -> ForceOutcome {
    match cell {
        Some(cell) if !cell.is_collapsed() && cell.domain().contains(module) => {
            cell.collapse_to(module);
            ForceOutcome::Applied
        }
        _ => ForceOutcome::Deferred,
    }
}

/// A 2D `width × depth` map of forced modules, one optional entry per (x, z).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlacementMap")]
pub struct ForcedPlacementMap {
    width: i32,
    depth: i32,
    cells: Vec<Option<ModuleId>>,
}

/// Unchecked serialized shape of [`ForcedPlacementMap`].
#[derive(Deserialize)]
struct RawPlacementMap {
    width: i32,
    depth: i32,
    cells: Vec<Option<ModuleId>>,
}

impl TryFrom<RawPlacementMap> for ForcedPlacementMap {
    type Error = String;

    fn try_from(raw: RawPlacementMap) -> Result<Self, Self::Error> {
        if raw.width < 0 || raw.depth < 0 {
            return Err(format!(
                "placement map size {}x{} is negative",
                raw.width, raw.depth
            ));
        }
        let expected = raw
            .width
            .checked_mul(raw.depth)
            .ok_or_else(|| format!("placement map size {}x{} overflows", raw.width, raw.depth))?;
        if raw.cells.len() != expected as usize {
            return Err(format!(
                "placement map {}x{} needs {} cells, got {}",
                raw.width,
                raw.depth,
                expected,
                raw.cells.len()
            ));
        }
        Ok(Self {
            width: raw.width,
            depth: raw.depth,
            cells: raw.cells,
        })
    }
}

impl ForcedPlacementMap {
    /// An empty map. Negative sizes clamp to 0; a size whose area overflows
    /// `i32` yields an empty 0×0 map.
    pub fn new(width: i32, depth: i32) -> Self {
        let width = width.max(0);
        let depth = depth.max(0);
        match width.checked_mul(depth) {
            Some(len) => Self {
                width,
                depth,
                cells: vec![None; len as usize],
            },
            None => Self {
                width: 0,
                depth: 0,
                cells: Vec::new(),
            },
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    fn slot(&self, x: i32, z: i32) -> Option<usize> {
        if x < 0 || z < 0 || x >= self.width || z >= self.depth {
            None
        } else {
            Some((x + z * self.width) as usize)
        }
    }

    pub fn get(&self, x: i32, z: i32) -> Option<ModuleId> {
        self.slot(x, z).and_then(|i| self.cells.get(i).copied().flatten())
    }

    /// Set or clear one entry. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: i32, z: i32, module: Option<ModuleId>) {
        if let Some(slot) = self.slot(x, z).and_then(|i| self.cells.get_mut(i)) {
            *slot = module;
        }
    }

    /// Set entries as `(x, z, module)`.
    pub fn entries(&self) -> impl Iterator<Item = (i32, i32, ModuleId)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, m)| {
            let i = i as i32;
            m.map(|m| (i % self.width, i / self.width, m))
        })
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|m| m.is_some()).count()
    }
}

/// A placement map applied at one Y level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildLayer {
    pub name: String,
    pub y_offset: i32,
    pub map: ForcedPlacementMap,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl BuildLayer {
    pub fn new(name: &str, y_offset: i32, map: ForcedPlacementMap) -> Self {
        Self {
            name: name.to_string(),
            y_offset,
            map,
            active: true,
        }
    }

    /// Grid positions and modules this layer forces; nothing when inactive.
    pub fn placements(&self) -> impl Iterator<Item = (IVec3, ModuleId)> + '_ {
        let active = self.active;
        self.map
            .entries()
            .filter(move |_| active)
            .map(move |(x, z, m)| (IVec3::new(x, self.y_offset, z), m))
    }
}

/// Y levels of the active layers, sorted and deduplicated.
pub fn active_layer_heights(layers: &[BuildLayer]) -> Vec<i32> {
    let mut ys: Vec<i32> = layers
        .iter()
        .filter(|l| l.active)
        .map(|l| l.y_offset)
        .collect();
    ys.sort_unstable();
    ys.dedup();
    ys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins_keeps_first_order() {
        let mut set = ConstraintSet::default();
        set.force(IVec3::new(1, 0, 0), ModuleId(1));
        set.force(IVec3::new(2, 0, 0), ModuleId(2));
        set.force(IVec3::new(1, 0, 0), ModuleId(3));

        assert_eq!(set.forced_len(), 2);
        assert_eq!(set.forced_at(IVec3::new(1, 0, 0)), Some(ModuleId(3)));
        let order: Vec<_> = set.forced().collect();
        assert_eq!(
            order,
            vec![
                (IVec3::new(1, 0, 0), ModuleId(3)),
                (IVec3::new(2, 0, 0), ModuleId(2))
            ]
        );

        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_apply_force() {
        let mut cell = Cell::new(IVec3::ZERO, ModuleSet::from_ids(3, [ModuleId(0), ModuleId(2)]));
        assert_eq!(apply_force(Some(&mut cell), ModuleId(1)), ForceOutcome::Deferred);
        assert!(!cell.is_collapsed());
        assert_eq!(apply_force(Some(&mut cell), ModuleId(2)), ForceOutcome::Applied);
        assert_eq!(cell.module(), Some(ModuleId(2)));
        assert_eq!(apply_force(Some(&mut cell), ModuleId(2)), ForceOutcome::Deferred);
        assert_eq!(apply_force(None, ModuleId(0)), ForceOutcome::Deferred);
    }

    #[test]
    fn test_placement_map_entries() {
        let mut map = ForcedPlacementMap::new(3, 2);
        map.set(2, 1, Some(ModuleId(4)));
        map.set(0, 0, Some(ModuleId(1)));
        map.set(5, 5, Some(ModuleId(9)));
        assert_eq!(map.count(), 2);
        assert_eq!(map.get(2, 1), Some(ModuleId(4)));
        assert_eq!(
            map.entries().collect::<Vec<_>>(),
            vec![(0, 0, ModuleId(1)), (2, 1, ModuleId(4))]
        );
    }

    #[test]
    fn test_build_layer_placements() {
        let mut map = ForcedPlacementMap::new(2, 2);
        map.set(1, 1, Some(ModuleId(0)));
        let mut layer = BuildLayer::new("floor", 3, map);
        assert_eq!(
            layer.placements().collect::<Vec<_>>(),
            vec![(IVec3::new(1, 3, 1), ModuleId(0))]
        );
        layer.active = false;
        assert_eq!(layer.placements().count(), 0);
        assert!(active_layer_heights(&[layer]).is_empty());
    }

    #[test]
    fn test_placement_map_rejects_malformed_json() {
        for json in [
            r#"{"width":2,"depth":2,"cells":[0]}"#,
            r#"{"width":0,"depth":3,"cells":[0]}"#,
            r#"{"width":1,"depth":1,"cells":[0,1,2]}"#,
            r#"{"width":-1,"depth":-2,"cells":[0,1]}"#,
            r#"{"width":65536,"depth":65536,"cells":[]}"#,
        ] {
            assert!(
                serde_json::from_str::<ForcedPlacementMap>(json).is_err(),
                "accepted {}",
                json
            );
        }

        let layer = r#"{"name":"l","y_offset":0,"map":{"width":0,"depth":3,"cells":[0]}}"#;
        assert!(serde_json::from_str::<BuildLayer>(layer).is_err());
    }

    #[test]
    fn test_placement_map_json_round_trip() {
        let map: ForcedPlacementMap =
            serde_json::from_str(r#"{"width":2,"depth":2,"cells":[null,3,null,null]}"#).unwrap();
        assert_eq!(map.get(1, 0), Some(ModuleId(3)));
        assert_eq!(map.get(1, 1), None);
        let text = serde_json::to_string(&map).unwrap();
        assert_eq!(serde_json::from_str::<ForcedPlacementMap>(&text).unwrap(), map);
    }

    #[test]
    fn test_placement_map_new_overflow_is_empty() {
        let map = ForcedPlacementMap::new(i32::MAX, 3);
        assert_eq!((map.width(), map.depth(), map.count()), (0, 0, 0));
        assert_eq!(map.get(0, 0), None);
        let map = ForcedPlacementMap::new(-4, 2);
        assert_eq!(map.entries().count(), 0);
    }
}
