//! Sparse 3D grid of cells.
//!
//! Cells live densely in a `Vec<Cell>` (z, then y, then x order). A slot
//! table over the full bounding box maps `x + y*sx + z*sx*sy` to a cell
//! index, or `None` for positions on inactive layers. Missing cells are
//! "void": they never constrain a neighbor.

use crate::cell::Cell;
use crate::direction::Direction;
use crate::domain::ModuleSet;
use crate::error::SolveError;
use glam::IVec3;

#[derive(Debug, Clone)]
pub struct GridStore {
    size: IVec3,
    cells: Vec<Cell>,
    slots: Vec<Option<usize>>,
    full: ModuleSet,
}

impl GridStore {
    /// Allocate one cell per position whose Y is in `active_layers`
    /// (every Y when `None`). Layers outside `0..size.y` are ignored.
    pub fn build(
        size: IVec3,
        module_count: usize,
        active_layers: Option<&[i32]>,
    ) -> Result<Self, SolveError> {
        if size.x <= 0 || size.y <= 0 || size.z <= 0 {
            return Err(SolveError::InvalidSize(size));
        }
        let full = ModuleSet::full(module_count);
        let volume = (size.x as usize) * (size.y as usize) * (size.z as usize);
        let mut slots = vec![None; volume];
        let mut cells = Vec::new();

        for z in 0..size.z {
            for y in 0..size.y {
                if let Some(layers) = active_layers {
                    if !layers.contains(&y) {
                        continue;
                    }
                }
                for x in 0..size.x {
                    let i = (x + y * size.x + z * size.x * size.y) as usize;
                    slots[i] = Some(cells.len());
                    cells.push(Cell::new(IVec3::new(x, y, z), full.clone()));
                }
            }
        }

        Ok(Self {
            size,
            cells,
            slots,
            full,
        })
    }

    pub fn size(&self) -> IVec3 {
        self.size
    }

    /// Number of active cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The full domain every cell starts from.
    pub fn full_domain(&self) -> &ModuleSet {
        &self.full
    }

    #[inline]
    pub fn in_bounds(&self, pos: IVec3) -> bool {
        pos.cmpge(IVec3::ZERO).all() && pos.cmplt(self.size).all()
    }

    /// Dense index of the cell at `pos`, if it exists.
    #[inline]
    pub fn index_of(&self, pos: IVec3) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        let s = self.size;
        self.slots[(pos.x + pos.y * s.x + pos.z * s.x * s.y) as usize]
    }

    pub fn get(&self, pos: IVec3) -> Option<&Cell> {
        self.index_of(pos).map(|i| &self.cells[i])
    }

    pub(crate) fn get_mut(&mut self, pos: IVec3) -> Option<&mut Cell> {
        self.index_of(pos).map(move |i| &mut self.cells[i])
    }

    #[inline]
    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    #[inline]
    pub(crate) fn cell_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Index of the neighbor of cell `index` in `direction`.
    #[inline]
    pub fn neighbor_index(&self, index: usize, direction: Direction) -> Option<usize> {
        self.index_of(self.cells[index].position() + direction.offset())
    }

    /// Every cell back to full domain, uncollapsed, no variant.
    pub fn reset(&mut self) {
        let full = &self.full;
        for cell in &mut self.cells {
            cell.reset(full);
        }
    }

    pub fn all_collapsed(&self) -> bool {
        self.cells.iter().all(Cell::is_collapsed)
    }

    /// Indices of the cells lying on the grid face in `direction`.
    pub fn face_indices(&self, direction: Direction) -> Vec<usize> {
        let max = self.size - IVec3::ONE;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                let p = c.position();
                match direction {
                    Direction::PosX => p.x == max.x,
                    Direction::NegX => p.x == 0,
                    Direction::PosY => p.y == max.y,
                    Direction::NegY => p.y == 0,
                    Direction::PosZ => p.z == max.z,
                    Direction::NegZ => p.z == 0,
                }
            })
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModuleId;

    #[test]
    fn test_build_dense() {
        let grid = GridStore::build(IVec3::new(3, 2, 4), 5, None).unwrap();
        assert_eq!(grid.len(), 24);
        assert_eq!(grid.get(IVec3::new(2, 1, 3)).unwrap().entropy(), 5);
        assert!(grid.get(IVec3::new(3, 0, 0)).is_none());
        assert!(grid.get(IVec3::new(0, -1, 0)).is_none());
        // z, y, x iteration order
        assert_eq!(grid.cell(0).position(), IVec3::ZERO);
        assert_eq!(grid.cell(1).position(), IVec3::new(1, 0, 0));
        assert_eq!(grid.cell(3).position(), IVec3::new(0, 1, 0));
    }

    #[test]
    fn test_build_sparse_layers() {
        let grid = GridStore::build(IVec3::new(2, 4, 2), 3, Some(&[0, 2, 9])).unwrap();
        assert_eq!(grid.len(), 8);
        assert!(grid.get(IVec3::new(1, 2, 1)).is_some());
        assert!(grid.get(IVec3::new(1, 1, 1)).is_none());
        assert!(grid.in_bounds(IVec3::new(1, 1, 1)));
    }

    #[test]
    fn test_invalid_size() {
        assert_eq!(
            GridStore::build(IVec3::new(0, 1, 1), 1, None).unwrap_err(),
            SolveError::InvalidSize(IVec3::new(0, 1, 1))
        );
    }

    #[test]
    fn test_reset_restores_full_domain() {
        let mut grid = GridStore::build(IVec3::new(2, 1, 1), 3, None).unwrap();
        grid.get_mut(IVec3::ZERO).unwrap().collapse_to(ModuleId(1));
        grid.get_mut(IVec3::X)
            .unwrap()
            .restrict(&ModuleSet::single(3, ModuleId(2)));
        grid.reset();
        assert!(grid.iter().all(|c| !c.is_collapsed() && c.entropy() == 3));
    }

    #[test]
    fn test_face_indices() {
        let grid = GridStore::build(IVec3::new(3, 2, 2), 1, None).unwrap();
        let right = grid.face_indices(Direction::PosX);
        assert_eq!(right.len(), 4);
        assert!(right.iter().all(|&i| grid.cell(i).position().x == 2));
        assert_eq!(grid.face_indices(Direction::NegY).len(), 6);
    }

    #[test]
    fn test_neighbor_index() {
        let grid = GridStore::build(IVec3::new(2, 1, 1), 1, None).unwrap();
        assert_eq!(grid.neighbor_index(0, Direction::PosX), Some(1));
        assert_eq!(grid.neighbor_index(0, Direction::NegX), None);
        assert_eq!(grid.neighbor_index(1, Direction::PosY), None);
    }
}
