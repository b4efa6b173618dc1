//! The six face directions of a grid cell.
//!
//! Direction indices double as indices into every per-face array in the
//! crate (sockets, allowed sets, variant rules), so the order here is fixed:
//! +X, -X, +Y, -Y, +Z, -Z.

use glam::IVec3;
use serde::{Deserialize, Serialize};

/// Offsets per direction index. Order: +X, -X, +Y, -Y, +Z, -Z
pub const DX: [i32; 6] = [1, -1, 0, 0, 0, 0];
pub const DY: [i32; 6] = [0, 0, 1, -1, 0, 0];
pub const DZ: [i32; 6] = [0, 0, 0, 0, 1, -1];

/// Opposite direction indices.
pub const OPPOSITE: [usize; 6] = [1, 0, 3, 2, 5, 4];

/// One of the six faces of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Direction {
    /// All directions in index order.
    pub const ALL: [Direction; 6] = [
        Direction::PosX,
        Direction::NegX,
        Direction::PosY,
        Direction::NegY,
        Direction::PosZ,
        Direction::NegZ,
    ];

    /// Index into per-face arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<Direction> {
        Self::ALL.get(index).copied()
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        Self::ALL[OPPOSITE[self.index()]]
    }

    /// Unit offset of this direction.
    #[inline]
    pub fn offset(self) -> IVec3 {
        let i = self.index();
        IVec3::new(DX[i], DY[i], DZ[i])
    }

    /// Inverse of [`Direction::offset`]; `None` for anything that is not a unit axis step.
    pub fn from_offset(offset: IVec3) -> Option<Direction> {
        Self::ALL.into_iter().find(|d| d.offset() == offset)
    }

    /// Whether this direction lies in the horizontal (XZ) plane.
    pub fn is_horizontal(self) -> bool {
        !matches!(self, Direction::PosY | Direction::NegY)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Direction::PosX => "+X",
            Direction::NegX => "-X",
            Direction::PosY => "+Y",
            Direction::NegY => "-Y",
            Direction::PosZ => "+Z",
            Direction::NegZ => "-Z",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposites_cancel() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_eq!(d.offset() + d.opposite().offset(), IVec3::ZERO);
        }
    }

    #[test]
    fn test_from_offset() {
        assert_eq!(Direction::from_offset(IVec3::X), Some(Direction::PosX));
        assert_eq!(Direction::from_offset(IVec3::NEG_Z), Some(Direction::NegZ));
        assert_eq!(Direction::from_offset(IVec3::new(1, 1, 0)), None);
    }

    #[test]
    fn test_index_roundtrip() {
        for (i, d) in Direction::ALL.iter().enumerate() {
            assert_eq!(d.index(), i);
            assert_eq!(Direction::from_index(i), Some(*d));
        }
        assert_eq!(Direction::from_index(6), None);
    }
}
