//! Per-position solver state.

use crate::domain::{ModuleId, ModuleSet};
use glam::IVec3;

/// One grid position's mutable state.
///
/// Fields are private so `collapsed ⇒ |domain| == 1` holds for every
/// observer: the only way to set `collapsed` is [`Cell::collapse_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    position: IVec3,
    domain: ModuleSet,
    collapsed: bool,
    variant: Option<usize>,
}

impl Cell {
    pub fn new(position: IVec3, domain: ModuleSet) -> Self {
        Self {
            position,
            domain,
            collapsed: false,
            variant: None,
        }
    }

    /// Local grid position.
    #[inline]
    pub fn position(&self) -> IVec3 {
        self.position
    }

    #[inline]
    pub fn domain(&self) -> &ModuleSet {
        &self.domain
    }

    #[inline]
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Domain size. Zero means contradiction.
    #[inline]
    pub fn entropy(&self) -> usize {
        self.domain.len()
    }

    pub fn is_contradiction(&self) -> bool {
        !self.collapsed && self.domain.is_empty()
    }

    /// The chosen module, once collapsed.
    pub fn module(&self) -> Option<ModuleId> {
        if self.collapsed {
            self.domain.first()
        } else {
            None
        }
    }

    /// Index into the module's variant list chosen by the variant pass.
    pub fn variant(&self) -> Option<usize> {
        self.variant
    }

    /// `y / (grid_height - 1)`, or 0 for single-layer grids.
    pub fn height_ratio(&self, grid_height: i32) -> f64 {
        if grid_height > 1 {
            self.position.y as f64 / (grid_height - 1) as f64
        } else {
            0.0
        }
    }

    /// Full domain, uncollapsed, no variant.
    pub(crate) fn reset(&mut self, full: &ModuleSet) {
        self.domain.clone_from(full);
        self.collapsed = false;
        self.variant = None;
    }

    pub(crate) fn collapse_to(&mut self, module: ModuleId) {
        self.domain.set_single(module);
        self.collapsed = true;
    }

    /// Intersect the domain with `allowed`. Returns true if it shrank.
    /// Collapsed cells are never narrowed.
    pub(crate) fn restrict(&mut self, allowed: &ModuleSet) -> bool {
        if self.collapsed {
            return false;
        }
        self.domain.intersect_with(allowed)
    }

    pub(crate) fn set_variant(&mut self, variant: Option<usize>) {
        self.variant = variant;
    }
}
