#![forbid(unsafe_code)]

//! Diff computation between surfaces.
//!
//! Row-major scan producing runs of changed cells, so a presenter can move
//! the cursor once per run instead of once per cell.
//!
//! ```
//! use deckbot_render::{Rgb, Surface, SurfaceDiff};
//!
//! let old = Surface::new(10, 2);
//! let mut new = Surface::new(10, 2);
//! new.draw_text(3, 1, "hey", Rgb::WHITE, Rgb::BLACK);
//!
//! let diff = SurfaceDiff::compute(&old, &new);
//! assert_eq!(diff.len(), 3);
//! assert_eq!(diff.runs().len(), 1);
//! ```

use crate::surface::Surface;

/// A contiguous run of changed cells on a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRun {
    /// Row index.
    pub y: u16,
    /// Start column (inclusive).
    pub x0: u16,
    /// End column (inclusive).
    pub x1: u16,
}

impl ChangeRun {
    #[inline]
    pub const fn new(y: u16, x0: u16, x1: u16) -> Self {
        debug_assert!(x0 <= x1);
        Self { y, x0, x1 }
    }

    /// Number of cells in this run.
    #[inline]
    pub const fn len(&self) -> u16 {
        self.x1 - self.x0 + 1
    }
}

/// Positions where two surfaces differ.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceDiff {
    changes: Vec<(u16, u16)>,
}

impl SurfaceDiff {
    /// Compare `old` against `new`.
    ///
    /// When the sizes differ every cell of `new` counts as changed.
    pub fn compute(old: &Surface, new: &Surface) -> Self {
        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!("deckbot.render.diff").entered();

        let full = old.width() != new.width() || old.height() != new.height();
        let mut changes = Vec::new();
        for y in 0..new.height() {
            for x in 0..new.width() {
                if full || old.get(x, y) != new.get(x, y) {
                    changes.push((x, y));
                }
            }
        }
        Self { changes }
    }

    /// Every cell of `surface`, for the first frame.
    pub fn full(surface: &Surface) -> Self {
        Self::compute(&Surface::default(), surface)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changed `(x, y)` positions in row-major order.
    pub fn changes(&self) -> &[(u16, u16)] {
        &self.changes
    }

    /// Coalesce changes into horizontal runs.
    pub fn runs(&self) -> Vec<ChangeRun> {
        let mut runs: Vec<ChangeRun> = Vec::new();
        for &(x, y) in &self.changes {
            match runs.last_mut() {
                Some(run) if run.y == y && run.x1 + 1 == x => run.x1 = x,
                _ => runs.push(ChangeRun::new(y, x, x)),
            }
        }
        runs
    }
}
