//! Layout model for the panel browser.
//!
//! A binary space partition tree (`LayoutNode`) divides the display surface
//! into leaf regions; each leaf hosts at most one `Pane`. The tree owns its
//! panes outright, so geometry changes reach panes only through
//! `LayoutNode::recompute`, which the event loop calls between renders.
//!
//! Pane contract:
//! * `update` is the only way a pane learns its region; it must not assume
//!   the region stays the same between renders.
//! * `render` draws only through the surface it is handed, clipped to the
//!   handle it is given. Content problems (missing files and the like) are
//!   the pane's to display, not to return.
//! * `handle_key` never blocks except for explicit external process
//!   delegation, which suspends the whole loop by design of the single
//!   cooperative thread.

use core_events::KeyEvent;
use core_terminal::{DegenerateRegion, DisplaySurface, Region, RegionHandle};

mod layout;
mod ratio;

pub use layout::LayoutNode;
pub use ratio::{Axis, Direction, Side, SplitRatio, partition};

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("node is already split")]
    AlreadySplit,
    #[error("split ratio {0} outside the open interval (0, 1)")]
    InvalidRatio(f64),
    #[error(transparent)]
    DegenerateRegion(#[from] DegenerateRegion),
    #[error("panes can only be bound to leaf nodes")]
    NotALeaf,
}

/// Whether a pane consumed a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
}

/// Anything renderable inside a leaf region.
pub trait Pane {
    /// Short stable name used in logs.
    fn name(&self) -> &str;

    /// New region for the pane after a bind or a geometry recompute.
    fn update(&mut self, region: Region);

    fn render(
        &mut self,
        surface: &mut dyn DisplaySurface,
        region: &RegionHandle,
    ) -> anyhow::Result<()>;

    fn handle_key(&mut self, _key: &KeyEvent) -> KeyOutcome {
        KeyOutcome::Ignored
    }

    fn focus(&mut self) {}

    fn unfocus(&mut self) {}

    /// Panes that never take keys (status bars) are skipped by focus cycling.
    fn accepts_focus(&self) -> bool {
        false
    }
}
