//! Display surface contract.
//!
//! The panes never touch the terminal directly: every character they produce
//! goes through a `DisplaySurface` handed to them by the layout tree. The trait
//! is object safe so panes can take `&mut dyn DisplaySurface`.
//!
//! Drawing is retained: calls mutate a back buffer and nothing reaches the
//! physical terminal until `refresh`.

use crate::geometry::{DegenerateRegion, Region, Size};
use crate::style::Style;
use std::io;

/// A region validated against the surface that minted it.
///
/// Carries the surface generation so drawing through a handle created before
/// a resize fails loudly instead of scribbling over the new layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionHandle {
    region: Region,
    generation: u64,
}

impl RegionHandle {
    pub(crate) fn new(region: Region, generation: u64) -> Self {
        Self { region, generation }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn height(&self) -> u16 {
        self.region.height()
    }

    pub fn width(&self) -> u16 {
        self.region.width()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error(transparent)]
    Degenerate(#[from] DegenerateRegion),
    #[error("region {region} does not fit surface {size}")]
    OutOfBounds { region: Region, size: Size },
    #[error("region {region} minted at generation {minted}, surface is at {current}")]
    StaleRegion {
        region: Region,
        minted: u64,
        current: u64,
    },
}

pub trait DisplaySurface {
    /// Size the back buffer currently has (rows, cols).
    fn size(&self) -> Size;

    /// Mint a handle for a sub-region. Fails when it does not fit the surface.
    fn make_region(
        &self,
        height: u16,
        width: u16,
        origin_row: u16,
        origin_col: u16,
    ) -> Result<RegionHandle, SurfaceError>;

    /// Draw `text` at (row, col) relative to the region origin. Text that would
    /// overflow the region is clipped silently.
    fn draw_text(
        &mut self,
        region: &RegionHandle,
        row: u16,
        col: u16,
        text: &str,
        style: Style,
    ) -> Result<(), SurfaceError>;

    /// Box-drawing border along the region's outer cells.
    fn draw_border(&mut self, region: &RegionHandle) -> Result<(), SurfaceError>;

    /// Blank every cell of the region.
    fn clear_region(&mut self, region: &RegionHandle) -> Result<(), SurfaceError>;

    /// Push the back buffer to the physical display.
    fn refresh(&mut self) -> anyhow::Result<()>;

    /// Blank the back buffer and the physical display. Used while the terminal
    /// is too small to lay out; the next `refresh` paints from a blank screen.
    fn blank(&mut self) -> anyhow::Result<()>;

    /// Reallocate the back buffer for a new physical size. Invalidates every
    /// outstanding `RegionHandle`.
    fn resize(&mut self, size: Size);

    fn region_handle(&self, region: Region) -> Result<RegionHandle, SurfaceError> {
        self.make_region(
            region.height(),
            region.width(),
            region.origin_row(),
            region.origin_col(),
        )
    }
}

/// Cheap, thread-safe size query used by the resize watcher. Kept separate
/// from `DisplaySurface` so the watcher never holds the drawing surface.
pub trait SizeProbe: Send + Sync + 'static {
    fn size(&self) -> io::Result<Size>;
}
