//! Crossterm-backed display surface.
//!
//! Drawing goes into the canvas back buffer. `refresh` diffs it against the
//! last frame pushed to the terminal and emits only the rows that changed,
//! batched through a `Writer` so each refresh is one flush.

use crate::canvas::{Canvas, Frame};
use crate::geometry::Size;
use crate::style::Style;
use crate::surface::{DisplaySurface, RegionHandle, SizeProbe, SurfaceError};
use crate::writer::Writer;
use crate::{SUSPEND_EPOCH, TerminalMetrics};
use anyhow::Result;
use std::io::{self, Write};
use std::sync::atomic::Ordering;

pub struct CrosstermSurface {
    canvas: Canvas,
    /// Last frame written to the terminal. `None` forces a full repaint.
    front: Option<Frame>,
    seen_epoch: u64,
}

impl CrosstermSurface {
    /// Surface sized to the current terminal.
    pub fn new() -> Result<Self> {
        let size = CrosstermSizeProbe.size()?;
        Ok(Self::with_size(size))
    }

    pub fn with_size(size: Size) -> Self {
        Self {
            canvas: Canvas::new(size),
            front: None,
            seen_epoch: SUSPEND_EPOCH.load(Ordering::Relaxed),
        }
    }

    /// Build the commands needed to bring the terminal up to date with the
    /// back buffer.
    fn diff(&mut self) -> Writer {
        let epoch = SUSPEND_EPOCH.load(Ordering::Relaxed);
        if epoch != self.seen_epoch {
            // A child process owned the screen in between.
            self.front = None;
            self.seen_epoch = epoch;
        }
        let back = &self.canvas.frame;
        let mut w = Writer::new();
        let full = match &self.front {
            Some(front) => front.size != back.size,
            None => true,
        };
        if full {
            w.clear_all();
        }
        for row in 0..back.size.rows {
            let dirty = full
                || self
                    .front
                    .as_ref()
                    .is_none_or(|front| front.row(row) != back.row(row));
            if !dirty {
                continue;
            }
            w.move_to(0, row);
            for cell in back.row(row).iter().filter(|c| c.is_leader()) {
                w.set_style(cell.style);
                w.print(cell.cluster.as_str());
            }
        }
        w
    }

    /// Refresh into an arbitrary writer. Returns the number of emitted
    /// terminal commands (zero when nothing changed).
    pub fn flush_to<W: Write>(&mut self, out: &mut W) -> Result<usize> {
        let writer = self.diff();
        let count = if writer.is_empty() {
            0
        } else {
            writer.flush_to(out)?
        };
        self.front = Some(self.canvas.frame.clone());
        TerminalMetrics::record_refresh(count);
        Ok(count)
    }

    /// Clear the terminal and the back buffer. The blank frame becomes the
    /// front, so a later refresh repaints every non-blank row.
    pub fn blank_to<W: Write>(&mut self, out: &mut W) -> Result<usize> {
        self.canvas.wipe();
        let mut w = Writer::new();
        w.clear_all();
        let count = w.flush_to(out)?;
        self.front = Some(self.canvas.frame.clone());
        TerminalMetrics::record_refresh(count);
        Ok(count)
    }
}

impl DisplaySurface for CrosstermSurface {
    fn size(&self) -> Size {
        self.canvas.size()
    }

    fn make_region(
        &self,
        height: u16,
        width: u16,
        origin_row: u16,
        origin_col: u16,
    ) -> Result<RegionHandle, SurfaceError> {
        self.canvas.make_region(height, width, origin_row, origin_col)
    }

    fn draw_text(
        &mut self,
        region: &RegionHandle,
        row: u16,
        col: u16,
        text: &str,
        style: Style,
    ) -> Result<(), SurfaceError> {
        self.canvas.draw_text(region, row, col, text, style)
    }

    fn draw_border(&mut self, region: &RegionHandle) -> Result<(), SurfaceError> {
        self.canvas.draw_border(region)
    }

    fn clear_region(&mut self, region: &RegionHandle) -> Result<(), SurfaceError> {
        self.canvas.clear_region(region)
    }

    fn refresh(&mut self) -> Result<()> {
        let mut out = io::stdout().lock();
        self.flush_to(&mut out)?;
        Ok(())
    }

    fn blank(&mut self) -> Result<()> {
        let mut out = io::stdout().lock();
        self.blank_to(&mut out)?;
        Ok(())
    }

    fn resize(&mut self, size: Size) {
        self.canvas.resize(size);
        self.front = None;
    }
}

/// Size probe reading the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrosstermSizeProbe;

impl SizeProbe for CrosstermSizeProbe {
    fn size(&self) -> io::Result<Size> {
        let (cols, rows) = crossterm::terminal::size()?;
        Ok(Size::new(rows, cols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(surface: &mut CrosstermSurface, row: u16, text: &str) {
        let size = surface.size();
        let h = surface.make_region(size.rows, size.cols, 0, 0).unwrap();
        surface.draw_text(&h, row, 0, text, Style::plain()).unwrap();
    }

    #[test]
    fn first_refresh_paints_everything_then_only_changes() {
        let mut s = CrosstermSurface::with_size(Size::new(3, 5));
        draw(&mut s, 0, "hello");
        let mut sink = Vec::new();
        let first = s.flush_to(&mut sink).unwrap();
        assert!(first > 3, "clear + every row: {first}");

        let mut sink = Vec::new();
        assert_eq!(s.flush_to(&mut sink).unwrap(), 0);
        assert!(sink.is_empty());

        draw(&mut s, 1, "x");
        let mut sink = Vec::new();
        s.flush_to(&mut sink).unwrap();
        let out = String::from_utf8(sink).unwrap();
        assert!(out.contains("x    "));
        assert!(!out.contains("hello"), "unchanged row re-emitted: {out:?}");
    }

    #[test]
    fn resize_forces_full_repaint() {
        let mut s = CrosstermSurface::with_size(Size::new(2, 4));
        draw(&mut s, 0, "ab");
        s.flush_to(&mut Vec::new()).unwrap();
        s.resize(Size::new(3, 6));
        draw(&mut s, 0, "ab");
        let mut sink = Vec::new();
        s.flush_to(&mut sink).unwrap();
        let out = String::from_utf8(sink).unwrap();
        assert!(out.contains("ab"));
        assert!(out.contains("\x1b[2J"), "expected clear: {out:?}");
    }

    #[test]
    fn blank_clears_once_then_repaints_content() {
        let mut s = CrosstermSurface::with_size(Size::new(2, 4));
        draw(&mut s, 0, "ab");
        s.flush_to(&mut Vec::new()).unwrap();

        let mut sink = Vec::new();
        s.blank_to(&mut sink).unwrap();
        let out = String::from_utf8(sink).unwrap();
        assert!(out.contains("\x1b[2J"), "expected clear: {out:?}");
        assert!(!out.contains("ab"));
        assert_eq!(s.flush_to(&mut Vec::new()).unwrap(), 0);

        draw(&mut s, 0, "ab");
        let mut sink = Vec::new();
        s.flush_to(&mut sink).unwrap();
        assert!(String::from_utf8(sink).unwrap().contains("ab"));
    }
}
