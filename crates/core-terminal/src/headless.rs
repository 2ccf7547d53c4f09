//! In-memory surface for tests and scripted runs.
//!
//! Behaves exactly like the crossterm surface from the drawing side (same
//! canvas, same clipping, same stale-handle checks) but `refresh` only counts.
//! The paired `HeadlessSizeProbe` lets a test change the "physical" size the
//! resize watcher observes.

use crate::canvas::{Canvas, Cell};
use crate::geometry::Size;
use crate::style::Style;
use crate::surface::{DisplaySurface, RegionHandle, SizeProbe, SurfaceError};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug)]
pub struct HeadlessSurface {
    canvas: Canvas,
    physical: Arc<AtomicU32>,
    refreshes: usize,
    blanks: usize,
}

impl HeadlessSurface {
    pub fn new(size: Size) -> Self {
        Self {
            canvas: Canvas::new(size),
            physical: Arc::new(AtomicU32::new(size.pack())),
            refreshes: 0,
            blanks: 0,
        }
    }

    /// Probe sharing this surface's simulated physical size.
    pub fn probe(&self) -> HeadlessSizeProbe {
        HeadlessSizeProbe {
            size: Arc::clone(&self.physical),
        }
    }

    pub fn row_text(&self, row: u16) -> String {
        self.canvas.frame.row_text(row)
    }

    pub fn rows(&self) -> Vec<String> {
        (0..self.canvas.size().rows).map(|r| self.row_text(r)).collect()
    }

    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.canvas.frame.cell(row, col)
    }

    pub fn style_at(&self, row: u16, col: u16) -> Option<Style> {
        self.cell(row, col).map(|c| c.style)
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    pub fn blank_count(&self) -> usize {
        self.blanks
    }

    /// First (row, col) where `needle` appears, scanning rows top to bottom.
    /// Columns are display columns only for single-width text.
    pub fn find(&self, needle: &str) -> Option<(u16, u16)> {
        self.rows().iter().enumerate().find_map(|(r, line)| {
            line.find(needle).map(|byte| {
                let col = line[..byte].chars().count() as u16;
                (r as u16, col)
            })
        })
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.find(needle).is_some()
    }
}

impl DisplaySurface for HeadlessSurface {
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

    fn refresh(&mut self) -> anyhow::Result<()> {
        self.refreshes += 1;
        Ok(())
    }

    fn blank(&mut self) -> anyhow::Result<()> {
        self.canvas.wipe();
        self.blanks += 1;
        Ok(())
    }

    fn resize(&mut self, size: Size) {
        self.canvas.resize(size);
    }
}

#[derive(Debug, Clone)]
pub struct HeadlessSizeProbe {
    size: Arc<AtomicU32>,
}

impl HeadlessSizeProbe {
    /// Simulate the terminal being resized.
    pub fn set(&self, size: Size) {
        self.size.store(size.pack(), Ordering::SeqCst);
    }
}

impl SizeProbe for HeadlessSizeProbe {
    fn size(&self) -> io::Result<Size> {
        Ok(Size::unpack(self.size.load(Ordering::SeqCst)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_tracks_simulated_resizes_without_touching_the_buffer() {
        let s = HeadlessSurface::new(Size::new(4, 10));
        let probe = s.probe();
        assert_eq!(probe.size().unwrap(), Size::new(4, 10));
        probe.set(Size::new(8, 20));
        assert_eq!(probe.size().unwrap(), Size::new(8, 20));
        assert_eq!(s.size(), Size::new(4, 10));
    }

    #[test]
    fn find_reports_row_and_column() {
        let mut s = HeadlessSurface::new(Size::new(3, 12));
        let h = s.make_region(3, 12, 0, 0).unwrap();
        s.draw_text(&h, 2, 4, "needle", Style::bold()).unwrap();
        assert_eq!(s.find("needle"), Some((2, 4)));
        assert!(s.style_at(2, 4).unwrap().is_bold());
        s.refresh().unwrap();
        assert_eq!(s.refresh_count(), 1);
    }

    #[test]
    fn blank_wipes_cells_and_keeps_handles_valid() {
        let mut s = HeadlessSurface::new(Size::new(2, 8));
        let h = s.make_region(2, 8, 0, 0).unwrap();
        s.draw_text(&h, 0, 0, "text", Style::plain()).unwrap();
        s.blank().unwrap();
        assert_eq!(s.blank_count(), 1);
        assert!(s.rows().iter().all(|r| r.trim().is_empty()));
        s.draw_text(&h, 1, 0, "back", Style::plain()).unwrap();
        assert_eq!(s.find("back"), Some((1, 0)));
    }
}
