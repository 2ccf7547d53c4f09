//! Cell grid backing both surfaces.
//!
//! `Cell` stores the full grapheme cluster for leader cells along with its
//! visual width; continuation cells (width==0) occupy the remaining columns of
//! a wide cluster and never print text.
//!
//! Invariants:
//! - Leader: width >= 1, `cluster` non-empty.
//! - Continuation: width == 0, `cluster` empty, immediately follows its leader.
//! - Every write is clipped to the target region; nothing outside the region
//!   handle is ever touched.
//! - Handles minted before the last `resize` are rejected as stale.

use crate::clip::clusters;
use crate::geometry::{Region, Size};
use crate::style::Style;
use crate::surface::{RegionHandle, SurfaceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Full grapheme cluster string (leader cells only). Empty for continuation cells.
    pub cluster: String,
    /// Visual width in terminal columns. `0` designates a continuation cell.
    pub width: u8,
    pub style: Style,
}

impl Cell {
    #[inline]
    pub fn leader(cluster: &str, width: u16, style: Style) -> Self {
        Self {
            cluster: cluster.to_string(),
            width: width.max(1) as u8,
            style,
        }
    }

    #[inline]
    pub fn continuation(style: Style) -> Self {
        Self {
            cluster: String::new(),
            width: 0,
            style,
        }
    }

    #[inline]
    pub fn is_leader(&self) -> bool {
        self.width > 0
    }
}

impl Default for Cell {
    fn default() -> Self {
        // Default is a single space leader cell for blank areas.
        Cell {
            cluster: " ".to_string(),
            width: 1,
            style: Style::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub size: Size,
    pub cells: Vec<Cell>,
}

impl Frame {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            cells: vec![Cell::default(); size.rows as usize * size.cols as usize],
        }
    }

    #[inline]
    fn index(&self, row: u16, col: u16) -> Option<usize> {
        if row < self.size.rows && col < self.size.cols {
            Some(row as usize * self.size.cols as usize + col as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    /// Set a cluster at (row,col) with continuation cells for its width.
    /// `limit` is the exclusive column bound the cluster must not cross.
    fn set_cluster(&mut self, row: u16, col: u16, cluster: &str, width: u16, limit: u16, style: Style) {
        if self.index(row, col).is_none() {
            return;
        }
        for dx in 0..width {
            if col + dx < limit {
                self.vacate(row, col + dx);
            }
        }
        let Some(idx) = self.index(row, col) else {
            return;
        };
        self.cells[idx] = Cell::leader(cluster, width, style);
        for dx in 1..width {
            let c = col + dx;
            if c >= limit {
                break;
            }
            if let Some(c_idx) = self.index(row, c) {
                self.cells[c_idx] = Cell::continuation(style);
            }
        }
    }

    /// Blank the cluster occupying (row,col) so an overwrite never leaves a
    /// wide leader without its continuation (or the reverse).
    fn vacate(&mut self, row: u16, col: u16) {
        let Some(idx) = self.index(row, col) else {
            return;
        };
        if self.cells[idx].is_leader() {
            let w = self.cells[idx].width as u16;
            for dx in 1..w {
                if let Some(i) = self.index(row, col + dx)
                    && !self.cells[i].is_leader()
                {
                    self.cells[i] = Cell::default();
                }
            }
        } else {
            let mut c = col;
            while c > 0 {
                c -= 1;
                if let Some(i) = self.index(row, c)
                    && self.cells[i].is_leader()
                {
                    self.cells[i] = Cell::default();
                    break;
                }
            }
            let mut c = col + 1;
            while let Some(i) = self.index(row, c) {
                if self.cells[i].is_leader() {
                    break;
                }
                self.cells[i] = Cell::default();
                c += 1;
            }
        }
        self.cells[idx] = Cell::default();
    }

    /// Row as plain text (leaders only, trailing blanks kept).
    pub fn row_text(&self, row: u16) -> String {
        if row >= self.size.rows {
            return String::new();
        }
        let start = row as usize * self.size.cols as usize;
        self.cells[start..start + self.size.cols as usize]
            .iter()
            .filter(|c| c.is_leader())
            .map(|c| c.cluster.as_str())
            .collect()
    }

    /// Row cells as a slice (for diffing).
    pub fn row(&self, row: u16) -> &[Cell] {
        let start = row as usize * self.size.cols as usize;
        &self.cells[start..start + self.size.cols as usize]
    }
}

/// Drawing state shared by `CrosstermSurface` and `HeadlessSurface`.
#[derive(Debug)]
pub(crate) struct Canvas {
    pub(crate) frame: Frame,
    pub(crate) generation: u64,
}

impl Canvas {
    pub(crate) fn new(size: Size) -> Self {
        Self {
            frame: Frame::new(size),
            generation: 0,
        }
    }

    pub(crate) fn size(&self) -> Size {
        self.frame.size
    }

    pub(crate) fn resize(&mut self, size: Size) {
        self.frame = Frame::new(size);
        self.generation += 1;
    }

    /// Blank every cell. Handles stay valid since the size is unchanged.
    pub(crate) fn wipe(&mut self) {
        self.frame = Frame::new(self.frame.size);
    }

    pub(crate) fn make_region(
        &self,
        height: u16,
        width: u16,
        origin_row: u16,
        origin_col: u16,
    ) -> Result<RegionHandle, SurfaceError> {
        let region = Region::new(origin_row, origin_col, height, width)?;
        let size = self.size();
        let bounds = Region::full(size).map_err(|_| SurfaceError::OutOfBounds { region, size })?;
        if !bounds.encloses(&region) {
            return Err(SurfaceError::OutOfBounds { region, size });
        }
        Ok(RegionHandle::new(region, self.generation))
    }

    fn check(&self, handle: &RegionHandle) -> Result<Region, SurfaceError> {
        if handle.generation() != self.generation {
            return Err(SurfaceError::StaleRegion {
                region: handle.region(),
                minted: handle.generation(),
                current: self.generation,
            });
        }
        Ok(handle.region())
    }

    pub(crate) fn draw_text(
        &mut self,
        handle: &RegionHandle,
        row: u16,
        col: u16,
        text: &str,
        style: Style,
    ) -> Result<(), SurfaceError> {
        let region = self.check(handle)?;
        if row >= region.height() || col >= region.width() {
            return Ok(());
        }
        let abs_row = region.origin_row() + row;
        let limit = region.origin_col() + region.width();
        let mut x = region.origin_col() + col;
        for (cluster, w) in clusters(text) {
            if x as u32 + w as u32 > limit as u32 {
                break;
            }
            self.frame.set_cluster(abs_row, x, cluster, w, limit, style);
            x += w;
        }
        Ok(())
    }

    pub(crate) fn clear_region(&mut self, handle: &RegionHandle) -> Result<(), SurfaceError> {
        let region = self.check(handle)?;
        for r in region.origin_row()..region.origin_row() + region.height() {
            for c in region.origin_col()..region.origin_col() + region.width() {
                if let Some(idx) = self.frame.index(r, c) {
                    self.frame.cells[idx] = Cell::default();
                }
            }
        }
        Ok(())
    }

    pub(crate) fn draw_border(&mut self, handle: &RegionHandle) -> Result<(), SurfaceError> {
        let region = self.check(handle)?;
        let (h, w) = (region.height(), region.width());
        if h < 2 || w < 2 {
            return Ok(());
        }
        let plain = Style::default();
        let horizontal = "─".repeat(w as usize - 2);
        self.draw_text(handle, 0, 0, "┌", plain)?;
        self.draw_text(handle, 0, 1, &horizontal, plain)?;
        self.draw_text(handle, 0, w - 1, "┐", plain)?;
        for r in 1..h - 1 {
            self.draw_text(handle, r, 0, "│", plain)?;
            self.draw_text(handle, r, w - 1, "│", plain)?;
        }
        self.draw_text(handle, h - 1, 0, "└", plain)?;
        self.draw_text(handle, h - 1, 1, &horizontal, plain)?;
        self.draw_text(handle, h - 1, w - 1, "┘", plain)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(rows: u16, cols: u16) -> Canvas {
        Canvas::new(Size::new(rows, cols))
    }

    #[test]
    fn text_is_clipped_to_region_width() {
        let mut c = canvas(3, 10);
        let h = c.make_region(1, 4, 1, 2).unwrap();
        c.draw_text(&h, 0, 1, "abcdef", Style::default()).unwrap();
        assert_eq!(c.frame.row_text(1), "   abc    ");
    }

    #[test]
    fn out_of_region_rows_are_ignored() {
        let mut c = canvas(3, 10);
        let h = c.make_region(1, 4, 0, 0).unwrap();
        c.draw_text(&h, 5, 0, "zzz", Style::default()).unwrap();
        c.draw_text(&h, 0, 9, "zzz", Style::default()).unwrap();
        assert!(c.frame.row_text(0).trim().is_empty());
    }

    #[test]
    fn handles_go_stale_after_resize() {
        let mut c = canvas(3, 10);
        let h = c.make_region(3, 10, 0, 0).unwrap();
        c.resize(Size::new(4, 12));
        let err = c.draw_text(&h, 0, 0, "x", Style::default()).unwrap_err();
        assert!(matches!(err, SurfaceError::StaleRegion { minted: 0, current: 1, .. }));
    }

    #[test]
    fn region_outside_surface_is_rejected() {
        let c = canvas(5, 5);
        assert!(matches!(
            c.make_region(3, 3, 3, 3),
            Err(SurfaceError::OutOfBounds { .. })
        ));
        assert!(matches!(
            c.make_region(0, 3, 0, 0),
            Err(SurfaceError::Degenerate(_))
        ));
    }

    #[test]
    fn border_draws_corners() {
        let mut c = canvas(3, 4);
        let h = c.make_region(3, 4, 0, 0).unwrap();
        c.draw_border(&h).unwrap();
        assert_eq!(c.frame.row_text(0), "┌──┐");
        assert_eq!(c.frame.row_text(1), "│  │");
        assert_eq!(c.frame.row_text(2), "└──┘");
    }

    #[test]
    fn wide_cluster_keeps_continuation() {
        let mut c = canvas(1, 4);
        let h = c.make_region(1, 4, 0, 0).unwrap();
        c.draw_text(&h, 0, 0, "\u{4E16}x", Style::default()).unwrap();
        assert!(c.frame.cell(0, 0).unwrap().is_leader());
        assert!(!c.frame.cell(0, 1).unwrap().is_leader());
        assert_eq!(c.frame.row_text(0), "\u{4E16}x ");
    }
}
