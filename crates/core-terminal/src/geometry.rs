//! Terminal cell geometry.
//!
//! All coordinates are absolute terminal cells with origin (0,0) at the top
//! left. A `Region` is never degenerate: both extents are at least one cell.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub rows: u16,
    pub cols: u16,
}

impl Size {
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    pub(crate) fn pack(self) -> u32 {
        ((self.rows as u32) << 16) | self.cols as u32
    }

    pub(crate) fn unpack(raw: u32) -> Self {
        Self {
            rows: (raw >> 16) as u16,
            cols: (raw & 0xFFFF) as u16,
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Attempted construction of a region with a zero extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("degenerate region: height={height} width={width}")]
pub struct DegenerateRegion {
    pub height: u16,
    pub width: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    origin_row: u16,
    origin_col: u16,
    height: u16,
    width: u16,
}

impl Region {
    pub fn new(
        origin_row: u16,
        origin_col: u16,
        height: u16,
        width: u16,
    ) -> Result<Self, DegenerateRegion> {
        if height == 0 || width == 0 {
            return Err(DegenerateRegion { height, width });
        }
        Ok(Self {
            origin_row,
            origin_col,
            height,
            width,
        })
    }

    /// Region covering a whole surface of `size`.
    pub fn full(size: Size) -> Result<Self, DegenerateRegion> {
        Self::new(0, 0, size.rows, size.cols)
    }

    pub fn origin_row(&self) -> u16 {
        self.origin_row
    }

    pub fn origin_col(&self) -> u16 {
        self.origin_col
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    /// One past the last row (absolute).
    pub fn bottom(&self) -> u32 {
        self.origin_row as u32 + self.height as u32
    }

    /// One past the last column (absolute).
    pub fn right(&self) -> u32 {
        self.origin_col as u32 + self.width as u32
    }

    pub fn area(&self) -> u32 {
        self.height as u32 * self.width as u32
    }

    pub fn contains_cell(&self, row: u16, col: u16) -> bool {
        row >= self.origin_row
            && (row as u32) < self.bottom()
            && col >= self.origin_col
            && (col as u32) < self.right()
    }

    /// `true` when `other` lies entirely inside `self`.
    pub fn encloses(&self, other: &Region) -> bool {
        other.origin_row >= self.origin_row
            && other.origin_col >= self.origin_col
            && other.bottom() <= self.bottom()
            && other.right() <= self.right()
    }

    pub fn intersects(&self, other: &Region) -> bool {
        (self.origin_row as u32) < other.bottom()
            && (other.origin_row as u32) < self.bottom()
            && (self.origin_col as u32) < other.right()
            && (other.origin_col as u32) < self.right()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}@({},{})",
            self.height, self.width, self.origin_row, self.origin_col
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_extents() {
        assert_eq!(
            Region::new(0, 0, 0, 5),
            Err(DegenerateRegion {
                height: 0,
                width: 5
            })
        );
        assert!(Region::new(0, 0, 3, 0).is_err());
        assert!(Region::new(2, 2, 1, 1).is_ok());
    }

    #[test]
    fn adjacent_regions_do_not_intersect() {
        let a = Region::new(0, 0, 24, 20).unwrap();
        let b = Region::new(0, 20, 24, 60).unwrap();
        assert!(!a.intersects(&b));
        let full = Region::new(0, 0, 24, 80).unwrap();
        assert!(full.encloses(&a) && full.encloses(&b));
        assert_eq!(a.area() + b.area(), full.area());
    }

    #[test]
    fn size_pack_round_trip_extremes() {
        let s = Size::new(u16::MAX, 1);
        assert_eq!(Size::unpack(s.pack()), s);
    }
}
