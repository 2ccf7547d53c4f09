//! Split descriptors and the partition arithmetic shared by every split.
//!
//! Ratios are quantised once to basis points. The first child always gets
//! `floor(extent * bp / 10_000)` cells and the second child the exact
//! remainder, so the two children tile the parent with no gap or overlap for
//! any parent size, and recomputing from the same parent is idempotent.

use crate::LayoutError;
use core_terminal::Region;
use std::fmt;

const BASIS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Stacked children: first on top, second below. Splits rows.
    Horizontal,
    /// Side-by-side children: first on the left, second on the right. Splits columns.
    Vertical,
}

/// Where the new space goes, relative to the node being split.
///
/// `Left`/`Up` hand the ratio to the first child, `Right`/`Down` to the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::Vertical,
            Direction::Up | Direction::Down => Axis::Horizontal,
        }
    }

    fn ratio_to_second(self) -> bool {
        matches!(self, Direction::Right | Direction::Down)
    }
}

/// Child selector for addressing nodes by path from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    First,
    Second,
}

/// Share of the parent extent given to the first child, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SplitRatio(u16);

impl SplitRatio {
    pub const QUARTER: SplitRatio = SplitRatio(2_500);
    pub const HALF: SplitRatio = SplitRatio(5_000);

    pub fn basis_points(self) -> u16 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / BASIS as f64
    }

    /// The ratio the other child receives.
    pub fn complement(self) -> Self {
        SplitRatio(BASIS as u16 - self.0)
    }

    /// Ratio for the first child when splitting toward `direction`.
    pub fn toward(self, direction: Direction) -> Self {
        if direction.ratio_to_second() {
            self.complement()
        } else {
            self
        }
    }

    /// Cells the first child receives out of `extent`.
    pub fn first_extent(self, extent: u16) -> u16 {
        (extent as u32 * self.0 as u32 / BASIS) as u16
    }
}

impl TryFrom<f64> for SplitRatio {
    type Error = LayoutError;

    fn try_from(ratio: f64) -> Result<Self, Self::Error> {
        if !ratio.is_finite() || ratio <= 0.0 || ratio >= 1.0 {
            return Err(LayoutError::InvalidRatio(ratio));
        }
        let bp = (ratio * BASIS as f64).round() as u32;
        if bp == 0 || bp >= BASIS {
            return Err(LayoutError::InvalidRatio(ratio));
        }
        Ok(SplitRatio(bp as u16))
    }
}

impl fmt::Display for SplitRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.as_f64())
    }
}

/// Split `region` along `axis`. Fails when either child would be empty.
pub fn partition(
    region: Region,
    axis: Axis,
    ratio: SplitRatio,
) -> Result<(Region, Region), LayoutError> {
    let (row, col) = (region.origin_row(), region.origin_col());
    let (h, w) = (region.height(), region.width());
    let pair = match axis {
        Axis::Vertical => {
            let a = ratio.first_extent(w);
            (
                Region::new(row, col, h, a)?,
                Region::new(row, col.saturating_add(a), h, w - a)?,
            )
        }
        Axis::Horizontal => {
            let a = ratio.first_extent(h);
            (
                Region::new(row, col, a, w)?,
                Region::new(row.saturating_add(a), col, h - a, w)?,
            )
        }
    };
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(h: u16, w: u16) -> Region {
        Region::new(0, 0, h, w).unwrap()
    }

    #[test]
    fn quarter_vertical_split_of_24x80() {
        let r = SplitRatio::try_from(0.25).unwrap();
        let (a, b) = partition(region(24, 80), Axis::Vertical, r).unwrap();
        assert_eq!(a, Region::new(0, 0, 24, 20).unwrap());
        assert_eq!(b, Region::new(0, 20, 24, 60).unwrap());
    }

    #[test]
    fn first_child_floors_second_takes_remainder() {
        let r = SplitRatio::try_from(0.5).unwrap();
        let (a, b) = partition(region(7, 3), Axis::Horizontal, r).unwrap();
        assert_eq!((a.height(), b.height()), (3, 4));
        assert_eq!(b.origin_row(), 3);
    }

    #[test]
    fn rejects_out_of_range_and_non_finite() {
        for bad in [0.0, 1.0, -0.1, 1.5, f64::NAN, f64::INFINITY, 0.000_01, 0.999_99] {
            assert!(
                matches!(SplitRatio::try_from(bad), Err(LayoutError::InvalidRatio(_))),
                "{bad} accepted"
            );
        }
    }

    #[test]
    fn tiny_extent_degenerates() {
        let r = SplitRatio::try_from(0.25).unwrap();
        let err = partition(region(1, 3), Axis::Vertical, r).unwrap_err();
        assert!(matches!(err, LayoutError::DegenerateRegion(_)));
    }

    #[test]
    fn direction_moves_ratio_to_the_named_side() {
        let r = SplitRatio::try_from(0.3).unwrap();
        assert_eq!(r.toward(Direction::Left).basis_points(), 3000);
        assert_eq!(r.toward(Direction::Down).basis_points(), 7000);
        assert_eq!(Direction::Up.axis(), Axis::Horizontal);
        assert_eq!(Direction::Right.axis(), Axis::Vertical);
    }
}
