//! Binary space partition layout tree.
//!
//! The root covers the whole display surface. Every `Split` node owns exactly
//! two children whose regions tile its own region with no gap and no overlap;
//! child regions are always derived from the node's stored ratio and its
//! current region, never from the children's previous regions.
//!
//! Invariants (hold after every public call, including failed ones):
//! * A node that is already split is never split again (`AlreadySplit`).
//! * Only leaves carry panes.
//! * `recompute` either applies the new geometry to the whole tree or leaves
//!   the tree untouched.

use crate::ratio::{Axis, Direction, Side, SplitRatio, partition};
use crate::{LayoutError, Pane};
use core_terminal::{DisplaySurface, Region, Style};
use std::fmt;
use tracing::debug;

const EMPTY_LEAF_LABEL: &str = "Window";

pub enum LayoutNode {
    Leaf {
        region: Region,
        pane: Option<Box<dyn Pane>>,
    },
    Split {
        region: Region,
        axis: Axis,
        ratio: SplitRatio,
        first: Box<LayoutNode>,
        second: Box<LayoutNode>,
    },
}

impl LayoutNode {
    /// Single empty leaf covering `region`.
    pub fn root(region: Region) -> Self {
        LayoutNode::Leaf { region, pane: None }
    }

    pub fn region(&self) -> Region {
        match self {
            LayoutNode::Leaf { region, .. } | LayoutNode::Split { region, .. } => *region,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, LayoutNode::Leaf { .. })
    }

    pub fn pane(&self) -> Option<&dyn Pane> {
        match self {
            LayoutNode::Leaf { pane, .. } => pane.as_deref(),
            LayoutNode::Split { .. } => None,
        }
    }

    pub fn children(&self) -> Option<(&LayoutNode, &LayoutNode)> {
        match self {
            LayoutNode::Split { first, second, .. } => Some((first, second)),
            LayoutNode::Leaf { .. } => None,
        }
    }

    /// Turn this leaf into a split with two empty leaves. `ratio` is the share
    /// of the first child. Returns the pane that was bound here, if any, so
    /// the caller can rebind it to one of the children.
    pub fn split(
        &mut self,
        axis: Axis,
        ratio: f64,
    ) -> Result<Option<Box<dyn Pane>>, LayoutError> {
        if !self.is_leaf() {
            return Err(LayoutError::AlreadySplit);
        }
        let ratio = SplitRatio::try_from(ratio)?;
        self.split_with(axis, ratio)
    }

    /// Split so that `ratio` of the space lands on the `direction` side.
    pub fn split_toward(
        &mut self,
        direction: Direction,
        ratio: f64,
    ) -> Result<Option<Box<dyn Pane>>, LayoutError> {
        if !self.is_leaf() {
            return Err(LayoutError::AlreadySplit);
        }
        let ratio = SplitRatio::try_from(ratio)?.toward(direction);
        self.split_with(direction.axis(), ratio)
    }

    fn split_with(
        &mut self,
        axis: Axis,
        ratio: SplitRatio,
    ) -> Result<Option<Box<dyn Pane>>, LayoutError> {
        let LayoutNode::Leaf { region, pane } = self else {
            return Err(LayoutError::AlreadySplit);
        };
        let region = *region;
        let (a, b) = partition(region, axis, ratio)?;
        let detached = pane.take();
        *self = LayoutNode::Split {
            region,
            axis,
            ratio,
            first: Box::new(LayoutNode::root(a)),
            second: Box::new(LayoutNode::root(b)),
        };
        debug!(target: "layout", %region, ?axis, %ratio, first = %a, second = %b, "split");
        Ok(detached)
    }

    /// Bind `pane` to this leaf, returning the pane it replaces.
    pub fn bind(&mut self, mut pane: Box<dyn Pane>) -> Result<Option<Box<dyn Pane>>, LayoutError> {
        let LayoutNode::Leaf { region, pane: slot } = self else {
            return Err(LayoutError::NotALeaf);
        };
        pane.update(*region);
        debug!(target: "layout", pane = pane.name(), region = %region, "bind");
        Ok(slot.replace(pane))
    }

    pub fn node(&self, path: &[Side]) -> Option<&LayoutNode> {
        let Some((step, rest)) = path.split_first() else {
            return Some(self);
        };
        let (first, second) = self.children()?;
        match step {
            Side::First => first.node(rest),
            Side::Second => second.node(rest),
        }
    }

    pub fn node_mut(&mut self, path: &[Side]) -> Option<&mut LayoutNode> {
        let Some((step, rest)) = path.split_first() else {
            return Some(self);
        };
        match self {
            LayoutNode::Split { first, second, .. } => match step {
                Side::First => first.node_mut(rest),
                Side::Second => second.node_mut(rest),
            },
            LayoutNode::Leaf { .. } => None,
        }
    }

    /// Re-derive every region in the tree from `region`. Validates the whole
    /// tree first; on error nothing is modified.
    pub fn recompute(&mut self, region: Region) -> Result<(), LayoutError> {
        let mut plan = Vec::new();
        self.plan(region, &mut plan)?;
        self.apply(&mut plan.into_iter());
        debug!(target: "layout", %region, "recomputed");
        Ok(())
    }

    /// Preorder list of the regions every node would get under `region`.
    fn plan(&self, region: Region, out: &mut Vec<Region>) -> Result<(), LayoutError> {
        out.push(region);
        if let LayoutNode::Split {
            axis,
            ratio,
            first,
            second,
            ..
        } = self
        {
            let (a, b) = partition(region, *axis, *ratio)?;
            first.plan(a, out)?;
            second.plan(b, out)?;
        }
        Ok(())
    }

    fn apply(&mut self, plan: &mut impl Iterator<Item = Region>) {
        let Some(next) = plan.next() else {
            return;
        };
        match self {
            LayoutNode::Leaf { region, pane } => {
                *region = next;
                if let Some(pane) = pane {
                    pane.update(next);
                }
            }
            LayoutNode::Split {
                region,
                first,
                second,
                ..
            } => {
                *region = next;
                first.apply(plan);
                second.apply(plan);
            }
        }
    }

    /// Render every leaf. Empty leaves get a border and a placeholder label.
    pub fn render(&mut self, surface: &mut dyn DisplaySurface) -> anyhow::Result<()> {
        match self {
            LayoutNode::Leaf { region, pane } => {
                let handle = surface.region_handle(*region)?;
                match pane {
                    Some(pane) => pane.render(surface, &handle)?,
                    None => {
                        surface.clear_region(&handle)?;
                        surface.draw_border(&handle)?;
                        surface.draw_text(&handle, 1, 1, EMPTY_LEAF_LABEL, Style::plain())?;
                    }
                }
            }
            LayoutNode::Split { first, second, .. } => {
                first.render(surface)?;
                second.render(surface)?;
            }
        }
        Ok(())
    }

    /// Leaf regions in left-to-right, top-to-bottom tree order.
    pub fn leaf_regions(&self) -> Vec<Region> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<Region>) {
        match self {
            LayoutNode::Leaf { region, .. } => out.push(*region),
            LayoutNode::Split { first, second, .. } => {
                first.collect_leaves(out);
                second.collect_leaves(out);
            }
        }
    }

    /// Bound panes in tree order.
    pub fn panes_mut(&mut self) -> Vec<&mut Box<dyn Pane>> {
        let mut out = Vec::new();
        self.collect_panes(&mut out);
        out
    }

    fn collect_panes<'a>(&'a mut self, out: &mut Vec<&'a mut Box<dyn Pane>>) {
        match self {
            LayoutNode::Leaf { pane, .. } => {
                if let Some(pane) = pane {
                    out.push(pane);
                }
            }
            LayoutNode::Split { first, second, .. } => {
                first.collect_panes(out);
                second.collect_panes(out);
            }
        }
    }
}

impl fmt::Debug for LayoutNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutNode::Leaf { region, pane } => f
                .debug_struct("Leaf")
                .field("region", region)
                .field("pane", &pane.as_ref().map(|p| p.name()))
                .finish(),
            LayoutNode::Split {
                region,
                axis,
                ratio,
                first,
                second,
            } => f
                .debug_struct("Split")
                .field("region", region)
                .field("axis", axis)
                .field("ratio", ratio)
                .field("first", first)
                .field("second", second)
                .finish(),
        }
    }
}
