//! Flowed grid of read-only status indicators.
//!
//! Indicators are placed left to right at a fixed column stride starting at
//! the first inner cell, wrapping to the next row (fixed row stride) when the
//! next slot would cross the right border. When the next row would fall
//! outside the usable height, placement stops and a marker is drawn on the
//! bottom border instead. Every indicator renders independently: one failing
//! is logged and counted, and the rest still draw.

use core_model::Pane;
use core_terminal::clip::{clip_to_width, display_width};
use core_terminal::{DisplaySurface, Region, RegionHandle, Style, SurfaceError};
use std::fmt;
use std::str::FromStr;
use tracing::{trace, warn};

pub const COL_STRIDE: u16 = 20;
pub const ROW_STRIDE: u16 = 3;
pub const HIDDEN_MARKER: &str = "more hidden indicators . . .";
const BAR_CELLS: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorValue {
    Text(String),
    /// Check box: `[x]` / `[ ]`.
    Flag(bool),
    /// Ten-cell bar; values above 100 fail to render.
    Percent(u8),
}

#[derive(Debug, thiserror::Error)]
pub enum IndicatorError {
    #[error("{label}: percent {value} is above 100")]
    OutOfRange { label: String, value: u8 },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IndicatorParseError {
    #[error("expected LABEL=VALUE, got {0:?}")]
    MissingSeparator(String),
    #[error("indicator label is empty")]
    EmptyLabel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub label: String,
    pub value: IndicatorValue,
    pub label_style: Option<Style>,
    pub value_style: Option<Style>,
}

impl Indicator {
    pub fn new(label: impl Into<String>, value: IndicatorValue) -> Self {
        Self {
            label: label.into(),
            value,
            label_style: None,
            value_style: None,
        }
    }

    pub fn text(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, IndicatorValue::Text(value.into()))
    }

    pub fn flag(label: impl Into<String>, on: bool) -> Self {
        Self::new(label, IndicatorValue::Flag(on))
    }

    pub fn percent(label: impl Into<String>, value: u8) -> Self {
        Self::new(label, IndicatorValue::Percent(value))
    }

    pub fn with_label_style(mut self, style: Style) -> Self {
        self.label_style = Some(style);
        self
    }

    pub fn with_value_style(mut self, style: Style) -> Self {
        self.value_style = Some(style);
        self
    }

    /// Textual form of the value.
    pub fn value_text(&self) -> Result<String, IndicatorError> {
        Ok(match &self.value {
            IndicatorValue::Text(s) => s.clone(),
            IndicatorValue::Flag(true) => "[x]".to_string(),
            IndicatorValue::Flag(false) => "[ ]".to_string(),
            IndicatorValue::Percent(p) if *p > 100 => {
                return Err(IndicatorError::OutOfRange {
                    label: self.label.clone(),
                    value: *p,
                });
            }
            IndicatorValue::Percent(p) => {
                let filled = (p / BAR_CELLS) as usize;
                format!(
                    "[{}{}]",
                    "#".repeat(filled),
                    "-".repeat(BAR_CELLS as usize - filled)
                )
            }
        })
    }

    /// Draw label then value into a slot `width` columns wide at (row, col).
    fn render(
        &self,
        surface: &mut dyn DisplaySurface,
        region: &RegionHandle,
        row: u16,
        col: u16,
        width: u16,
    ) -> Result<(), IndicatorError> {
        let value = self.value_text()?;
        let label = clip_to_width(&self.label, width as usize);
        let label_style = self.label_style.unwrap_or(Style::bold());
        surface.draw_text(region, row, col, &label, label_style)?;
        let used = display_width(&label) as u16 + 1;
        if used < width {
            let value = clip_to_width(&value, (width - used) as usize);
            let value_style = self.value_style.unwrap_or_default();
            surface.draw_text(region, row, col + used, &value, value_style)?;
        }
        Ok(())
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_text() {
            Ok(v) => write!(f, "{} {}", self.label, v),
            Err(_) => write!(f, "{} ?", self.label),
        }
    }
}

/// `LABEL=VALUE`. `true`/`false` become flags, `%NN` a percent bar, anything
/// else text.
impl FromStr for Indicator {
    type Err = IndicatorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (label, raw) = s
            .split_once('=')
            .ok_or_else(|| IndicatorParseError::MissingSeparator(s.to_string()))?;
        let label = label.trim();
        if label.is_empty() {
            return Err(IndicatorParseError::EmptyLabel);
        }
        let raw = raw.trim();
        let value = match raw {
            "true" => IndicatorValue::Flag(true),
            "false" => IndicatorValue::Flag(false),
            _ => match raw.strip_prefix('%').and_then(|n| n.parse::<u8>().ok()) {
                Some(p) => IndicatorValue::Percent(p),
                None => IndicatorValue::Text(raw.to_string()),
            },
        };
        Ok(Indicator::new(label, value))
    }
}

/// Outcome of one status bar render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusRenderReport {
    pub drawn: usize,
    pub hidden: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct StatusBar {
    indicators: Vec<Indicator>,
    region: Option<Region>,
    last_report: StatusRenderReport,
}

impl StatusBar {
    pub fn new(indicators: Vec<Indicator>) -> Self {
        Self {
            indicators,
            region: None,
            last_report: StatusRenderReport::default(),
        }
    }

    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn last_report(&self) -> StatusRenderReport {
        self.last_report
    }

    /// Lay out and draw every indicator that fits.
    pub fn render_report(
        &self,
        surface: &mut dyn DisplaySurface,
        region: &RegionHandle,
    ) -> Result<StatusRenderReport, SurfaceError> {
        surface.clear_region(region)?;
        surface.draw_border(region)?;

        let (h, w) = (region.height() as u32, region.width() as u32);
        let usable_right = w.saturating_sub(2);
        let last_row = h.saturating_sub(2);
        let stride = COL_STRIDE as u32;
        let mut report = StatusRenderReport::default();
        let (mut x, mut y) = (1u32, 1u32);

        for (i, indicator) in self.indicators.iter().enumerate() {
            // First slot of a row is always taken, so a narrow bar still shows one per row.
            if x > 1 && x + stride - 1 > usable_right {
                x = 1;
                y += ROW_STRIDE as u32;
            }
            if y > last_row {
                report.hidden = self.indicators.len() - i;
                surface.draw_text(region, (h - 1) as u16, 1, HIDDEN_MARKER, Style::bold())?;
                break;
            }
            let width = (stride - 1).min(usable_right + 1 - x) as u16;
            match indicator.render(surface, region, y as u16, x as u16, width) {
                Ok(()) => report.drawn += 1,
                Err(e) => {
                    warn!(target: "status", label = %indicator.label, error = %e, "indicator render failed");
                    report.failed += 1;
                }
            }
            x += stride;
        }
        trace!(target: "status", ?report, "rendered");
        Ok(report)
    }
}

impl Pane for StatusBar {
    fn name(&self) -> &str {
        "status"
    }

    fn update(&mut self, region: Region) {
        self.region = Some(region);
    }

    fn render(
        &mut self,
        surface: &mut dyn DisplaySurface,
        region: &RegionHandle,
    ) -> anyhow::Result<()> {
        self.last_report = self.render_report(surface, region)?;
        Ok(())
    }
}
