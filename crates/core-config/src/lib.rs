//! Runtime configuration.
//!
//! There is no configuration file: values come from explicit overrides (the
//! command line) layered over a single environment variable (`EDITOR`) and
//! built-in defaults. The environment is read through an injected lookup so
//! resolution is deterministic under test.
//!
//! Validation: split ratios must lie strictly inside (0, 1) and are rejected
//! otherwise. Durations are clamped to a sane floor; any value changed by
//! clamping is logged with target `config`.

use std::time::Duration;
use tracing::info;

pub const EDITOR_VAR: &str = "EDITOR";
pub const DEFAULT_EDITOR: &str = "nano";
pub const DEFAULT_PAGER: &str = "less";
pub const DEFAULT_TITLE: &str = "Files";
pub const DEFAULT_STATUS_RATIO: f64 = 0.2;
pub const DEFAULT_LIST_RATIO: f64 = 0.25;
pub const DEFAULT_TICK: Duration = Duration::from_millis(250);
pub const MIN_TICK: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be strictly between 0 and 1, got {value}")]
    InvalidRatio { name: &'static str, value: f64 },
}

/// Explicit values that win over environment and defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub title: Option<String>,
    pub editor: Option<String>,
    pub pager: Option<String>,
    pub status_ratio: Option<f64>,
    pub list_ratio: Option<f64>,
    pub tick: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub title: String,
    pub editor: String,
    pub pager: String,
    /// Bound on each `read_key` wait.
    pub read_timeout: Duration,
    /// Fallback poll period of the resize watcher.
    pub resize_poll_interval: Duration,
    /// Share of the screen height given to the status bar.
    pub status_ratio: f64,
    /// Share of the list pane width given to the list itself.
    pub list_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            editor: DEFAULT_EDITOR.to_string(),
            pager: DEFAULT_PAGER.to_string(),
            read_timeout: DEFAULT_TICK,
            resize_poll_interval: DEFAULT_TICK,
            status_ratio: DEFAULT_STATUS_RATIO,
            list_ratio: DEFAULT_LIST_RATIO,
        }
    }
}

fn check_ratio(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidRatio { name, value })
    }
}

/// Editor from the environment; unset and blank both fall back.
pub fn find_default_editor(env: impl Fn(&str) -> Option<String>) -> String {
    env(EDITOR_VAR)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}

impl Config {
    pub fn resolve(
        overrides: Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let editor = overrides
            .editor
            .unwrap_or_else(|| find_default_editor(env));
        let status_ratio = check_ratio(
            "status ratio",
            overrides.status_ratio.unwrap_or(defaults.status_ratio),
        )?;
        let list_ratio = check_ratio(
            "list ratio",
            overrides.list_ratio.unwrap_or(defaults.list_ratio),
        )?;

        let raw_tick = overrides.tick.unwrap_or(DEFAULT_TICK);
        let tick = raw_tick.max(MIN_TICK);
        if tick != raw_tick {
            info!(
                target: "config",
                raw_ms = raw_tick.as_millis() as u64,
                clamped_ms = tick.as_millis() as u64,
                "tick_clamped"
            );
        }

        let cfg = Config {
            title: overrides.title.unwrap_or(defaults.title),
            editor,
            pager: overrides.pager.unwrap_or(defaults.pager),
            read_timeout: tick,
            resize_poll_interval: tick,
            status_ratio,
            list_ratio,
        };
        info!(
            target: "config",
            editor = %cfg.editor,
            pager = %cfg.pager,
            tick_ms = tick.as_millis() as u64,
            status_ratio,
            list_ratio,
            "resolved"
        );
        Ok(cfg)
    }

    /// Resolve against the real process environment.
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |k| std::env::var(k).ok())
    }
}
