//! Terminal backend abstraction and crossterm implementation.
//!
//! Everything that touches the physical terminal lives here: raw-mode and
//! alternate-screen entry, the scoped `TerminalGuard` that restores the
//! terminal on every exit path, suspension around child processes, and the
//! `DisplaySurface` implementations the panes draw through.

use anyhow::Result;
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
    },
};
use std::io::{self, stdout};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, warn};

mod canvas;
pub mod clip;
mod crossterm_surface;
pub mod geometry;
mod headless;
pub mod style;
pub mod surface;
pub mod writer;

pub use canvas::{Cell, Frame};
pub use crossterm_surface::{CrosstermSizeProbe, CrosstermSurface};
pub use geometry::{DegenerateRegion, Region, Size};
pub use headless::{HeadlessSizeProbe, HeadlessSurface};
pub use style::{Attr, Color, Style};
pub use surface::{DisplaySurface, RegionHandle, SizeProbe, SurfaceError};

/// True while raw mode + alternate screen are active.
static ENTERED: AtomicBool = AtomicBool::new(false);

/// Bumped whenever the terminal is handed to a child process; surfaces
/// compare it against the value they last saw and repaint in full.
pub(crate) static SUSPEND_EPOCH: AtomicU64 = AtomicU64::new(0);

static REFRESHES: AtomicU64 = AtomicU64::new(0);
static COMMANDS_EMITTED: AtomicU64 = AtomicU64::new(0);

/// Process-wide refresh counters.
pub struct TerminalMetrics;

impl TerminalMetrics {
    pub(crate) fn record_refresh(commands: usize) {
        REFRESHES.fetch_add(1, Ordering::Relaxed);
        COMMANDS_EMITTED.fetch_add(commands as u64, Ordering::Relaxed);
    }

    pub fn refreshes() -> u64 {
        REFRESHES.load(Ordering::Relaxed)
    }

    pub fn commands_emitted() -> u64 {
        COMMANDS_EMITTED.load(Ordering::Relaxed)
    }
}

/// A restoration step that failed. Teardown keeps going after a failure and
/// reports the first one.
#[derive(Debug, thiserror::Error)]
#[error("terminal teardown failed at {stage}: {source}")]
pub struct TeardownError {
    pub stage: &'static str,
    #[source]
    pub source: io::Error,
}

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<(), TeardownError>;
    fn set_title(&mut self, title: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct CrosstermBackend {
    entered: bool,
}

/// RAII guard ensuring terminal state restoration even if caller early-returns or panics.
#[must_use = "dropping the guard immediately restores the terminal"]
pub struct TerminalGuard {
    backend: CrosstermBackend,
    active: bool,
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { entered: false }
    }

    /// Enter and return a guard that will leave on drop.
    pub fn enter_guard(mut self) -> Result<TerminalGuard> {
        self.enter()?;
        Ok(TerminalGuard {
            backend: self,
            active: true,
        })
    }
}

type Step = (&'static str, fn() -> io::Result<()>);

const RESTORE_STEPS: [Step; 3] = [
    ("show cursor", || execute!(stdout(), Show)),
    ("leave alternate screen", || execute!(stdout(), LeaveAlternateScreen)),
    ("disable raw mode", disable_raw_mode),
];

/// Run every restoration step, logging each failure, and return the first.
fn restore_all() -> Result<(), TeardownError> {
    let mut first = None;
    for (stage, step) in RESTORE_STEPS {
        if let Err(source) = step() {
            warn!(target: "terminal", stage, error = %source, "restore step failed");
            first.get_or_insert(TeardownError { stage, source });
        } else {
            debug!(target: "terminal", stage, "restored");
        }
    }
    match first {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            if let Err(e) = execute!(stdout(), EnterAlternateScreen, Hide) {
                // Half-entered: put raw mode back before reporting.
                let _ = disable_raw_mode();
                return Err(e.into());
            }
            self.entered = true;
            ENTERED.store(true, Ordering::SeqCst);
            debug!(target: "terminal", "entered raw mode + alternate screen");
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<(), TeardownError> {
        if !self.entered {
            return Ok(());
        }
        self.entered = false;
        ENTERED.store(false, Ordering::SeqCst);
        restore_all()
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        execute!(stdout(), SetTitle(title))?;
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

impl TerminalGuard {
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.backend.set_title(title)
    }

    /// Explicit teardown with error reporting. Drop covers the paths that
    /// never reach this.
    pub fn release(mut self) -> Result<(), TeardownError> {
        self.active = false;
        self.backend.leave()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.active {
            let _ = self.backend.leave();
        }
    }
}

/// Best-effort restore for the panic hook, where no guard is reachable.
pub fn emergency_restore() {
    if ENTERED.swap(false, Ordering::SeqCst) {
        let _ = restore_all();
    }
}

pub fn is_entered() -> bool {
    ENTERED.load(Ordering::SeqCst)
}

/// Run `f` with the terminal in its normal state (cooked mode, main screen,
/// cursor visible), then re-enter. Outside an entered session `f` just runs.
pub fn with_terminal_suspended<T>(f: impl FnOnce() -> T) -> Result<T> {
    if !is_entered() {
        return Ok(f());
    }
    if let Err(e) = restore_all() {
        warn!(target: "terminal", error = %e, "suspend incomplete");
    }
    SUSPEND_EPOCH.fetch_add(1, Ordering::SeqCst);
    let out = f();
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, Hide)?;
    debug!(target: "terminal", "resumed after child process");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspend_outside_session_runs_closure_directly() {
        let epoch = SUSPEND_EPOCH.load(Ordering::SeqCst);
        let v = with_terminal_suspended(|| 7).unwrap();
        assert_eq!(v, 7);
        assert_eq!(SUSPEND_EPOCH.load(Ordering::SeqCst), epoch);
    }

    #[test]
    fn leave_without_enter_is_noop() {
        let mut b = CrosstermBackend::new();
        assert!(b.leave().is_ok());
        emergency_restore();
        assert!(!is_entered());
    }
}
