//! Event loop state machine.
//!
//! One iteration: render every pane, apply a pending size change (resize the
//! surface, recompute the tree, render again), refresh, then wait for the
//! first of a key, a size change or termination. While the terminal is too
//! small to lay out, the screen stays blank and nothing is painted. The loop and the resize
//! watcher share one thread and only interleave at `.await` points, so a
//! render never observes a half-recomputed tree.

use core_events::{KEYPRESS_TOTAL, KeyCode, KeyEvent, KeyRead, KeySource, READ_TIMEOUTS, RESIZE_NUDGES};
use core_model::{KeyOutcome, LayoutError, LayoutNode};
use core_terminal::{DisplaySurface, Region, Size, TeardownError, TerminalGuard, TerminalMetrics};
use std::fmt;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, trace, warn};

pub const QUIT_KEY: KeyEvent = KeyEvent::char('q');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    QuitKey,
    Interrupt,
    Terminated,
    InputClosed,
    /// The loop body returned an error; teardown still runs.
    Failed,
}

impl ShutdownReason {
    fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::QuitKey => "quit_key",
            ShutdownReason::Interrupt => "interrupt",
            ShutdownReason::Terminated => "terminated",
            ShutdownReason::InputClosed => "input_closed",
            ShutdownReason::Failed => "failed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

fn log_telemetry(reason: ShutdownReason) {
    debug!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        keypresses = KEYPRESS_TOTAL.load(Ordering::Relaxed),
        read_timeouts = READ_TIMEOUTS.load(Ordering::Relaxed),
        resize_nudges = RESIZE_NUDGES.load(Ordering::Relaxed),
        refreshes = TerminalMetrics::refreshes(),
        commands = TerminalMetrics::commands_emitted(),
        "telemetry"
    );
}

pub struct Runtime<S: DisplaySurface, K: KeySource> {
    surface: S,
    keys: K,
    root: LayoutNode,
    sizes: watch::Receiver<Size>,
    watching: bool,
    pending_size: Option<Size>,
    /// Set after a rejected size blanked the screen.
    blanked: bool,
    read_timeout: Option<Duration>,
    /// Index into `root.panes_mut()` of the focused pane.
    focus: Option<usize>,
    state: LoopState,
    watcher: Option<JoinHandle<()>>,
    guard: Option<TerminalGuard>,
}

impl<S: DisplaySurface, K: KeySource> Runtime<S, K> {
    pub fn new(surface: S, keys: K, root: LayoutNode, sizes: watch::Receiver<Size>) -> Self {
        Self {
            surface,
            keys,
            root,
            sizes,
            watching: true,
            pending_size: None,
            blanked: false,
            read_timeout: None,
            focus: None,
            state: LoopState::Running,
            watcher: None,
            guard: None,
        }
    }

    /// Bound each key wait. `None` waits without bound.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Watcher task to cancel at teardown.
    pub fn with_watcher(mut self, watcher: JoinHandle<()>) -> Self {
        self.watcher = Some(watcher);
        self
    }

    /// Terminal session to release at teardown.
    pub fn with_guard(mut self, guard: TerminalGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn root(&self) -> &LayoutNode {
        &self.root
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    pub fn focused_pane(&mut self) -> Option<String> {
        let idx = self.focus?;
        self.root
            .panes_mut()
            .get(idx)
            .map(|p| p.name().to_string())
    }

    /// Run until a shutdown reason arises, then tear down. Teardown runs on
    /// the error path too; a loop error wins over a teardown error.
    pub async fn run(&mut self, terminate: impl Future<Output = ()>) -> anyhow::Result<ShutdownReason> {
        let span = tracing::debug_span!(target: "runtime", "event_loop");
        let result = self.event_loop(terminate).instrument(span).await;
        self.state = LoopState::Quitting;
        let reason = match &result {
            Ok(reason) => *reason,
            Err(e) => {
                error!(target: "runtime", error = %e, "loop_failed");
                ShutdownReason::Failed
            }
        };
        let teardown = self.finalize_shutdown(reason).await;
        let reason = result?;
        teardown?;
        Ok(reason)
    }

    async fn event_loop(&mut self, terminate: impl Future<Output = ()>) -> anyhow::Result<ShutdownReason> {
        tokio::pin!(terminate);
        self.focus_first();
        loop {
            if !self.blanked {
                self.root.render(&mut self.surface)?;
            }
            if let Some(size) = self.take_pending_size()
                && self.apply_resize(size)
            {
                self.root.render(&mut self.surface)?;
            }
            if !self.blanked {
                self.surface.refresh()?;
            }

            let watching = self.watching;
            tokio::select! {
                biased;
                _ = &mut terminate => {
                    info!(target: "runtime", "terminate_signal");
                    return Ok(ShutdownReason::Terminated);
                }
                changed = self.sizes.changed(), if watching => match changed {
                    Ok(()) => self.pending_size = Some(*self.sizes.borrow_and_update()),
                    Err(_) => {
                        debug!(target: "runtime.resize", "watcher_channel_closed");
                        self.watching = false;
                    }
                },
                read = self.keys.read_key(self.read_timeout) => match read? {
                    KeyRead::Key(key) => {
                        if let Some(reason) = self.dispatch(&key) {
                            return Ok(reason);
                        }
                    }
                    KeyRead::Timeout => trace!(target: "runtime", "read_timeout"),
                    KeyRead::Closed => return Ok(ShutdownReason::InputClosed),
                },
            }
        }
    }

    fn take_pending_size(&mut self) -> Option<Size> {
        if self.watching && matches!(self.sizes.has_changed(), Ok(true)) {
            self.pending_size = Some(*self.sizes.borrow_and_update());
        }
        self.pending_size.take()
    }

    /// Recompute the tree for `size`, then resize the surface. On a
    /// degenerate size both keep their previous geometry and the screen is
    /// blanked once. Returns whether the tree should be rendered again.
    fn apply_resize(&mut self, size: Size) -> bool {
        if size == self.surface.size() && !self.blanked {
            return false;
        }
        let recomputed = Region::full(size)
            .map_err(LayoutError::from)
            .and_then(|region| self.root.recompute(region));
        match recomputed {
            Ok(()) => {
                if size != self.surface.size() {
                    self.surface.resize(size);
                }
                self.blanked = false;
                info!(target: "runtime.resize", %size, "geometry_recomputed");
                true
            }
            Err(e) => {
                warn!(target: "runtime.resize", %size, error = %e, "resize_rejected");
                if !self.blanked {
                    if let Err(e) = self.surface.blank() {
                        warn!(target: "runtime.resize", error = %e, "blank_failed");
                    }
                    self.blanked = true;
                }
                false
            }
        }
    }

    fn focusable(&mut self) -> Vec<usize> {
        self.root
            .panes_mut()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.accepts_focus())
            .map(|(i, _)| i)
            .collect()
    }

    fn focus_first(&mut self) {
        if self.focus.is_some() {
            return;
        }
        let Some(&first) = self.focusable().first() else {
            return;
        };
        self.set_focus(first);
    }

    fn set_focus(&mut self, idx: usize) {
        let previous = self.focus.replace(idx);
        let mut panes = self.root.panes_mut();
        if let Some(prev) = previous
            && let Some(pane) = panes.get_mut(prev)
        {
            pane.unfocus();
        }
        if let Some(pane) = panes.get_mut(idx) {
            pane.focus();
            debug!(target: "runtime", pane = pane.name(), "focus");
        }
    }

    fn cycle_focus(&mut self, forward: bool) {
        let ring = self.focusable();
        if ring.is_empty() {
            return;
        }
        let pos = self
            .focus
            .and_then(|f| ring.iter().position(|&i| i == f))
            .unwrap_or(0);
        let next = if forward {
            (pos + 1) % ring.len()
        } else {
            (pos + ring.len() - 1) % ring.len()
        };
        if Some(ring[next]) != self.focus {
            self.set_focus(ring[next]);
        }
    }

    fn dispatch(&mut self, key: &KeyEvent) -> Option<ShutdownReason> {
        if key.is_interrupt() {
            return Some(ShutdownReason::Interrupt);
        }
        if *key == QUIT_KEY {
            return Some(ShutdownReason::QuitKey);
        }
        match key.code {
            KeyCode::Tab => self.cycle_focus(true),
            KeyCode::BackTab => self.cycle_focus(false),
            _ => {
                let Some(idx) = self.focus else {
                    trace!(target: "runtime", %key, "no_focused_pane");
                    return None;
                };
                if let Some(pane) = self.root.panes_mut().get_mut(idx) {
                    let outcome = pane.handle_key(key);
                    if outcome == KeyOutcome::Ignored {
                        trace!(target: "runtime", pane = pane.name(), %key, "key_ignored");
                    }
                }
            }
        }
        None
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) -> Result<(), TeardownError> {
        log_shutdown_stage(reason, "begin");

        if let Some(handle) = self.watcher.take() {
            handle.abort();
            match handle.await {
                Ok(()) => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "watcher_stopped"
                ),
                Err(err) if err.is_cancelled() => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "watcher_cancelled"
                ),
                Err(err) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "watcher_join_failed"
                ),
            }
        }
        log_shutdown_stage(reason, "watcher_done");

        let released = match self.guard.take() {
            Some(guard) => guard.release(),
            None => Ok(()),
        };
        if let Err(e) = &released {
            error!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                stage = e.stage,
                error = %e.source,
                "terminal_release_failed"
            );
        }
        log_telemetry(reason);
        log_shutdown_stage(reason, "complete");
        released
    }
}
