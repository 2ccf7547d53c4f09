//! Core input types and wake-up primitives shared by the panel browser crates.
//!
//! Scope: the normalized key model consumed by panes, the `KeySource`
//! contract the event loop blocks on, and the `ResizeNudge` handle the input
//! side uses to wake the resize watcher early.
//!
//! Invariants:
//! * `KeySource::read_key` is the only operation in the loop allowed to wait for
//!   an unbounded duration (`timeout == None`).
//! * A `KeyRead::Timeout` carries no information; callers treat it as a plain
//!   scheduling point.
//! * `ResizeNudge` coalesces: any number of `nudge()` calls between two
//!   `notified()` awaits wake the waiter exactly once.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;
use tokio::sync::Notify;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
// Relaxed atomic counters. They are inspected by tests and logged at shutdown.
// -------------------------------------------------------------------------------------------------
pub static KEYPRESS_TOTAL: AtomicU64 = AtomicU64::new(0); // key events surfaced by a KeySource
pub static READ_TIMEOUTS: AtomicU64 = AtomicU64::new(0); // read_key calls that ended in Timeout
pub static RESIZE_NUDGES: AtomicU64 = AtomicU64::new(0); // terminal resize reports forwarded to the watcher

/// Result of one bounded wait for input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRead {
    Key(KeyEvent),
    /// The timeout elapsed (or the wait was interrupted by a non-key event).
    Timeout,
    /// The input stream ended; no further keys will arrive.
    Closed,
}

/// Anything the event loop can block on for keys.
///
/// Implementors must be cancel-safe: the loop races `read_key` against the
/// resize channel and drops the future when the other branch wins.
#[allow(async_fn_in_trait)]
pub trait KeySource {
    /// Wait for the next key. `None` waits without bound.
    async fn read_key(&mut self, timeout: Option<Duration>) -> EventResult<KeyRead>;
}

/// Wake-up handle shared between the input side and the resize watcher.
#[derive(Clone, Debug, Default)]
pub struct ResizeNudge {
    notify: Arc<Notify>,
}

impl ResizeNudge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the terminal reported a size change. Never blocks.
    pub fn nudge(&self) {
        RESIZE_NUDGES.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.notify.notify_one();
    }

    /// Wait for the next nudge (returns immediately if one is already pending).
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyEvent {
    pub const fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    /// Unmodified key.
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::empty())
    }

    /// Unmodified printable character.
    pub const fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    /// `true` for Ctrl-C, which raw mode delivers as a key instead of SIGINT.
    pub fn is_interrupt(&self) -> bool {
        matches!(self.code, KeyCode::Char('c') | KeyCode::Char('C'))
            && self.mods.contains(KeyModifiers::CTRL)
    }
}

/// Normalized logical key representations consumed by panes and the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const CTRL = 0b0000_0001;
        const ALT  = 0b0000_0010;
        const SHIFT= 0b0000_0100;
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.code, self.mods)
    }
}

/// Helper result type for key sources.
pub type EventResult<T> = anyhow::Result<T>;
