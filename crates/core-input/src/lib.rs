//! Key sources for the event loop.
//!
//! `CrosstermKeys` reads the real terminal through `crossterm::EventStream`;
//! `ScriptedKeys` replays a fixed sequence so the loop can be driven
//! deterministically under paused tokio time.

use core_events::{
    EventResult, KEYPRESS_TOTAL, KeyCode, KeyEvent, KeyModifiers, KeyRead, KeySource,
    READ_TIMEOUTS, ResizeNudge,
};
use core_terminal::{HeadlessSizeProbe, Size};
use crossterm::event::{
    Event as CEvent, EventStream, KeyCode as CKeyCode, KeyEvent as CKeyEvent,
    KeyEventKind as CKind, KeyModifiers as CMods,
};
use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::Instant;
use tokio_stream::StreamExt;
use tracing::{debug, trace};

/// Bound `fut` by `timeout`, mapping an elapsed wait to `KeyRead::Timeout`.
async fn bounded<F>(timeout: Option<Duration>, fut: F) -> EventResult<KeyRead>
where
    F: Future<Output = EventResult<KeyRead>>,
{
    match timeout {
        None => fut.await,
        Some(d) => match tokio::time::timeout(d, fut).await {
            Ok(read) => read,
            Err(_) => {
                READ_TIMEOUTS.fetch_add(1, Ordering::Relaxed);
                Ok(KeyRead::Timeout)
            }
        },
    }
}

fn count_key(key: KeyEvent) -> KeyRead {
    KEYPRESS_TOTAL.fetch_add(1, Ordering::Relaxed);
    trace!(target: "input", %key, "key");
    KeyRead::Key(key)
}

/// Terminal-backed key source.
///
/// Resize reports arriving on the same stream are forwarded to the resize
/// watcher through `ResizeNudge` and surface to the loop as a `Timeout` so it
/// gets a scheduling point immediately.
pub struct CrosstermKeys {
    stream: EventStream,
    nudge: ResizeNudge,
}

impl CrosstermKeys {
    pub fn new(nudge: ResizeNudge) -> Self {
        Self {
            stream: EventStream::new(),
            nudge,
        }
    }
}

impl KeySource for CrosstermKeys {
    async fn read_key(&mut self, timeout: Option<Duration>) -> EventResult<KeyRead> {
        let stream = &mut self.stream;
        let nudge = &self.nudge;
        // EventStream::next is cancel safe, so dropping this mid-wait loses nothing.
        let next = async move {
            loop {
                match stream.next().await {
                    None => {
                        debug!(target: "input", "event stream ended");
                        return Ok(KeyRead::Closed);
                    }
                    Some(Err(e)) => return Err(e.into()),
                    Some(Ok(CEvent::Key(k))) => {
                        if let Some(key) = map_key_event(&k) {
                            return Ok(count_key(key));
                        }
                    }
                    Some(Ok(CEvent::Resize(cols, rows))) => {
                        trace!(target: "input", rows, cols, "resize reported");
                        nudge.nudge();
                        return Ok(KeyRead::Timeout);
                    }
                    Some(Ok(_)) => {}
                }
            }
        };
        bounded(timeout, next).await
    }
}

/// Map a crossterm key event. Releases and unsupported keys yield `None`.
pub(crate) fn map_key_event(event: &CKeyEvent) -> Option<KeyEvent> {
    if !matches!(event.kind, CKind::Press | CKind::Repeat) {
        return None;
    }
    let code = map_code(&event.code)?;
    let mut mods = map_mods(event.modifiers);
    if let KeyCode::Char(_) = code {
        // Case already encodes shift for printable characters.
        mods.remove(KeyModifiers::SHIFT);
    }
    Some(KeyEvent::new(code, mods))
}

pub(crate) fn map_code(code: &CKeyCode) -> Option<KeyCode> {
    let mapped = match code {
        CKeyCode::Char(c) => KeyCode::Char(*c),
        CKeyCode::Enter => KeyCode::Enter,
        CKeyCode::Esc => KeyCode::Esc,
        CKeyCode::Backspace => KeyCode::Backspace,
        CKeyCode::Tab => KeyCode::Tab,
        CKeyCode::BackTab => KeyCode::BackTab,
        CKeyCode::Up => KeyCode::Up,
        CKeyCode::Down => KeyCode::Down,
        CKeyCode::Left => KeyCode::Left,
        CKeyCode::Right => KeyCode::Right,
        CKeyCode::Home => KeyCode::Home,
        CKeyCode::End => KeyCode::End,
        CKeyCode::PageUp => KeyCode::PageUp,
        CKeyCode::PageDown => KeyCode::PageDown,
        _ => return None,
    };
    Some(mapped)
}

pub(crate) fn map_mods(m: CMods) -> KeyModifiers {
    let mut out = KeyModifiers::empty();
    if m.contains(CMods::CONTROL) {
        out |= KeyModifiers::CTRL;
    }
    if m.contains(CMods::ALT) {
        out |= KeyModifiers::ALT;
    }
    if m.contains(CMods::SHIFT) {
        out |= KeyModifiers::SHIFT;
    }
    out
}

#[derive(Debug, Clone)]
enum Step {
    Key(KeyEvent),
    Wait(Duration),
    /// A `Wait` that has started; the deadline survives a cancelled read.
    Until(Instant),
    Resize(Size),
    Close,
}

/// Deterministic key source replaying a script.
///
/// An exhausted script reads as `Closed`, which the loop treats as end of
/// input.
#[derive(Debug, Default)]
pub struct ScriptedKeys {
    steps: VecDeque<Step>,
    probe: Option<HeadlessSizeProbe>,
    nudge: Option<ResizeNudge>,
}

impl ScriptedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: KeyEvent) -> Self {
        self.steps.push_back(Step::Key(key));
        self
    }

    pub fn code(self, code: KeyCode) -> Self {
        self.key(KeyEvent::plain(code))
    }

    /// One unmodified key per character.
    pub fn text(mut self, text: &str) -> Self {
        self.steps
            .extend(text.chars().map(|c| Step::Key(KeyEvent::char(c))));
        self
    }

    /// Produce no key for `d` (reads inside it time out).
    pub fn wait(mut self, d: Duration) -> Self {
        self.steps.push_back(Step::Wait(d));
        self
    }

    /// Change the simulated terminal size. Requires `with_probe`.
    pub fn resize(mut self, size: Size) -> Self {
        self.steps.push_back(Step::Resize(size));
        self
    }

    pub fn close(mut self) -> Self {
        self.steps.push_back(Step::Close);
        self
    }

    pub fn with_probe(mut self, probe: HeadlessSizeProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_nudge(mut self, nudge: ResizeNudge) -> Self {
        self.nudge = Some(nudge);
        self
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl KeySource for ScriptedKeys {
    async fn read_key(&mut self, timeout: Option<Duration>) -> EventResult<KeyRead> {
        loop {
            let Some(step) = self.steps.front().cloned() else {
                return Ok(KeyRead::Closed);
            };
            match step {
                Step::Key(key) => {
                    self.steps.pop_front();
                    return Ok(count_key(key));
                }
                Step::Close => return Ok(KeyRead::Closed),
                Step::Resize(size) => {
                    self.steps.pop_front();
                    if let Some(probe) = &self.probe {
                        probe.set(size);
                    }
                    if let Some(nudge) = &self.nudge {
                        nudge.nudge();
                    }
                    return Ok(KeyRead::Timeout);
                }
                Step::Wait(d) => {
                    if let Some(front) = self.steps.front_mut() {
                        *front = Step::Until(Instant::now() + d);
                    }
                }
                Step::Until(deadline) => {
                    let wake = match timeout {
                        Some(t) => deadline.min(Instant::now() + t),
                        None => deadline,
                    };
                    tokio::time::sleep_until(wake).await;
                    if Instant::now() >= deadline {
                        self.steps.pop_front();
                    }
                    READ_TIMEOUTS.fetch_add(1, Ordering::Relaxed);
                    return Ok(KeyRead::Timeout);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_terminal::{HeadlessSurface, SizeProbe};
    use crossterm::event::KeyEventState;

    fn press(code: CKeyCode, modifiers: CMods) -> CKeyEvent {
        CKeyEvent {
            code,
            modifiers,
            kind: CKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn maps_press_and_drops_release() {
        let k = map_key_event(&press(CKeyCode::Char('c'), CMods::CONTROL)).unwrap();
        assert!(k.is_interrupt());

        let shifted = map_key_event(&press(CKeyCode::Char('J'), CMods::SHIFT)).unwrap();
        assert_eq!(shifted, KeyEvent::char('J'));

        let mut release = press(CKeyCode::Down, CMods::NONE);
        release.kind = CKind::Release;
        assert_eq!(map_key_event(&release), None);
        assert_eq!(map_code(&CKeyCode::F(5)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn script_replays_keys_then_closes() {
        let mut keys = ScriptedKeys::new().text("jk").code(KeyCode::Enter);
        let t = Some(Duration::from_millis(100));
        assert_eq!(keys.read_key(t).await.unwrap(), KeyRead::Key(KeyEvent::char('j')));
        assert_eq!(keys.read_key(t).await.unwrap(), KeyRead::Key(KeyEvent::char('k')));
        assert_eq!(
            keys.read_key(t).await.unwrap(),
            KeyRead::Key(KeyEvent::plain(KeyCode::Enter))
        );
        assert_eq!(keys.read_key(t).await.unwrap(), KeyRead::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn long_wait_spans_several_bounded_reads() {
        let mut keys = ScriptedKeys::new()
            .wait(Duration::from_millis(250))
            .text("q");
        let start = Instant::now();
        let t = Some(Duration::from_millis(100));
        assert_eq!(keys.read_key(t).await.unwrap(), KeyRead::Timeout);
        assert_eq!(keys.read_key(t).await.unwrap(), KeyRead::Timeout);
        assert_eq!(keys.read_key(t).await.unwrap(), KeyRead::Timeout);
        assert_eq!(keys.read_key(t).await.unwrap(), KeyRead::Key(KeyEvent::char('q')));
        assert_eq!(start.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_wait_keeps_its_deadline() {
        let mut keys = ScriptedKeys::new().wait(Duration::from_millis(200)).text("x");
        let start = Instant::now();
        let cut = tokio::time::timeout(Duration::from_millis(150), keys.read_key(None)).await;
        assert!(cut.is_err());
        assert_eq!(keys.read_key(None).await.unwrap(), KeyRead::Timeout);
        assert_eq!(start.elapsed(), Duration::from_millis(200));
        assert_eq!(keys.read_key(None).await.unwrap(), KeyRead::Key(KeyEvent::char('x')));
    }

    #[tokio::test(start_paused = true)]
    async fn resize_step_updates_probe_and_nudges() {
        let surface = HeadlessSurface::new(Size::new(10, 40));
        let probe = surface.probe();
        let nudge = ResizeNudge::new();
        let mut keys = ScriptedKeys::new()
            .resize(Size::new(20, 60))
            .with_probe(probe.clone())
            .with_nudge(nudge.clone());
        assert_eq!(keys.read_key(None).await.unwrap(), KeyRead::Timeout);
        assert_eq!(probe.size().unwrap(), Size::new(20, 60));
        tokio::time::timeout(Duration::from_millis(1), nudge.notified())
            .await
            .expect("nudge delivered");
        assert_eq!(keys.remaining(), 0);
    }
}
