//! Background task publishing terminal size changes.
//!
//! The watcher wakes on a `ResizeNudge` (the input side saw a resize event)
//! or on a fallback interval, asks the probe for the current size and
//! publishes it only when it differs from the last published value. The
//! `watch` channel keeps the latest size alone, so bursts of resizes
//! collapse into one recompute on the loop side.
//!
//! The task holds nothing across an await except its own ticker, so aborting
//! it at any suspension point is safe.

use core_events::ResizeNudge;
use core_terminal::{Size, SizeProbe};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, trace, warn};

pub struct ResizeWatcher<P: SizeProbe> {
    probe: P,
    nudge: ResizeNudge,
    poll: Duration,
    tx: watch::Sender<Size>,
}

impl<P: SizeProbe> ResizeWatcher<P> {
    /// Spawn the watcher on the current runtime. `initial` is the size the
    /// surface was created with; the receiver starts out having seen it.
    pub fn spawn(
        probe: P,
        nudge: ResizeNudge,
        poll: Duration,
        initial: Size,
    ) -> (JoinHandle<()>, watch::Receiver<Size>) {
        let (tx, rx) = watch::channel(initial);
        let watcher = ResizeWatcher {
            probe,
            nudge,
            poll,
            tx,
        };
        (tokio::spawn(watcher.run()), rx)
    }

    async fn run(self) {
        let mut ticker = interval(self.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(target: "runtime.resize", poll_ms = self.poll.as_millis() as u64, "watcher_started");
        loop {
            tokio::select! {
                _ = self.nudge.notified() => trace!(target: "runtime.resize", "nudged"),
                _ = ticker.tick() => {}
            }
            if self.tx.is_closed() {
                debug!(target: "runtime.resize", "receiver_gone");
                return;
            }
            self.check();
        }
    }

    fn check(&self) {
        let size = match self.probe.size() {
            Ok(size) => size,
            Err(e) => {
                warn!(target: "runtime.resize", error = %e, "size_probe_failed");
                return;
            }
        };
        let changed = self.tx.send_if_modified(|current| {
            if *current == size {
                false
            } else {
                *current = size;
                true
            }
        });
        if changed {
            debug!(target: "runtime.resize", rows = size.rows, cols = size.cols, "size_changed");
        }
    }
}
