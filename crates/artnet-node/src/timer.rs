//! Failsafe timer (spec.md §4.3 "Failsafe timer").
//!
//! Sleeps `tick-interval-ms`, emits `now` into a `watch` channel — only the
//! freshest tick is ever pending, matching the spec's "sliding-buffer(1)"
//! requirement without a custom ring buffer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::PauseGate;

pub fn spawn(
    tick_interval: Duration,
    start: Instant,
    running: Arc<std::sync::atomic::AtomicBool>,
    pause: PauseGate,
) -> watch::Receiver<Duration> {
    let (tx, rx) = watch::channel(Duration::ZERO);
    tokio::spawn(async move {
        while running.load(std::sync::atomic::Ordering::Acquire) {
            pause.wait_resumed().await;
            tokio::time::sleep(tick_interval).await;
            if tx.send(start.elapsed()).is_err() {
                break;
            }
        }
    });
    rx
}
