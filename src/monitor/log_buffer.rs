//! Bounded, batched log rendering
//!
//! Lines pile up in `pending` and are moved to the [`LogPane`] in one batch
//! per tick. The pane never holds more than `max_logs` entries.

use std::future;
use std::mem;
use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use super::surface::LogPane;

pub const MAX_LOGS: usize = 50;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferWake {
    Tick,
    StopDue,
}

struct FlushTimer {
    interval: Interval,
    stop_at: Option<Instant>,
}

pub struct LogBuffer {
    pending: Vec<String>,
    max_logs: usize,
    timer: Option<FlushTimer>,
}

impl LogBuffer {
    pub fn new(max_logs: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_logs: max_logs.max(1),
            timer: None,
        }
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.pending.push(text.into());
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// (Re)start the periodic flush. A running timer is replaced, not doubled.
    pub fn start_flushing(&mut self, every: Duration) {
        let every = every.max(Duration::from_millis(1));
        let mut interval = time::interval_at(Instant::now() + every, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(FlushTimer {
            interval,
            stop_at: None,
        });
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Tear the timer down now. Pending lines are dropped; calling twice is fine.
    pub fn stop(&mut self) {
        if self.timer.take().is_some() {
            tracing::trace!(dropped = self.pending.len(), "log buffer stopped");
        }
        self.pending.clear();
    }

    /// Keep flushing for `grace`, then flush whatever is left and stop.
    ///
    /// An earlier deadline is never pushed back by a later call.
    pub fn schedule_stop(&mut self, grace: Duration) {
        if let Some(timer) = self.timer.as_mut() {
            if timer.stop_at.is_none() {
                timer.stop_at = Some(Instant::now() + grace);
            }
        }
    }

    /// Resolve at the next tick or at the stop deadline. Never resolves once stopped.
    pub async fn wait(&mut self) -> BufferWake {
        let Some(timer) = self.timer.as_mut() else {
            return future::pending().await;
        };
        let stop_at = timer.stop_at;

        tokio::select! {
            biased;
            _ = sleep_until_opt(stop_at) => BufferWake::StopDue,
            _ = timer.interval.tick() => BufferWake::Tick,
        }
    }

    pub fn on_wake(&mut self, wake: BufferWake, pane: &mut LogPane) {
        match wake {
            BufferWake::Tick => {
                self.flush(pane);
            }
            BufferWake::StopDue => {
                self.flush(pane);
                self.timer = None;
            }
        }
    }

    /// Move every pending line to `pane` in one batch and enforce the bound.
    pub fn flush(&mut self, pane: &mut LogPane) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        let batch = mem::take(&mut self.pending);
        let count = batch.len();
        pane.append_batch(batch);
        while pane.len() > self.max_logs {
            pane.evict_oldest();
        }
        pane.scroll_to_latest();
        count
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
