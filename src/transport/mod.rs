//! Push-channel subscriptions
//!
//! A [`StreamSource`] turns a job link into a [`Subscription`]: a receiver of
//! raw lines fed by a background transport task. Closing the subscription
//! aborts that task; nothing it produced afterwards is observable.

pub mod sse;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use sse::{SseDecoder, SseSource};

/// Capacity of the channel between the transport task and the session.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Line(String),
    /// The stream ended or failed. `reason` is `None` for a clean server close.
    Disconnected { reason: Option<String> },
}

pub trait StreamSource {
    fn subscribe(&self, link: &str) -> Subscription;
}

pub struct Subscription {
    rx: Option<mpsc::Receiver<SourceEvent>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<SourceEvent>, task: JoinHandle<()>) -> Self {
        Self {
            rx: Some(rx),
            task: Some(task),
        }
    }

    /// A subscription fed directly through a channel, with no task to own.
    pub fn from_channel(rx: mpsc::Receiver<SourceEvent>) -> Self {
        Self {
            rx: Some(rx),
            task: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.rx.is_some()
    }

    /// Next event in arrival order. A sender dropped without a word counts as
    /// a clean disconnect. Never resolves once closed.
    pub async fn recv(&mut self) -> SourceEvent {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };

        match rx.recv().await {
            Some(event) => event,
            None => SourceEvent::Disconnected { reason: None },
        }
    }

    /// Stop receiving. Safe to call any number of times.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(mut rx) = self.rx.take() {
            rx.close();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}
