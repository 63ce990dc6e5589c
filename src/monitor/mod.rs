//! Live operation monitor
//!
//! Turns the job's free-text push stream into progress, a bounded log and a
//! single terminal outcome. See [`Controller::start_monitoring`].

pub mod artifact;
pub mod classifier;
pub mod controller;
pub mod error;
pub mod log_buffer;
pub mod presenter;
pub mod session;
pub mod surface;

use std::time::Duration;

pub use artifact::ResultArtifact;
pub use classifier::{classify, ClassifiedEvent};
pub use controller::Controller;
pub use error::MonitorError;
pub use log_buffer::{LogBuffer, MAX_LOGS};
pub use presenter::ProgressState;
pub use session::{Session, SessionOutcome, SessionStatus, Wake};
pub use surface::{LogPane, ProgressIndicator, ResultSurface, Surface};

/// Log line standing in for a generic "download completed" report.
pub const ALL_DONE_MESSAGE: &str = "✅ All files processing completed.";

/// Rendered-log marker that suppresses the connection-closed status.
pub const COMPLETION_MARKER: &str = "processing completed";

pub const CONNECTION_CLOSED_MESSAGE: &str = "Status: Connection closed.";
pub const EMPTY_LINK_MESSAGE: &str = "Please enter a link.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub max_logs: usize,
    pub flush_interval: Duration,
    /// How long the buffer keeps flushing after a terminal event.
    pub stop_grace: Duration,
    /// How long the progress indicator stays up after completion or disconnect.
    pub hide_delay: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            max_logs: MAX_LOGS,
            flush_interval: log_buffer::DEFAULT_FLUSH_INTERVAL,
            stop_grace: Duration::from_millis(500),
            hide_delay: Duration::from_millis(3000),
        }
    }
}
