//! One monitoring run: subscription, routing and the terminal-state machine

use std::future;
use tokio::time::{self, Instant};

use super::artifact::ResultArtifact;
use super::error::MonitorError;
use super::classifier::{classify, ClassifiedEvent};
use super::log_buffer::{BufferWake, LogBuffer};
use super::presenter::{self, ProgressState};
use super::surface::{ResultSurface, Surface};
use super::{
    MonitorSettings, ALL_DONE_MESSAGE, COMPLETION_MARKER, CONNECTION_CLOSED_MESSAGE,
};
use crate::transport::{SourceEvent, StreamSource, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Active,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed(ResultArtifact),
    Failed(String),
    /// The stream closed without a terminal line. `after_completion` is set
    /// when a generic completion had already been rendered.
    ConnectionLost { after_completion: bool },
    Superseded,
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Completed(_)
                | Self::ConnectionLost {
                    after_completion: true
                }
        )
    }

    /// The failure a caller should report, if the run did not succeed.
    pub fn error(&self) -> Option<MonitorError> {
        match self {
            Self::Failed(message) => Some(MonitorError::StreamFailure(message.clone())),
            Self::ConnectionLost {
                after_completion: false,
            } => Some(MonitorError::ConnectionLost),
            _ => None,
        }
    }
}

/// Something the session has to react to.
#[derive(Debug)]
pub enum Wake {
    Source(SourceEvent),
    Buffer(BufferWake),
    HideProgress,
}

pub struct Session {
    id: u64,
    status: SessionStatus,
    outcome: Option<SessionOutcome>,
    subscription: Subscription,
    buffer: LogBuffer,
    progress: ProgressState,
    hide_at: Option<Instant>,
    settings: MonitorSettings,
}

impl Session {
    pub fn start<S: StreamSource + ?Sized>(
        source: &S,
        link: &str,
        id: u64,
        settings: MonitorSettings,
    ) -> Self {
        Self::with_subscription(source.subscribe(link), id, settings)
    }

    pub fn with_subscription(subscription: Subscription, id: u64, settings: MonitorSettings) -> Self {
        let mut buffer = LogBuffer::new(settings.max_logs);
        buffer.start_flushing(settings.flush_interval);
        tracing::info!(session = id, "monitor session started");

        Self {
            id,
            status: SessionStatus::Active,
            outcome: None,
            subscription,
            buffer,
            progress: ProgressState::default(),
            hide_at: None,
            settings,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn progress(&self) -> ProgressState {
        self.progress
    }

    /// Nothing left to receive, flush or hide.
    pub fn is_finished(&self) -> bool {
        !self.subscription.is_open() && !self.buffer.is_running() && self.hide_at.is_none()
    }

    /// Wait for the next line, flush tick or cleanup deadline.
    pub async fn next_wake(&mut self) -> Wake {
        let hide_at = self.hide_at;
        let listening = self.subscription.is_open();

        tokio::select! {
            event = self.subscription.recv(), if listening => Wake::Source(event),
            wake = self.buffer.wait() => Wake::Buffer(wake),
            _ = sleep_until_opt(hide_at) => Wake::HideProgress,
        }
    }

    pub fn handle(&mut self, wake: Wake, surface: &mut Surface) {
        match wake {
            Wake::Source(SourceEvent::Line(line)) => self.on_line(&line, surface),
            Wake::Source(SourceEvent::Disconnected { reason }) => {
                self.on_disconnect(reason, surface)
            }
            Wake::Buffer(wake) => self.buffer.on_wake(wake, &mut surface.logs),
            Wake::HideProgress => {
                self.hide_at = None;
                surface.progress.hide();
            }
        }
    }

    fn on_line(&mut self, line: &str, surface: &mut Surface) {
        if self.status != SessionStatus::Active {
            tracing::trace!(session = self.id, line, "ignoring line after termination");
            return;
        }

        let event = classify(line);
        tracing::trace!(session = self.id, ?event, "classified");

        match event {
            ClassifiedEvent::Progress { current, total } => {
                presenter::on_progress(current, total, &mut self.progress, &mut surface.progress);
            }
            ClassifiedEvent::Completed { path } => {
                surface.progress.set(100);
                let artifact = ResultArtifact::from_raw(&path);
                surface.result = ResultSurface::Artifact(artifact.clone());
                self.terminate(SessionOutcome::Completed(artifact));
                self.schedule_hide();
                self.buffer.schedule_stop(self.settings.stop_grace);
            }
            ClassifiedEvent::GenericDone => self.buffer.push(ALL_DONE_MESSAGE),
            ClassifiedEvent::Failed { message } => {
                surface.result = ResultSurface::Error(format!("Error: {}", message));
                self.terminate(SessionOutcome::Failed(message));
                self.buffer.schedule_stop(self.settings.stop_grace);
            }
            ClassifiedEvent::Info { text } => self.buffer.push(text),
        }
    }

    fn on_disconnect(&mut self, reason: Option<String>, surface: &mut Surface) {
        if self.status != SessionStatus::Active {
            return;
        }
        if let Some(reason) = &reason {
            tracing::warn!(session = self.id, %reason, "job stream failed");
        }

        let after_completion = surface.logs.contains_text(COMPLETION_MARKER);
        if !after_completion {
            surface.result = ResultSurface::Message(CONNECTION_CLOSED_MESSAGE.to_string());
        }
        self.terminate(SessionOutcome::ConnectionLost { after_completion });
        self.buffer.schedule_stop(self.settings.stop_grace);
        self.schedule_hide();
    }

    fn terminate(&mut self, outcome: SessionOutcome) {
        tracing::info!(session = self.id, ?outcome, "monitor session terminated");
        self.status = SessionStatus::Terminated;
        self.outcome = Some(outcome);
        self.subscription.close();
    }

    fn schedule_hide(&mut self) {
        if self.hide_at.is_none() {
            self.hide_at = Some(Instant::now() + self.settings.hide_delay);
        }
    }

    /// Tear everything down right now so a new session can own the surface.
    pub fn supersede(&mut self) {
        if self.status == SessionStatus::Active {
            tracing::info!(session = self.id, "monitor session superseded");
            self.status = SessionStatus::Terminated;
            self.outcome = Some(SessionOutcome::Superseded);
        }
        self.subscription.close();
        self.buffer.stop();
        self.hide_at = None;
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
