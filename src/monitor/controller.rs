//! Entry point for monitoring requests

use std::future;

use super::error::{MonitorError, Result};
use super::presenter::ProgressState;
use super::session::{Session, SessionOutcome, SessionStatus, Wake};
use super::surface::{ResultSurface, Surface};
use super::{MonitorSettings, EMPTY_LINK_MESSAGE};
use crate::transport::StreamSource;

/// Owns at most one session and guarantees it is the only writer of the surface.
pub struct Controller<S> {
    source: S,
    settings: MonitorSettings,
    session: Option<Session>,
    started: u64,
}

impl<S: StreamSource> Controller<S> {
    pub fn new(source: S, settings: MonitorSettings) -> Self {
        Self {
            source,
            settings,
            session: None,
            started: 0,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Begin monitoring `link`, tearing down any previous session first.
    pub fn start_monitoring(&mut self, link: &str, surface: &mut Surface) -> Result<()> {
        let link = link.trim();
        if link.is_empty() {
            surface.result = ResultSurface::Message(EMPTY_LINK_MESSAGE.to_string());
            return Err(MonitorError::Validation(EMPTY_LINK_MESSAGE.to_string()));
        }

        if let Some(mut previous) = self.session.take() {
            previous.supersede();
        }

        surface.result = ResultSurface::Empty;
        surface.logs.clear();
        surface.progress.show_at_zero();

        self.started += 1;
        self.session = Some(Session::start(
            &self.source,
            link,
            self.started,
            self.settings,
        ));
        Ok(())
    }

    pub fn status(&self) -> SessionStatus {
        self.session
            .as_ref()
            .map(Session::status)
            .unwrap_or(SessionStatus::Idle)
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.session.as_ref().and_then(Session::outcome)
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session.as_ref().map(Session::id)
    }

    pub fn progress(&self) -> Option<ProgressState> {
        self.session.as_ref().map(Session::progress)
    }

    /// A session exists and still has lines, flushes or timers outstanding.
    pub fn has_pending_work(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_finished())
    }

    /// Resolves with the active session's next wake-up; pends while there is none.
    pub async fn next_wake(&mut self) -> Wake {
        match self.session.as_mut() {
            Some(session) if !session.is_finished() => session.next_wake().await,
            _ => future::pending().await,
        }
    }

    pub fn handle(&mut self, wake: Wake, surface: &mut Surface) {
        if let Some(session) = self.session.as_mut() {
            session.handle(wake, surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{SourceEvent, Subscription};
    use std::cell::RefCell;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct FakeSource {
        links: RefCell<Vec<String>>,
        feeds: RefCell<Vec<mpsc::Sender<SourceEvent>>>,
    }

    impl FakeSource {
        fn feed(&self, index: usize) -> mpsc::Sender<SourceEvent> {
            self.feeds.borrow()[index].clone()
        }
    }

    impl StreamSource for FakeSource {
        fn subscribe(&self, link: &str) -> Subscription {
            let (tx, rx) = mpsc::channel(64);
            self.links.borrow_mut().push(link.to_string());
            self.feeds.borrow_mut().push(tx);
            Subscription::from_channel(rx)
        }
    }

    fn controller() -> Controller<FakeSource> {
        Controller::new(FakeSource::default(), MonitorSettings::default())
    }

    #[tokio::test]
    async fn test_empty_link_is_rejected_without_subscribing() {
        let mut ctl = controller();
        let mut surface = Surface::new();

        let err = ctl.start_monitoring("   ", &mut surface).unwrap_err();
        assert!(matches!(err, MonitorError::Validation(_)));
        assert_eq!(surface.result.text(), EMPTY_LINK_MESSAGE);
        assert!(ctl.source().links.borrow().is_empty());
        assert_eq!(ctl.status(), SessionStatus::Idle);
        assert!(!surface.progress.visible);
    }

    #[tokio::test]
    async fn test_start_resets_surface() {
        let mut ctl = controller();
        let mut surface = Surface::new();
        surface.result = ResultSurface::Message("old".into());
        surface.logs.append_batch(vec!["old line".into()]);
        surface.progress.set(80);

        ctl.start_monitoring(" https://open.spotify.com/album/1 ", &mut surface)
            .unwrap();

        assert_eq!(surface.result, ResultSurface::Empty);
        assert!(surface.logs.is_empty());
        assert!(surface.progress.visible);
        assert_eq!(surface.progress.value, 0);
        assert_eq!(ctl.status(), SessionStatus::Active);
        assert_eq!(
            ctl.source().links.borrow().as_slice(),
            ["https://open.spotify.com/album/1"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_supersedes_first() {
        let mut ctl = controller();
        let mut surface = Surface::new();

        ctl.start_monitoring("first", &mut surface).unwrap();
        let first = ctl.source().feed(0);
        first.send(SourceEvent::Line("from first".into())).await.unwrap();
        let wake = ctl.next_wake().await;
        ctl.handle(wake, &mut surface);

        ctl.start_monitoring("second", &mut surface).unwrap();
        assert!(first.is_closed(), "first subscription closed before second starts");

        let second = ctl.source().feed(1);
        second
            .send(SourceEvent::Line("from second".into()))
            .await
            .unwrap();
        while surface.logs.is_empty() {
            let wake = ctl.next_wake().await;
            ctl.handle(wake, &mut surface);
        }

        let texts: Vec<_> = surface.logs.entries().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["from second"]);
        assert!(first
            .send(SourceEvent::Line("straggler".into()))
            .await
            .is_err());
        assert_eq!(ctl.status(), SessionStatus::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_after_session_finishes() {
        let mut ctl = controller();
        let mut surface = Surface::new();
        ctl.start_monitoring("link", &mut surface).unwrap();
        ctl.source()
            .feed(0)
            .send(SourceEvent::Line("✅ DOWNLOAD: id/a.mp3".into()))
            .await
            .unwrap();

        while ctl.has_pending_work() {
            let wake = ctl.next_wake().await;
            ctl.handle(wake, &mut surface);
        }

        assert_eq!(ctl.status(), SessionStatus::Terminated);
        assert!(ctl.outcome().unwrap().is_success());
        let pending = tokio::time::timeout(std::time::Duration::from_secs(5), ctl.next_wake()).await;
        assert!(pending.is_err());
    }
}
