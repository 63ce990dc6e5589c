//! Interactive monitor state and event loop

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures_util::StreamExt;
use ratatui::backend::Backend;
use ratatui::Terminal;
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use url::Url;

use super::dialogs::{ConfirmDialog, DialogResult, FormDialog, FormField};
use super::styles::Theme;
use crate::api::{ApiClient, SetPathResponse};
use crate::cli::Context;
use crate::monitor::{Controller, ResultSurface, SessionOutcome, SessionStatus, Surface};
use crate::transport::SseSource;

const PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Logs,
}

pub(super) enum Dialog {
    ConfirmRestart(ConfirmDialog),
    ConfirmLogout(ConfirmDialog),
    Login(FormDialog),
    SetPath(FormDialog),
    Help,
}

/// Results of background requests, delivered back to the loop.
pub(super) enum AppMessage {
    LoginStatus(Result<bool, String>),
    LoggedIn(Result<bool, String>),
    LoggedOut(Result<(), String>),
    PathSet(Result<SetPathResponse, String>),
    Fetched(Result<PathBuf, String>),
}

pub(super) struct Notice {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    pub(super) controller: Controller<SseSource>,
    pub(super) surface: Surface,
    pub(super) input: Input,
    pub(super) focus: Focus,
    pub(super) dialog: Option<Dialog>,
    pub(super) theme: Theme,
    pub(super) server: Url,
    /// `None` until the first status check answers.
    pub(super) admin: Option<bool>,
    pub(super) notice: Option<Notice>,
    /// Lines scrolled up from the tail of the log pane.
    pub(super) scroll_back: usize,
    api: ApiClient,
    download_dir: PathBuf,
    /// Last path the server confirmed, offered again in the path dialog.
    server_path: Option<String>,
    auto_fetch: bool,
    auto_fetched: Option<u64>,
    msg_tx: mpsc::UnboundedSender<AppMessage>,
    msg_rx: mpsc::UnboundedReceiver<AppMessage>,
    should_quit: bool,
}

impl App {
    pub fn new(ctx: &Context) -> Self {
        let source = SseSource::new(ctx.http.clone(), ctx.server.clone());
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();

        Self {
            controller: Controller::new(source, ctx.config.monitor.settings()),
            surface: Surface::new(),
            input: Input::default(),
            focus: Focus::Input,
            dialog: None,
            theme: Theme::default(),
            server: ctx.server.clone(),
            admin: None,
            notice: None,
            scroll_back: 0,
            api: ctx.api(),
            download_dir: ctx.config.download_dir(),
            server_path: None,
            auto_fetch: ctx.config.auto_fetch,
            auto_fetched: None,
            msg_tx,
            msg_rx,
            should_quit: false,
        }
    }

    /// Pre-fill the link input and start monitoring it right away.
    pub fn start_with(&mut self, link: String) {
        self.input = Input::default().with_value(link);
        self.start();
    }

    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut events = EventStream::new();
        self.request_login_status();

        loop {
            terminal.draw(|frame| self.render(frame))?;
            if self.is_quitting() {
                break;
            }

            tokio::select! {
                event = events.next() => match event {
                    Some(Ok(event)) => self.handle_event(event),
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
                wake = self.controller.next_wake() => {
                    self.controller.handle(wake, &mut self.surface);
                    self.after_wake();
                }
                Some(msg) = self.msg_rx.recv() => self.handle_message(msg),
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.handle_key(key);
    }

    pub(super) fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if let Some(dialog) = self.dialog.take() {
            self.handle_dialog_key(dialog, key);
            return;
        }

        match self.focus {
            Focus::Input => match key.code {
                KeyCode::Enter => self.submit(),
                KeyCode::Esc | KeyCode::Tab => self.focus = Focus::Logs,
                _ => {
                    self.input.handle_event(&Event::Key(key));
                }
            },
            Focus::Logs => self.handle_logs_key(key),
        }
    }

    fn handle_logs_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Char('i') | KeyCode::Char('/') => self.focus = Focus::Input,
            KeyCode::Enter => self.submit(),
            KeyCode::Char('d') => self.fetch_result(),
            KeyCode::Char('L') => self.toggle_admin(),
            KeyCode::Char('P') => {
                self.dialog = Some(Dialog::SetPath(FormDialog::new(
                    "Download Path",
                    vec![FormField::text("Path:")
                        .with_value(self.server_path.as_deref().unwrap_or_default())],
                )));
            }
            KeyCode::Char('?') => self.dialog = Some(Dialog::Help),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(PAGE),
            KeyCode::PageDown => self.scroll_down(PAGE),
            KeyCode::Home | KeyCode::Char('g') => self.scroll_up(usize::MAX),
            KeyCode::End | KeyCode::Char('G') => self.scroll_down(usize::MAX),
            _ => {}
        }
    }

    fn handle_dialog_key(&mut self, mut dialog: Dialog, key: KeyEvent) {
        let keep_open = match &mut dialog {
            Dialog::Help => false,
            Dialog::ConfirmRestart(confirm) => match confirm.handle_key(key) {
                DialogResult::Continue => true,
                DialogResult::Cancel => false,
                DialogResult::Submit(()) => {
                    self.start();
                    false
                }
            },
            Dialog::ConfirmLogout(confirm) => match confirm.handle_key(key) {
                DialogResult::Continue => true,
                DialogResult::Cancel => false,
                DialogResult::Submit(()) => {
                    let api = self.api.clone();
                    self.spawn(async move {
                        AppMessage::LoggedOut(api.logout().await.map_err(|e| e.to_string()))
                    });
                    false
                }
            },
            Dialog::Login(form) => match form.handle_key(key) {
                DialogResult::Continue => true,
                DialogResult::Cancel => false,
                DialogResult::Submit(values) => {
                    let api = self.api.clone();
                    let (username, password) = (values[0].clone(), values[1].clone());
                    self.spawn(async move {
                        AppMessage::LoggedIn(
                            api.login(&username, &password)
                                .await
                                .map_err(|e| e.to_string()),
                        )
                    });
                    false
                }
            },
            Dialog::SetPath(form) => match form.handle_key(key) {
                DialogResult::Continue => true,
                DialogResult::Cancel => false,
                DialogResult::Submit(values) => {
                    let api = self.api.clone();
                    let path = values[0].clone();
                    self.spawn(async move {
                        AppMessage::PathSet(api.set_path(&path).await.map_err(|e| e.to_string()))
                    });
                    false
                }
            },
        };

        if keep_open {
            self.dialog = Some(dialog);
        }
    }

    fn submit(&mut self) {
        if self.controller.status() == SessionStatus::Active {
            self.dialog = Some(Dialog::ConfirmRestart(ConfirmDialog::new(
                "Restart",
                "A download is still running. Abandon it and start this one?",
            )));
            return;
        }
        self.start();
    }

    fn start(&mut self) {
        let link = self.input.value().to_string();
        match self.controller.start_monitoring(&link, &mut self.surface) {
            Ok(()) => {
                self.scroll_back = 0;
                self.notice = None;
                self.focus = Focus::Logs;
            }
            Err(e) => tracing::debug!("not starting: {}", e),
        }
    }

    fn after_wake(&mut self) {
        if !self.auto_fetch {
            return;
        }
        let session = self.controller.session_id();
        let completed = matches!(
            self.controller.outcome(),
            Some(SessionOutcome::Completed(_))
        );
        if completed && session != self.auto_fetched {
            self.auto_fetched = session;
            self.fetch_result();
        }
    }

    fn fetch_result(&mut self) {
        let ResultSurface::Artifact(artifact) = &self.surface.result else {
            self.set_notice("Nothing to download yet.", true);
            return;
        };

        let artifact = artifact.clone();
        let api = self.api.clone();
        let dir = self.download_dir.clone();
        self.set_notice(&format!("Fetching {} ...", artifact.display_name()), false);
        self.spawn(async move {
            AppMessage::Fetched(
                api.fetch_artifact(&artifact, &dir)
                    .await
                    .map_err(|e| e.to_string()),
            )
        });
    }

    fn toggle_admin(&mut self) {
        if self.admin == Some(true) {
            self.dialog = Some(Dialog::ConfirmLogout(ConfirmDialog::new(
                "Log Out",
                "End the admin session?",
            )));
        } else {
            self.dialog = Some(Dialog::Login(FormDialog::new(
                "Admin Login",
                vec![FormField::text("Username:"), FormField::secret("Password:")],
            )));
        }
    }

    fn request_login_status(&self) {
        let api = self.api.clone();
        self.spawn(async move {
            AppMessage::LoginStatus(
                api.check_status()
                    .await
                    .map(|s| s.logged_in)
                    .map_err(|e| e.to_string()),
            )
        });
    }

    pub(super) fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::LoginStatus(Ok(logged_in)) => self.admin = Some(logged_in),
            AppMessage::LoginStatus(Err(e)) => {
                tracing::warn!("Error checking login status: {}", e);
            }
            AppMessage::LoggedIn(Ok(true)) => {
                self.set_notice("Login successful!", false);
                self.request_login_status();
            }
            AppMessage::LoggedIn(Ok(false)) => self.set_notice("Login failed. Try again.", true),
            AppMessage::LoggedIn(Err(e)) | AppMessage::LoggedOut(Err(e)) => {
                self.set_notice(&format!("Error: {}", e), true)
            }
            AppMessage::LoggedOut(Ok(())) => {
                self.set_notice("Logged out.", false);
                self.request_login_status();
            }
            AppMessage::PathSet(Ok(response)) if response.success => {
                let path = response.new_path.unwrap_or_default();
                self.server_path = Some(path.clone());
                self.set_notice(
                    &format!("Download path set successfully to: {}", path),
                    false,
                );
            }
            AppMessage::PathSet(Ok(response)) => self.set_notice(
                &format!("Error: {}", response.message.unwrap_or_default()),
                true,
            ),
            AppMessage::PathSet(Err(e)) => self.set_notice(&format!("Error: {}", e), true),
            AppMessage::Fetched(Ok(path)) => {
                self.set_notice(&format!("Saved {}", path.display()), false)
            }
            AppMessage::Fetched(Err(e)) => {
                self.set_notice(&format!("Download failed: {}", e), true)
            }
        }
    }

    fn set_notice(&mut self, text: &str, is_error: bool) {
        self.notice = Some(Notice {
            text: text.to_string(),
            is_error,
        });
    }

    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = AppMessage> + Send + 'static,
    {
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(fut.await);
        });
    }

    fn scroll_up(&mut self, lines: usize) {
        let max = self.surface.logs.len().saturating_sub(1);
        self.scroll_back = self.scroll_back.saturating_add(lines).min(max);
        if self.scroll_back > 0 {
            self.surface.logs.release_tail();
        }
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
        if self.scroll_back == 0 {
            self.surface.logs.scroll_to_latest();
        }
    }

    pub(super) fn is_quitting(&self) -> bool {
        self.should_quit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn app() -> App {
        let ctx = Context::new(Config::default(), Some("http://127.0.0.1:9")).unwrap();
        App::new(&ctx)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_empty_link_shows_validation_message() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.surface.result.text(), crate::monitor::EMPTY_LINK_MESSAGE);
        assert_eq!(app.controller.status(), SessionStatus::Idle);
        assert_eq!(app.focus, Focus::Input);
    }

    #[tokio::test]
    async fn test_restart_while_active_asks_first() {
        let mut app = app();
        app.start_with("https://open.spotify.com/track/1".to_string());
        assert_eq!(app.controller.status(), SessionStatus::Active);
        let first = app.controller.session_id();

        app.handle_key(key(KeyCode::Enter));
        assert!(matches!(app.dialog, Some(Dialog::ConfirmRestart(_))));

        app.handle_key(key(KeyCode::Char('n')));
        assert!(app.dialog.is_none());
        assert_eq!(app.controller.session_id(), first);

        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('y')));
        assert_ne!(app.controller.session_id(), first);
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_even_in_dialog() {
        let mut app = app();
        app.dialog = Some(Dialog::Help);
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.is_quitting());
    }

    #[tokio::test]
    async fn test_scrolling_releases_and_restores_tail() {
        let mut app = app();
        app.focus = Focus::Logs;
        app.surface
            .logs
            .append_batch((0..30).map(|i| i.to_string()).collect());

        app.handle_key(key(KeyCode::PageUp));
        assert_eq!(app.scroll_back, PAGE);
        assert!(!app.surface.logs.follows_tail());

        app.handle_key(key(KeyCode::End));
        assert_eq!(app.scroll_back, 0);
        assert!(app.surface.logs.follows_tail());
    }

    #[tokio::test]
    async fn test_fetch_without_artifact_sets_notice() {
        let mut app = app();
        app.focus = Focus::Logs;
        app.handle_key(key(KeyCode::Char('d')));
        assert!(app.notice.as_ref().unwrap().is_error);
    }

    #[tokio::test]
    async fn test_failed_login_message() {
        let mut app = app();
        app.handle_message(AppMessage::LoggedIn(Ok(false)));
        assert_eq!(app.notice.as_ref().unwrap().text, "Login failed. Try again.");
        app.handle_message(AppMessage::LoginStatus(Ok(true)));
        assert_eq!(app.admin, Some(true));
    }

    #[tokio::test]
    async fn test_confirmed_path_is_remembered() {
        let mut app = app();
        app.handle_message(AppMessage::PathSet(Ok(SetPathResponse {
            success: true,
            new_path: Some("/mnt/music".to_string()),
            message: None,
        })));
        assert_eq!(app.server_path.as_deref(), Some("/mnt/music"));
        assert_eq!(
            app.notice.as_ref().unwrap().text,
            "Download path set successfully to: /mnt/music"
        );

        app.focus = Focus::Logs;
        app.handle_key(key(KeyCode::Char('P')));
        assert!(matches!(app.dialog, Some(Dialog::SetPath(_))));
    }
}
