//! Frame layout for the monitor screen

use ratatui::prelude::*;
use ratatui::widgets::*;

use super::app::{App, Dialog, Focus};
use super::components::HelpOverlay;
use crate::monitor::{ProgressState, ResultSurface, SessionOutcome, SessionStatus};

impl App {
    pub(super) fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(if self.surface.progress.visible { 3 } else { 0 }),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.render_input(frame, chunks[1]);
        if self.surface.progress.visible {
            self.render_progress(frame, chunks[2]);
        }
        self.render_result(frame, chunks[3]);
        self.render_logs(frame, chunks[4]);
        self.render_footer(frame, chunks[5]);

        match &self.dialog {
            Some(Dialog::ConfirmRestart(d)) | Some(Dialog::ConfirmLogout(d)) => {
                d.render(frame, area, &self.theme)
            }
            Some(Dialog::Login(d)) | Some(Dialog::SetPath(d)) => d.render(frame, area, &self.theme),
            Some(Dialog::Help) => HelpOverlay::render(frame, area, &self.theme),
            None => {}
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let (status, color) = match self.controller.status() {
            SessionStatus::Idle => ("idle", self.theme.dimmed),
            SessionStatus::Active => ("downloading", self.theme.running),
            SessionStatus::Terminated => match self.controller.outcome() {
                Some(SessionOutcome::Failed(_)) => ("failed", self.theme.error),
                Some(SessionOutcome::ConnectionLost {
                    after_completion: false,
                }) => ("disconnected", self.theme.waiting),
                _ => ("done", self.theme.running),
            },
        };
        let admin = match self.admin {
            Some(true) => "admin",
            Some(false) => "guest",
            None => "…",
        };

        let line = Line::from(vec![
            Span::styled(" dlwatch ", Style::default().fg(self.theme.title).bold()),
            Span::styled(self.server.as_str(), Style::default().fg(self.theme.dimmed)),
            Span::raw("  "),
            Span::styled(status, Style::default().fg(color)),
            Span::raw("  "),
            Span::styled(admin, Style::default().fg(self.theme.accent)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Input;
        let border = if focused {
            self.theme.accent
        } else {
            self.theme.border
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Link ")
            .title_style(Style::default().fg(self.theme.title));

        let inner = block.inner(area);
        let width = inner.width.max(1) as usize;
        let scroll = self.input.visual_scroll(width);
        let input = Paragraph::new(self.input.value())
            .style(Style::default().fg(self.theme.text))
            .scroll((0, scroll as u16))
            .block(block);
        frame.render_widget(input, area);

        if focused && self.dialog.is_none() {
            let x = self.input.visual_cursor().saturating_sub(scroll) as u16;
            frame.set_cursor_position((inner.x + x, inner.y));
        }
    }

    fn render_progress(&self, frame: &mut Frame, area: Rect) {
        let percent = self.surface.progress.value;
        let completed = matches!(
            self.controller.outcome(),
            Some(SessionOutcome::Completed(_))
        );
        let label = gauge_label(percent, self.controller.progress(), completed);
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.border))
                    .title(" Progress "),
            )
            .gauge_style(Style::default().fg(self.theme.running))
            .percent(u16::from(percent))
            .label(label);
        frame.render_widget(gauge, area);
    }

    fn render_result(&self, frame: &mut Frame, area: Rect) {
        let color = match &self.surface.result {
            ResultSurface::Error(_) => self.theme.error,
            ResultSurface::Artifact(_) => self.theme.running,
            _ => self.theme.text,
        };
        let mut lines = vec![Line::styled(
            self.surface.result.text(),
            Style::default().fg(color),
        )];
        if let ResultSurface::Artifact(artifact) = &self.surface.result {
            lines[0].push_span(Span::styled(
                format!("  {}", artifact.url(&self.server)),
                Style::default().fg(self.theme.dimmed),
            ));
        }
        if let Some(notice) = &self.notice {
            let color = if notice.is_error {
                self.theme.error
            } else {
                self.theme.hint
            };
            lines.push(Line::styled(notice.text.as_str(), Style::default().fg(color)));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border))
            .title(" Result ");
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_logs(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Logs;
        let border = if focused {
            self.theme.accent
        } else {
            self.theme.border
        };
        let title = if self.surface.logs.follows_tail() {
            format!(" Logs ({}) ", self.surface.logs.len())
        } else {
            format!(" Logs ({}) [scrolled] ", self.surface.logs.len())
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title)
            .title_style(Style::default().fg(self.theme.title));

        let visible = block.inner(area).height as usize;
        let total = self.surface.logs.len();
        let end = total.saturating_sub(self.scroll_back);
        let start = end.saturating_sub(visible);

        let items: Vec<ListItem> = self
            .surface
            .logs
            .entries()
            .skip(start)
            .take(end - start)
            .map(|entry| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        entry.rendered_at.format("%H:%M:%S ").to_string(),
                        Style::default().fg(self.theme.dimmed),
                    ),
                    Span::styled(entry.text.as_str(), Style::default().fg(self.theme.text)),
                ]))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let keys: &[(&str, &str)] = match self.focus {
            Focus::Input => &[("Enter", "start"), ("Tab", "logs"), ("Ctrl-C", "quit")],
            Focus::Logs => &[
                ("Enter", "start"),
                ("d", "download"),
                ("L", "login"),
                ("P", "path"),
                ("?", "help"),
                ("q", "quit"),
            ],
        };

        let mut spans = Vec::with_capacity(keys.len() * 2);
        for (key, action) in keys {
            spans.push(Span::styled(
                format!(" {} ", key),
                Style::default().fg(self.theme.hint).bold(),
            ));
            spans.push(Span::styled(
                format!("{} ", action),
                Style::default().fg(self.theme.dimmed),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Gauge text, e.g. `41% (145/357)`. A completed job counts every item as done.
fn gauge_label(percent: u8, progress: Option<ProgressState>, completed: bool) -> String {
    match progress {
        Some(p) if p.total > 0 && completed => format!("{}% ({}/{})", percent, p.total, p.total),
        Some(p) if p.total > 0 => format!("{}% ({}/{})", percent, p.current, p.total),
        _ => format!("{}%", percent),
    }
}
