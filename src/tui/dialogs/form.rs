//! Small text-entry dialog (admin login, download path)

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::*;

use super::{centered, DialogResult};
use crate::tui::styles::Theme;

pub struct FormField {
    label: &'static str,
    value: String,
    masked: bool,
}

impl FormField {
    pub fn text(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            masked: false,
        }
    }

    pub fn secret(label: &'static str) -> Self {
        Self {
            masked: true,
            ..Self::text(label)
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }
}

pub struct FormDialog {
    title: String,
    fields: Vec<FormField>,
    focused_field: usize,
    error: Option<String>,
}

impl FormDialog {
    pub fn new(title: &str, fields: Vec<FormField>) -> Self {
        Self {
            title: title.to_string(),
            fields,
            focused_field: 0,
            error: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DialogResult<Vec<String>> {
        let count = self.fields.len().max(1);
        match key.code {
            KeyCode::Esc => DialogResult::Cancel,
            KeyCode::Enter => {
                if let Some(empty) = self.fields.iter().find(|f| f.value.trim().is_empty()) {
                    self.error = Some(format!(
                        "{} cannot be empty.",
                        empty.label.trim_end_matches(':')
                    ));
                    return DialogResult::Continue;
                }
                DialogResult::Submit(self.fields.iter().map(|f| f.value.clone()).collect())
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focused_field = (self.focused_field + 1) % count;
                DialogResult::Continue
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focused_field = if self.focused_field == 0 {
                    count - 1
                } else {
                    self.focused_field - 1
                };
                DialogResult::Continue
            }
            KeyCode::Backspace => {
                if let Some(field) = self.fields.get_mut(self.focused_field) {
                    field.value.pop();
                }
                DialogResult::Continue
            }
            KeyCode::Char(c) => {
                if let Some(field) = self.fields.get_mut(self.focused_field) {
                    field.value.push(c);
                }
                self.error = None;
                DialogResult::Continue
            }
            _ => DialogResult::Continue,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let height = 2 * self.fields.len() as u16 + 6;
        let dialog_area = centered(area, 60, height);
        frame.render_widget(Clear, dialog_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent))
            .title(format!(" {} ", self.title))
            .title_style(Style::default().fg(theme.title).bold());

        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let mut constraints: Vec<Constraint> =
            self.fields.iter().map(|_| Constraint::Length(2)).collect();
        constraints.push(Constraint::Length(1));
        constraints.push(Constraint::Min(1));
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints(constraints)
            .split(inner);

        for (idx, field) in self.fields.iter().enumerate() {
            let is_focused = idx == self.focused_field;
            let style = if is_focused {
                Style::default().fg(theme.accent)
            } else {
                Style::default().fg(theme.text)
            };

            let shown = if field.masked {
                "•".repeat(field.value.chars().count())
            } else {
                field.value.clone()
            };
            let cursor = if is_focused { "█" } else { "" };
            let line = Line::from(vec![
                Span::styled(format!("{} {}", field.label, shown), style),
                Span::styled(cursor, Style::default().fg(theme.accent)),
            ]);

            frame.render_widget(Paragraph::new(line), chunks[idx]);
        }

        if let Some(error) = &self.error {
            frame.render_widget(
                Paragraph::new(error.as_str()).style(Style::default().fg(theme.error)),
                chunks[self.fields.len()],
            );
        }

        let hint = Line::from(vec![
            Span::styled("Tab", Style::default().fg(theme.hint)),
            Span::raw(" next  "),
            Span::styled("Enter", Style::default().fg(theme.hint)),
            Span::raw(" submit  "),
            Span::styled("Esc", Style::default().fg(theme.hint)),
            Span::raw(" cancel"),
        ]);
        frame.render_widget(Paragraph::new(hint), chunks[self.fields.len() + 1]);
    }
}
