//! Keybinding overlay

use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::tui::dialogs::centered;
use crate::tui::styles::Theme;

const BINDINGS: &[(&str, &[(&str, &str)])] = &[
    (
        "Monitor",
        &[
            ("Enter", "Start monitoring the link"),
            ("d", "Download the finished file"),
            ("Tab / i", "Edit the link"),
        ],
    ),
    (
        "Logs",
        &[
            ("j / k", "Scroll one line"),
            ("PgUp / PgDn", "Scroll one page"),
            ("g / G", "Oldest / latest"),
        ],
    ),
    (
        "Admin",
        &[
            ("L", "Log in or out"),
            ("P", "Set the server download path"),
        ],
    ),
    ("Other", &[("?", "Toggle this help"), ("q / Ctrl-C", "Quit")]),
];

pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame, area: Rect, theme: &Theme) {
        let rows: usize = BINDINGS.iter().map(|(_, keys)| keys.len() + 1).sum();
        let dialog_area = centered(area, 56, rows as u16 + 3);
        frame.render_widget(Clear, dialog_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent))
            .title(" Help ")
            .title_style(Style::default().fg(theme.title).bold());

        let mut lines = Vec::with_capacity(rows + 1);
        for (section, keys) in BINDINGS {
            lines.push(Line::styled(*section, Style::default().fg(theme.title).bold()));
            for (key, action) in keys.iter() {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {:<14}", key), Style::default().fg(theme.hint)),
                    Span::styled(*action, Style::default().fg(theme.text)),
                ]));
            }
        }
        lines.push(Line::styled(
            "Press any key to close",
            Style::default().fg(theme.dimmed),
        ));

        frame.render_widget(Paragraph::new(lines).block(block), dialog_area);
    }
}
