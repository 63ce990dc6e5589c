//! Colors shared by every widget

use ratatui::style::Color;

pub struct Theme {
    pub border: Color,
    pub title: Color,
    pub text: Color,
    pub dimmed: Color,
    pub accent: Color,
    pub running: Color,
    pub error: Color,
    pub waiting: Color,
    pub hint: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border: Color::Rgb(88, 91, 112),
            title: Color::Rgb(137, 180, 250),
            text: Color::Rgb(205, 214, 244),
            dimmed: Color::Rgb(108, 112, 134),
            accent: Color::Rgb(203, 166, 247),
            running: Color::Rgb(166, 227, 161),
            error: Color::Rgb(243, 139, 168),
            waiting: Color::Rgb(249, 226, 175),
            hint: Color::Rgb(148, 226, 213),
        }
    }
}
