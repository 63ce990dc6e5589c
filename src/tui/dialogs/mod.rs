//! TUI dialog components

mod confirm;
mod form;

pub use confirm::ConfirmDialog;
pub use form::{FormDialog, FormField};

pub enum DialogResult<T> {
    Continue,
    Cancel,
    Submit(T),
}

/// Centered rectangle of at most `width` x `height` inside `area`.
pub(crate) fn centered(area: ratatui::layout::Rect, width: u16, height: u16) -> ratatui::layout::Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    ratatui::layout::Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
