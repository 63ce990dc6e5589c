//! View model mutated by the active session and drawn by the front ends.
//!
//! Nothing here knows about ratatui or stdout; the TUI and the plain
//! reporter both read these structs after every handled wake-up.

use chrono::{DateTime, Local};
use std::collections::VecDeque;

use super::artifact::ResultArtifact;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressIndicator {
    pub visible: bool,
    pub value: u8,
    /// Bumped on every `set`, so renderers can tell updates apart from no-ops.
    updates: u64,
}

impl ProgressIndicator {
    pub fn set(&mut self, value: u8) {
        self.value = value.min(100);
        self.updates += 1;
    }

    pub fn update_count(&self) -> u64 {
        self.updates
    }

    pub fn show_at_zero(&mut self) {
        self.visible = true;
        self.set(0);
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub text: String,
    pub rendered_at: DateTime<Local>,
}

/// Rendered log history. Only the log buffer's flush appends to it.
#[derive(Debug, Clone, Default)]
pub struct LogPane {
    entries: VecDeque<LogEntry>,
    appended_total: u64,
    generation: u64,
    follow_tail: bool,
}

impl LogPane {
    pub fn append_batch(&mut self, batch: Vec<String>) {
        let now = Local::now();
        self.appended_total += batch.len() as u64;
        self.entries.extend(batch.into_iter().map(|text| LogEntry {
            text,
            rendered_at: now,
        }));
    }

    pub fn evict_oldest(&mut self) -> Option<LogEntry> {
        self.entries.pop_front()
    }

    pub fn scroll_to_latest(&mut self) {
        self.follow_tail = true;
    }

    /// Called when the user scrolls away from the tail.
    pub fn release_tail(&mut self) {
        self.follow_tail = false;
    }

    pub fn follows_tail(&self) -> bool {
        self.follow_tail
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &LogEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Total entries ever appended since the last clear, evicted ones included.
    pub fn appended_total(&self) -> u64 {
        self.appended_total
    }

    /// Changes every time the pane is cleared.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.text.contains(needle))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.appended_total = 0;
        self.generation += 1;
        self.follow_tail = true;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResultSurface {
    #[default]
    Empty,
    /// Short status or validation text.
    Message(String),
    /// Error reported by the job itself.
    Error(String),
    /// Retrievable artifact offered as a one-click action.
    Artifact(ResultArtifact),
}

impl ResultSurface {
    pub fn text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Message(msg) | Self::Error(msg) => msg.clone(),
            Self::Artifact(artifact) => {
                format!("Click to download your file: {}", artifact.display_name())
            }
        }
    }
}

/// The single UI surface shared by consecutive sessions, one writer at a time.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    pub progress: ProgressIndicator,
    pub logs: LogPane,
    pub result: ResultSurface,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }
}
