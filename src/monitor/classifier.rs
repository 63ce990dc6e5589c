//! Classification of raw stream lines into monitor events

use regex::Regex;
use std::sync::OnceLock;

use super::error::MonitorError;

/// Marker carried by progress lines, e.g. `[download] Downloading item 145 of 357`.
const PROGRESS_MARKER: &str = "Downloading item";

/// Prefix of the line announcing the finished artifact.
const DOWNLOAD_SENTINEL: &str = "✅ DOWNLOAD:";

const GENERIC_DONE_PHRASES: [&str; 2] = [
    "Download completed",
    "Download process completed successfully",
];

const ERROR_PREFIX: &str = "Error";
const ERROR_INFIX: &str = "Error:";

/// Semantic meaning of a single line pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedEvent {
    Progress { current: u64, total: u64 },
    Completed { path: String },
    GenericDone,
    Failed { message: String },
    Info { text: String },
}

impl ClassifiedEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

fn progress_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)item\s+(\d+)\s+of\s+(\d+)").expect("progress pattern is valid")
    })
}

/// Map one raw line to exactly one event. Never fails: anything unrecognised is `Info`.
pub fn classify(line: &str) -> ClassifiedEvent {
    if line.contains(PROGRESS_MARKER) && line.contains("of") {
        return match parse_progress(line) {
            Some((current, total)) => ClassifiedEvent::Progress { current, total },
            None => {
                let anomaly = MonitorError::ParseAnomaly {
                    line: line.to_string(),
                };
                tracing::debug!(%anomaly, "degrading to info");
                info(line)
            }
        };
    }

    if let Some(payload) = line.strip_prefix(DOWNLOAD_SENTINEL) {
        return ClassifiedEvent::Completed {
            path: payload.trim().to_string(),
        };
    }

    if GENERIC_DONE_PHRASES
        .iter()
        .any(|phrase| line.contains(phrase))
    {
        return ClassifiedEvent::GenericDone;
    }

    if line.starts_with(ERROR_PREFIX) || line.contains(ERROR_INFIX) {
        return ClassifiedEvent::Failed {
            message: line.to_string(),
        };
    }

    info(line)
}

fn parse_progress(line: &str) -> Option<(u64, u64)> {
    let caps = progress_pattern().captures(line)?;
    let current = caps.get(1)?.as_str().parse().ok()?;
    let total = caps.get(2)?.as_str().parse().ok()?;
    Some((current, total))
}

fn info(line: &str) -> ClassifiedEvent {
    ClassifiedEvent::Info {
        text: line.to_string(),
    }
}
