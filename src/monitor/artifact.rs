//! Result artifact references announced by the completion sentinel

use std::borrow::Cow;
use url::Url;

/// A finished download on the server.
///
/// The server may or may not percent-encode the path it announces, so the
/// raw path is decoded once into segments and both the display name and the
/// retrieval URL are derived from those segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultArtifact {
    raw: String,
    segments: Vec<String>,
}

impl ResultArtifact {
    pub fn from_raw(raw: &str) -> Self {
        let segments = raw
            .trim()
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| decode_segment(s).into_owned())
            .collect();

        Self {
            raw: raw.trim().to_string(),
            segments,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Human-readable filename: the decoded last path segment.
    pub fn display_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Decoded relative path, `/`-joined.
    pub fn decoded_path(&self) -> String {
        self.segments.join("/")
    }

    /// Retrieval URL: `{server}/downloads/{segments...}` with every segment re-encoded.
    pub fn url(&self, server: &Url) -> Url {
        let mut url = server.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("downloads");
            path.extend(self.segments.iter());
        }
        url
    }
}

fn decode_segment(segment: &str) -> Cow<'_, str> {
    match urlencoding::decode(segment) {
        Ok(decoded) => decoded,
        // Not valid UTF-8 once decoded; keep the segment as sent.
        Err(_) => Cow::Borrowed(segment),
    }
}
