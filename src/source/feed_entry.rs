//! The entry type every feed source produces.
//!
//! `FeedEntry` carries only what the differ needs: when the entry was
//! published and the text to relay. Sources pick the body text themselves
//! with [`FeedEntry::pick_body`].

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// A single feed entry, normalised from any source.
///
/// ## Sorting
///
/// `FeedEntry` implements [`Ord`] **chronologically**: older entries sort
/// before newer ones. Entries with equal timestamps compare equal, so a
/// stable sort keeps their fetch order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FeedEntry {
    /// Publication timestamp.
    pub published: DateTime<Utc>,

    /// Text relayed for this entry. May be empty.
    pub body: String,
}

impl FeedEntry {
    pub fn new(published: DateTime<Utc>, body: impl Into<String>) -> Self {
        Self {
            published,
            body: body.into(),
        }
    }

    /// Return the first non-empty candidate, or the title.
    ///
    /// Candidates are ordered richest first (e.g. encoded content, then
    /// description). A missing title yields an empty body, never `None`.
    pub fn pick_body<'a>(
        candidates: impl IntoIterator<Item = Option<&'a str>>,
        title: Option<&'a str>,
    ) -> String {
        candidates
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
            .or(title)
            .unwrap_or_default()
            .to_string()
    }
}

impl Ord for FeedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.published.cmp(&other.published)
    }
}

impl PartialOrd for FeedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
