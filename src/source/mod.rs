//! Feed source abstraction layer.
//!
//! This module defines the [`FeedSource`] trait and the common [`FeedEntry`]
//! type. Concrete source implementations live in sub-modules (currently only
//! [`rss`]).
//!
//! ## Adding a new source
//!
//! 1. Create a new file in this directory (e.g. `atom.rs`).
//! 2. Define a struct (e.g. `AtomSource`) and implement [`FeedSource`] for it.
//! 3. Add `mod atom;` below and re-export your struct in the `pub use` block.
//! 4. Construct it in `main.rs` instead of (or next to) `RssSource`.
//!
//! The orchestrator, differ and relay are all source-agnostic.

mod feed_entry;
mod rss;

pub use feed_entry::FeedEntry;
pub use self::rss::{RssSource, TOPIC_PLACEHOLDER};

use crate::error::Result;

/// Trait that every feed source must implement.
///
/// The orchestrator calls [`fetch()`](FeedSource::fetch) once per topic per
/// run, sequentially.
pub trait FeedSource {
    /// Human-readable label used in log output.
    fn name(&self) -> &str;

    /// Fetch the current entries for `topic`, in any order.
    ///
    /// Return [`NotifierError::NotFound`](crate::error::NotifierError::NotFound)
    /// when the source has nothing for this topic right now; the orchestrator
    /// skips the topic. Any other error aborts the run.
    fn fetch(&self, topic: &str) -> Result<Vec<FeedEntry>>;
}
