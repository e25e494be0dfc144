//! One notifier run.
//!
//! Polls every topic sequentially, persists advanced watermarks, then hands
//! the whole batch of lines to the relay in a single delivery. Any error
//! other than a topic's feed being unavailable stops the run where it is:
//! topics not yet reached keep their watermarks and are picked up next run.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::differ;
use crate::error::{NotifierError, Result};
use crate::relay::Relay;
use crate::source::FeedSource;
use crate::watermark::WatermarkStore;

/// What a run did, for the final log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub topics_polled: usize,
    pub topics_skipped: usize,
    pub lines_delivered: usize,
}

/// Poll `topics` and deliver any new lines to every destination.
///
/// `clock` supplies the seed watermark for topics seen for the first time.
pub fn run_once(
    topics: &[String],
    destinations: &[String],
    source: &dyn FeedSource,
    store: &dyn WatermarkStore,
    relay: &dyn Relay,
    clock: &dyn Fn() -> DateTime<Utc>,
) -> Result<RunReport> {
    let mut report = RunReport::default();
    let mut lines = Vec::new();

    for topic in topics {
        let prior = store.read(topic)?;

        let entries = match source.fetch(topic) {
            Ok(entries) => entries,
            Err(NotifierError::NotFound { .. }) => {
                warn!(%topic, source = source.name(), "no feed available, skipping");
                report.topics_skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        debug!(%topic, entries = entries.len(), prior = ?prior, "fetched");

        let diff = differ::diff(topic, prior, entries, clock());
        if diff.touched {
            store.write(topic, diff.watermark)?;
        }

        report.topics_polled += 1;
        lines.extend(diff.lines);
    }

    if lines.is_empty() {
        info!(?report, "nothing new");
        return Ok(report);
    }

    info!(notifications = lines.len(), "relaying notifications");
    relay.deliver(destinations, &lines)?;
    report.lines_delivered = lines.len();

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
