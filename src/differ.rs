//! New-entry detection against a topic's watermark.

use chrono::{DateTime, Utc};

use crate::source::FeedEntry;

/// Result of diffing one topic's fetch against its watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    /// Notification lines, oldest entry first.
    pub lines: Vec<String>,
    /// Watermark after this fetch.
    pub watermark: DateTime<Utc>,
    /// Whether `watermark` must be persisted.
    pub touched: bool,
}

/// Render the line relayed for one entry.
pub fn render_line(topic: &str, body: &str) -> String {
    format!("{topic}: {body}")
}

/// Select the entries of `entries` newer than `prior` and render them.
///
/// With no prior watermark the topic is seeded at `now`: nothing in this
/// fetch is relayed, but the seed is marked for persistence so the next run
/// has a cut to compare against.
pub fn diff(
    topic: &str,
    prior: Option<DateTime<Utc>>,
    mut entries: Vec<FeedEntry>,
    now: DateTime<Utc>,
) -> Diff {
    let (mut watermark, mut touched) = match prior {
        Some(mark) => (mark, false),
        None => (now, true),
    };

    // Stable: equal timestamps keep fetch order.
    entries.sort();

    let mut lines = Vec::new();
    for entry in &entries {
        if entry.published > watermark {
            lines.push(render_line(topic, &entry.body));
            watermark = entry.published;
            touched = true;
        }
    }

    Diff {
        lines,
        watermark,
        touched,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    fn entry(h: u32, m: u32, body: &str) -> FeedEntry {
        FeedEntry::new(at(h, m), body)
    }

    #[test]
    fn emits_newer_entries_oldest_first() {
        let entries = vec![entry(1, 0, "A"), entry(0, 30, "B")];

        let out = diff("ec2-us-east", Some(at(0, 0)), entries, at(12, 0));

        assert_eq!(out.lines, vec!["ec2-us-east: B", "ec2-us-east: A"]);
        assert_eq!(out.watermark, at(1, 0));
        assert!(out.touched);
    }

    #[test]
    fn ignores_entries_at_or_before_watermark() {
        let older = FeedEntry::new(Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap(), "older");
        let entries = vec![entry(0, 0, "equal"), entry(0, 0, "again"), older];

        let out = diff("s3", Some(at(0, 0)), entries, at(12, 0));

        assert!(out.lines.is_empty());
        assert_eq!(out.watermark, at(0, 0));
        assert!(!out.touched);
    }

    #[test]
    fn mixed_entries_only_emit_the_new_ones() {
        let entries = vec![
            entry(3, 0, "new-2"),
            entry(0, 15, "old"),
            entry(2, 0, "new-1"),
            entry(1, 0, "boundary"),
        ];

        let out = diff("rds", Some(at(1, 0)), entries, at(12, 0));

        assert_eq!(out.lines, vec!["rds: new-1", "rds: new-2"]);
        assert_eq!(out.watermark, at(3, 0));
    }

    #[test]
    fn equal_timestamps_after_the_first_are_not_repeated() {
        // Once the watermark reaches 01:00, a second 01:00 entry is no
        // longer strictly newer.
        let entries = vec![entry(1, 0, "first"), entry(1, 0, "second")];

        let out = diff("ec2", Some(at(0, 0)), entries, at(12, 0));

        assert_eq!(out.lines, vec!["ec2: first"]);
    }

    #[test]
    fn first_run_seeds_now_and_emits_nothing() {
        let entries = vec![entry(1, 0, "A"), entry(0, 30, "B")];

        let out = diff("ec2", None, entries, at(12, 0));

        assert!(out.lines.is_empty());
        assert_eq!(out.watermark, at(12, 0));
        assert!(out.touched, "seed must be persisted");
    }

    #[test]
    fn first_run_with_empty_fetch_still_touches() {
        let out = diff("ec2", None, Vec::new(), at(12, 0));
        assert!(out.touched);
        assert_eq!(out.watermark, at(12, 0));
    }

    #[test]
    fn empty_fetch_is_a_no_op() {
        let out = diff("ec2", Some(at(0, 0)), Vec::new(), at(12, 0));
        assert!(out.lines.is_empty());
        assert_eq!(out.watermark, at(0, 0));
        assert!(!out.touched);
    }

    #[test]
    fn empty_body_still_produces_a_line() {
        let out = diff("ec2", Some(at(0, 0)), vec![entry(1, 0, "")], at(12, 0));
        assert_eq!(out.lines, vec!["ec2: "]);
    }

    #[test]
    fn same_inputs_same_output() {
        let entries = vec![entry(2, 0, "x"), entry(1, 0, "y"), entry(3, 0, "z")];

        let first = diff("ec2", Some(at(0, 0)), entries.clone(), at(12, 0));
        let second = diff("ec2", Some(at(0, 0)), entries, at(12, 0));

        assert_eq!(first, second);
    }

    #[test]
    fn distinct_timestamps_come_out_sorted_with_max_watermark() {
        let minutes = [47u32, 3, 29, 58, 11, 36];
        let entries: Vec<_> = minutes
            .iter()
            .map(|&m| entry(5, m, &m.to_string()))
            .collect();

        let out = diff("ec2", Some(at(0, 0)), entries, at(12, 0));

        let mut sorted = minutes.to_vec();
        sorted.sort();
        let expected: Vec<String> = sorted.iter().map(|m| format!("ec2: {m}")).collect();
        assert_eq!(out.lines, expected);
        assert_eq!(out.watermark, at(5, 58));
    }
}
