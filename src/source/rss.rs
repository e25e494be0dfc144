//! RSS feed source implementation.
//!
//! Each topic maps to one RSS document whose URL is built from a template
//! (e.g. `http://status.aws.amazon.com/rss/{topic}.rss`).

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use tracing::debug;

use super::{FeedEntry, FeedSource};
use crate::error::{NotifierError, Result};

/// Placeholder replaced by the topic name in [`RssSource::url_template`].
pub const TOPIC_PLACEHOLDER: &str = "{topic}";

/// An RSS feed source.
///
/// Fetches RSS 2.0 documents over HTTP with a blocking [`reqwest`] client and
/// parses them with the [`rss`](::rss) crate.
pub struct RssSource {
    /// URL template containing [`TOPIC_PLACEHOLDER`].
    pub url_template: String,
    client: reqwest::blocking::Client,
}

impl RssSource {
    /// Create a new RSS source.
    ///
    /// # Arguments
    ///
    /// * `url_template` — feed URL with `{topic}` where the topic name goes.
    /// * `timeout` — whole-request timeout for each fetch.
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            url_template: url_template.into(),
            client,
        })
    }

    /// The feed URL for `topic`.
    pub fn url_for(&self, topic: &str) -> String {
        self.url_template.replace(TOPIC_PLACEHOLDER, topic)
    }

    /// Parse an already-fetched [`rss::Channel`](::rss::Channel) into entries.
    ///
    /// Pure, so tests can exercise it without the network. Items without a
    /// parsable RFC 2822 `pubDate` are dropped: they can never be newer than
    /// a watermark.
    pub fn parse_channel(channel: &::rss::Channel) -> Vec<FeedEntry> {
        channel
            .items()
            .iter()
            .filter_map(|item| {
                let published = match item
                    .pub_date()
                    .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                {
                    Some(dt) => dt.with_timezone(&Utc),
                    None => {
                        debug!(title = ?item.title(), "dropping item without a usable pubDate");
                        return None;
                    }
                };

                let body = FeedEntry::pick_body(
                    [item.content(), item.description()],
                    item.title(),
                );

                Some(FeedEntry::new(published, body))
            })
            .collect()
    }

    fn parse_document(topic: &str, body: &[u8]) -> Result<Vec<FeedEntry>> {
        match ::rss::Channel::read_from(body) {
            Ok(channel) => Ok(Self::parse_channel(&channel)),
            // The server answered, but not with a feed.
            Err(::rss::Error::InvalidStartTag) => Err(NotifierError::NotFound {
                topic: topic.to_string(),
            }),
            Err(e) => Err(NotifierError::fetch(topic, e)),
        }
    }
}

impl FeedSource for RssSource {
    fn name(&self) -> &str {
        "rss"
    }

    fn fetch(&self, topic: &str) -> Result<Vec<FeedEntry>> {
        let url = self.url_for(topic);
        debug!(%url, "fetching feed");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| NotifierError::fetch(topic, e))?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                return Err(NotifierError::NotFound {
                    topic: topic.to_string(),
                })
            }
            status if !status.is_success() => {
                return Err(NotifierError::fetch(topic, format!("HTTP {status}")))
            }
            _ => {}
        }

        let body = response.bytes().map_err(|e| NotifierError::fetch(topic, e))?;
        Self::parse_document(topic, body.as_ref())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
