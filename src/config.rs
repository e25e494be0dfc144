//! Configuration file loading.
//!
//! The file is JSON with PascalCase keys:
//!
//! ```json
//! {
//!   "IRCServer": "irc.example.net:6667",
//!   "IRCNickname": "asoi",
//!   "Channels": ["#ops"],
//!   "Topics": ["ec2-us-east-1", "s3-us-standard"]
//! }
//! ```
//!
//! Everything else is optional and falls back to the defaults below.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{NotifierError, Result};
use crate::relay::{HandshakeMode, SessionOptions};
use crate::source::TOPIC_PLACEHOLDER;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/asoi.conf";
pub const DEFAULT_FEED_URL_TEMPLATE: &str = "http://status.aws.amazon.com/rss/{topic}.rss";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    /// `host:port` of the IRC server.
    #[serde(rename = "IRCServer", default)]
    pub irc_server: String,

    /// Nickname announced on connect.
    #[serde(rename = "IRCNickname", default)]
    pub irc_nickname: String,

    /// Channels every notification is sent to.
    #[serde(default)]
    pub channels: Vec<String>,

    /// Feed names; each is substituted into `feed_url_template`.
    #[serde(default)]
    pub topics: Vec<String>,

    #[serde(rename = "FeedURLTemplate", default = "default_feed_url_template")]
    pub feed_url_template: String,

    /// Where `<topic>.latest` watermark files live.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    #[serde(default = "default_settle_delay_millis")]
    pub settle_delay_millis: u64,

    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,

    #[serde(default)]
    pub handshake_mode: HandshakeMode,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_feed_url_template() -> String {
    DEFAULT_FEED_URL_TEMPLATE.to_string()
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_settle_delay_millis() -> u64 {
    500
}

fn default_handshake_timeout_secs() -> u64 {
    30
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Read, parse and validate the file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            NotifierError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs the run could not act on.
    pub fn validate(&self) -> Result<()> {
        let missing = |key: &str| Err(NotifierError::Config(format!("'{key}' is not defined")));

        if self.irc_nickname.is_empty() {
            return missing("IRCNickname");
        }
        if self.irc_server.is_empty() {
            return missing("IRCServer");
        }
        if self.channels.is_empty() {
            return missing("Channels");
        }
        if self.topics.is_empty() {
            return missing("Topics");
        }

        // Topic names become file names under `state_dir`.
        for topic in &self.topics {
            if topic.is_empty() || topic.contains(['/', '\\']) || topic == "." || topic == ".." {
                return Err(NotifierError::Config(format!("invalid topic name {topic:?}")));
            }
        }

        if !self.feed_url_template.contains(TOPIC_PLACEHOLDER) {
            return Err(NotifierError::Config(format!(
                "'FeedURLTemplate' must contain {TOPIC_PLACEHOLDER}"
            )));
        }

        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs),
            settle_delay: Duration::from_millis(self.settle_delay_millis),
            handshake_mode: self.handshake_mode,
            ..SessionOptions::default()
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"{
        "IRCServer": "irc.example.net:6667",
        "IRCNickname": "asoi",
        "Channels": ["#ops"],
        "Topics": ["ec2-us-east-1", "s3-us-standard"]
    }"##;

    fn config_error(raw: &str) -> String {
        match Config::from_json(raw) {
            Err(NotifierError::Config(msg)) => msg,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_json(MINIMAL).unwrap();

        assert_eq!(config.irc_server, "irc.example.net:6667");
        assert_eq!(config.irc_nickname, "asoi");
        assert_eq!(config.channels, vec!["#ops"]);
        assert_eq!(config.topics.len(), 2);
        assert_eq!(config.feed_url_template, DEFAULT_FEED_URL_TEMPLATE);
        assert_eq!(config.state_dir, PathBuf::from("."));
        assert_eq!(config.handshake_mode, HandshakeMode::FirstLine);

        let options = config.session_options();
        assert_eq!(options.settle_delay, Duration::from_millis(500));
        assert_eq!(options.handshake_timeout, Duration::from_secs(30));
    }

    #[test]
    fn optional_keys_override_defaults() {
        let config = Config::from_json(
            r##"{
                "IRCServer": "irc.example.net:6667",
                "IRCNickname": "asoi",
                "Channels": ["#ops", "#aws"],
                "Topics": ["rds"],
                "FeedURLTemplate": "https://status.example.com/{topic}.xml",
                "StateDir": "/var/lib/asoi",
                "SettleDelayMillis": 0,
                "HandshakeTimeoutSecs": 5,
                "HandshakeMode": "until-match",
                "FetchTimeoutSecs": 10
            }"##,
        )
        .unwrap();

        assert_eq!(config.state_dir, PathBuf::from("/var/lib/asoi"));
        assert_eq!(config.handshake_mode, HandshakeMode::UntilMatch);
        assert_eq!(config.session_options().settle_delay, Duration::ZERO);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn missing_required_keys_are_reported() {
        assert_eq!(
            config_error(r##"{"IRCServer": "irc:6667", "Channels": ["#a"], "Topics": ["t"]}"##),
            "'IRCNickname' is not defined"
        );
        assert_eq!(
            config_error(r##"{"IRCNickname": "n", "Channels": ["#a"], "Topics": ["t"]}"##),
            "'IRCServer' is not defined"
        );
        assert_eq!(
            config_error(r##"{"IRCServer": "irc:6667", "IRCNickname": "n", "Topics": ["t"]}"##),
            "'Channels' is not defined"
        );
        assert_eq!(
            config_error(r##"{"IRCServer": "irc:6667", "IRCNickname": "n", "Channels": ["#a"], "Topics": []}"##),
            "'Topics' is not defined"
        );
    }

    #[test]
    fn topics_must_be_plain_file_names() {
        let msg = config_error(
            r##"{"IRCServer": "irc:6667", "IRCNickname": "n", "Channels": ["#a"], "Topics": ["../etc"]}"##,
        );
        assert!(msg.contains("invalid topic name"));
    }

    #[test]
    fn template_needs_placeholder() {
        let msg = config_error(
            r##"{"IRCServer": "irc:6667", "IRCNickname": "n", "Channels": ["#a"], "Topics": ["t"],
                "FeedURLTemplate": "http://example.com/feed.rss"}"##,
        );
        assert!(msg.contains("FeedURLTemplate"));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            Config::from_json("{ not json"),
            Err(NotifierError::ConfigParse(_))
        ));
    }

    #[test]
    fn load_reports_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.conf")).unwrap_err();
        assert!(matches!(err, NotifierError::Config(_)));
    }
}
