//! Per-topic "last seen" timestamps.
//!
//! A watermark is the publication time of the newest entry already relayed
//! for a topic. [`FileWatermarkStore`] keeps one `<topic>.latest` file per
//! topic holding an RFC 3339 timestamp.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::error::{NotifierError, Result};

/// Durable per-topic watermark storage.
pub trait WatermarkStore {
    /// Load the watermark for `topic`. A missing record is `Ok(None)`.
    fn read(&self, topic: &str) -> Result<Option<DateTime<Utc>>>;

    /// Replace the watermark for `topic`. Must be durable on return.
    fn write(&self, topic: &str, watermark: DateTime<Utc>) -> Result<()>;
}

/// Stores each watermark in `<dir>/<topic>.latest`.
pub struct FileWatermarkStore {
    dir: PathBuf,
}

impl FileWatermarkStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, topic: &str) -> PathBuf {
        self.dir.join(format!("{topic}.latest"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Parse a stored payload. Whitespace and NUL padding are ignored.
fn parse_payload(topic: &str, raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| NotifierError::persistence(topic, format!("{e} in {trimmed:?}")))
}

fn format_payload(watermark: DateTime<Utc>) -> String {
    watermark.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl WatermarkStore for FileWatermarkStore {
    fn read(&self, topic: &str) -> Result<Option<DateTime<Utc>>> {
        let path = self.path_for(topic);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(topic, path = %path.display(), "no stored watermark");
                return Ok(None);
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(NotifierError::persistence(topic, "watermark file is not UTF-8"));
            }
            Err(e) => return Err(e.into()),
        };

        parse_payload(topic, &raw).map(Some)
    }

    fn write(&self, topic: &str, watermark: DateTime<Utc>) -> Result<()> {
        let path = self.path_for(topic);
        let temp_path = self.dir.join(format!("{topic}.latest.tmp"));

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(format_payload(watermark).as_bytes())?;
            file.sync_all()?;
        }

        // Atomic rename; the previous value stays intact until here.
        fs::rename(&temp_path, &path)?;
        debug!(topic, path = %path.display(), %watermark, "watermark written");
        Ok(())
    }
}

/// In-memory store, mainly for tests.
#[derive(Default)]
pub struct MemoryWatermarkStore {
    marks: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryWatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a topic.
    pub fn with(self, topic: &str, watermark: DateTime<Utc>) -> Self {
        self.lock().insert(topic.to_string(), watermark);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        // A poisoned map is still a valid map.
        self.marks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WatermarkStore for MemoryWatermarkStore {
    fn read(&self, topic: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.lock().get(topic).copied())
    }

    fn write(&self, topic: &str, watermark: DateTime<Utc>) -> Result<()> {
        self.lock().insert(topic.to_string(), watermark);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
