//! feedrelay — relays new RSS status-feed entries to IRC channels.
//!
//! ## Architecture overview
//!
//! ```text
//!                 ┌─────────────┐
//!                 │   run.rs    │  one pass over all topics
//!                 └──────┬──────┘
//!        ┌───────────────┼────────────────┬──────────────┐
//!        ▼               ▼                ▼              ▼
//! ┌────────────┐  ┌────────────┐  ┌────────────┐  ┌────────────┐
//! │watermark.rs│  │  source/   │  │ differ.rs  │  │   relay/   │
//! │ last seen  │  │ fetch feed │  │ new lines  │  │ IRC session│
//! └────────────┘  └────────────┘  └────────────┘  └────────────┘
//! ```
//!
//! * **`source/`** — the `FeedSource` trait and the RSS implementation.
//! * **`watermark`** — per-topic "last seen" timestamps on disk.
//! * **`differ`** — picks entries newer than the watermark, oldest first.
//! * **`relay/`** — handshake-then-push IRC session and the `Relay` seam.
//! * **`run`** — ties the above together for a single scheduled run.
//! * **`config`** — JSON configuration file.

pub mod config;
pub mod differ;
pub mod error;
pub mod relay;
pub mod run;
pub mod source;
pub mod watermark;

pub use config::Config;
pub use error::{NotifierError, Result};
pub use run::{run_once, RunReport};
