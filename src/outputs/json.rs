//! JSON snapshot of the feed.
//!
//! The snapshot holds the displayed items (newest first), the cursor needed
//! to continue loading, and the last error, so other tools can pick up where
//! this run left off.

use crate::models::{Cursor, NewsItem};
use crate::state::FeedState;
use crate::utils::ensure_writable_parent;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Serialized form of a [`FeedState`].
#[derive(Debug, Deserialize, Serialize)]
pub struct FeedSnapshot {
    /// When the snapshot was taken (RFC 3339, UTC).
    pub generated_at: String,
    /// Items in display order.
    pub news_items: Vec<NewsItem>,
    /// Cursor for the next page, if any.
    pub next_key: Option<Cursor>,
    /// The last user-visible error, if any.
    pub error: Option<String>,
}

impl FeedSnapshot {
    pub fn from_state(state: &FeedState) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            news_items: state.displayed().into_iter().cloned().collect(),
            next_key: state.cursor.clone(),
            error: state.error.clone(),
        }
    }
}

/// Write a [`FeedSnapshot`] of `state` to `path`, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_feed(state: &FeedState, path: &Path) -> Result<(), Box<dyn Error>> {
    let snapshot = FeedSnapshot::from_state(state);
    let json = serde_json::to_string_pretty(&snapshot)?;

    ensure_writable_parent(path).await?;
    fs::write(path, json).await?;
    info!(items = snapshot.news_items.len(), "Wrote JSON feed snapshot");
    Ok(())
}
