//! Data models exchanged with the news board API.
//!
//! This module defines the wire types used by every flow in the client:
//! - [`NewsItem`]: A single published news item
//! - [`NewsPage`]: One page of the `/news` listing, with its continuation cursor
//! - [`Cursor`]: The opaque `next_key` token passed back to fetch the next page
//! - [`UploadCredential`]: A pre-signed upload target issued by `/pre-signed-url`
//! - [`NewsItemRequest`] / [`NewsItemResponse`]: The `/newsitem` create exchange
//!
//! Field names match the JSON produced by the API handlers, so no renames are
//! needed apart from the response envelopes.

use crate::utils::parse_item_date;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A published news item.
///
/// Items are created server-side; the client never mutates one after
/// receiving it. Unknown attributes stored alongside the item (such as the
/// table partition key) are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewsItem {
    /// Server-assigned identifier. Empty when the server omitted it.
    #[serde(default)]
    pub id: String,
    /// Headline, at most 100 characters.
    pub title: String,
    /// Body text, at most 300 characters.
    pub description: String,
    /// Publication timestamp as sent by the server (ISO-8601).
    pub date: String,
    /// Storage key of the uploaded thumbnail, if any.
    #[serde(default)]
    pub thumbnail_key: Option<String>,
}

impl NewsItem {
    /// Parse [`NewsItem::date`] into a UTC timestamp.
    ///
    /// Returns `None` when the server sent something that is not a
    /// recognizable date; such items sort after every dated item.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_item_date(&self.date)
    }
}

/// Opaque pagination token (`next_key`).
///
/// The listing endpoint hands back whatever its table returned as the last
/// evaluated key. The client never looks inside; it only JSON-encodes the
/// value and sends it back as `start_key`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Cursor(pub serde_json::Value);

impl Cursor {
    /// The JSON text sent as the `start_key` query parameter.
    pub fn to_query_value(&self) -> String {
        self.0.to_string()
    }
}

/// One page of the `/news` listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NewsPage {
    /// The items on this page, in server order.
    #[serde(default)]
    pub news_items: Vec<NewsItem>,
    /// Cursor for the next page; `None` (absent or `null`) at end of list.
    #[serde(default)]
    pub next_key: Option<Cursor>,
}

/// A short-lived, single-use upload target.
///
/// `url` accepts a multipart `POST` containing every entry of `fields`
/// followed by the file itself. `key` is what the caller later attaches to a
/// news item as its `thumbnail_key`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UploadCredential {
    pub url: String,
    #[serde(default)]
    pub fields: HashMap<String, String>,
    pub key: String,
}

/// Body of `POST /newsitem`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewsItemRequest {
    pub title: String,
    pub description: String,
    /// Serialized as `null` when no thumbnail was uploaded.
    pub thumbnail_key: Option<String>,
}

/// Response envelope of `POST /newsitem`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewsItemResponse {
    pub news_item: NewsItem,
}

/// Error body returned by the API handlers on non-2xx responses.
///
/// Handlers reply either `{"message": ...}` or, for a missing query
/// parameter, `{"missing_parameter": ...}`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
    pub missing_parameter: Option<String>,
}

impl ApiErrorBody {
    /// Collapse the body into a single human-readable message.
    pub fn into_message(self) -> Option<String> {
        match (self.message, self.missing_parameter) {
            (Some(message), _) => Some(message),
            (None, Some(param)) => Some(format!("missing parameter `{}`", param)),
            (None, None) => None,
        }
    }
}
