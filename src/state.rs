//! Explicit state container for the news feed.
//!
//! All client-side state lives in one [`FeedState`]:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `items` | Accumulated news items, in insertion order |
//! | `cursor` | `next_key` of the last loaded page |
//! | `loading` | A listing request is in flight |
//! | `submitting` | A create request is in flight |
//! | `uploading` | The latest thumbnail upload is in flight |
//! | `error` | The last user-visible error, if any |
//! | `draft` | The news item being composed |
//!
//! State only changes through [`FeedState::apply`], a transition function
//! with no I/O. The async flows dispatch [`Action`]s through a [`Store`].
//!
//! # Upload ordering
//!
//! Each upload is tagged with a [`UploadTicket`] from
//! [`FeedState::begin_upload`]. Tickets increase monotonically and only the
//! most recently issued one may set the draft's thumbnail key, so a slow,
//! superseded upload can never overwrite a newer one.
//!
//! # Errors
//!
//! Listing and posting (upload then create) run concurrently and report into
//! the same `error` slot. A posting success only clears an error raised by
//! posting, so a listing failure stays visible.

use crate::models::{Cursor, NewsItem, NewsPage};
use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// The news item being composed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub title: String,
    pub description: String,
    /// Storage key of the most recent completed upload.
    pub thumbnail_key: Option<String>,
}

/// Identifies one upload request. Larger tickets are newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UploadTicket(pub u64);

/// Everything that can happen to the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A listing request was issued.
    FetchStarted,
    /// A listing request returned a page.
    FetchSucceeded(NewsPage),
    /// A listing request failed with the given user-visible message.
    FetchFailed(String),

    /// The upload for `ticket` was issued.
    UploadStarted(UploadTicket),
    /// The upload for `ticket` finished, yielding a storage key.
    UploadSucceeded { ticket: UploadTicket, key: String },
    /// The upload for `ticket` failed.
    UploadFailed { ticket: UploadTicket, message: String },
    /// A file was refused before any request was issued.
    UploadRejected(String),
    /// A previously uploaded key was attached to the draft directly.
    ThumbnailAttached(String),

    /// The draft title changed.
    TitleEdited(String),
    /// The draft description changed.
    DescriptionEdited(String),

    /// A create request was issued.
    SubmitStarted,
    /// The server accepted the draft and returned its canonical item.
    SubmitSucceeded(NewsItem),
    /// A create request was refused, locally or by the server.
    SubmitFailed(String),

}

/// Which flow raised the current error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Listing,
    Posting,
}

/// Client-side feed state. See the module docs for the field table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    pub items: Vec<NewsItem>,
    pub cursor: Option<Cursor>,
    pub loading: bool,
    pub submitting: bool,
    pub uploading: bool,
    pub error: Option<String>,
    pub draft: Draft,
    /// `true` once at least one page has been loaded.
    pub loaded_once: bool,
    last_ticket: u64,
    error_flow: Option<Flow>,
}

impl FeedState {
    /// Issue the ticket for a new upload. Any earlier ticket becomes stale.
    pub fn begin_upload(&mut self) -> UploadTicket {
        self.last_ticket += 1;
        UploadTicket(self.last_ticket)
    }

    /// Whether `ticket` belongs to the most recently issued upload.
    pub fn is_current_upload(&self, ticket: UploadTicket) -> bool {
        ticket.0 == self.last_ticket
    }

    /// `true` when another page can be requested.
    pub fn has_more(&self) -> bool {
        !self.loaded_once || self.cursor.is_some()
    }

    /// Apply one transition.
    pub fn apply(&mut self, action: Action) {
        debug!(?action, "Applying feed action");
        match action {
            Action::FetchStarted => {
                self.loading = true;
            }
            Action::FetchSucceeded(page) => {
                self.loading = false;
                self.loaded_once = true;
                self.cursor = page.next_key;
                self.append_unique(page.news_items);
            }
            Action::FetchFailed(message) => {
                self.loading = false;
                self.set_error(Flow::Listing, message);
            }

            Action::UploadStarted(ticket) => {
                if self.is_current_upload(ticket) {
                    self.uploading = true;
                    self.clear_error(Flow::Posting);
                }
            }
            Action::UploadSucceeded { ticket, key } => {
                if self.is_current_upload(ticket) {
                    self.uploading = false;
                    self.draft.thumbnail_key = Some(key);
                } else {
                    debug!(ticket = ticket.0, latest = self.last_ticket, "Discarding stale upload result");
                }
            }
            Action::UploadFailed { ticket, message } => {
                if self.is_current_upload(ticket) {
                    self.uploading = false;
                    self.set_error(Flow::Posting, message);
                } else {
                    debug!(ticket = ticket.0, latest = self.last_ticket, "Discarding stale upload failure");
                }
            }
            Action::UploadRejected(message) => {
                self.set_error(Flow::Posting, message);
            }
            Action::ThumbnailAttached(key) => {
                self.draft.thumbnail_key = Some(key);
            }

            Action::TitleEdited(title) => {
                self.draft.title = title;
            }
            Action::DescriptionEdited(description) => {
                self.draft.description = description;
            }

            Action::SubmitStarted => {
                self.submitting = true;
            }
            Action::SubmitSucceeded(item) => {
                self.submitting = false;
                self.clear_error(Flow::Posting);
                self.items.retain(|existing| item.id.is_empty() || existing.id != item.id);
                self.items.insert(0, item);
                self.draft = Draft::default();
            }
            Action::SubmitFailed(message) => {
                self.submitting = false;
                self.set_error(Flow::Posting, message);
            }
        }
    }

    fn set_error(&mut self, flow: Flow, message: String) {
        self.error = Some(message);
        self.error_flow = Some(flow);
    }

    /// Clear the current error if `flow` raised it.
    fn clear_error(&mut self, flow: Flow) {
        if self.error_flow == Some(flow) {
            self.error = None;
            self.error_flow = None;
        }
    }

    /// Append a page, skipping items whose id is already known.
    ///
    /// Items without an id cannot be matched and are always kept.
    fn append_unique(&mut self, incoming: Vec<NewsItem>) {
        let mut known: HashSet<String> = self
            .items
            .iter()
            .filter(|i| !i.id.is_empty())
            .map(|i| i.id.clone())
            .collect();

        let before = incoming.len();
        let fresh: Vec<NewsItem> = incoming
            .into_iter()
            .filter(|i| i.id.is_empty() || known.insert(i.id.clone()))
            .collect();

        let dropped = before - fresh.len();
        if dropped > 0 {
            debug!(dropped, "Skipped news items already in the feed");
        }
        self.items.extend(fresh);
    }

    /// The feed as displayed: newest first.
    ///
    /// Sorting happens on every call, so display order depends only on item
    /// dates, never on insertion order. Items with equal dates keep their
    /// relative order; items with unparseable dates go last.
    pub fn displayed(&self) -> Vec<&NewsItem> {
        self.items
            .iter()
            .sorted_by(|a, b| compare_newest_first(a, b))
            .collect()
    }
}

fn compare_newest_first(a: &NewsItem, b: &NewsItem) -> Ordering {
    match (a.published_at(), b.published_at()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Shared handle on a [`FeedState`].
///
/// Flows running concurrently dispatch through the same store. The lock is
/// only held for the duration of a single transition or read, never across
/// an `.await`.
#[derive(Debug, Default)]
pub struct Store {
    state: Mutex<FeedState>,
}

impl Store {
    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply `action` to the shared state.
    pub fn dispatch(&self, action: Action) {
        self.lock().apply(action);
    }

    /// Issue a new upload ticket.
    pub fn begin_upload(&self) -> UploadTicket {
        self.lock().begin_upload()
    }

    /// Run `f` against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&FeedState) -> R) -> R {
        f(&self.lock())
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> FeedState {
        self.lock().clone()
    }
}
