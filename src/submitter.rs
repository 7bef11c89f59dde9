//! News submitter: validates the draft and creates the news item.
//!
//! Nothing is inserted into the feed until the server confirms; the item the
//! server returns (with its assigned id and date) is what gets prepended.

use crate::api::NewsApi;
use crate::error::ClientError;
use crate::models::{NewsItem, NewsItemRequest};
use crate::state::{Action, Draft, Store};
use tracing::{info, instrument, warn};

/// Maximum title length, in characters.
pub const MAX_TITLE_CHARS: usize = 100;
/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 300;

/// User-visible prefix for create failures.
pub const POST_FAILED: &str = "Failed to post news item";

/// Check a draft against the client-side rules.
///
/// Lengths are counted in characters, not bytes.
pub fn validate_draft(draft: &Draft) -> Result<(), ClientError> {
    if draft.title.trim().is_empty() {
        return Err(ClientError::Validation("Title cannot be empty.".to_string()));
    }
    if draft.title.chars().count() > MAX_TITLE_CHARS {
        return Err(ClientError::Validation(format!(
            "Title must not exceed {} characters.",
            MAX_TITLE_CHARS
        )));
    }
    if draft.description.trim().is_empty() {
        return Err(ClientError::Validation("Description cannot be empty.".to_string()));
    }
    if draft.description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(ClientError::Validation(format!(
            "Description must not exceed {} characters.",
            MAX_DESCRIPTION_CHARS
        )));
    }
    Ok(())
}

/// Posts drafts through a [`NewsApi`].
#[derive(Debug)]
pub struct NewsSubmitter<'a, A> {
    api: &'a A,
}

impl<'a, A: NewsApi> NewsSubmitter<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Set the draft fields, then submit. See [`NewsSubmitter::submit_draft`].
    ///
    /// The thumbnail key is taken from `thumbnail_key` when given, otherwise
    /// the draft keeps the key of the last completed upload.
    pub async fn submit(
        &self,
        store: &Store,
        title: &str,
        description: &str,
        thumbnail_key: Option<String>,
    ) -> Result<NewsItem, ClientError> {
        store.dispatch(Action::TitleEdited(title.to_string()));
        store.dispatch(Action::DescriptionEdited(description.to_string()));
        if let Some(key) = thumbnail_key {
            store.dispatch(Action::ThumbnailAttached(key));
        }
        self.submit_draft(store).await
    }

    /// Validate the current draft and create it on the server.
    ///
    /// On success the canonical item is prepended to the feed and the draft
    /// cleared. On failure the draft is left as it was and the error message
    /// is stored in the feed.
    #[instrument(level = "info", skip_all)]
    pub async fn submit_draft(&self, store: &Store) -> Result<NewsItem, ClientError> {
        let (draft, uploading) = store.read(|s| (s.draft.clone(), s.uploading));

        if uploading {
            let e = ClientError::Validation(
                "Wait for the image upload to finish before posting.".to_string(),
            );
            store.dispatch(Action::SubmitFailed(e.user_message(POST_FAILED)));
            return Err(e);
        }
        if let Err(e) = validate_draft(&draft) {
            warn!(error = %e, "Draft failed validation");
            store.dispatch(Action::SubmitFailed(e.user_message(POST_FAILED)));
            return Err(e);
        }

        let request = NewsItemRequest {
            title: draft.title,
            description: draft.description,
            thumbnail_key: draft.thumbnail_key,
        };

        store.dispatch(Action::SubmitStarted);
        match self.api.create_news_item(&request).await {
            Ok(item) => {
                info!(id = %item.id, "News item posted");
                store.dispatch(Action::SubmitSucceeded(item.clone()));
                Ok(item)
            }
            Err(e) => {
                warn!(error = %e, "Create request failed");
                store.dispatch(Action::SubmitFailed(e.user_message(POST_FAILED)));
                Err(e)
            }
        }
    }
}
