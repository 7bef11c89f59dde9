//! # News Board
//!
//! A command-line client for the news board API: list news items page by
//! page, upload thumbnail images through pre-signed URLs, and post new items.
//!
//! ## Usage
//!
//! ```sh
//! news_board --api-url https://example.com/api list --pages 2
//! news_board post --title "Launch" --description "We shipped" --image ./photo.png
//! ```
//!
//! ## Architecture
//!
//! The client is built around one explicit state container:
//! 1. **State**: [`state::FeedState`] holds items, cursor, flags, error and draft
//! 2. **Flows**: [`listing`], [`uploader`] and [`submitter`] talk to the API and
//!    dispatch [`state::Action`]s describing what happened
//! 3. **Output**: the resulting feed is rendered newest-first as Markdown and,
//!    optionally, saved as a JSON snapshot
//!
//! Listing and posting are independent; `post` runs both concurrently.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod listing;
mod models;
mod outputs;
mod state;
mod submitter;
#[cfg(test)]
mod testing;
mod uploader;
mod utils;

use api::{HttpNewsApi, NewsApi};
use cli::{Cli, Command};
use config::ClientConfig;
use error::ClientError;
use listing::ListingFetcher;
use outputs::{json, markdown};
use state::{Action, Store};
use submitter::{NewsSubmitter, POST_FAILED, validate_draft};
use uploader::ThumbnailUploader;
use utils::ensure_writable_parent;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("news_board starting up");

    let args = Cli::parse();
    debug!(command = ?args.command, "Parsed CLI arguments");

    let config = ClientConfig::load(&args)?;
    info!(api = %config.api_base_url, page_size = config.page_size, "Loaded configuration");

    let api = HttpNewsApi::new(&config.api_base_url)?;
    let store = Store::default();

    let outcome = match &args.command {
        Command::List { pages, .. } => ListingFetcher::new(&api, config.page_size)
            .fetch_pages(&store, *pages)
            .await
            .map(|_| ()),
        Command::Post {
            title,
            description,
            image,
        } => {
            post_news(
                &api,
                &store,
                config.page_size,
                title,
                description,
                image.as_deref(),
            )
            .await
        }
        Command::Upload { path } => ThumbnailUploader::new(&api)
            .upload_path(&store, path)
            .await
            .map(|key| println!("{}", key)),
    };

    // ---- Output ----
    let feed = store.snapshot();
    let render_feed =
        !matches!(args.command, Command::Upload { .. }) || args.markdown_output.is_some();

    if render_feed {
        let md = markdown::feed_to_markdown(&feed, &config.thumbnail_base_url);
        match &args.markdown_output {
            Some(path) => {
                if let Err(e) = write_markdown(path, &md).await {
                    error!(path = %path.display(), error = %e, "Failed writing Markdown");
                }
            }
            None => print!("{}", md),
        }
    }

    if let Some(path) = &args.json_output {
        if let Err(e) = json::write_feed(&feed, path).await {
            error!(path = %path.display(), error = %e, "Failed to write JSON snapshot");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        items = feed.items.len(),
        has_more = feed.cursor.is_some(),
        "Execution complete"
    );

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            let message = feed.error.unwrap_or_else(|| e.to_string());
            if e.is_validation() {
                warn!("{}", message);
            } else {
                error!(error = %e, "{}", message);
            }
            if !render_feed {
                eprintln!("{}", message);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Upload the image (if any) and post the item while the first page loads.
///
/// The listing runs independently of the upload-then-submit chain. A posting
/// failure takes precedence over a listing failure in the returned result.
#[instrument(level = "info", skip_all, fields(%title, has_image = image.is_some()))]
async fn post_news<A: NewsApi>(
    api: &A,
    store: &Store,
    page_size: u32,
    title: &str,
    description: &str,
    image: Option<&Path>,
) -> Result<(), ClientError> {
    let listing = ListingFetcher::new(api, page_size);
    let (listed, posted) = futures::future::join(
        listing.fetch_page(store, None),
        upload_and_submit(api, store, title, description, image),
    )
    .await;
    posted?;
    listed?;
    Ok(())
}

/// Upload the thumbnail first so its key is on the draft, then submit.
///
/// The draft is validated before the upload, so an invalid draft never
/// leaves an orphaned object in storage.
async fn upload_and_submit<A: NewsApi>(
    api: &A,
    store: &Store,
    title: &str,
    description: &str,
    image: Option<&Path>,
) -> Result<(), ClientError> {
    store.dispatch(Action::TitleEdited(title.to_string()));
    store.dispatch(Action::DescriptionEdited(description.to_string()));
    if let Err(e) = store.read(|s| validate_draft(&s.draft)) {
        warn!(error = %e, "Draft failed validation, skipping upload");
        store.dispatch(Action::SubmitFailed(e.user_message(POST_FAILED)));
        return Err(e);
    }

    if let Some(path) = image {
        ThumbnailUploader::new(api).upload_path(store, path).await?;
    }
    NewsSubmitter::new(api)
        .submit(store, title, description, None)
        .await?;
    Ok(())
}

async fn write_markdown(path: &Path, md: &str) -> Result<(), Box<dyn Error>> {
    ensure_writable_parent(path).await?;
    tokio::fs::write(path, md).await?;
    info!(path = %path.display(), "Wrote feed Markdown");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewsPage;
    use crate::testing::{Call, FakeApi, credential, item};

    #[tokio::test]
    async fn test_post_news_uploads_then_submits_alongside_listing() {
        let mut created = item("srv", "2024-02-01T00:00:00Z");
        created.thumbnail_key = Some("k_photo.png".to_string());
        let api = FakeApi {
            pages: std::sync::Mutex::new(
                vec![NewsPage {
                    news_items: vec![item("a", "2024-01-01")],
                    next_key: None,
                }]
                .into(),
            ),
            credential: Some(credential("k_photo.png")),
            created: Some(created),
            ..FakeApi::default()
        };
        let store = Store::default();
        let dir = std::env::temp_dir().join(format!("news_board_main_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let image = dir.join("photo.png");
        std::fs::write(&image, b"png").unwrap();

        post_news(&api, &store, 20, "Launch", "We shipped", Some(image.as_path()))
            .await
            .unwrap();

        let calls = api.calls();
        let credential_at = calls
            .iter()
            .position(|c| matches!(c, Call::Credential(_)))
            .unwrap();
        let upload_at = calls
            .iter()
            .position(|c| matches!(c, Call::Upload { .. }))
            .unwrap();
        let create_at = calls
            .iter()
            .position(|c| matches!(c, Call::Create(_)))
            .unwrap();
        assert!(credential_at < upload_at && upload_at < create_at);
        assert!(calls.iter().any(|c| matches!(c, Call::List { .. })));

        let feed = store.snapshot();
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.displayed()[0].id, "srv");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_post_news_reports_listing_failure() {
        let api = FakeApi {
            created: Some(item("srv", "2024-02-01T00:00:00Z")),
            ..FakeApi::default()
        };
        let store = Store::default();

        let err = post_news(&api, &store, 20, "Launch", "We shipped", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Server { .. }));
        assert_eq!(store.read(|s| s.items.len()), 1);

        let md = markdown::feed_to_markdown(&store.snapshot(), "/thumbnails");
        assert!(md.contains("> **Error:** Failed to fetch news items"));
    }

    #[tokio::test]
    async fn test_post_news_invalid_draft_skips_upload() {
        let api = FakeApi {
            pages: std::sync::Mutex::new(
                vec![NewsPage {
                    news_items: vec![item("a", "2024-01-01")],
                    next_key: None,
                }]
                .into(),
            ),
            credential: Some(credential("k_photo.png")),
            ..FakeApi::default()
        };
        let store = Store::default();
        let dir = std::env::temp_dir().join(format!("news_board_invalid_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let image = dir.join("photo.png");
        std::fs::write(&image, b"png").unwrap();

        let err = post_news(&api, &store, 20, &"t".repeat(101), "ok", Some(image.as_path()))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(
            api.calls()
                .iter()
                .all(|c| !matches!(c, Call::Credential(_) | Call::Upload { .. } | Call::Create(_)))
        );
        let state = store.snapshot();
        assert_eq!(state.draft.title.chars().count(), 101);
        assert_eq!(
            state.error.as_deref(),
            Some("Title must not exceed 100 characters.")
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
