//! Markdown rendering of the feed.

use crate::state::FeedState;
use crate::utils::{escape_markdown, format_display_date, thumbnail_url};
use std::fmt::Write;

/// Render the feed as Markdown, newest item first.
///
/// The layout mirrors the news page: an error banner when the last flow
/// failed, a placeholder while nothing is loaded, then one section per item
/// with its thumbnail, description and publication date.
///
/// # Arguments
///
/// * `state` - The feed to render
/// * `thumbnail_base_url` - Prefix thumbnails are served from
pub fn feed_to_markdown(state: &FeedState, thumbnail_base_url: &str) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Latest News\n");

    if let Some(error) = &state.error {
        let _ = writeln!(md, "> **Error:** {}\n", error);
    }

    let items = state.displayed();
    if items.is_empty() {
        if state.loading {
            let _ = writeln!(md, "_Loading news..._");
        } else {
            let _ = writeln!(md, "_No news items found._");
        }
        return md;
    }

    for item in items {
        let title = escape_markdown(&item.title);
        let _ = writeln!(md, "## {}\n", title);
        if let Some(key) = &item.thumbnail_key {
            let _ = writeln!(
                md,
                "![{}]({})\n",
                title,
                thumbnail_url(thumbnail_base_url, key)
            );
        }
        let _ = writeln!(md, "{}\n", escape_markdown(&item.description));
        let _ = writeln!(md, "<small>{}</small>\n", format_display_date(&item.date));
    }

    if state.cursor.is_some() {
        let _ = writeln!(md, "---\n\n_More news items available._");
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewsPage;
    use crate::state::Action;
    use crate::testing::item;

    #[test]
    fn test_empty_feed_placeholder() {
        let md = feed_to_markdown(&FeedState::default(), "/thumbnails");
        assert!(md.contains("_No news items found._"));

        let mut loading = FeedState::default();
        loading.apply(Action::FetchStarted);
        assert!(feed_to_markdown(&loading, "/thumbnails").contains("_Loading news..._"));
    }

    #[test]
    fn test_items_render_newest_first_with_thumbnail() {
        let mut with_thumb = item("b", "2024-01-03T10:00:00Z");
        with_thumb.thumbnail_key = Some("abc_photo.png".to_string());

        let mut state = FeedState::default();
        state.apply(Action::FetchSucceeded(NewsPage {
            news_items: vec![item("a", "2024-01-01T08:00:00Z"), with_thumb],
            next_key: None,
        }));

        let md = feed_to_markdown(&state, "/thumbnails");
        let first = md.find("## Title b").unwrap();
        let second = md.find("## Title a").unwrap();
        assert!(first < second);
        assert!(md.contains("![Title b](/thumbnails/abc_photo.png)"));
        assert!(md.contains("<small>January 3, 2024 at 10:00 AM</small>"));
        assert!(!md.contains("More news items available"));
    }

    #[test]
    fn test_server_text_cannot_break_markup() {
        let mut tricky = item("t", "2024-01-03T10:00:00Z");
        tricky.title = "C# [beta](x)".to_string();
        tricky.description = "# not a heading".to_string();
        tricky.thumbnail_key = Some("k.png".to_string());

        let mut state = FeedState::default();
        state.apply(Action::FetchSucceeded(NewsPage {
            news_items: vec![tricky],
            next_key: None,
        }));

        let md = feed_to_markdown(&state, "/thumbnails");
        assert!(md.contains(r"## C\# \[beta\]\(x\)"));
        assert!(md.contains(r"![C\# \[beta\]\(x\)](/thumbnails/k.png)"));
        assert!(md.contains(r"\# not a heading"));
    }

    #[test]
    fn test_error_banner_and_more_marker() {
        let mut state = FeedState::default();
        state.apply(Action::FetchSucceeded(NewsPage {
            news_items: vec![item("a", "2024-01-01")],
            next_key: Some(crate::models::Cursor(serde_json::json!("k"))),
        }));
        state.apply(Action::SubmitFailed("Failed to post news item".to_string()));

        let md = feed_to_markdown(&state, "/thumbnails");
        assert!(md.contains("> **Error:** Failed to post news item"));
        assert!(md.contains("_More news items available._"));
    }
}
