//! Output generation for the rendered feed.
//!
//! # Submodules
//!
//! - [`markdown`]: Renders the displayed feed (newest first) as Markdown
//! - [`json`]: Writes a JSON snapshot of the feed for other tools
//!
//! Both render from a [`crate::state::FeedState`] and always go through
//! [`crate::state::FeedState::displayed`], so output order is by date.

pub mod json;
pub mod markdown;
