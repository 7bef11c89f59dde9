//! Command-line interface definitions for News Board.
//!
//! This module defines the CLI arguments and subcommands using the `clap` crate.
//! Connection options can also be provided via environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the News Board client.
///
/// # Examples
///
/// ```sh
/// # Show the latest page of news
/// news_board --api-url https://example.com/api list
///
/// # Load three pages and write them to files
/// news_board list --pages 3 --markdown-output ./news.md --json-output ./news.json
///
/// # Post a news item with a thumbnail
/// news_board post --title "Launch" --description "We shipped" --image ./photo.png
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Base URL of the news API (overrides the config file)
    #[arg(long, env = "NEWS_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Base URL thumbnails are served from (overrides the config file)
    #[arg(long, env = "NEWS_THUMBNAIL_URL", global = true)]
    pub thumbnail_base_url: Option<String>,

    /// Write the rendered feed to this Markdown file instead of stdout
    #[arg(short, long, global = true)]
    pub markdown_output: Option<PathBuf>,

    /// Also write the accumulated feed as JSON to this file
    #[arg(short, long, global = true)]
    pub json_output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// What to do once connected.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List news items, newest first
    List {
        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: usize,

        /// Items per page
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Post a news item, optionally with a thumbnail image
    Post {
        /// Headline (at most 100 characters)
        #[arg(short, long)]
        title: String,

        /// Body text (at most 300 characters)
        #[arg(short, long)]
        description: String,

        /// Image file to upload as the thumbnail (at most 5 MB)
        #[arg(short, long)]
        image: Option<PathBuf>,
    },

    /// Upload a thumbnail and print its storage key
    Upload {
        /// Image file to upload (at most 5 MB)
        path: PathBuf,
    },
}

impl Command {
    /// Page size requested on the command line, if any.
    pub fn page_size(&self) -> Option<u32> {
        match self {
            Command::List { limit, .. } => *limit,
            _ => None,
        }
    }
}
