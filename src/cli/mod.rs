pub mod commands;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::SortBy;

#[derive(Parser)]
#[command(name = "headliner")]
#[command(about = "Top headlines and news search in the terminal", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/headliner/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show top headlines
    Headlines {
        /// Two-letter country code (default from config)
        #[arg(long)]
        country: Option<String>,

        /// Category, e.g. business, technology, sports
        #[arg(long)]
        category: Option<String>,

        /// Articles per page (default from config)
        #[arg(long)]
        page_size: Option<u32>,

        /// Page number to show
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Search all articles
    Search {
        /// Search terms
        query: String,

        /// Sort mode: publishedAt, relevancy or popularity
        #[arg(short, long)]
        sort: Option<SortBy>,

        /// Two-letter language code
        #[arg(short, long)]
        language: Option<String>,

        /// Oldest publication date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Newest publication date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Launch the TUI
    Tui,
}
