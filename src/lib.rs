//! # Headliner
//!
//! Top headlines and news search in the terminal, backed by the NewsAPI
//! REST service.
//!
//! ## Architecture
//!
//! ```text
//! UI intent → (debounce) → QueryCache → ArticleRepository → Gateway → HTTP
//! ```
//!
//! Responses are cached by [`QueryKey`](domain::QueryKey); paged lists are
//! merged into one [`PageSet`](pagination::PageSet) per list.
//!
//! ## Quick Start
//!
//! ```bash
//! export NEWS_API_KEY=...
//!
//! # Top headlines for the configured country
//! headliner headlines --category technology
//!
//! # Search, loading three pages
//! headliner search "rust language" --sort relevancy --pages 3
//!
//! # Launch TUI
//! headliner tui
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires the gateway, repository
/// and [`NewsService`](service::NewsService) together from a [`Config`](config::Config).
pub mod app;

/// Keyed query cache: de-duplicates in-flight requests, serves stale data
/// while refetching, keeps failed results next to the last good data, and
/// evicts unobserved entries.
pub mod cache;

/// Command-line interface using clap.
///
/// - `headlines` - One page of top headlines
/// - `search <query>` - Search all articles
/// - `tui` - Launch the TUI
pub mod cli;

/// Configuration loaded from `~/.config/headliner/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Article`](domain::Article) and [`ResultPage`](domain::ResultPage): API payloads
/// - [`TopHeadlinesQuery`](domain::TopHeadlinesQuery) and
///   [`SearchFilters`](domain::SearchFilters): request filters
/// - [`QueryKey`](domain::QueryKey): cache identity of a request
pub mod domain;

/// HTTP access to the news API.
///
/// - [`Gateway`](gateway::Gateway): Async trait for GET requests
/// - [`HttpGateway`](gateway::HttpGateway): reqwest-based implementation
/// - [`Diagnostics`](gateway::Diagnostics): Sink for failed requests
pub mod gateway;

/// Infinite lists: pages accumulated under one cache entry.
pub mod pagination;

/// Typed accessors for `/top-headlines` and `/everything`.
pub mod repository;

/// Debounced search input.
pub mod search;

/// Cached reads and infinite feeds for UI collaborators.
pub mod service;

/// Terminal user interface.
///
/// Headlines and Search tabs, each a list beside a preview pane.
///
/// Keybindings: j/k navigate, Tab switches tabs, / edits the search,
/// s cycles the sort mode, o opens in browser, y shows share text,
/// R refreshes, q quits.
pub mod tui;

/// Date formatting, empty states and other text shown to the user.
pub mod view;
