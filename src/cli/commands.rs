use chrono::{NaiveDate, Utc};

use crate::app::{AppContext, HeadlinerError, Result};
use crate::cache::QueryStatus;
use crate::domain::{Article, ListQuery, SearchFilters, SortBy, TopHeadlinesQuery};
use crate::pagination::LoadMore;
use crate::view::{self, format_published, DatePolicy, ListState};

pub async fn show_headlines(
    ctx: &AppContext,
    country: Option<String>,
    category: Option<String>,
    page_size: Option<u32>,
    page: u32,
) -> Result<()> {
    let feed = &ctx.config.feed;
    let query = TopHeadlinesQuery {
        category,
        ..TopHeadlinesQuery::new(
            country.unwrap_or_else(|| feed.country.clone()),
            page_size.unwrap_or(feed.page_size),
            page.max(1),
        )
    };

    let entry = ctx.service.fetch_page(ListQuery::TopHeadlines(query)).await;
    if let (QueryStatus::Error, Some(e)) = (entry.status, entry.error) {
        return Err(e.into());
    }

    let Some(result) = entry.data.filter(|p| !p.is_empty()) else {
        println!("{}", view::empty_text(None));
        return Ok(());
    };

    println!("{} articles, page {}", result.total_results, page.max(1));
    print_articles(&result.articles, DatePolicy::Absolute);
    Ok(())
}

pub struct SearchArgs {
    pub query: String,
    pub sort: Option<SortBy>,
    pub language: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub pages: u32,
}

pub async fn search(ctx: &AppContext, args: SearchArgs) -> Result<()> {
    if let (Some(from), Some(to)) = (args.from, args.to) {
        if from > to {
            return Err(HeadlinerError::InvalidArgument(format!(
                "--from {from} is after --to {to}"
            )));
        }
    }

    let config = &ctx.config.search;
    let filters = SearchFilters {
        from: args.from,
        to: args.to,
        language: args.language.or_else(|| config.language.clone()),
        sort_by: args.sort.unwrap_or(config.sort_by),
        page_size: config.page_size,
        ..SearchFilters::query(args.query.clone())
    };

    let list = ctx.service.search_feed(&filters);
    let mut snapshot = list.fetch().await;

    for _ in 1..args.pages {
        match list.load_more().await {
            LoadMore::Loaded { .. } => {}
            LoadMore::Failed(e) => {
                eprintln!("Could not load more results: {}", e);
                break;
            }
            LoadMore::NoMorePages | LoadMore::Busy | LoadMore::NotLoaded => break,
        }
    }
    if args.pages > 1 {
        snapshot = list.snapshot();
    }

    let term = Some(args.query.as_str());
    match ListState::classify(&snapshot, term) {
        ListState::Failed {
            has_content: false, ..
        } => {
            let error = snapshot
                .error
                .ok_or_else(|| HeadlinerError::InvalidArgument("search failed".into()))?;
            return Err(error.into());
        }
        ListState::Failed { message, .. } => eprintln!("{}", message),
        ListState::Empty { message } => {
            println!("{}", message);
            return Ok(());
        }
        ListState::Loading | ListState::Ready => {}
    }

    println!("{}", view::header_text(&snapshot, term));
    print_articles(&snapshot.articles, DatePolicy::Relative);
    if snapshot.has_more {
        println!(
            "\nShowing {} of {}. Use --pages to load more.",
            snapshot.articles.len(),
            snapshot.total_results
        );
    }
    Ok(())
}

fn print_articles(articles: &[Article], dates: DatePolicy) {
    let now = Utc::now();
    for (i, article) in articles.iter().enumerate() {
        println!(
            "{:>3}. {} [{}] {}\n     {}",
            i + 1,
            format_published(article.published_at, dates, now),
            article.source_name(),
            article.display_title(),
            article.url
        );
    }
}
