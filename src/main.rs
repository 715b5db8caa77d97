use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use headliner::app::AppContext;
use headliner::cli::commands::{self, SearchArgs};
use headliner::cli::{Cli, Commands};
use headliner::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal, so its logs go to a file instead.
    if matches!(cli.command, Commands::Tui) {
        let log_path = log_file_path()?;
        let file = OpenOptions::new().create(true).append(true).open(&log_path)?;
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(EnvFilter::from_default_env())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config)?;
    let _gc = ctx.service.spawn_gc(ctx.config.cache.gc_interval());

    match cli.command {
        Commands::Headlines {
            country,
            category,
            page_size,
            page,
        } => {
            commands::show_headlines(&ctx, country, category, page_size, page).await?;
        }
        Commands::Search {
            query,
            sort,
            language,
            from,
            to,
            pages,
        } => {
            let args = SearchArgs {
                query,
                sort,
                language,
                from,
                to,
                pages,
            };
            commands::search(&ctx, args).await?;
        }
        Commands::Tui => {
            headliner::tui::run(Arc::new(ctx)).await?;
        }
    }

    Ok(())
}

fn log_file_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::cache_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?
        .join("headliner");
    fs::create_dir_all(&dir)?;
    Ok(dir.join("headliner.log"))
}
