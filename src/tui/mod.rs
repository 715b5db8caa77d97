pub mod app;
pub mod event;
pub mod layout;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use crate::app::{AppContext, Result};
use crate::pagination::{InfiniteQuery, LoadMore};
use crate::search::SearchController;
use crate::view::{share_message, ShareContext};

use self::app::{Mode, Tab, TuiApp};
use self::event::{Action, AppEvent, EditAction, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum ListTask {
    Fetch,
    Refresh,
    LoadMore,
}

/// Runs `task` on its own so the UI keeps drawing; results land in the cache
/// and are picked up on the next frame.
fn spawn_list_task(list: &InfiniteQuery, task: ListTask) {
    let list = list.clone();
    tokio::spawn(async move {
        match task {
            ListTask::Fetch => {
                list.fetch().await;
            }
            ListTask::Refresh => {
                list.refresh().await;
            }
            ListTask::LoadMore => match list.load_more().await {
                LoadMore::Loaded { page } => info!("Loaded page {} of {}", page, list.key()),
                LoadMore::Failed(e) => warn!("Loading more of {} failed: {}", list.key(), e),
                LoadMore::NoMorePages | LoadMore::Busy | LoadMore::NotLoaded => {}
            },
        }
    });
}

struct Lists {
    headlines: InfiniteQuery,
    search: Arc<SearchController>,
    related: Option<InfiniteQuery>,
}

impl Lists {
    fn current(&self, tab: Tab) -> InfiniteQuery {
        match tab {
            Tab::Headlines => self.headlines.clone(),
            Tab::Search => self.search.query(),
        }
    }

    fn sync(&self, app: &mut TuiApp) {
        app.update_snapshot(Tab::Headlines, self.headlines.snapshot());
        app.update_snapshot(Tab::Search, self.search.query().snapshot());
        app.search_term = self
            .search
            .has_user_term()
            .then(|| self.search.term());
        app.sort = self.search.sort();
        if let Some(related) = &self.related {
            app.related = related.snapshot();
        }
    }
}

async fn run_app(terminal: &mut Tui, ctx: Arc<AppContext>) -> Result<()> {
    let mut tui_app = TuiApp::new(ctx.config.search.sort_by);
    let event_handler = EventHandler::new(Duration::from_millis(100));

    let feed = &ctx.config.feed;
    let mut lists = Lists {
        headlines: ctx.service.top_headlines_feed(&feed.country, feed.page_size),
        search: Arc::new(ctx.search_controller()),
        related: None,
    };
    spawn_list_task(&lists.headlines, ListTask::Fetch);
    let search_task = lists.search.spawn();

    loop {
        lists.sync(&mut tui_app);
        if let Some(article) = tui_app.selected_article() {
            // One related list per source; switching sources switches lists.
            let related = ctx.service.related_feed(article, &feed.country);
            if lists.related.as_ref().map(InfiniteQuery::key) != Some(related.key()) {
                spawn_list_task(&related, ListTask::Fetch);
                lists.related = Some(related);
            }
        }
        if tui_app.wants_more() {
            spawn_list_task(&lists.current(tui_app.tab), ListTask::LoadMore);
        }
        if tui_app.wants_more_related() {
            if let Some(related) = &lists.related {
                spawn_list_task(related, ListTask::LoadMore);
            }
        }

        let mut preview_at_end = false;
        terminal.draw(|frame| preview_at_end = layout::render(frame, &tui_app))?;
        tui_app.preview_at_end = preview_at_end;

        let key = match event_handler.next()? {
            AppEvent::Key(key) => key,
            AppEvent::Tick => continue,
        };

        if tui_app.share.take().is_some() {
            continue;
        }

        if tui_app.mode == Mode::Editing {
            handle_edit(&mut tui_app, &lists.search, EditAction::from(key));
            continue;
        }

        match Action::from(key) {
            Action::Quit => {
                tui_app.should_quit = true;
            }
            Action::MoveUp => {
                tui_app.move_up();
            }
            Action::MoveDown => {
                tui_app.move_down();
            }
            Action::NextTab => {
                tui_app.next_tab();
                tui_app.clear_status();
                // Serves cached results and refetches them once stale.
                spawn_list_task(&lists.current(tui_app.tab), ListTask::Fetch);
            }
            Action::TogglePane => {
                tui_app.toggle_pane();
            }
            Action::StartSearch => {
                if tui_app.tab != Tab::Search {
                    tui_app.next_tab();
                }
                tui_app.mode = Mode::Editing;
                tui_app.search_input = lists.search.input();
            }
            Action::CycleSort => {
                if tui_app.tab == Tab::Search {
                    let sort = lists.search.cycle_sort();
                    tui_app.search_index = 0;
                    tui_app.set_status(format!("Sorted by {}", sort.label()));
                }
            }
            Action::Refresh => {
                spawn_list_task(&lists.current(tui_app.tab), ListTask::Refresh);
                tui_app.clear_status();
            }
            Action::OpenInBrowser => {
                if let Some(article) = tui_app.selected_article() {
                    let url = article.url.clone();
                    match open::that(&url) {
                        Ok(()) => tui_app.set_status(format!("Opened {}", url)),
                        Err(e) => tui_app.set_status(format!("Failed to open browser: {}", e)),
                    }
                }
            }
            Action::Share => {
                let context = match tui_app.tab {
                    Tab::Headlines => ShareContext::Feed,
                    Tab::Search => ShareContext::Search,
                };
                tui_app.share = tui_app
                    .selected_article()
                    .map(|article| share_message(article, context));
            }
            Action::None => {}
        }

        if tui_app.should_quit {
            break;
        }
    }

    search_task.abort();
    Ok(())
}

fn handle_edit(tui_app: &mut TuiApp, search: &SearchController, action: EditAction) {
    match action {
        EditAction::Insert(c) => tui_app.search_input.push(c),
        EditAction::Backspace => {
            tui_app.search_input.pop();
        }
        EditAction::Clear => tui_app.search_input.clear(),
        EditAction::Submit => {
            search.set_input(tui_app.search_input.clone());
            search.submit();
            tui_app.mode = Mode::Normal;
            tui_app.search_index = 0;
            return;
        }
        EditAction::Done => {
            tui_app.mode = Mode::Normal;
            return;
        }
        EditAction::None => return,
    }
    search.set_input(tui_app.search_input.clone());
    tui_app.search_index = 0;
}
