use crate::cache::QueryStatus;
use crate::domain::{Article, SortBy};
use crate::pagination::InfiniteSnapshot;
use crate::view::SharePayload;

/// Rows from the end of the list at which the next page is requested.
const LOAD_MORE_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Headlines,
    Search,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Headlines, Tab::Search];

    pub fn next(self) -> Self {
        match self {
            Tab::Headlines => Tab::Search,
            Tab::Search => Tab::Headlines,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Headlines => "Headlines",
            Tab::Search => "Search",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Headlines => 0,
            Tab::Search => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    List,
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Keystrokes go to the search box.
    Editing,
}

pub struct TuiApp {
    pub tab: Tab,
    pub pane: Pane,
    pub mode: Mode,
    pub headlines: InfiniteSnapshot,
    pub search: InfiniteSnapshot,
    pub related: InfiniteSnapshot,
    pub search_input: String,
    /// Settled term the user typed; `None` while the default term is shown.
    pub search_term: Option<String>,
    pub sort: SortBy,
    pub headlines_index: usize,
    pub search_index: usize,
    pub preview_scroll: u16,
    /// Set after each frame: the last preview line is on screen.
    pub preview_at_end: bool,
    pub share: Option<SharePayload>,
    pub should_quit: bool,
    pub status_message: Option<String>,
}

impl TuiApp {
    pub fn new(sort: SortBy) -> Self {
        Self {
            tab: Tab::Headlines,
            pane: Pane::List,
            mode: Mode::Normal,
            headlines: empty_snapshot(),
            search: empty_snapshot(),
            related: empty_snapshot(),
            search_input: String::new(),
            search_term: None,
            sort,
            headlines_index: 0,
            search_index: 0,
            preview_scroll: 0,
            preview_at_end: false,
            share: None,
            should_quit: false,
            status_message: None,
        }
    }

    pub fn snapshot(&self) -> &InfiniteSnapshot {
        match self.tab {
            Tab::Headlines => &self.headlines,
            Tab::Search => &self.search,
        }
    }

    pub fn selected_index(&self) -> usize {
        match self.tab {
            Tab::Headlines => self.headlines_index,
            Tab::Search => self.search_index,
        }
    }

    fn selected_index_mut(&mut self) -> &mut usize {
        match self.tab {
            Tab::Headlines => &mut self.headlines_index,
            Tab::Search => &mut self.search_index,
        }
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.snapshot().articles.get(self.selected_index())
    }

    /// Replaces a list snapshot, keeping the selection inside the list.
    pub fn update_snapshot(&mut self, tab: Tab, snapshot: InfiniteSnapshot) {
        let len = snapshot.articles.len();
        let (slot, index) = match tab {
            Tab::Headlines => (&mut self.headlines, &mut self.headlines_index),
            Tab::Search => (&mut self.search, &mut self.search_index),
        };
        *slot = snapshot;
        if *index >= len {
            *index = len.saturating_sub(1);
        }
    }

    pub fn move_up(&mut self) {
        match self.pane {
            Pane::List => {
                let index = self.selected_index_mut();
                if *index > 0 {
                    *index -= 1;
                    self.preview_scroll = 0;
                }
            }
            Pane::Preview => {
                self.preview_scroll = self.preview_scroll.saturating_sub(1);
            }
        }
    }

    pub fn move_down(&mut self) {
        match self.pane {
            Pane::List => {
                let len = self.snapshot().articles.len();
                let index = self.selected_index_mut();
                if len > 0 && *index < len - 1 {
                    *index += 1;
                    self.preview_scroll = 0;
                }
            }
            Pane::Preview => {
                self.preview_scroll = self.preview_scroll.saturating_add(1);
            }
        }
    }

    pub fn next_tab(&mut self) {
        self.tab = self.tab.next();
        self.pane = Pane::List;
        self.preview_scroll = 0;
    }

    pub fn toggle_pane(&mut self) {
        self.pane = match self.pane {
            Pane::List => Pane::Preview,
            Pane::Preview => Pane::List,
        };
    }

    /// Whether the selection is close enough to the end to fetch the next page.
    pub fn wants_more(&self) -> bool {
        let snapshot = self.snapshot();
        if !can_load_more(snapshot) {
            return false;
        }
        let len = snapshot.articles.len();
        len > 0 && self.selected_index() + LOAD_MORE_THRESHOLD >= len - 1
    }

    /// Whether the related headlines under the preview should grow: the
    /// preview has focus and is scrolled to its end.
    pub fn wants_more_related(&self) -> bool {
        self.pane == Pane::Preview && self.preview_at_end && can_load_more(&self.related)
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}

/// A failed page stays failed until the user retries; otherwise every frame
/// would request it again.
fn can_load_more(snapshot: &InfiniteSnapshot) -> bool {
    snapshot.has_more
        && !snapshot.is_fetching_more
        && !snapshot.is_refreshing
        && snapshot.status != QueryStatus::Error
}

fn empty_snapshot() -> InfiniteSnapshot {
    InfiniteSnapshot {
        articles: Vec::new(),
        total_results: 0,
        page_count: 0,
        status: QueryStatus::Idle,
        error: None,
        is_loading: false,
        is_refreshing: false,
        is_fetching_more: false,
        has_more: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FetchError;
    use crate::domain::article::tests::article;

    fn loaded(count: usize, has_more: bool) -> InfiniteSnapshot {
        InfiniteSnapshot {
            articles: (0..count)
                .map(|i| article(&format!("https://news.test/{i}")))
                .collect(),
            total_results: 100,
            page_count: 1,
            status: QueryStatus::Success,
            has_more,
            ..empty_snapshot()
        }
    }

    #[test]
    fn test_selection_is_per_tab() {
        let mut app = TuiApp::new(SortBy::PublishedAt);
        app.update_snapshot(Tab::Headlines, loaded(20, true));
        app.update_snapshot(Tab::Search, loaded(20, true));

        app.move_down();
        app.move_down();
        app.next_tab();
        app.move_down();

        assert_eq!(app.headlines_index, 2);
        assert_eq!(app.search_index, 1);
        assert_eq!(
            app.selected_article().map(|a| a.url.as_str()),
            Some("https://news.test/1")
        );
    }

    #[test]
    fn test_wants_more_near_end_only() {
        let mut app = TuiApp::new(SortBy::PublishedAt);
        app.update_snapshot(Tab::Headlines, loaded(20, true));
        assert!(!app.wants_more());

        app.headlines_index = 16;
        assert!(app.wants_more());

        app.update_snapshot(Tab::Headlines, loaded(20, false));
        assert!(!app.wants_more());
    }

    #[test]
    fn test_failed_page_is_not_requested_again_every_frame() {
        let mut app = TuiApp::new(SortBy::PublishedAt);
        app.update_snapshot(
            Tab::Headlines,
            InfiniteSnapshot {
                status: QueryStatus::Error,
                error: Some(FetchError::Http {
                    status: 429,
                    path: "/top-headlines".into(),
                    message: None,
                }),
                ..loaded(20, true)
            },
        );
        app.headlines_index = 19;

        let requests = (0..10).filter(|_| app.wants_more()).count();
        assert_eq!(requests, 0);

        // A successful retry re-enables infinite scroll.
        app.update_snapshot(Tab::Headlines, loaded(20, true));
        assert!(app.wants_more());
    }

    #[test]
    fn test_related_grows_only_when_preview_scrolled_to_end() {
        let mut app = TuiApp::new(SortBy::PublishedAt);
        app.update_snapshot(Tab::Headlines, loaded(20, true));
        app.related = loaded(10, true);
        app.preview_at_end = true;
        assert!(!app.wants_more_related());

        app.toggle_pane();
        assert!(app.wants_more_related());

        app.preview_at_end = false;
        assert!(!app.wants_more_related());

        app.preview_at_end = true;
        app.related.is_fetching_more = true;
        assert!(!app.wants_more_related());

        app.related = InfiniteSnapshot {
            status: QueryStatus::Error,
            ..loaded(10, true)
        };
        assert!(!app.wants_more_related());
    }

    #[test]
    fn test_selection_clamped_when_list_shrinks() {
        let mut app = TuiApp::new(SortBy::PublishedAt);
        app.update_snapshot(Tab::Search, loaded(40, true));
        app.search_index = 35;

        app.update_snapshot(Tab::Search, loaded(20, true));
        assert_eq!(app.search_index, 19);

        app.update_snapshot(Tab::Search, loaded(0, false));
        assert_eq!(app.search_index, 0);
    }
}
