use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState as Selection, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::tui::app::{Mode, Pane, Tab, TuiApp};
use crate::view::{self, format_published, ArticleMetadata, DatePolicy, ListState};

/// Draws one frame. Returns whether the end of the preview is visible.
pub fn render(frame: &mut Frame, app: &TuiApp) -> bool {
    let search_bar = if app.tab == Tab::Search { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),          // Tabs
            Constraint::Length(search_bar), // Search box
            Constraint::Min(10),            // List + preview
            Constraint::Length(1),          // Status bar
        ])
        .split(frame.area());

    render_tabs(frame, app, chunks[0]);
    if app.tab == Tab::Search {
        render_search_bar(frame, app, chunks[1]);
    }

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[2]);
    render_list_pane(frame, app, body[0]);
    let preview_at_end = render_preview_pane(frame, app, body[1]);
    render_status_bar(frame, app, chunks[3]);

    if let Some(share) = &app.share {
        let area = frame.area();
        render_share_popup(frame, share, area);
    }
    preview_at_end
}

fn border_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render_tabs(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
        .select(app.tab.index())
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

fn render_search_bar(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let editing = app.mode == Mode::Editing;
    let title = format!(" Search (sort: {}) ", app.sort.label());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(editing));

    let text = if editing {
        format!("{}_", app.search_input)
    } else if app.search_input.is_empty() {
        "Press / to search".to_string()
    } else {
        app.search_input.clone()
    };
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn list_term(app: &TuiApp) -> Option<&str> {
    match app.tab {
        Tab::Headlines => None,
        Tab::Search => app.search_term.as_deref(),
    }
}

fn render_list_pane(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let is_active = app.pane == Pane::List && app.mode == Mode::Normal;
    let snapshot = app.snapshot();
    let term = list_term(app);

    let header = view::header_text(snapshot, term);
    let title = if header.is_empty() {
        format!(" {} ", app.tab.title())
    } else {
        format!(" {} ", header)
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_active));

    let message = match ListState::classify(snapshot, term) {
        ListState::Loading => Some("Loading...".to_string()),
        ListState::Empty { message } => Some(message),
        ListState::Failed {
            message,
            has_content: false,
        } => Some(format!("{}\n\nPress R to retry.", message)),
        ListState::Ready | ListState::Failed { .. } => None,
    };
    if let Some(message) = message {
        let paragraph = Paragraph::new(message)
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
        return;
    }

    let dates = match app.tab {
        Tab::Headlines => DatePolicy::Absolute,
        Tab::Search => DatePolicy::Relative,
    };
    let now = Utc::now();
    let mut items: Vec<ListItem> = snapshot
        .articles
        .iter()
        .map(|article| {
            let date = format_published(article.published_at, dates, now);
            ListItem::new(format!("{} {}", date, article.display_title()))
        })
        .collect();

    if snapshot.is_fetching_more {
        items.push(ListItem::new("Loading more...").style(Style::default().fg(Color::DarkGray)));
    } else if !snapshot.has_more {
        items.push(ListItem::new("End of results").style(Style::default().fg(Color::DarkGray)));
    }

    let highlight = if is_active {
        Style::default()
            .bg(Color::Cyan)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(Color::DarkGray)
    };
    let list = List::new(items).block(block).highlight_style(highlight);
    let mut selection = Selection::default().with_selected(Some(app.selected_index()));
    frame.render_stateful_widget(list, area, &mut selection);
}

fn render_preview_pane(frame: &mut Frame, app: &TuiApp, area: Rect) -> bool {
    let is_active = app.pane == Pane::Preview && app.mode == Mode::Normal;

    let (title, content) = if let Some(article) = app.selected_article() {
        let meta = ArticleMetadata::new(article, Utc::now());
        let label = Style::default().fg(Color::Yellow);
        let mut lines = vec![
            Line::from(Span::styled(
                article.display_title(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(format!("By: {}", meta.author), label)),
            Line::from(Span::styled(format!("Source: {}", meta.source), label)),
            Line::from(Span::styled(format!("Date: {}", meta.published_at), label)),
            Line::from(Span::styled(meta.reading_time.clone(), label)),
            Line::from(Span::styled(
                format!("Link: {}", article.url),
                Style::default().fg(Color::Blue),
            )),
            Line::from(""),
            Line::from("─".repeat(area.width.saturating_sub(2) as usize)),
            Line::from(""),
        ];

        if let Some(description) = article.display_description() {
            lines.push(Line::from(Span::styled(
                description,
                Style::default().add_modifier(Modifier::ITALIC),
            )));
            lines.push(Line::from(""));
        }
        if let Some(content) = article.display_content() {
            lines.extend(content.lines().map(|l| Line::from(l.to_string())));
        }
        if !view::has_full_content(article) {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Press o to read the full article.",
                Style::default().fg(Color::DarkGray),
            )));
        }

        let related: Vec<_> = view::related_articles(article, &app.related.articles).collect();
        if !related.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "More headlines",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for other in related {
                lines.push(Line::from(format!("• {}", other.display_title())));
            }
            if app.related.is_fetching_more {
                lines.push(Line::from(Span::styled(
                    "Loading more...",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }

        (format!(" {} ", article.source_name()), Text::from(lines))
    } else {
        (" Preview ".to_string(), Text::from("No article selected"))
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_active));

    let at_end = app.selected_article().is_some()
        && app.preview_scroll as usize + area.height.saturating_sub(2) as usize
            >= wrapped_height(&content, area.width.saturating_sub(2));

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.preview_scroll, 0));

    frame.render_widget(paragraph, area);
    at_end
}

/// Rows `text` takes once wrapped to `width` columns. Word wrapping can
/// need a few more rows than this.
fn wrapped_height(text: &Text, width: u16) -> usize {
    let width = usize::from(width.max(1));
    text.lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum()
}

fn render_status_bar(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let snapshot = app.snapshot();
    let failure = match ListState::classify(snapshot, list_term(app)) {
        ListState::Failed {
            message,
            has_content: true,
        } => Some(message),
        _ => None,
    };

    let (status, style) = if let Some(message) = failure {
        (
            format!("{} (R to retry)", message),
            Style::default().fg(Color::White).bg(Color::Red),
        )
    } else if snapshot.is_refreshing {
        (
            "Refreshing...".to_string(),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        )
    } else if let Some(msg) = &app.status_message {
        (
            msg.clone(),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        )
    } else {
        let help = match app.mode {
            Mode::Editing => "Type to search  Enter:Search now  Ctrl-U:Clear  Esc:Done",
            Mode::Normal => {
                "j/k:Navigate  Tab:Switch tab  Enter:Preview  /:Search  s:Sort  o:Open  y:Share  R:Refresh  q:Quit"
            }
        };
        (
            help.to_string(),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        )
    };

    frame.render_widget(Paragraph::new(status).style(style), area);
}

fn render_share_popup(frame: &mut Frame, share: &view::SharePayload, area: Rect) {
    let popup = centered(area, 70, 50);
    let block = Block::default()
        .title(format!(" {} ", share.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let paragraph = Paragraph::new(share.message.as_str())
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
