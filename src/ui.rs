//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! The feed is drawn through the [`VirtualList`](crate::virtual_list::VirtualList)
//! owned by the app: each frame sets the viewport height, measures the rows
//! that are about to be shown at the current width, and then draws only
//! those rows at their computed offsets.  Rows cut by the top edge are
//! drawn scrolled; rows cut by the bottom edge are clipped.
//!
//! Layout, top to bottom: optional "new posts" banner, the feed, optional
//! input box, one-line status bar.

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, Mode};
use crate::feed::post::{relative_time, MAX_POST_CHARS};
use crate::feed::PostWithAuthor;

/// Header line plus blank separator around the wrapped content.
const ROW_CHROME_LINES: u16 = 2;
const SENTINEL_HEIGHT: u16 = 1;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let banner = app
        .reconciler
        .banner()
        .filter(|_| app.is_home() && app.mode == Mode::Browse);
    let input_height = if app.mode == Mode::Browse { 0 } else { 3 };

    let [banner_area, main_area, input_area, status_area] = Layout::vertical([
        Constraint::Length(u16::from(banner.is_some())),
        Constraint::Min(1),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    if let Some(text) = banner {
        draw_banner(&text, frame, banner_area);
    }
    draw_feed(app, frame, main_area);
    if input_height > 0 {
        draw_input(app, frame, input_area);
    }
    draw_status_bar(app, frame, status_area);
}

/// Split `text` into lines of at most `width` characters, honouring
/// embedded newlines.  Always yields at least one line.
pub fn wrap_content(text: &str, width: u16) -> Vec<String> {
    let width = usize::from(width.max(1));
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let chars: Vec<char> = raw.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        lines.extend(chars.chunks(width).map(|c| c.iter().collect::<String>()));
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Rendered height of a post row at `width`.
pub fn row_height(row: &PostWithAuthor, width: u16) -> u16 {
    let content = wrap_content(&row.post.content, width).len();
    u16::try_from(content)
        .unwrap_or(u16::MAX)
        .saturating_add(ROW_CHROME_LINES)
}

fn draw_banner(text: &str, frame: &mut Frame, area: Rect) {
    let banner = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" ↑ {text} "),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  press n to show", Style::default().fg(Color::Cyan)),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(banner, area);
}

/// Render the virtualized feed list.
fn draw_feed(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(format!(" {} ", app.query.title()))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.feed.len() == 0 {
        draw_placeholder(app, frame, inner);
        return;
    }

    // Content is indented by the two-column selection marker.
    let text_width = inner.width.saturating_sub(2);
    app.list.set_viewport(inner.height);
    measure_visible(app, text_width);

    let now = Utc::now();
    let scroll = i64::from(app.list.scroll_offset());
    let viewport = i64::from(inner.height);

    for item in app.list.visible_items() {
        let top = i64::from(item.start) - scroll;
        let bottom = top + i64::from(item.size);
        if bottom <= 0 || top >= viewport {
            continue;
        }
        let clip_top = (-top).max(0);
        let y = top.max(0);
        let height = bottom.min(viewport) - y;
        let rect = Rect {
            x: inner.x,
            y: inner.y + y as u16,
            width: inner.width,
            height: height as u16,
        };

        let paragraph = match app.feed.get(item.index) {
            Some(row) => {
                let selected = app.selected == Some(item.index);
                post_paragraph(row, text_width, selected, now)
            }
            None => Paragraph::new(Line::from(Span::styled(
                "  Loading more…",
                Style::default().fg(Color::DarkGray),
            ))),
        };
        frame.render_widget(paragraph.scroll((clip_top as u16, 0)), rect);
    }
}

/// Feed heights of rows about to be drawn back into the virtual list.
fn measure_visible(app: &mut App, width: u16) {
    // Measuring can shift the visible window; two passes settle it for the
    // common case of a handful of rows changing height.
    for _ in 0..2 {
        let mut changed = false;
        for index in app.list.visible_range() {
            let height = match app.feed.get(index) {
                Some(row) => row_height(row, width),
                None => SENTINEL_HEIGHT,
            };
            changed |= app.list.measure(index, height);
        }
        if !changed {
            break;
        }
    }
}

fn post_paragraph(
    row: &PostWithAuthor,
    width: u16,
    selected: bool,
    now: chrono::DateTime<Utc>,
) -> Paragraph<'static> {
    let marker = if selected { "▸ " } else { "  " };
    let mut lines = vec![Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::styled(
            format!("@{}", row.author.username),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" · {}", relative_time(row.post.created_at, now)),
            Style::default().fg(Color::DarkGray),
        ),
    ])];
    lines.extend(
        wrap_content(&row.post.content, width)
            .into_iter()
            .map(|l| Line::from(vec![Span::raw("  "), Span::styled(l, Style::default().fg(Color::White))])),
    );
    lines.push(Line::default());

    let style = if selected {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };
    Paragraph::new(lines).style(style)
}

fn draw_placeholder(app: &App, frame: &mut Frame, area: Rect) {
    let text = if app.feed.is_fetching() {
        "Loading…".to_string()
    } else if let Some(e) = app.feed.last_error() {
        format!("Could not load posts: {}  (r to retry)", e.user_message())
    } else if app.feed.is_empty() {
        match app.query {
            crate::feed::FeedQuery::All => "No posts yet. Press c to write the first one.".to_string(),
            _ => "No posts found".to_string(),
        }
    } else {
        String::new()
    };
    let placeholder = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(Color::DarkGray),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(placeholder, area);
}

fn draw_input(app: &App, frame: &mut Frame, area: Rect) {
    let (title, buffer) = match &app.mode {
        Mode::Browse => return,
        Mode::Compose(buf) => (
            format!(
                " New post {}/{MAX_POST_CHARS}  Enter: send  Esc: cancel ",
                buf.chars().count()
            ),
            buf,
        ),
        Mode::Username(buf) => (" Choose a username  Enter: save ".to_string(), buf),
        Mode::Search(buf) => (" Search posts (@name opens a profile) ".to_string(), buf),
    };

    // Keep the cursor end visible for long input.
    let visible = usize::from(area.width.saturating_sub(3));
    let chars: Vec<char> = buffer.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(visible)..].iter().collect();

    let input = Paragraph::new(Line::from(vec![
        Span::raw(tail),
        Span::styled("█", Style::default().fg(Color::Yellow)),
    ]))
    .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(input, area);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let who = app
        .user
        .username
        .as_deref()
        .map(|u| format!("@{u}"))
        .unwrap_or_else(|| "(no username)".into());
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} posts", app.feed.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(who, Style::default().fg(Color::Cyan)),
        Span::raw("  q: quit  ↑/↓: scroll  n: new  c: post  /: search  p: profile  h: home"),
    ]));
    frame.render_widget(status, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
