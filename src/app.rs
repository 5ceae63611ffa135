//! Application state and the transitions the UI loop drives.
//!
//! [`App`] owns everything one screen needs: the pagination controller for
//! the current view, the reconciler behind the "new posts" banner, the
//! virtual list used for layout, and the input mode.  Background results
//! arrive as [`WorkerMsg`]s through [`App::handle_msg`]; key presses arrive
//! through the methods called from [`crate::input`].
//!
//! Every view switch bumps `epoch` and builds a fresh controller, so page
//! responses that were in flight for the previous view are dropped.

use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::error::FeedError;
use crate::feed::{Author, FeedQuery, Page, PostWithAuthor};
use crate::identity::CurrentUser;
use crate::pagination::{Completion, FetchRequest, Pagination};
use crate::poll::{self, Poller};
use crate::reconcile::Reconciler;
use crate::virtual_list::{ItemSize, VirtualList};
use crate::worker::{Worker, WorkerMsg};

/// Rows start at this height until the renderer measures them.
const ESTIMATED_ROW_HEIGHT: u16 = 3;
const OVERSCAN_ROWS: usize = 2;

/// What keystrokes currently edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Compose(String),
    Username(String),
    Search(String),
}

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub page_size: usize,
    /// `None` disables unseen-count polling.
    pub poll_interval: Option<Duration>,
}

pub struct App {
    pub user: CurrentUser,
    pub query: FeedQuery,
    pub feed: Pagination,
    pub reconciler: Reconciler,
    pub list: VirtualList,
    /// Selected post (never the sentinel row).
    pub selected: Option<usize>,
    pub mode: Mode,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last status or error message.
    pub status: String,
    epoch: u64,
    settings: Settings,
    worker: Worker,
    poller: Option<Poller>,
    compose_after_username: bool,
    /// Whether the boundary row was on screen after the previous frame.
    sentinel_seen: bool,
}

impl App {
    /// Build the app and start loading the home feed.
    pub fn new(worker: Worker, user: CurrentUser, settings: Settings) -> Self {
        let mut app = Self {
            user,
            query: FeedQuery::All,
            feed: Pagination::new(),
            reconciler: Reconciler::new(),
            list: VirtualList::new(ItemSize::Estimated(ESTIMATED_ROW_HEIGHT), OVERSCAN_ROWS),
            selected: None,
            mode: Mode::Browse,
            quit: false,
            status: "Loading…".into(),
            epoch: 0,
            settings,
            worker,
            poller: None,
            compose_after_username: false,
            sentinel_seen: false,
        };
        app.open(FeedQuery::All);
        app
    }

    pub fn backend_name(&self) -> String {
        self.worker.service().name().to_string()
    }

    pub fn is_home(&self) -> bool {
        self.query == FeedQuery::All
    }

    /// Whether a "Loading more…" boundary row follows the last post.
    pub fn has_sentinel(&self) -> bool {
        self.feed.has_more()
    }

    /// Posts plus the sentinel row, if any.
    pub fn row_count(&self) -> usize {
        self.feed.len() + usize::from(self.has_sentinel())
    }

    pub fn selected_post(&self) -> Option<&PostWithAuthor> {
        self.selected.and_then(|i| self.feed.get(i))
    }

    // -- views ---------------------------------------------------------------

    /// Switch to `query` with an empty feed and load its first page.
    pub fn open(&mut self, query: FeedQuery) {
        info!(view = %query.title(), "opening view");
        self.epoch += 1;
        self.query = query;
        self.feed = Pagination::new();
        self.list.reset();
        self.selected = None;
        self.sentinel_seen = false;

        // Dropping the old poller aborts its task.
        self.poller = None;
        if self.is_home() {
            let session = self.reconciler.reset();
            if let Some(interval) = self.settings.poll_interval {
                self.poller = Some(poll::spawn(
                    &self.worker,
                    self.user.id.clone(),
                    interval,
                    session,
                ));
            }
        }

        if let Some(request) = self.feed.start() {
            self.dispatch(request);
        }
    }

    pub fn go_home(&mut self) {
        if !self.is_home() {
            self.open(FeedQuery::All);
        }
    }

    pub fn open_selected_profile(&mut self) {
        let Some(row) = self.selected_post() else {
            return;
        };
        let author = row.author.clone();
        self.open_profile(author);
    }

    fn open_profile(&mut self, author: Author) {
        self.open(FeedQuery::ByAuthor {
            id: author.id,
            username: author.username,
        });
    }

    // -- fetching ------------------------------------------------------------

    fn dispatch(&mut self, request: FetchRequest) {
        self.reconciler.suppress(true);
        self.worker.fetch_page(
            self.epoch,
            self.query.clone(),
            request,
            self.settings.page_size,
        );
    }

    /// Reset the unseen count, reload from the first page, and scroll up.
    pub fn refresh(&mut self) {
        let session = self.reconciler.reset();
        if let Some(poller) = &self.poller {
            poller.set_session(session);
        }
        let request = self.feed.refetch();
        self.dispatch(request);
        self.sentinel_seen = false;
        self.list.scroll_to_top(Instant::now());
        if self.selected.is_some() {
            self.selected = Some(0);
        }
        self.status = "Refreshing…".into();
    }

    /// Act on the "N new posts" banner, if it is showing.
    pub fn accept_banner(&mut self) {
        if let Some(banner) = self.reconciler.banner() {
            info!(%banner, "new-posts banner accepted");
            self.refresh();
        }
    }

    /// Ask for the next page when the boundary row comes into view.
    ///
    /// Called after every frame, once layout knows what is visible.  A row
    /// that stays on screen does not trigger again, so a failed page is only
    /// retried after the user scrolls away and back.  An applied page counts
    /// as a fresh reveal since it pushed the row down.
    pub fn check_sentinel(&mut self) {
        let visible = self.has_sentinel() && self.list.is_row_visible(self.feed.len());
        let entered = visible && !self.sentinel_seen;
        self.sentinel_seen = visible;
        if entered {
            if let Some(request) = self.feed.on_sentinel_visible() {
                self.dispatch(request);
            }
        }
    }

    /// Per-tick housekeeping that does not depend on input.
    pub fn on_tick(&mut self, now: Instant) {
        if let Some(token) = self.list.animation_token() {
            self.list.advance(token, now);
        }
    }

    fn sync_rows(&mut self) {
        self.list.set_len(self.row_count());
        if let Some(i) = self.selected {
            self.selected = match self.feed.len() {
                0 => None,
                n => Some(i.min(n - 1)),
            };
        }
    }

    // -- background results --------------------------------------------------

    pub fn handle_msg(&mut self, msg: WorkerMsg) {
        match msg {
            WorkerMsg::Page {
                epoch,
                request,
                result,
            } => {
                if epoch != self.epoch {
                    return;
                }
                self.apply_page(&request, result);
            }
            WorkerMsg::UnseenCount { session, result } => match result {
                Ok(count) => {
                    self.reconciler.observe(session, count);
                }
                Err(e) => warn!(error = %e, "unseen-count poll failed"),
            },
            WorkerMsg::Posted(result) => match result {
                Ok(post) => {
                    info!(post = %post.id, "post published");
                    self.refresh();
                    self.status = "Posted".into();
                }
                Err(e) => self.report(e),
            },
            WorkerMsg::UsernameUpdated(result) => match result {
                Ok(author) => {
                    self.status = format!("Welcome, @{}", author.username);
                    self.user.username = Some(author.username);
                    self.mode = if std::mem::take(&mut self.compose_after_username) {
                        Mode::Compose(String::new())
                    } else {
                        Mode::Browse
                    };
                }
                Err(e) => self.report(e),
            },
            WorkerMsg::ProfileLoaded(result) => match result {
                Ok(author) => self.open_profile(author),
                Err(e) => self.report(e),
            },
        }
    }

    fn apply_page(&mut self, request: &FetchRequest, result: Result<Page, FeedError>) {
        match self.feed.complete(request, result) {
            Ok(Completion::Applied { added, replaced }) => {
                if replaced {
                    // Rows now hold different posts; old heights are void.
                    self.list.invalidate_sizes();
                }
                self.sentinel_seen = false;
                self.status = if self.feed.is_empty() {
                    "No posts yet".into()
                } else {
                    format!("Loaded {added} posts")
                };
            }
            Ok(Completion::Stale) => {}
            Err(e) => self.report(e),
        }
        self.reconciler.suppress(self.feed.is_fetching());
        self.sync_rows();
    }

    fn report(&mut self, e: FeedError) {
        match &e {
            FeedError::AuthorNotFound(_) | FeedError::Protocol(_) => error!(error = %e, "request failed"),
            _ => warn!(error = %e, "request failed"),
        }
        self.status = e.user_message();
    }

    // -- navigation ----------------------------------------------------------

    fn reveal(&mut self, index: usize) {
        // Keep the boundary row in view when the last post is selected.
        if self.has_sentinel() && index + 1 == self.feed.len() {
            self.list.ensure_visible(index + 1);
        }
        self.list.ensure_visible(index);
    }

    fn select(&mut self, index: usize) {
        self.selected = Some(index);
        self.reveal(index);
    }

    pub fn select_next(&mut self) {
        let len = self.feed.len();
        if len == 0 {
            return;
        }
        let i = match self.selected {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.select(i);
    }

    pub fn select_previous(&mut self) {
        if self.feed.len() == 0 {
            return;
        }
        let i = match self.selected {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.select(i);
    }

    pub fn select_first(&mut self) {
        if self.feed.len() > 0 {
            self.select(0);
        }
    }

    pub fn select_last(&mut self) {
        let len = self.feed.len();
        if len > 0 {
            self.select(len - 1);
        }
    }

    pub fn scroll_page(&mut self, down: bool) {
        let step = i32::from(self.list.viewport().max(1));
        self.list.scroll_by(if down { step } else { -step });
    }

    // -- input modes ---------------------------------------------------------

    /// Open the composer, or the username prompt if the user has none yet.
    pub fn compose(&mut self) {
        if self.user.needs_username() {
            self.compose_after_username = true;
            self.mode = Mode::Username(String::new());
            self.status = "Pick a username before posting".into();
        } else {
            self.mode = Mode::Compose(String::new());
        }
    }

    pub fn start_search(&mut self) {
        self.mode = Mode::Search(String::new());
    }

    pub fn cancel_input(&mut self) {
        self.compose_after_username = false;
        self.mode = Mode::Browse;
    }

    pub fn input_buffer(&mut self) -> Option<&mut String> {
        match &mut self.mode {
            Mode::Browse => None,
            Mode::Compose(buf) | Mode::Username(buf) | Mode::Search(buf) => Some(buf),
        }
    }

    pub fn submit_input(&mut self) {
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Browse => {}
            Mode::Compose(content) => {
                self.status = "Posting…".into();
                self.worker.create_post(self.user.id.clone(), content);
            }
            Mode::Username(name) => {
                let name = name.trim().to_string();
                // Stay in the prompt until the update lands.
                self.mode = Mode::Username(name.clone());
                self.worker.update_username(self.user.id.clone(), name);
            }
            Mode::Search(text) => {
                let text = text.trim();
                if let Some(name) = text.strip_prefix('@') {
                    self.worker.load_profile(name.to_string());
                } else if !text.is_empty() {
                    self.open(FeedQuery::ByContent(text.to_string()));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration as ChronoDuration, Utc};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tokio::runtime::Runtime;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::feed::{MemoryFeed, UserId};
    use crate::identity::User;
    use crate::worker::testing::worker_for;

    struct Harness {
        runtime: Runtime,
        rx: UnboundedReceiver<WorkerMsg>,
        feed: Arc<MemoryFeed>,
        app: App,
    }

    impl Harness {
        fn new(posts: usize, username: Option<&str>) -> Self {
            let feed = Arc::new(MemoryFeed::new());
            feed.ensure_user(User::new("me", username));
            feed.ensure_user(User::new("bob", Some("bob")));
            for i in 0..posts {
                feed.insert_post(
                    &UserId::from("bob"),
                    &format!("bob says {i}"),
                    Utc::now() - ChronoDuration::minutes(i as i64 + 1),
                );
            }
            let (runtime, worker, rx) = worker_for(Arc::clone(&feed));
            let user = CurrentUser {
                id: UserId::from("me"),
                username: username.map(str::to_string),
            };
            let settings = Settings {
                page_size: 10,
                poll_interval: None,
            };
            let app = App::new(worker, user, settings);
            Self {
                runtime,
                rx,
                feed,
                app,
            }
        }

        /// Handle messages until one matching `done` has been applied.
        fn pump(&mut self, done: impl Fn(&WorkerMsg) -> bool) {
            loop {
                let msg = self.runtime.block_on(self.rx.recv()).unwrap();
                let finished = done(&msg);
                self.app.handle_msg(msg);
                if finished {
                    return;
                }
            }
        }

        fn next_page(&mut self) {
            self.pump(|m| matches!(m, WorkerMsg::Page { .. }));
        }

        fn layout(&mut self, viewport: u16) {
            self.app.list.set_viewport(viewport);
        }

        fn unseen(&mut self, count: u64) {
            let session = self.app.reconciler.session();
            self.app.handle_msg(WorkerMsg::UnseenCount {
                session,
                result: Ok(count),
            });
        }
    }

    #[test]
    fn initial_load_fills_first_page() {
        let mut h = Harness::new(25, Some("me"));
        assert!(h.app.feed.is_fetching());
        h.next_page();
        assert_eq!(h.app.feed.len(), 10);
        assert!(h.app.has_sentinel());
        assert_eq!(h.app.row_count(), 11);
        assert_eq!(h.app.status, "Loaded 10 posts");
    }

    #[test]
    fn empty_feed_reports_no_posts() {
        let mut h = Harness::new(0, Some("me"));
        h.next_page();
        assert!(h.app.feed.is_empty());
        assert!(!h.app.has_sentinel());
        assert_eq!(h.app.status, "No posts yet");
    }

    #[test]
    fn visible_sentinel_loads_next_page_once() {
        let mut h = Harness::new(25, Some("me"));
        h.next_page();
        h.layout(200);

        h.app.check_sentinel();
        assert!(h.app.feed.is_fetching());
        h.app.check_sentinel();
        h.app.check_sentinel();

        h.next_page();
        assert_eq!(h.app.feed.len(), 20);
        assert!(!h.app.feed.is_fetching(), "only one request was issued");
    }

    #[test]
    fn failed_next_page_waits_for_the_sentinel_to_come_back() {
        let mut h = Harness::new(15, Some("me"));
        // Oldest post has no resolvable author, so page two fails.
        h.feed.insert_post(
            &UserId::from("ghost"),
            "boo",
            Utc::now() - ChronoDuration::days(1),
        );
        h.next_page();
        h.layout(200);
        h.app.check_sentinel();
        h.next_page();
        assert_eq!(h.app.feed.len(), 10);
        assert!(!h.app.feed.is_fetching());
        assert_eq!(h.app.status, "Something went wrong loading posts");

        for _ in 0..5 {
            h.app.check_sentinel();
            assert!(!h.app.feed.is_fetching(), "no retry while the row stays on screen");
        }

        h.layout(1);
        h.app.check_sentinel();
        assert!(!h.app.feed.is_fetching());
        h.layout(200);
        h.app.check_sentinel();
        assert!(h.app.feed.is_fetching(), "scrolling back retries");
    }

    #[test]
    fn sentinel_still_on_screen_after_a_page_loads_fetches_again() {
        let mut h = Harness::new(25, Some("me"));
        h.next_page();
        h.layout(200);
        h.app.check_sentinel();
        h.next_page();
        assert_eq!(h.app.feed.len(), 20);
        h.app.check_sentinel();
        assert!(h.app.feed.is_fetching());
    }

    #[test]
    fn hidden_sentinel_does_not_fetch() {
        let mut h = Harness::new(25, Some("me"));
        h.next_page();
        h.layout(6);
        h.app.check_sentinel();
        assert!(!h.app.feed.is_fetching());
    }

    #[test]
    fn selecting_last_post_reveals_sentinel() {
        let mut h = Harness::new(25, Some("me"));
        h.next_page();
        h.layout(6);
        h.app.select_last();
        assert_eq!(h.app.selected, Some(9));
        h.app.check_sentinel();
        assert!(h.app.feed.is_fetching());
    }

    #[test]
    fn banner_counts_new_posts_and_accepting_reloads_from_the_top() {
        let mut h = Harness::new(12, Some("me"));
        h.next_page();
        h.unseen(2);
        h.unseen(5);
        assert_eq!(h.app.reconciler.banner().as_deref(), Some("3 new posts"));

        let session_before = h.app.reconciler.session();
        h.app.accept_banner();
        assert_eq!(h.app.reconciler.delta(), 0);
        assert_ne!(h.app.reconciler.session(), session_before);
        assert!(h.app.feed.is_refetching(), "reload starts from no cursor");
        assert!(h.app.list.animation_token().is_some());

        h.next_page();
        assert_eq!(h.app.feed.page_count(), 1);
        assert_eq!(h.app.reconciler.banner(), None);
    }

    #[test]
    fn polls_during_a_fetch_are_ignored() {
        let mut h = Harness::new(12, Some("me"));
        h.unseen(4);
        assert_eq!(h.app.reconciler.baseline(), None);
        h.next_page();
        h.unseen(4);
        assert_eq!(h.app.reconciler.baseline(), Some(4));
    }

    #[test]
    fn accepting_without_banner_does_nothing() {
        let mut h = Harness::new(3, Some("me"));
        h.next_page();
        h.app.accept_banner();
        assert!(!h.app.feed.is_fetching());
    }

    #[test]
    fn posting_refetches_and_shows_the_new_post_first() {
        let mut h = Harness::new(3, Some("me"));
        h.next_page();
        h.app.compose();
        assert_eq!(h.app.mode, Mode::Compose(String::new()));
        h.app.input_buffer().unwrap().push_str("hello");
        h.app.submit_input();
        h.pump(|m| matches!(m, WorkerMsg::Posted(_)));
        h.next_page();
        assert_eq!(h.app.feed.get(0).unwrap().post.content, "hello");
        assert_eq!(h.app.status, "Loaded 4 posts");
    }

    #[test]
    fn empty_post_shows_validation_message() {
        let mut h = Harness::new(1, Some("me"));
        h.next_page();
        h.app.compose();
        h.app.submit_input();
        h.pump(|m| matches!(m, WorkerMsg::Posted(_)));
        assert_eq!(h.app.status, "Post must not be empty");
        assert_eq!(h.app.mode, Mode::Browse);
    }

    #[test]
    fn fourth_post_in_a_minute_shows_rate_limit_toast() {
        let mut h = Harness::new(0, Some("me"));
        h.next_page();
        for i in 0..4 {
            h.app.compose();
            h.app.input_buffer().unwrap().push_str(&format!("post {i}"));
            h.app.submit_input();
            h.pump(|m| matches!(m, WorkerMsg::Posted(_)));
        }
        assert!(h.app.status.contains("try again later"));
    }

    #[test]
    fn missing_username_is_prompted_before_composing() {
        let mut h = Harness::new(1, None);
        h.next_page();
        h.app.compose();
        assert_eq!(h.app.mode, Mode::Username(String::new()));

        h.app.input_buffer().unwrap().push_str("newbie");
        h.app.submit_input();
        h.pump(|m| matches!(m, WorkerMsg::UsernameUpdated(_)));
        assert_eq!(h.app.user.username.as_deref(), Some("newbie"));
        assert_eq!(h.app.mode, Mode::Compose(String::new()));
    }

    #[test]
    fn rejected_username_keeps_the_prompt_open() {
        let mut h = Harness::new(1, None);
        h.next_page();
        h.app.compose();
        h.app.input_buffer().unwrap().push_str("bob");
        h.app.submit_input();
        h.pump(|m| matches!(m, WorkerMsg::UsernameUpdated(_)));
        assert!(h.app.user.needs_username());
        assert!(matches!(h.app.mode, Mode::Username(_)));
        assert!(h.app.status.contains("taken"));
    }

    #[test]
    fn search_opens_a_filtered_view_and_drops_stale_pages() {
        let mut h = Harness::new(15, Some("me"));
        // Home's first page is still in flight when the search opens.
        h.app.start_search();
        h.app.input_buffer().unwrap().push_str("says 1");
        h.app.submit_input();
        assert_eq!(h.app.query, FeedQuery::ByContent("says 1".into()));

        h.next_page(); // home page, stale
        if h.app.feed.is_fetching() {
            h.next_page();
        }
        // "bob says 1" and "bob says 10".."bob says 14"
        assert_eq!(h.app.feed.len(), 6);
        assert!(h.app.feed.items().all(|r| r.post.content.contains("says 1")));
    }

    #[test]
    fn at_search_opens_profile() {
        let mut h = Harness::new(5, Some("me"));
        h.next_page();
        h.app.start_search();
        h.app.input_buffer().unwrap().push_str("@BOB");
        h.app.submit_input();
        h.pump(|m| matches!(m, WorkerMsg::ProfileLoaded(_)));
        assert_eq!(h.app.query.title(), "@bob");
        h.next_page();
        assert_eq!(h.app.feed.len(), 5);
    }

    #[test]
    fn unknown_profile_reports_not_found() {
        let mut h = Harness::new(1, Some("me"));
        h.next_page();
        h.app.start_search();
        h.app.input_buffer().unwrap().push_str("@nobody");
        h.app.submit_input();
        h.pump(|m| matches!(m, WorkerMsg::ProfileLoaded(_)));
        assert!(h.app.status.starts_with("Not found"));
        assert!(h.app.is_home());
    }

    #[test]
    fn selected_author_profile_and_back_home() {
        let mut h = Harness::new(3, Some("me"));
        h.next_page();
        h.app.select_first();
        h.app.open_selected_profile();
        assert!(!h.app.is_home());
        h.next_page();
        assert!(h.app.feed.items().all(|r| r.author.username == "bob"));
        h.app.go_home();
        assert!(h.app.is_home());
    }

    #[test]
    fn navigation_on_empty_is_noop() {
        let mut h = Harness::new(0, Some("me"));
        h.next_page();
        h.app.select_next();
        h.app.select_previous();
        h.app.select_first();
        h.app.select_last();
        assert!(h.app.selected.is_none());
    }

    #[test]
    fn navigation_clamps_to_loaded_posts() {
        let mut h = Harness::new(3, Some("me"));
        h.next_page();
        h.layout(20);
        h.app.select_next();
        assert_eq!(h.app.selected, Some(0));
        h.app.select_last();
        h.app.select_next();
        assert_eq!(h.app.selected, Some(2));
        h.app.select_first();
        h.app.select_previous();
        assert_eq!(h.app.selected, Some(0));
    }

    // -- rendering (smoke tests) ---------------------------------------------

    fn render(app: &mut App) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| crate::ui::draw(app, f)).unwrap();
        let buf = terminal.backend().buffer().clone();
        buf.content()
            .iter()
            .map(|c| c.symbol().chars().next().unwrap_or(' '))
            .collect()
    }

    #[test]
    fn draw_does_not_panic_while_loading() {
        let mut h = Harness::new(5, Some("me"));
        let text = render(&mut h.app);
        assert!(text.contains("Loading"));
    }

    #[test]
    fn draw_shows_posts_and_count() {
        let mut h = Harness::new(25, Some("me"));
        h.next_page();
        h.app.select_first();
        let text = render(&mut h.app);
        assert!(text.contains("@bob"));
        assert!(text.contains("bob says 0"));
        assert!(text.contains("10 posts"), "status bar should show post count");
    }

    #[test]
    fn draw_only_lays_out_rows_near_the_viewport() {
        let mut h = Harness::new(25, Some("me"));
        h.next_page();
        render(&mut h.app);
        // 24 rows minus borders and status fit seven three-line posts.
        let range = h.app.list.visible_range();
        assert_eq!(range.start, 0);
        assert!(range.end < h.app.row_count());
    }

    #[test]
    fn sentinel_fetch_follows_scrolling_to_the_end() {
        let mut h = Harness::new(12, Some("me"));
        h.next_page();
        render(&mut h.app);
        h.app.check_sentinel();
        assert!(!h.app.feed.is_fetching(), "sentinel is below the fold");

        h.app.select_last();
        render(&mut h.app);
        h.app.check_sentinel();
        assert!(h.app.feed.is_fetching());
    }

    #[test]
    fn draw_shows_banner_on_home() {
        let mut h = Harness::new(3, Some("me"));
        h.next_page();
        h.unseen(2);
        h.unseen(5);
        let text = render(&mut h.app);
        assert!(text.contains("3 new posts"));
    }

    #[test]
    fn draw_shows_empty_state_and_composer() {
        let mut h = Harness::new(0, Some("me"));
        h.next_page();
        assert!(render(&mut h.app).contains("No posts yet"));
        h.app.compose();
        h.app.input_buffer().unwrap().push_str("draft");
        let text = render(&mut h.app);
        assert!(text.contains("New post 5/280"));
        assert!(text.contains("draft"));
    }

    #[test]
    fn author_not_found_fails_the_load_without_crashing() {
        let mut h = Harness::new(2, Some("me"));
        h.feed
            .insert_post(&UserId::from("ghost"), "boo", Utc::now());
        h.next_page();
        assert_eq!(h.app.feed.len(), 0);
        assert!(!h.app.feed.is_fetching());
        assert_eq!(h.app.status, "Something went wrong loading posts");
    }
}
