//! chirp — an infinitely scrolling short-post feed for the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────┐ WorkerMsg  ┌──────────┐  draw()  ┌──────────┐
//! │ worker.rs │ ─────────► │  app.rs  │ ───────► │  ui.rs   │
//! │  poll.rs  │ (channel)  │ (state)  │          │ (render) │
//! │  (tokio)  │            └──────────┘          └──────────┘
//! └───────────┘                 ▲
//!       ▲                       │ handle_key_event()
//!       │ FeedService      ┌──────────┐
//! ┌───────────┐            │ input.rs │
//! │  feed/    │            └──────────┘
//! └───────────┘
//! ```
//!
//! * **`feed/`** — the `FeedService` trait, the post model, and the two
//!   backends (in-memory and tRPC over HTTP).
//! * **`pagination`**, **`reconcile`**, **`virtual_list`** — the pure state
//!   machines behind infinite scroll, the "new posts" banner and row layout.
//! * **`worker`** / **`poll`** — run backend calls off the UI thread and send
//!   results back over a channel.
//! * **`app`** — owns all application state for the current view.
//! * **`ui`** — pure rendering: reads `App` state and draws widgets.
//! * **`input`** — maps key events to `App` mutations.
//! * **`main`** — wires everything together: parse config, set up logging and
//!   the terminal, and run the event loop.

mod app;
mod config;
mod demo;
mod error;
mod feed;
mod identity;
mod input;
mod pagination;
mod poll;
mod ratelimit;
mod reconcile;
mod ui;
mod virtual_list;
mod worker;

use std::fs::File;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use config::Config;
use feed::{FeedService, MemoryFeed, RemoteFeed, UserId};
use identity::{CurrentUser, User};
use worker::Worker;

/// How long the loop waits for a key before redrawing.  Short enough that
/// the scroll-to-top animation stays smooth.
const TICK_RATE: Duration = Duration::from_millis(33);

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Owns raw mode and the alternate screen.
///
/// Constructing it enters both; dropping it (normally or while unwinding)
/// restores the terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the default hook prints the panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

/// Logs go to a file; stdout belongs to the TUI.
fn init_logging(config: &Config) -> Result<()> {
    let file = File::create(&config.log_file)
        .with_context(|| format!("creating log file {}", config.log_file.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Pick the backend from the config.  The in-memory feed always knows the
/// signed-in user so their posts resolve to an author.
fn build_service(config: &Config) -> Result<(Arc<dyn FeedService>, Option<Arc<MemoryFeed>>)> {
    if let Some(url) = &config.remote {
        let remote = RemoteFeed::new(url.as_str(), config.token.clone())
            .context("building HTTP client")?;
        return Ok((Arc::new(remote), None));
    }

    let memory = Arc::new(MemoryFeed::new());
    memory.ensure_user(User::new(config.user_id.as_str(), config.username.as_deref()));
    if !config.no_demo {
        demo::seed(&memory);
    }
    Ok((Arc::clone(&memory) as Arc<dyn FeedService>, Some(memory)))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;
    init_logging(&config)?;
    install_panic_hook();

    let (service, memory) = build_service(&config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("starting tokio runtime")?;

    let _chatter = match (&memory, config.chatter) {
        (Some(memory), secs) if secs > 0 => Some(demo::spawn_chatter(
            runtime.handle(),
            Arc::clone(memory),
            Duration::from_secs(secs),
        )),
        _ => None,
    };

    let (worker, mut rx) = Worker::new(service, runtime.handle().clone());
    let user = CurrentUser {
        id: UserId::from(config.user_id.as_str()),
        username: config.username.clone(),
    };

    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(worker, user, config.settings());
    info!(backend = %app.backend_name(), user = %app.user.id, "chirp started");

    // Each iteration:
    //   1. Drain finished background work.
    //   2. Advance the scroll animation.
    //   3. Render, which also measures the rows on screen.
    //   4. Fetch the next page if the sentinel row became visible.
    //   5. Wait up to TICK_RATE for a key.
    loop {
        while let Ok(msg) = rx.try_recv() {
            app.handle_msg(msg);
        }

        app.on_tick(Instant::now());
        guard.terminal.draw(|f| ui::draw(&mut app, f))?;
        app.check_sentinel();

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    info!("chirp exiting");
    // Stop background polling before the runtime goes away.
    drop(app);
    runtime.shutdown_timeout(Duration::from_millis(500));
    Ok(())
}
