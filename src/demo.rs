//! Demo content for the in-memory feed.
//!
//! Seeds a few authors and a few dozen posts spread over the last days so
//! pagination has something to page through, and can keep one demo author
//! posting on a timer so the "new posts" banner has something to count.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::feed::{FeedService, MemoryFeed, UserId};
use crate::identity::User;

const AUTHORS: [(&str, &str); 4] = [
    ("user_ada", "ada"),
    ("user_grace", "grace"),
    ("user_linus", "linus"),
    ("user_barbara", "barbara"),
];

const LINES: [&str; 12] = [
    "Shipping a small fix today, nothing dramatic.",
    "Coffee first, then the flaky test.",
    "Reading about cursor pagination. Offsets were a mistake.",
    "Infinite scroll is just a linked list with extra steps.",
    "Does anyone still write RSS readers? Asking for a friend.",
    "The build is green. I do not trust it.",
    "Spent the afternoon deleting code. Best kind of afternoon.",
    "Hot take: the terminal is the best UI toolkit.",
    "Rate limits exist for a reason and the reason is me.",
    "Wrote a virtual list today. Prefix sums all the way down.",
    "It works on my machine, which is now the production machine.",
    "New keyboard arrived. Typing speed unchanged, joy increased.",
];

/// Number of posts [`seed`] creates.
pub const SEED_POSTS: usize = 42;

/// Register the demo authors and backfill posts, newest about a minute old.
pub fn seed(feed: &MemoryFeed) {
    for (id, name) in AUTHORS {
        feed.ensure_user(User::new(id, Some(name)));
    }
    let now = Utc::now();
    for i in 0..SEED_POSTS {
        let (author, _) = AUTHORS[i % AUTHORS.len()];
        let line = LINES[(i * 5) % LINES.len()];
        let age = ChronoDuration::minutes(1 + (i as i64) * 97);
        feed.insert_post(&UserId::from(author), line, now - age);
    }
    info!(posts = SEED_POSTS, "seeded demo feed");
}

/// Post from a rotating demo author every `every` until the handle is aborted.
pub fn spawn_chatter(runtime: &Handle, feed: Arc<MemoryFeed>, every: Duration) -> JoinHandle<()> {
    runtime.spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately; skip it so chatter starts later.
        ticker.tick().await;
        let mut n = 0usize;
        loop {
            ticker.tick().await;
            let (author, _) = AUTHORS[n % AUTHORS.len()];
            let line = LINES[(n * 7 + 3) % LINES.len()];
            n += 1;
            let feed = Arc::clone(&feed);
            let outcome = tokio::task::spawn_blocking(move || {
                feed.create_post(&UserId::from(author), line)
            })
            .await;
            match outcome {
                Ok(Ok(post)) => debug!(post = %post.id, author, "demo chatter"),
                Ok(Err(e)) => debug!(error = %e, author, "demo chatter rejected"),
                Err(_) => return,
            }
        }
    })
}
