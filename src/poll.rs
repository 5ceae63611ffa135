//! Background unseen-count polling.
//!
//! A tokio task ticks on a fixed interval and asks the backend how many
//! posts by other users exist.  Each result is tagged with the reconciler
//! session that was current when the poll *started*, so answers that were
//! in flight across a reset can be told apart from fresh ones.
//!
//! The task lives exactly as long as the returned [`Poller`]: dropping it
//! aborts the task, which is how the home view tears polling down when it
//! is left.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::error::FeedError;
use crate::feed::UserId;
use crate::worker::{Worker, WorkerMsg};

pub struct Poller {
    session: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl Poller {
    /// Tag subsequent polls with `session`.
    pub fn set_session(&self, session: u64) {
        self.session.store(session, Ordering::SeqCst);
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        debug!("unseen-count poller stopped");
        self.task.abort();
    }
}

/// Start polling for `user` every `interval`, beginning immediately.
pub fn spawn(worker: &Worker, user: UserId, interval: Duration, session: u64) -> Poller {
    let session = Arc::new(AtomicU64::new(session));
    let service = worker.service();
    let tx = worker.sender();
    let tag = Arc::clone(&session);

    info!(interval_secs = interval.as_secs(), "unseen-count poller started");
    let task = worker.runtime().spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let session = tag.load(Ordering::SeqCst);
            let service = Arc::clone(&service);
            let user = user.clone();
            let result = tokio::task::spawn_blocking(move || service.count_posts_not_by(&user))
                .await
                .unwrap_or_else(|e| Err(FeedError::Network(e.to_string())));
            if tx.send(WorkerMsg::UnseenCount { session, result }).is_err() {
                return;
            }
        }
    });

    Poller { session, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::MemoryFeed;
    use crate::identity::User;
    use crate::worker::testing::worker_for;

    fn feed_with_posts() -> Arc<MemoryFeed> {
        let feed = Arc::new(MemoryFeed::new());
        feed.ensure_user(User::new("me", Some("me")));
        feed.ensure_user(User::new("bob", Some("bob")));
        for author in ["me", "bob", "bob"] {
            feed.insert_post(&UserId::from(author), "x", chrono::Utc::now());
        }
        feed
    }

    #[test]
    fn first_tick_reports_count_with_session() {
        let (runtime, worker, mut rx) = worker_for(feed_with_posts());
        let _poller = runtime.block_on(async {
            spawn(&worker, UserId::from("me"), Duration::from_secs(60), 4)
        });

        match runtime.block_on(rx.recv()) {
            Some(WorkerMsg::UnseenCount { session, result }) => {
                assert_eq!(session, 4);
                assert_eq!(result.unwrap(), 2);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn later_polls_carry_the_updated_session() {
        let (runtime, worker, mut rx) = worker_for(feed_with_posts());
        let poller = runtime.block_on(async {
            spawn(&worker, UserId::from("me"), Duration::from_millis(20), 0)
        });
        runtime.block_on(rx.recv());
        poller.set_session(9);

        let session = runtime.block_on(async {
            loop {
                if let Some(WorkerMsg::UnseenCount { session, .. }) = rx.recv().await {
                    if session == 9 {
                        return session;
                    }
                }
            }
        });
        assert_eq!(session, 9);
    }

    #[test]
    fn dropping_the_poller_stops_polling() {
        let (runtime, worker, mut rx) = worker_for(feed_with_posts());
        let poller = runtime.block_on(async {
            spawn(&worker, UserId::from("me"), Duration::from_millis(10), 0)
        });
        runtime.block_on(rx.recv());
        drop(poller);
        drop(worker);

        // Only messages already queued can arrive; then the channel closes.
        let drained = runtime.block_on(async {
            let mut n = 0;
            while let Ok(Some(_)) =
                tokio::time::timeout(Duration::from_millis(200), rx.recv()).await
            {
                n += 1;
            }
            n
        });
        assert!(drained <= 1);
    }
}
