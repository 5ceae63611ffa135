//! One-shot background requests.
//!
//! The UI thread never blocks on the backend.  Each request runs on tokio's
//! blocking pool and its outcome comes back as a [`WorkerMsg`] over an
//! unbounded channel that the main loop drains every tick.  Messages carry
//! whatever token the app needs to recognise stale answers (view epoch,
//! fetch request, poll session).

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::error::Result;
use crate::feed::{Author, FeedQuery, FeedService, Page, Post, UserId};
use crate::pagination::FetchRequest;

/// Messages sent from background tasks to the UI thread.
#[derive(Debug)]
pub enum WorkerMsg {
    /// A page request finished.
    Page {
        epoch: u64,
        request: FetchRequest,
        result: Result<Page>,
    },
    /// An unseen-count poll finished.
    UnseenCount { session: u64, result: Result<u64> },
    Posted(Result<Post>),
    UsernameUpdated(Result<Author>),
    ProfileLoaded(Result<Author>),
}

#[derive(Clone)]
pub struct Worker {
    service: Arc<dyn FeedService>,
    runtime: Handle,
    tx: UnboundedSender<WorkerMsg>,
}

impl Worker {
    pub fn new(service: Arc<dyn FeedService>, runtime: Handle) -> (Self, UnboundedReceiver<WorkerMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                service,
                runtime,
                tx,
            },
            rx,
        )
    }

    pub fn service(&self) -> Arc<dyn FeedService> {
        Arc::clone(&self.service)
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn sender(&self) -> UnboundedSender<WorkerMsg> {
        self.tx.clone()
    }

    /// Run `job` on the blocking pool and forward its message.
    fn run<F>(&self, job: F)
    where
        F: FnOnce(&dyn FeedService) -> WorkerMsg + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        self.runtime.spawn_blocking(move || {
            let msg = job(service.as_ref());
            // The receiver is gone once the UI loop has exited.
            let _ = tx.send(msg);
        });
    }

    pub fn fetch_page(&self, epoch: u64, query: FeedQuery, request: FetchRequest, limit: usize) {
        debug!(epoch, cursor = ?request.cursor, "dispatching page fetch");
        self.run(move |svc| {
            let result = svc.list_posts(&query, request.cursor.as_ref(), limit);
            WorkerMsg::Page {
                epoch,
                request,
                result,
            }
        });
    }

    pub fn create_post(&self, author: UserId, content: String) {
        self.run(move |svc| WorkerMsg::Posted(svc.create_post(&author, &content)));
    }

    pub fn update_username(&self, user: UserId, username: String) {
        self.run(move |svc| WorkerMsg::UsernameUpdated(svc.update_username(&user, &username)));
    }

    pub fn load_profile(&self, username: String) {
        self.run(move |svc| WorkerMsg::ProfileLoaded(svc.user_by_username(&username)));
    }
}
