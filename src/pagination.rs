//! Cursor-based infinite pagination.
//!
//! [`Pagination`] owns the feed state for one view: the pages fetched so
//! far (in fetch order), the request currently in flight, and whether the
//! initial load has landed.  It never performs I/O itself.  Methods that
//! want a page return a [`FetchRequest`]; the caller runs it and hands the
//! outcome back through [`Pagination::complete`].
//!
//! Guarantees:
//!
//! * at most one request is in flight; asking again while one is
//!   outstanding yields `None`,
//! * page *k+1* is requested with page *k*'s `next_cursor`, and only after
//!   page *k* was appended,
//! * a failed request leaves the accumulated pages untouched,
//! * a refetch bumps the generation, so responses to requests issued
//!   before it are recognised as stale and dropped.

use tracing::{debug, info, warn};

use crate::error::FeedError;
use crate::feed::{Page, PostId, PostWithAuthor};

/// A page request the caller should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub cursor: Option<PostId>,
}

/// What a completed request did to the feed state.
#[derive(Debug, PartialEq, Eq)]
pub enum Completion {
    /// A page was stored; `replaced` is true for a first page.
    Applied { added: usize, replaced: bool },
    /// The response belonged to a superseded request.
    Stale,
}

#[derive(Debug, Default)]
pub struct Pagination {
    pages: Vec<Page>,
    in_flight: Option<FetchRequest>,
    initial_loaded: bool,
    generation: u64,
    last_error: Option<FeedError>,
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    // -- queries -------------------------------------------------------------

    /// More posts exist beyond the last page.  Derived from the cursor only.
    pub fn has_more(&self) -> bool {
        self.pages
            .last()
            .is_some_and(|page| page.next_cursor.is_some())
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// A cursor-less request is outstanding, i.e. the first page is loading.
    pub fn is_refetching(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|r| r.cursor.is_none())
    }

    pub fn initial_loaded(&self) -> bool {
        self.initial_loaded
    }

    /// The initial load finished and returned nothing.
    pub fn is_empty(&self) -> bool {
        self.initial_loaded && self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(|p| p.items.len()).sum()
    }

    #[cfg(test)]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn last_error(&self) -> Option<&FeedError> {
        self.last_error.as_ref()
    }

    /// Every loaded post, newest first.
    pub fn items(&self) -> impl Iterator<Item = &PostWithAuthor> {
        self.pages.iter().flat_map(|p| p.items.iter())
    }

    pub fn get(&self, index: usize) -> Option<&PostWithAuthor> {
        self.items().nth(index)
    }

    // -- transitions ---------------------------------------------------------

    /// Request the first page if nothing is loaded or loading yet.
    ///
    /// Also serves as the retry path after a failed initial load.
    pub fn start(&mut self) -> Option<FetchRequest> {
        if self.initial_loaded || self.in_flight.is_some() {
            return None;
        }
        Some(self.issue(None))
    }

    /// The boundary sentinel scrolled into view.
    ///
    /// Returns the next-page request only when more posts exist, nothing is
    /// in flight, and the initial load has completed.
    pub fn on_sentinel_visible(&mut self) -> Option<FetchRequest> {
        if !self.initial_loaded || self.in_flight.is_some() {
            return None;
        }
        let cursor = self.pages.last()?.next_cursor.clone()?;
        Some(self.issue(Some(cursor)))
    }

    /// Load the first page again, discarding every accumulated page once
    /// it lands.
    ///
    /// The old pages stay readable until then so the list can animate back
    /// to the top over them.  Supersedes any request in flight: its
    /// response will be stale.
    pub fn refetch(&mut self) -> FetchRequest {
        self.generation += 1;
        self.in_flight = None;
        info!(generation = self.generation, "feed refetch");
        self.issue(None)
    }

    /// Apply the outcome of a request issued by this controller.
    ///
    /// Errors are returned to the caller after the in-flight flag has been
    /// cleared, so a later trigger can retry.
    pub fn complete(
        &mut self,
        request: &FetchRequest,
        result: Result<Page, FeedError>,
    ) -> Result<Completion, FeedError> {
        if request.generation != self.generation || self.in_flight.as_ref() != Some(request) {
            debug!(
                generation = request.generation,
                current = self.generation,
                "dropping stale page response"
            );
            return Ok(Completion::Stale);
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                let added = page.items.len();
                let replaced = request.cursor.is_none();
                if replaced {
                    self.pages.clear();
                    self.initial_loaded = true;
                }
                self.pages.push(page);
                self.last_error = None;
                debug!(added, pages = self.pages.len(), more = self.has_more(), "page appended");
                Ok(Completion::Applied { added, replaced })
            }
            Err(e) => {
                warn!(error = %e, cursor = ?request.cursor, "page fetch failed");
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn issue(&mut self, cursor: Option<PostId>) -> FetchRequest {
        let request = FetchRequest {
            generation: self.generation,
            cursor,
        };
        debug!(cursor = ?request.cursor, generation = request.generation, "page fetch issued");
        self.in_flight = Some(request.clone());
        request
    }
}
