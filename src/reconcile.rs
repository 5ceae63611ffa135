//! Live "new posts" reconciliation.
//!
//! The backend has no push channel, so the app polls the count of posts by
//! other users.  The first count observed in a session becomes the
//! baseline; later counts are compared against it.  The difference is the
//! number of posts that exist server-side but are missing from the head of
//! the loaded feed.
//!
//! Every poll result is tagged with the session that was current when the
//! poll started.  [`Reconciler::reset`] opens a new session, so results of
//! polls issued before a refetch are discarded instead of being compared
//! against the fresh baseline.

use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct Reconciler {
    session: u64,
    baseline: Option<u64>,
    latest: u64,
    suppressed: bool,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn baseline(&self) -> Option<u64> {
        self.baseline
    }

    /// Feed a poll result.  Returns `true` when the visible delta changed.
    pub fn observe(&mut self, session: u64, count: u64) -> bool {
        if session != self.session {
            debug!(session, current = self.session, "dropping stale unseen count");
            return false;
        }
        if self.suppressed {
            return false;
        }
        let before = self.delta();
        match self.baseline {
            None => {
                debug!(session, count, "unseen-count baseline captured");
                self.baseline = Some(count);
                self.latest = count;
            }
            Some(_) => self.latest = count,
        }
        let after = self.delta();
        if before != after {
            info!(delta = after, "unseen posts changed");
        }
        before != after
    }

    /// Posts not yet reflected in the feed head.  Zero while suppressed.
    pub fn delta(&self) -> u64 {
        if self.suppressed {
            return 0;
        }
        match self.baseline {
            Some(base) => self.latest.saturating_sub(base),
            None => 0,
        }
    }

    /// Text of the "new posts" action, if it should be offered.
    pub fn banner(&self) -> Option<String> {
        let delta = self.delta();
        let established = self.baseline.is_some_and(|b| b > 0);
        if delta == 0 || !established {
            return None;
        }
        Some(if delta == 1 {
            "1 new post".to_string()
        } else {
            format!("{delta} new posts")
        })
    }

    /// Start a new session: the next observation becomes the baseline.
    pub fn reset(&mut self) -> u64 {
        self.session += 1;
        self.baseline = None;
        self.latest = 0;
        debug!(session = self.session, "reconciler reset");
        self.session
    }

    /// Hold the delta at zero (and ignore polls) while a refetch is in flight.
    pub fn suppress(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
    }
}
