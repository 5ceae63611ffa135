//! Row virtualization for the feed list.
//!
//! Only rows intersecting the viewport (plus an overscan margin) are laid
//! out and drawn.  Row heights are either fixed or estimated and then
//! replaced by measurements as rows are rendered.  Start offsets are prefix
//! sums over the heights, rebuilt lazily from the first index whose height
//! changed.
//!
//! Heights and offsets are in terminal lines.

use std::ops::Range;
use std::time::{Duration, Instant};

/// How long an animated scroll-to-top takes.
pub const SCROLL_TO_TOP_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSize {
    /// Every row has this height; measurements are ignored.
    Fixed(u16),
    /// Rows start at this height until measured.
    Estimated(u16),
}

/// A row placed in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualItem {
    pub index: usize,
    pub start: u32,
    pub size: u16,
}

impl VirtualItem {
    pub fn end(&self) -> u32 {
        self.start + u32::from(self.size)
    }
}

/// Identifies one scroll animation by the instant it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationToken(Instant);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStep {
    /// The token does not belong to the current animation.
    Stale,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy)]
struct ScrollAnimation {
    token: AnimationToken,
    from: u32,
    to: u32,
}

/// Quintic ease-in-out over `t` in `[0, 1]`.
pub fn ease_in_out_quint(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        16.0 * t.powi(5)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
    }
}

#[derive(Debug)]
pub struct VirtualList {
    sizing: ItemSize,
    measured: Vec<Option<u16>>,
    /// `offsets[i]` is the start of row `i`; valid for the prefix present.
    offsets: Vec<u32>,
    viewport: u16,
    overscan: usize,
    scroll: u32,
    animation: Option<ScrollAnimation>,
}

impl VirtualList {
    pub fn new(sizing: ItemSize, overscan: usize) -> Self {
        Self {
            sizing,
            measured: Vec::new(),
            offsets: vec![0],
            viewport: 0,
            overscan,
            scroll: 0,
            animation: None,
        }
    }

    pub fn len(&self) -> usize {
        self.measured.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measured.is_empty()
    }

    pub fn scroll_offset(&self) -> u32 {
        self.scroll
    }

    pub fn viewport(&self) -> u16 {
        self.viewport
    }

    // -- structure -----------------------------------------------------------

    /// Track a new row count.  Growth keeps measurements; shrinking means
    /// the list was rebuilt, so everything is reset and the list returns to
    /// the top.
    pub fn set_len(&mut self, len: usize) {
        if len < self.len() {
            self.reset();
        }
        self.measured.resize(len, None);
        self.offsets.truncate(len + 1);
    }

    /// Forget every measurement and scroll back to the top.
    pub fn reset(&mut self) {
        self.measured.clear();
        self.offsets.truncate(1);
        self.scroll = 0;
        self.animation = None;
    }

    /// Forget measurements but keep the row count and scroll position.
    /// For when the rows were replaced by different content.
    pub fn invalidate_sizes(&mut self) {
        self.measured.iter_mut().for_each(|m| *m = None);
        self.offsets.truncate(1);
        self.clamp_scroll();
    }

    pub fn set_viewport(&mut self, height: u16) {
        self.viewport = height;
        self.clamp_scroll();
    }

    /// Record the rendered height of a row.  Returns `true` if it changed.
    pub fn measure(&mut self, index: usize, height: u16) -> bool {
        if matches!(self.sizing, ItemSize::Fixed(_)) || index >= self.len() {
            return false;
        }
        if self.size_of(index) == height && self.measured[index].is_some() {
            return false;
        }
        let changed = self.size_of(index) != height;
        self.measured[index] = Some(height);
        if changed {
            self.offsets.truncate(index + 1);
        }
        changed
    }

    pub fn size_of(&self, index: usize) -> u16 {
        match self.sizing {
            ItemSize::Fixed(h) => h,
            ItemSize::Estimated(h) => self.measured.get(index).copied().flatten().unwrap_or(h),
        }
    }

    fn ensure_offsets(&mut self, upto: usize) {
        while self.offsets.len() <= upto {
            let i = self.offsets.len();
            let start = self.offsets[i - 1] + u32::from(self.size_of(i - 1));
            self.offsets.push(start);
        }
    }

    pub fn offset_of(&mut self, index: usize) -> u32 {
        let index = index.min(self.len());
        self.ensure_offsets(index);
        self.offsets[index]
    }

    /// Height of all rows together.
    pub fn total_extent(&mut self) -> u32 {
        self.offset_of(self.len())
    }

    fn max_scroll(&mut self) -> u32 {
        self.total_extent().saturating_sub(u32::from(self.viewport))
    }

    fn clamp_scroll(&mut self) {
        let max = self.max_scroll();
        self.scroll = self.scroll.min(max);
    }

    // -- layout --------------------------------------------------------------

    /// Rows intersecting the viewport, widened by the overscan margin.
    pub fn visible_range(&mut self) -> Range<usize> {
        let len = self.len();
        if len == 0 || self.viewport == 0 {
            return 0..0;
        }
        self.ensure_offsets(len);
        let starts = &self.offsets[..len];
        let top = self.scroll;
        let bottom = self.scroll + u32::from(self.viewport);

        let first = starts.partition_point(|&o| o <= top).saturating_sub(1);
        let end = starts.partition_point(|&o| o < bottom).max(first + 1);

        first.saturating_sub(self.overscan)..(end + self.overscan).min(len)
    }

    pub fn visible_items(&mut self) -> Vec<VirtualItem> {
        self.visible_range()
            .map(|index| VirtualItem {
                index,
                start: self.offsets[index],
                size: self.size_of(index),
            })
            .collect()
    }

    /// Whether any part of row `index` is inside the viewport (no overscan).
    pub fn is_row_visible(&mut self, index: usize) -> bool {
        if index >= self.len() || self.viewport == 0 {
            return false;
        }
        let start = self.offset_of(index);
        let end = start + u32::from(self.size_of(index));
        start < self.scroll + u32::from(self.viewport) && end > self.scroll
    }

    // -- scrolling -----------------------------------------------------------

    /// Manual scroll; cancels any running animation.
    pub fn scroll_by(&mut self, delta: i32) {
        self.animation = None;
        let target = i64::from(self.scroll) + i64::from(delta);
        self.scroll = u32::try_from(target.max(0)).unwrap_or(u32::MAX);
        self.clamp_scroll();
    }

    /// Scroll the minimum amount that brings row `index` fully into view.
    pub fn ensure_visible(&mut self, index: usize) {
        if index >= self.len() {
            return;
        }
        self.animation = None;
        let start = self.offset_of(index);
        let end = start + u32::from(self.size_of(index));
        let viewport = u32::from(self.viewport);
        if start < self.scroll {
            self.scroll = start;
        } else if end > self.scroll + viewport {
            self.scroll = end.saturating_sub(viewport).min(start);
        }
        self.clamp_scroll();
    }

    /// Start an eased scroll back to row 0, replacing any running animation.
    pub fn scroll_to_top(&mut self, now: Instant) -> AnimationToken {
        let token = AnimationToken(now);
        self.animation = Some(ScrollAnimation {
            token,
            from: self.scroll,
            to: 0,
        });
        token
    }

    pub fn animation_token(&self) -> Option<AnimationToken> {
        self.animation.map(|a| a.token)
    }

    /// Advance the animation identified by `token` to `now`.
    pub fn advance(&mut self, token: AnimationToken, now: Instant) -> AnimationStep {
        let Some(anim) = self.animation else {
            return AnimationStep::Stale;
        };
        if anim.token != token {
            return AnimationStep::Stale;
        }
        let elapsed = now.saturating_duration_since(anim.token.0);
        let t = elapsed.as_secs_f64() / SCROLL_TO_TOP_DURATION.as_secs_f64();
        let eased = ease_in_out_quint(t);
        let from = f64::from(anim.from);
        let to = f64::from(anim.to);
        self.scroll = (from + (to - from) * eased).round() as u32;
        self.clamp_scroll();
        if t >= 1.0 {
            self.scroll = anim.to;
            self.animation = None;
            AnimationStep::Finished
        } else {
            AnimationStep::Running
        }
    }
}
