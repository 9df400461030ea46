//! Lazy, forward-only walk over a profile's timeline.

use std::collections::VecDeque;

use crate::request::Platform;
use crate::types::{Post, Profile};
use crate::Result;

/// Pulls timeline pages from the platform on demand.
///
/// A page is only requested once every post of the previous one has been handed out,
/// so stopping early never costs an extra round trip. Not restartable: build a new
/// `Feed` to walk the timeline again.
pub struct Feed<'a, P: Platform + ?Sized> {
    platform: &'a P,
    profile: &'a Profile,
    buffer: VecDeque<Post>,
    cursor: Option<String>,
    started: bool,
    pages_fetched: usize,
}

impl<'a, P: Platform + ?Sized> Feed<'a, P> {
    pub fn new(platform: &'a P, profile: &'a Profile) -> Self {
        Self {
            platform,
            profile,
            buffer: VecDeque::new(),
            cursor: None,
            started: false,
            pages_fetched: 0,
        }
    }

    /// Next post in feed order, or `None` once the timeline is exhausted.
    pub async fn next_post(&mut self) -> Result<Option<Post>> {
        loop {
            if let Some(post) = self.buffer.pop_front() {
                return Ok(Some(post));
            }
            if self.is_exhausted() {
                return Ok(None);
            }

            let page = self
                .platform
                .feed_page(self.profile, self.cursor.as_deref())
                .await?;
            self.started = true;
            self.pages_fetched += 1;
            tracing::debug!(
                page = self.pages_fetched,
                posts = page.posts.len(),
                has_next = page.next_cursor.is_some(),
                "fetched timeline page"
            );

            if page.next_cursor.is_some() && page.next_cursor == self.cursor {
                tracing::warn!(cursor = ?self.cursor, "timeline cursor did not advance, stopping");
                self.cursor = None;
            } else {
                self.cursor = page.next_cursor;
            }
            self.buffer = page.posts;
        }
    }

    fn is_exhausted(&self) -> bool {
        self.started && self.cursor.is_none()
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}
