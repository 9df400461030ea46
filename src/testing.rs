//! In-memory `Platform` used by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use calamine::{open_workbook, Reader, Xlsx};
use chrono::{TimeZone, Utc};

use crate::config::Credentials;
use crate::request::Platform;
use crate::types::{FeedPage, Post, PostKind, Profile};
use crate::{Error, Result};

pub(crate) const PROFILE: &str = "unistays.co";

pub(crate) fn single(shortcode: &str) -> Post {
    Post {
        shortcode: shortcode.to_string(),
        taken_at: Utc.with_ymd_and_hms(2024, 5, 17, 10, 0, 0).unwrap(),
        caption: format!("caption of {shortcode}"),
        likes: Some(5),
        likes_hidden: false,
        kind: PostKind::Single,
        display_url: format!("https://cdn.test/{shortcode}.jpg"),
        children: Vec::new(),
    }
}

pub(crate) fn carousel(shortcode: &str, children: usize) -> Post {
    Post {
        kind: PostKind::Carousel,
        display_url: format!("https://cdn.test/{shortcode}/cover.jpg"),
        children: (1..=children)
            .map(|i| format!("https://cdn.test/{shortcode}/{i}.jpg"))
            .collect(),
        ..single(shortcode)
    }
}

/// Sheet names and the cells of the `Posts` sheet, rendered as text. Blank cells are `""`.
pub(crate) fn read_workbook(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range(crate::sheet::SHEET_NAME).unwrap();
    let rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    (workbook.sheet_names(), rows)
}

#[derive(Default)]
pub(crate) struct FakePlatform {
    pages: Vec<Vec<Post>>,
    details: HashMap<String, Post>,
    failing_urls: HashSet<String>,
    password: Option<String>,
    pub logged_in: bool,
    pub page_requests: AtomicUsize,
    pub detail_requests: AtomicUsize,
}

impl FakePlatform {
    /// Splits `posts` into pages of `page_size`, in order.
    pub fn paged(posts: Vec<Post>, page_size: usize) -> Self {
        Self {
            pages: posts.chunks(page_size).map(<[Post]>::to_vec).collect(),
            ..Self::default()
        }
    }

    pub fn with_details(mut self, post: Post) -> Self {
        self.details.insert(post.shortcode.clone(), post);
        self
    }

    pub fn fail_url(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn profile_handle(&self) -> Profile {
        Profile {
            id: "1".into(),
            username: PROFILE.into(),
            is_private: false,
            post_count: Some(self.pages.iter().map(|p| p.len() as u64).sum()),
        }
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        if self.password.as_deref() == Some(credentials.password.as_str()) {
            self.logged_in = true;
            return Ok(());
        }
        Err(Error::Login {
            username: credentials.username.clone(),
            reason: "wrong password".into(),
        })
    }

    async fn profile(&self, username: &str) -> Result<Profile> {
        if username == PROFILE {
            Ok(self.profile_handle())
        } else {
            Err(Error::ProfileNotFound(username.to_string()))
        }
    }

    async fn feed_page(&self, _profile: &Profile, cursor: Option<&str>) -> Result<FeedPage> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        let index = match cursor {
            None => 0,
            Some(c) => c
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| Error::NotFound { url: c.to_string() })?,
        };
        let posts = self.pages.get(index).cloned().unwrap_or_default();
        let next_cursor = (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1));

        Ok(FeedPage {
            posts: VecDeque::from(posts),
            next_cursor,
        })
    }

    async fn post_details(&self, shortcode: &str) -> Result<Post> {
        self.detail_requests.fetch_add(1, Ordering::SeqCst);
        self.details.get(shortcode).cloned().ok_or_else(|| Error::NotFound {
            url: format!("details/{shortcode}"),
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        if self.failing_urls.contains(url) {
            return Err(Error::UnexpectedStatus {
                status: 500,
                url: url.to_string(),
            });
        }
        Ok(url.as_bytes().to_vec())
    }
}
