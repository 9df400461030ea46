use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Handle to a remote profile, resolved by username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub is_private: bool,
    pub post_count: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    /// Image or video; videos contribute their thumbnail.
    Single,
    Carousel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub shortcode: String,
    pub taken_at: DateTime<Utc>,
    /// Empty when the post has no caption.
    pub caption: String,
    pub likes: Option<u64>,
    pub likes_hidden: bool,
    pub kind: PostKind,
    pub display_url: String,
    /// Carousel children, when the feed node carried them.
    pub children: Vec<String>,
}

impl Post {
    /// Media to download for this post, given the carousel children if any.
    pub fn media_items(&self, children: &[String]) -> Vec<MediaItem> {
        match self.kind {
            PostKind::Carousel => children
                .iter()
                .enumerate()
                .map(|(i, url)| MediaItem {
                    url: url.clone(),
                    filename: format!("{}_{}.jpg", self.shortcode, i + 1),
                })
                .collect(),
            PostKind::Single => vec![MediaItem {
                url: self.display_url.clone(),
                filename: format!("{}.jpg", self.shortcode),
            }],
        }
    }

    /// Whether the like count has to be looked up separately.
    pub fn needs_like_lookup(&self) -> bool {
        self.likes.is_none() && !self.likes_hidden
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub url: String,
    pub filename: String,
}

/// One page of a profile's timeline.
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    pub posts: VecDeque<Post>,
    /// Cursor of the following page, `None` on the last one.
    pub next_cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileInfoResponse {
    pub data: Option<ProfileInfoData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileInfoData {
    pub user: Option<RawProfile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub is_private: bool,
    pub edge_owner_to_timeline_media: Option<Count>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimelineResponse {
    pub data: Option<TimelineData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimelineData {
    pub user: Option<TimelineUser>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimelineUser {
    pub edge_owner_to_timeline_media: Timeline,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Timeline {
    pub page_info: PageInfo,
    #[serde(default)]
    pub edges: Vec<Edge<RawPost>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostDetailsResponse {
    pub data: Option<PostDetailsData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostDetailsData {
    pub shortcode_media: Option<RawPost>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Edges<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Count {
    pub count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CaptionNode {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChildNode {
    pub display_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPost {
    #[serde(rename = "__typename")]
    pub typename: Option<String>,
    pub shortcode: Option<String>,
    pub display_url: Option<String>,
    pub taken_at_timestamp: Option<i64>,
    pub edge_media_to_caption: Option<Edges<CaptionNode>>,
    pub edge_media_preview_like: Option<Count>,
    pub edge_liked_by: Option<Count>,
    #[serde(default)]
    pub like_and_view_counts_disabled: bool,
    pub edge_sidecar_to_children: Option<Edges<ChildNode>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub authenticated: bool,
    pub user: Option<bool>,
    #[serde(default)]
    pub two_factor_required: bool,
    pub checkpoint_url: Option<String>,
    pub message: Option<String>,
}
