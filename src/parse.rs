use chrono::{DateTime, Utc};
use scraper::{Html, Selector};

use crate::types::{Count, Edges, PageInfo, Post, PostKind, RawPost, RawProfile, Timeline};
use crate::types::{FeedPage, Profile};
use crate::{Error, Result};

const SIDECAR_TYPENAME: &str = "GraphSidecar";
const CSRF_MARKER: &str = r#""csrf_token":""#;

pub(crate) fn parse_profile(raw: RawProfile) -> Profile {
    Profile {
        id: raw.id,
        username: raw.username,
        is_private: raw.is_private,
        post_count: raw.edge_owner_to_timeline_media.and_then(|c| c.count),
    }
}

/// Converts one timeline page. The cursor is only kept if there is a next page.
pub(crate) fn parse_timeline(timeline: Timeline) -> Result<FeedPage> {
    let Timeline { page_info, edges } = timeline;
    let posts = edges
        .into_iter()
        .map(|edge| parse_post(edge.node))
        .collect::<Result<_>>()?;

    Ok(FeedPage {
        posts,
        next_cursor: next_cursor(page_info),
    })
}

fn next_cursor(page_info: PageInfo) -> Option<String> {
    page_info
        .has_next_page
        .then_some(page_info.end_cursor)
        .flatten()
        .filter(|c| !c.is_empty())
}

/// Turns a GraphQL media node into a `Post`.
pub(crate) fn parse_post(raw: RawPost) -> Result<Post> {
    let shortcode = require(raw.shortcode, "shortcode", "media node")?;
    let context = || format!("post {shortcode}");

    let display_url = raw
        .display_url
        .ok_or_else(|| missing(context(), "display_url"))?;
    let timestamp = raw
        .taken_at_timestamp
        .ok_or_else(|| missing(context(), "taken_at_timestamp"))?;
    let taken_at =
        DateTime::<Utc>::from_timestamp(timestamp, 0).ok_or_else(|| missing(context(), "taken_at_timestamp"))?;

    let kind = match raw.typename.as_deref() {
        Some(SIDECAR_TYPENAME) => PostKind::Carousel,
        _ if raw.edge_sidecar_to_children.is_some() => PostKind::Carousel,
        _ => PostKind::Single,
    };

    let caption = raw
        .edge_media_to_caption
        .and_then(|c| c.edges.into_iter().next())
        .and_then(|e| e.node.text)
        .unwrap_or_default();

    let likes = if raw.like_and_view_counts_disabled {
        None
    } else {
        like_count(raw.edge_media_preview_like).or_else(|| like_count(raw.edge_liked_by))
    };

    let children = raw
        .edge_sidecar_to_children
        .map(|Edges { edges }| edges.into_iter().map(|e| e.node.display_url).collect())
        .unwrap_or_default();

    Ok(Post {
        shortcode,
        taken_at,
        caption,
        likes,
        likes_hidden: raw.like_and_view_counts_disabled,
        kind,
        display_url,
        children,
    })
}

#[inline]
fn like_count(count: Option<Count>) -> Option<u64> {
    count.and_then(|c| c.count)
}

fn require(value: Option<String>, field: &'static str, context: &str) -> Result<String> {
    value.ok_or_else(|| missing(context.to_string(), field))
}

fn missing(context: String, field: &'static str) -> Error {
    Error::MissingField { context, field }
}

/// Looks for the CSRF token the landing page embeds in its inline scripts.
/// Used when the server didn't hand out a `csrftoken` cookie.
pub(crate) fn parse_csrf_token(html: &str) -> Result<String> {
    let doc = Html::parse_document(html);
    let script_selector = create_selector("script")?;

    doc.select(&script_selector)
        .map(|script| script.inner_html())
        .find_map(|body| extract_csrf(&body))
        .ok_or(Error::MissingCsrfToken)
}

fn extract_csrf(script: &str) -> Option<String> {
    let start = script.find(CSRF_MARKER)? + CSRF_MARKER.len();
    let rest = &script[start..];
    let end = rest.find('"')?;
    let token = &rest[..end];
    (!token.is_empty()).then(|| token.to_string())
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}
