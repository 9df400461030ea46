use std::path::{Path, PathBuf};

use chrono::Local;

use crate::config::Config;
use crate::feed::Feed;
use crate::request::{InstagramClient, Platform};
use crate::sheet::{OutputRow, OutputTable};
use crate::types::{MediaItem, Post, PostKind, Profile};
use crate::{info_time, Error, Result};

const TEMP_SUFFIX: &str = ".temp";

/// Something that went wrong with a single post without stopping the run.
#[derive(Debug)]
pub enum PostFailure {
    /// Fetching the post's media failed. Items after `filename` were not attempted.
    Download { filename: Option<String>, error: Error },
    Likes(Error),
}

/// Outcome of one post: the row is always produced, possibly with gaps.
#[derive(Debug)]
pub struct PostReport {
    pub row: OutputRow,
    pub failures: Vec<PostFailure>,
    pub images_saved: usize,
}

impl PostReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub rows: usize,
    pub images_saved: usize,
    pub partial_posts: usize,
    pub pages_fetched: usize,
}

/// Full run against Instagram: validate, log in, resolve the profile, ingest, save.
pub async fn run(config: &Config) -> Result<IngestSummary> {
    config.validate()?;
    let mut client = InstagramClient::from_config(config)?;
    run_with(&mut client, config).await
}

/// Same as [`run`] with any `Platform`.
/// The spreadsheet is only written if every step up to the end of the feed succeeded.
pub async fn run_with<P: Platform>(platform: &mut P, config: &Config) -> Result<IngestSummary> {
    let start_time = Local::now();
    config.validate()?;

    tokio::fs::create_dir_all(&config.images_dir).await?;

    if let Some(credentials) = &config.credentials {
        platform.login(credentials).await?;
    } else {
        tracing::info!("no credentials supplied, continuing without login");
    }

    let profile = platform.profile(&config.profile).await?;
    info_time!(
        "Resolved profile {} ({} posts)",
        profile.username,
        profile.post_count.map_or_else(|| "?".to_string(), |n| n.to_string())
    );

    let (table, summary) = ingest(&*platform, &profile, config).await?;

    table.save(&config.output_file)?;
    info_time!(
        start_time,
        "Saved data to {} ({} rows, images in {})",
        config.output_file.display(),
        table.len(),
        config.images_dir.display()
    );

    Ok(summary)
}

/// Walks the feed until it runs dry or the post cap is reached, one post at a time.
pub async fn ingest<P: Platform + ?Sized>(
    platform: &P,
    profile: &Profile,
    config: &Config,
) -> Result<(OutputTable, IngestSummary)> {
    let mut feed = Feed::new(platform, profile);
    let mut table = OutputTable::new();
    let mut summary = IngestSummary::default();
    let mut ordinal = 0usize;

    loop {
        // Check the cap before pulling, so no page past the last wanted post is requested.
        if config.reaches_cap(ordinal + 1) {
            break;
        }
        let Some(post) = feed.next_post().await? else {
            break;
        };
        if ordinal > 0 {
            if let Some(delay) = config.delay {
                tokio::time::sleep(delay).await;
            }
        }
        ordinal += 1;

        let report = process_post(platform, post, ordinal, config).await;
        if report.is_partial() {
            summary.partial_posts += 1;
        }
        summary.images_saved += report.images_saved;
        table.push(report.row);
        info_time!("Processed post {}", ordinal);
    }

    summary.rows = table.len();
    summary.pages_fetched = feed.pages_fetched();
    Ok((table, summary))
}

/// Downloads a post's media and builds its row. Never fails: problems end up in `failures`.
pub async fn process_post<P: Platform + ?Sized>(
    platform: &P,
    post: Post,
    ordinal: usize,
    config: &Config,
) -> PostReport {
    let mut failures = Vec::new();
    let mut details: Option<Post> = None;
    let mut details_failed = false;

    let children = if post.kind == PostKind::Carousel && post.children.is_empty() {
        match platform.post_details(&post.shortcode).await {
            Ok(full) => {
                let children = full.children.clone();
                details = Some(full);
                children
            }
            Err(error) => {
                tracing::warn!(post = ordinal, error = %error, "Error downloading images for post");
                details_failed = true;
                failures.push(PostFailure::Download {
                    filename: None,
                    error,
                });
                Vec::new()
            }
        }
    } else {
        post.children.clone()
    };

    let items = post.media_items(&children);
    let (filenames, download_failure) = download_media(platform, &items, &config.images_dir).await;
    if let Some(failure) = download_failure {
        if let PostFailure::Download { error, .. } = &failure {
            tracing::warn!(post = ordinal, error = %error, "Error downloading images for post");
        }
        failures.push(failure);
    }

    let likes = if post.needs_like_lookup() && details_failed {
        // Same request as the one that just failed; the post is already marked partial.
        tracing::debug!(post = ordinal, "post details unavailable, leaving like count empty");
        None
    } else if post.needs_like_lookup() {
        let looked_up = match details {
            Some(full) => Ok(full.likes),
            None => platform.post_details(&post.shortcode).await.map(|full| full.likes),
        };
        looked_up.unwrap_or_else(|error| {
            tracing::warn!(post = ordinal, error = %error, "Couldn't read like count for post");
            failures.push(PostFailure::Likes(error));
            None
        })
    } else {
        post.likes
    };

    let images_saved = filenames.len();
    PostReport {
        row: OutputRow {
            ordinal,
            date: config.date_style.format(post.taken_at),
            caption: post.caption,
            likes,
            filenames,
        },
        failures,
        images_saved,
    }
}

/// Saves `items` into `dir` in order, stopping at the first failure.
/// Returns the filenames that made it to disk.
async fn download_media<P: Platform + ?Sized>(
    platform: &P,
    items: &[MediaItem],
    dir: &Path,
) -> (Vec<String>, Option<PostFailure>) {
    let mut saved = Vec::with_capacity(items.len());

    for item in items {
        let path = dir.join(&item.filename);
        if already_downloaded(&path).await {
            tracing::debug!(file = %path.display(), "already exists, skipping download");
            saved.push(item.filename.clone());
            continue;
        }

        let result = match platform.download(&item.url).await {
            Ok(bytes) => save_atomically(&path, &bytes).await,
            Err(error) => Err(error),
        };
        if let Err(error) = result {
            let failure = PostFailure::Download {
                filename: Some(item.filename.clone()),
                error,
            };
            return (saved, Some(failure));
        }
        saved.push(item.filename.clone());
    }

    (saved, None)
}

/// Writes next to `path` first and renames into place, so `path` only ever holds a complete file.
async fn save_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(TEMP_SUFFIX);
    let temp = PathBuf::from(temp);

    let result = async {
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp).await;
    }
    Ok(result?)
}

async fn already_downloaded(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}
