//! Run configuration.
//!
//! Everything the ingestion loop needs is collected into one immutable [`Config`]
//! before any work starts. The binary builds it from CLI arguments and the
//! environment; tests build it directly.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};

use crate::{Error, Result};

pub const DEFAULT_PROFILE: &str = "unistays.co";
pub const DEFAULT_IMAGES_DIR: &str = "unistays_images";
pub const DEFAULT_OUTPUT_FILE: &str = "unistays_posts.xlsx";
pub const DEFAULT_MAX_POSTS: usize = 20;
pub const DEFAULT_BASE_URL: &str = "https://www.instagram.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How the `Date` column is rendered. Both use local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DateStyle {
    /// `YYYY-MM-DD`
    #[default]
    Date,
    /// `YYYY-MM-DD HH:MM:SS`
    Timestamp,
}

impl DateStyle {
    pub fn format(self, date: DateTime<Utc>) -> String {
        let local = date.with_timezone(&Local);
        match self {
            DateStyle::Date => local.format("%Y-%m-%d").to_string(),
            DateStyle::Timestamp => local.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Pairs up a username and password. Either half missing (or empty) means no credentials.
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Option<Self> {
        // An empty variable counts as unset.
        let username = username.filter(|u| !u.is_empty());
        let password = password.filter(|p| !p.is_empty());
        match (username, password) {
            (Some(username), Some(password)) => Some(Self { username, password }),
            (None, None) => None,
            _ => {
                tracing::warn!("only one of INSTAGRAM_USERNAME/INSTAGRAM_PASSWORD is set, ignoring both");
                None
            }
        }
    }
}

// Keep the password out of logs and panics.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginPolicy {
    /// Log in when credentials are present, otherwise scrape anonymously.
    #[default]
    Optional,
    /// Refuse to start without credentials.
    Required,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub profile: String,
    pub images_dir: PathBuf,
    pub output_file: PathBuf,
    /// `None` processes the whole feed.
    pub max_posts: Option<usize>,
    pub delay: Option<Duration>,
    pub date_style: DateStyle,
    pub credentials: Option<Credentials>,
    pub login: LoginPolicy,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            max_posts: Some(DEFAULT_MAX_POSTS),
            delay: None,
            date_style: DateStyle::default(),
            credentials: None,
            login: LoginPolicy::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// A cap of 0 disables the limit.
    pub fn with_max_posts(mut self, max_posts: usize) -> Self {
        self.max_posts = (max_posts > 0).then_some(max_posts);
        self
    }

    /// A delay of 0 disables pausing between posts.
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay = (delay_ms > 0).then(|| Duration::from_millis(delay_ms));
        self
    }

    /// Checks the preconditions that must hold before any network or filesystem work.
    pub fn validate(&self) -> Result<()> {
        if self.login == LoginPolicy::Required && self.credentials.is_none() {
            return Err(Error::MissingCredentials);
        }
        Ok(())
    }

    pub fn reaches_cap(&self, ordinal: usize) -> bool {
        self.max_posts.is_some_and(|max| ordinal > max)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use chrono::TimeZone;

    fn creds() -> Credentials {
        Credentials {
            username: "someone".into(),
            password: "hunter2".into(),
        }
    }

    #[test]
    fn credentials_need_both_halves() {
        assert!(Credentials::from_parts(None, None).is_none());
        assert!(Credentials::from_parts(Some("a".into()), None).is_none());
        assert!(Credentials::from_parts(None, Some("b".into())).is_none());
        assert!(Credentials::from_parts(Some("".into()), Some("b".into())).is_none());
        assert_eq!(
            Credentials::from_parts(Some("someone".into()), Some("hunter2".into())),
            Some(creds())
        );
    }

    /// Runs `f` with a subscriber that writes into a buffer and returns what was logged.
    fn captured_logs(f: impl FnOnce()) -> String {
        #[derive(Clone, Default)]
        struct Buf(Arc<Mutex<Vec<u8>>>);
        impl std::io::Write for Buf {
            fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(bytes);
                Ok(bytes.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buf = Buf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn empty_credentials_are_absent_without_warning() {
        let logs = captured_logs(|| {
            assert!(Credentials::from_parts(Some("".into()), Some("".into())).is_none());
            assert!(Credentials::from_parts(Some("".into()), None).is_none());
        });
        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn one_missing_half_is_warned() {
        let logs = captured_logs(|| {
            assert!(Credentials::from_parts(Some("someone".into()), Some("".into())).is_none());
        });
        assert!(logs.contains("only one of"), "{logs}");
    }

    #[test]
    fn debug_hides_password() {
        let out = format!("{:?}", creds());
        assert!(out.contains("someone"));
        assert!(!out.contains("hunter2"));
    }

    #[test]
    fn zero_cap_means_unlimited() {
        let cfg = Config::default().with_max_posts(0);
        assert_eq!(cfg.max_posts, None);
        assert!(!cfg.reaches_cap(usize::MAX));
    }

    #[test]
    fn cap_is_exclusive_upper_bound() {
        let cfg = Config::default().with_max_posts(3);
        assert!(!cfg.reaches_cap(3));
        assert!(cfg.reaches_cap(4));
    }

    #[test]
    fn zero_delay_is_disabled() {
        assert_eq!(Config::default().with_delay_ms(0).delay, None);
        assert_eq!(
            Config::default().with_delay_ms(1500).delay,
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn required_login_without_credentials_fails_validation() {
        let cfg = Config {
            login: LoginPolicy::Required,
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::MissingCredentials)));

        let cfg = Config {
            login: LoginPolicy::Required,
            credentials: Some(creds()),
            ..Config::default()
        };
        assert!(cfg.validate().is_ok());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn date_styles_render_local_time() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 5).unwrap();
        let local = utc.with_timezone(&Local);
        assert_eq!(
            DateStyle::Date.format(utc),
            local.format("%Y-%m-%d").to_string()
        );
        let stamp = DateStyle::Timestamp.format(utc);
        assert_eq!(stamp.len(), "2024-03-09 12:30:05".len());
        assert!(stamp.ends_with(":05"));
    }
}
