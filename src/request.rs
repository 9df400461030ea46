use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::{Config, Credentials};
use crate::parse::{parse_csrf_token, parse_post, parse_profile, parse_timeline};
use crate::types::{
    FeedPage, LoginResponse, Post, PostDetailsResponse, Profile, ProfileInfoResponse,
    TimelineResponse,
};
use crate::{Error, Result};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const APP_ID: &str = "936619743392459";
const CSRF_COOKIE: &str = "csrftoken";
const CSRF_HEADER: &str = "X-CSRFToken";
const TIMELINE_QUERY_HASH: &str = "003056d32c2554def87228bc3fd9668a";
const POST_QUERY_HASH: &str = "2b0673e0dc4580674a88d426fe00ea90";
const PAGE_SIZE: u32 = 12;

/// What the ingestion loop needs from the remote platform.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Authenticates the session. Called at most once, before anything else.
    async fn login(&mut self, credentials: &Credentials) -> Result<()>;

    async fn profile(&self, username: &str) -> Result<Profile>;

    /// Fetches one timeline page, newest posts first. `cursor` is `None` for the first page.
    async fn feed_page(&self, profile: &Profile, cursor: Option<&str>) -> Result<FeedPage>;

    /// Full metadata of a single post, including carousel children and like count.
    async fn post_details(&self, shortcode: &str) -> Result<Post>;

    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// `Platform` over Instagram's public web endpoints.
pub struct InstagramClient {
    client: Client,
    base_url: String,
    csrf_token: Option<String>,
}

impl InstagramClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("X-IG-App-ID", HeaderValue::from_static(APP_ID));

        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            csrf_token: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url, config.timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.csrf_token {
            Some(token) => builder.header(CSRF_HEADER, token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, builder: RequestBuilder, context: &str) -> Result<T> {
        let response = check_status(builder.send().await?)?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| Error::Deserialize {
            context: context.to_string(),
            source,
        })
    }

    /// Picks up the CSRF token from the landing page, either from the cookie or the inline scripts.
    async fn fetch_csrf_token(&self) -> Result<String> {
        let response = check_status(self.request(Method::GET, &self.url("/")).send().await?)?;
        if let Some(token) = csrf_cookie(&response) {
            return Ok(token);
        }
        let html = response.text().await?;
        parse_csrf_token(&html)
    }
}

#[async_trait]
impl Platform for InstagramClient {
    async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        let login_err = |reason: &str| Error::Login {
            username: credentials.username.clone(),
            reason: reason.to_string(),
        };

        self.csrf_token = Some(self.fetch_csrf_token().await?);

        let enc_password = format!(
            "#PWD_INSTAGRAM_BROWSER:0:{}:{}",
            Utc::now().timestamp(),
            credentials.password
        );
        let url = self.url("/api/v1/web/accounts/login/ajax/");
        let response = self
            .request(Method::POST, &url)
            .header(REFERER, self.url("/"))
            .form(&[
                ("username", credentials.username.as_str()),
                ("enc_password", enc_password.as_str()),
                ("queryParams", "{}"),
                ("optIntoOneTap", "false"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited { url });
        }
        let new_token = csrf_cookie(&response);
        let body = response.text().await?;

        let reply: LoginResponse = match serde_json::from_str(&body) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(Error::UnexpectedStatus {
                    status: status.as_u16(),
                    url,
                })
            }
            Err(source) => {
                return Err(Error::Deserialize {
                    context: "login reply".to_string(),
                    source,
                })
            }
        };

        if reply.authenticated {
            if new_token.is_some() {
                self.csrf_token = new_token;
            }
            tracing::info!(username = %credentials.username, "logged in");
            return Ok(());
        }

        Err(if reply.two_factor_required {
            login_err("two-factor authentication is required")
        } else if let Some(checkpoint) = reply.checkpoint_url {
            login_err(&format!("account checkpoint required: {checkpoint}"))
        } else if reply.user == Some(false) {
            login_err("user does not exist")
        } else {
            login_err(reply.message.as_deref().unwrap_or("wrong password"))
        })
    }

    async fn profile(&self, username: &str) -> Result<Profile> {
        let builder = self
            .request(Method::GET, &self.url("/api/v1/users/web_profile_info/"))
            .query(&[("username", username)]);

        let response: ProfileInfoResponse = match self.get_json(builder, "profile info").await {
            Err(Error::NotFound { .. }) => return Err(Error::ProfileNotFound(username.to_string())),
            other => other?,
        };

        let raw = response
            .data
            .and_then(|d| d.user)
            .ok_or_else(|| Error::ProfileNotFound(username.to_string()))?;
        let profile = parse_profile(raw);
        if profile.is_private {
            tracing::warn!(profile = %profile.username, "profile is private, posts may not be visible");
        }
        Ok(profile)
    }

    async fn feed_page(&self, profile: &Profile, cursor: Option<&str>) -> Result<FeedPage> {
        let variables = json!({
            "id": profile.id,
            "first": PAGE_SIZE,
            "after": cursor,
        })
        .to_string();
        let builder = self
            .request(Method::GET, &self.url("/graphql/query/"))
            .query(&[("query_hash", TIMELINE_QUERY_HASH), ("variables", variables.as_str())]);

        let response: TimelineResponse = self.get_json(builder, "timeline page").await?;
        let timeline = response
            .data
            .and_then(|d| d.user)
            .map(|u| u.edge_owner_to_timeline_media)
            .ok_or_else(|| Error::MissingField {
                context: format!("timeline of {}", profile.username),
                field: "edge_owner_to_timeline_media",
            })?;

        parse_timeline(timeline)
    }

    async fn post_details(&self, shortcode: &str) -> Result<Post> {
        let variables = json!({ "shortcode": shortcode }).to_string();
        let builder = self
            .request(Method::GET, &self.url("/graphql/query/"))
            .query(&[("query_hash", POST_QUERY_HASH), ("variables", variables.as_str())]);

        let response: PostDetailsResponse = self.get_json(builder, "post details").await?;
        let raw = response
            .data
            .and_then(|d| d.shortcode_media)
            .ok_or_else(|| Error::MissingField {
                context: format!("post {shortcode}"),
                field: "shortcode_media",
            })?;

        parse_post(raw)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = check_status(self.client.get(url).send().await?)?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    let url = response.url().to_string();

    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound { url });
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(Error::RateLimited { url });
    }
    if !status.is_success() {
        return Err(Error::UnexpectedStatus {
            status: status.as_u16(),
            url,
        });
    }
    Ok(response)
}

fn csrf_cookie(response: &Response) -> Option<String> {
    response
        .cookies()
        .find(|c| c.name() == CSRF_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
