use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Login is required but INSTAGRAM_USERNAME and INSTAGRAM_PASSWORD are not both set.")]
    MissingCredentials,
    #[error("Login as '{username}' failed: {reason}")]
    Login { username: String, reason: String },
    #[error("Couldn't find a CSRF token on the landing page.")]
    MissingCsrfToken,

    #[error("Profile '{0}' does not exist or is not accessible.")]
    ProfileNotFound(String),

    #[error("The selector you are trying to scrape for is missing. Selector: {0}")]
    ParseMissingSelector(String),
    #[error("Couldn't deserialize {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Response for {context} is missing '{field}'")]
    MissingField { context: String, field: &'static str },

    #[error("Not found: {url}")]
    NotFound { url: String },
    #[error("Rate limited while requesting {url}")]
    RateLimited { url: String },
    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Spreadsheet Error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
