use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use igscrap::config::{
    DEFAULT_BASE_URL, DEFAULT_IMAGES_DIR, DEFAULT_MAX_POSTS, DEFAULT_OUTPUT_FILE, DEFAULT_PROFILE,
    DEFAULT_TIMEOUT_SECS,
};
use igscrap::{info_time, process::run, Config, Credentials, DateStyle, LoginPolicy};

#[derive(Debug, Parser)]
#[command(name = "igscrap")]
#[command(about = "Download a profile's posts and list them in a spreadsheet")]
struct Cli {
    /// Profile to scrape.
    #[arg(long, env = "IGSCRAP_PROFILE", default_value = DEFAULT_PROFILE)]
    profile: String,

    /// Where the images go.
    #[arg(long, env = "IGSCRAP_IMAGES_DIR", default_value = DEFAULT_IMAGES_DIR)]
    images_dir: PathBuf,

    /// Spreadsheet to write. Replaced if it exists.
    #[arg(long, env = "IGSCRAP_OUTPUT", default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Maximum number of posts, 0 for the whole feed.
    #[arg(long, env = "IGSCRAP_MAX_POSTS", default_value_t = DEFAULT_MAX_POSTS)]
    max_posts: usize,

    /// Pause between posts in milliseconds.
    #[arg(long, env = "IGSCRAP_DELAY_MS", default_value_t = 0)]
    delay_ms: u64,

    #[arg(long, env = "IGSCRAP_DATE_STYLE", value_enum, default_value_t = DateStyle::Date)]
    date_style: DateStyle,

    /// Abort unless INSTAGRAM_USERNAME and INSTAGRAM_PASSWORD are set.
    #[arg(long, env = "IGSCRAP_REQUIRE_LOGIN")]
    require_login: bool,

    #[arg(long, env = "IGSCRAP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[arg(long, env = "IGSCRAP_BASE_URL", default_value = DEFAULT_BASE_URL, hide = true)]
    base_url: String,

    #[arg(long, env = "INSTAGRAM_USERNAME", hide_env_values = true)]
    username: Option<String>,

    #[arg(long, env = "INSTAGRAM_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            profile: cli.profile,
            images_dir: cli.images_dir,
            output_file: cli.output,
            max_posts: None,
            delay: None,
            date_style: cli.date_style,
            credentials: Credentials::from_parts(cli.username, cli.password),
            login: if cli.require_login {
                LoginPolicy::Required
            } else {
                LoginPolicy::Optional
            },
            base_url: cli.base_url,
            timeout: std::time::Duration::from_secs(cli.timeout_secs),
        }
        .with_max_posts(cli.max_posts)
        .with_delay_ms(cli.delay_ms)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let start_time = Local::now();
    let config = Config::from(Cli::parse());

    match run(&config).await {
        Ok(summary) => {
            info_time!(
                start_time,
                "Full program time: {} posts, {} images, {} incomplete",
                summary.rows,
                summary.images_saved,
                summary.partial_posts
            );
            // Printed regardless of RUST_LOG.
            println!(
                "Saved data to {} (images in {})",
                config.output_file.display(),
                config.images_dir.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
