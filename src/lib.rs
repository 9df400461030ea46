//! Instagram post scraper.
//! Walks a profile's timeline newest-first, saves every post's image(s) and
//! writes one spreadsheet row per post.

pub mod config;
mod error;
pub mod feed;
mod macros;
mod parse;
pub mod process;
pub mod request;
pub mod sheet;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{Config, Credentials, DateStyle, LoginPolicy};
pub use error::{Error, Result};
pub use process::{run, IngestSummary};
pub use request::{InstagramClient, Platform};
