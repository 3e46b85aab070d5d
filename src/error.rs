//! Error types for the feed-to-mail pipeline.
//!
//! Only the failures that callers need to tell apart get their own variant.
//! Extraction never fails: a page that yields too little text degrades to a
//! fallback body instead (see [`crate::extract`]).

use std::path::PathBuf;

/// Error type for feed, fetch, persistence and delivery operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An HTTP request failed or returned a non-success status.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("http client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    /// The feed document could not be parsed, even after sanitizing.
    #[error("malformed feed: {0}")]
    Feed(String),

    /// Reading or appending the seen-URL history failed.
    #[error("history file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sender or recipient address could not be parsed.
    #[error("invalid mail address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// The message could not be built or the relay refused it.
    #[error("mail delivery failed: {0}")]
    Mail(String),
}

impl From<lettre::error::Error> for Error {
    fn from(e: lettre::error::Error) -> Self {
        Error::Mail(e.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for Error {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        Error::Mail(e.to_string())
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
