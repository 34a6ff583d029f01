// ABOUTME: Error types for the catalog: tree parsing, feed fetching, settings and queries.
// ABOUTME: FetchError follows a code + url + source layout with boolean helpers per code.

use std::fmt;
use thiserror::Error;

/// Errors raised by the catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The caller supplied no search term.
    #[error("query must not be empty")]
    EmptyQuery,

    /// The deployment has no feed URLs configured.
    #[error("no feed source URLs configured")]
    NoSourcesConfigured,

    /// Every configured source failed. Carries one error per URL, in order.
    #[error("failed to download the feed from all {} configured sources", .0.len())]
    FetchExhausted(Vec<FetchError>),

    /// The request was valid but no product title matched.
    #[error("no product found for query {0:?}")]
    NotFound(String),

    /// The downloaded document is not well-formed XML.
    #[error(transparent)]
    Parse(#[from] TreeError),
}

impl CatalogError {
    /// True for errors caused by the caller's input rather than the upstream feed.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CatalogError::EmptyQuery | CatalogError::NotFound(_))
    }
}

/// Failure to turn feed text into a tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Syntax or encoding error reported by the XML reader.
    #[error("malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// A closing tag appeared with no element open.
    #[error("unexpected closing tag at byte {0}")]
    UnexpectedClose(u64),

    /// The document ended with an element still open.
    #[error("unclosed element <{0}>")]
    Unclosed(String),
}

impl TreeError {
    pub fn xml(position: u64, err: impl fmt::Display) -> Self {
        TreeError::Xml {
            position,
            message: err.to_string(),
        }
    }
}

/// Categories of a failed fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorCode {
    InvalidUrl,
    Transport,
    Timeout,
    Status,
    TooLarge,
    EmptyBody,
}

impl fmt::Display for FetchErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchErrorCode::InvalidUrl => "invalid URL",
            FetchErrorCode::Transport => "transport error",
            FetchErrorCode::Timeout => "timeout",
            FetchErrorCode::Status => "unexpected status",
            FetchErrorCode::TooLarge => "content too large",
            FetchErrorCode::EmptyBody => "empty body",
        };
        write!(f, "{}", s)
    }
}

/// A single failed attempt to download a feed URL.
#[derive(Debug, Error)]
pub struct FetchError {
    pub code: FetchErrorCode,
    pub url: String,
    /// HTTP status for [`FetchErrorCode::Status`] errors.
    pub http_status: Option<u16>,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch {}: {}", self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl FetchError {
    pub fn new(code: FetchErrorCode, url: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            code,
            url: url.into(),
            http_status: None,
            source,
        }
    }

    pub fn invalid_url(url: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(FetchErrorCode::InvalidUrl, url, source)
    }

    pub fn transport(url: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(FetchErrorCode::Transport, url, source)
    }

    pub fn timeout(url: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(FetchErrorCode::Timeout, url, source)
    }

    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self {
            http_status: Some(status),
            ..Self::new(
                FetchErrorCode::Status,
                url,
                Some(anyhow::anyhow!("HTTP status {}", status)),
            )
        }
    }

    pub fn too_large(url: impl Into<String>) -> Self {
        Self::new(FetchErrorCode::TooLarge, url, None)
    }

    pub fn empty_body(url: impl Into<String>) -> Self {
        Self::new(FetchErrorCode::EmptyBody, url, None)
    }

    pub fn is_invalid_url(&self) -> bool {
        self.code == FetchErrorCode::InvalidUrl
    }

    pub fn is_timeout(&self) -> bool {
        self.code == FetchErrorCode::Timeout
    }

    pub fn is_status(&self) -> bool {
        self.code == FetchErrorCode::Status
    }

    pub fn is_empty_body(&self) -> bool {
        self.code == FetchErrorCode::EmptyBody
    }

    /// Whether another attempt at the same URL could succeed.
    ///
    /// Only 408, 429 and 5xx statuses are retried.
    pub fn is_retryable(&self) -> bool {
        match self.code {
            FetchErrorCode::Transport | FetchErrorCode::Timeout => true,
            FetchErrorCode::Status => {
                matches!(self.http_status, Some(408 | 429 | 500..=599))
            }
            _ => false,
        }
    }
}

/// Failure to load application settings. Never fatal; callers fall back to defaults.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}
