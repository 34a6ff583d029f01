// ABOUTME: Feed download: the FeedFetcher seam, a reqwest implementation and the ordered failover chain.
// ABOUTME: HttpFetcher enforces per-attempt timeouts, bounded retries, size limits and charset decoding.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};

use crate::error::FetchError;

/// Maximum accepted feed size (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Downloads the raw text of one feed URL.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Tries `urls` in order and returns the first non-blank body with its URL.
///
/// A blank body counts as a failed source. On exhaustion every attempt's
/// error is returned, in order.
pub async fn fetch_first(
    fetcher: &dyn FeedFetcher,
    urls: &[String],
) -> Result<(String, String), Vec<FetchError>> {
    let mut errors = Vec::with_capacity(urls.len());
    for url in urls {
        match fetcher.fetch(url).await {
            Ok(text) if !text.trim().is_empty() => return Ok((url.clone(), text)),
            Ok(_) => {
                let err = FetchError::empty_body(url.as_str());
                warn!("feed source failed, trying next: {}", err);
                errors.push(err);
            }
            Err(err) => {
                warn!("feed source failed, trying next: {}", err);
                errors.push(err);
            }
        }
    }
    Err(errors)
}

/// HTTP behaviour of [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    /// Extra attempts per URL after the first one fails.
    pub retries: u32,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    pub max_content_length: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(4),
            retries: 2,
            user_agent: concat!("socd-catalog/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: HashMap::new(),
            max_content_length: MAX_CONTENT_LENGTH,
        }
    }
}

/// [`FeedFetcher`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    opts: FetchOptions,
}

impl HttpFetcher {
    pub fn new(opts: FetchOptions) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(opts.timeout)
            .user_agent(opts.user_agent.clone())
            .build()
            .map_err(|e| FetchError::transport("", Some(anyhow::anyhow!(e))))?;
        Ok(Self { client, opts })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        for (key, value) in &self.opts.headers {
            request = request.header(key, value);
        }

        let response = request.send().await.map_err(|e| classify(url, e))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(FetchError::status(url, status));
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.opts.max_content_length {
                return Err(FetchError::too_large(url));
            }
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let body: Bytes = response.bytes().await.map_err(|e| classify(url, e))?;
        if body.len() > self.opts.max_content_length {
            return Err(FetchError::too_large(url));
        }

        Ok(decode_body(&body, content_type.as_deref()))
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        validate_url(url)?;

        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt < self.opts.retries => {
                    attempt += 1;
                    debug!("retrying {} (attempt {}): {}", url, attempt + 1, err);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Accepts only absolute http(s) URLs.
fn validate_url(url: &str) -> Result<(), FetchError> {
    if url.is_empty() {
        return Err(FetchError::invalid_url(url, None));
    }
    let parsed = url::Url::parse(url).map_err(|e| {
        FetchError::invalid_url(url, Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(FetchError::invalid_url(
            url,
            Some(anyhow::anyhow!("scheme must be http or https")),
        )),
    }
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::timeout(url, Some(anyhow::anyhow!(err)))
    } else {
        FetchError::transport(url, Some(anyhow::anyhow!(err)))
    }
}

/// Decodes a body using the content-type charset, or detection when absent.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    lower.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("charset=")
            .map(|c| c.trim_matches('"').trim_matches('\'').to_string())
    })
}
