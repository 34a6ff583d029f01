// ABOUTME: The Catalog service: cached feed download, tree parsing and cheapest-product search.
// ABOUTME: CatalogBuilder configures the fetcher, the shared cache and optional miss coalescing.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use serde::Serialize;

use crate::cache::FeedCache;
use crate::error::{CatalogError, FetchError};
use crate::extract::extract_items;
use crate::fetch::{fetch_first, FeedFetcher, FetchOptions, HttpFetcher};
use crate::product::{map_items, ProductSummary};
use crate::query::find_cheapest;
use crate::settings::AppSettings;
use crate::tree::{parse_xml, Node};

/// Result of [`Catalog::find_cheapest_match`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheapestMatch {
    pub query: String,
    pub total_matches: usize,
    pub cheapest: ProductSummary,
}

/// Answers feed and search requests for one logical product feed.
#[derive(Clone)]
pub struct Catalog {
    fetcher: Arc<dyn FeedFetcher>,
    cache: Arc<FeedCache>,
    coalesce_misses: bool,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("cache", &self.cache)
            .field("coalesce_misses", &self.coalesce_misses)
            .finish_non_exhaustive()
    }
}

impl Catalog {
    pub fn new(fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self {
            fetcher,
            cache: Arc::new(FeedCache::new()),
            coalesce_misses: false,
        }
    }

    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    /// Returns the feed document, from cache when fresh, otherwise from the
    /// first configured source that answers.
    pub async fn feed_text(&self, settings: &AppSettings) -> Result<Arc<str>, CatalogError> {
        self.feed_text_at(settings, Instant::now()).await
    }

    /// [`Catalog::feed_text`] evaluated at a given instant.
    pub async fn feed_text_at(
        &self,
        settings: &AppSettings,
        now: Instant,
    ) -> Result<Arc<str>, CatalogError> {
        if settings.feed_source_urls.is_empty() {
            return Err(CatalogError::NoSourcesConfigured);
        }

        if !settings.cache_enabled {
            return self.download(settings).await;
        }

        let ttl = settings.cache_ttl();
        if let Some(text) = self.cache.fresh_at(ttl, now).await {
            debug!("feed cache hit");
            return Ok(text);
        }

        if !self.coalesce_misses {
            debug!("feed cache miss");
            return self.refill(settings, now).await;
        }

        let _refill = self.cache.lock_refill().await;
        if let Some(text) = self.cache.fresh_at(ttl, now).await {
            debug!("feed cache filled by a concurrent request");
            return Ok(text);
        }
        debug!("feed cache miss");
        self.refill(settings, now).await
    }

    /// Downloads the feed and stores it stamped with the time the download finished.
    async fn refill(&self, settings: &AppSettings, now: Instant) -> Result<Arc<str>, CatalogError> {
        let started = Instant::now();
        let text = self.download(settings).await?;
        self.cache
            .store_at(Arc::clone(&text), now + started.elapsed())
            .await;
        Ok(text)
    }

    async fn download(&self, settings: &AppSettings) -> Result<Arc<str>, CatalogError> {
        let (url, text) = fetch_first(self.fetcher.as_ref(), &settings.feed_source_urls)
            .await
            .map_err(CatalogError::FetchExhausted)?;
        info!("downloaded feed from {} ({} bytes)", url, text.len());
        Ok(Arc::from(text))
    }

    /// The whole feed as a generic tree.
    pub async fn get_feed_as_tree(&self, settings: &AppSettings) -> Result<Node, CatalogError> {
        self.get_feed_as_tree_at(settings, Instant::now()).await
    }

    pub async fn get_feed_as_tree_at(
        &self,
        settings: &AppSettings,
        now: Instant,
    ) -> Result<Node, CatalogError> {
        let text = self.feed_text_at(settings, now).await?;
        Ok(parse_xml(&text)?)
    }

    /// The cheapest product whose title contains `query`.
    pub async fn find_cheapest_match(
        &self,
        settings: &AppSettings,
        query: &str,
    ) -> Result<CheapestMatch, CatalogError> {
        self.find_cheapest_match_at(settings, query, Instant::now())
            .await
    }

    pub async fn find_cheapest_match_at(
        &self,
        settings: &AppSettings,
        query: &str,
        now: Instant,
    ) -> Result<CheapestMatch, CatalogError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::EmptyQuery);
        }

        let tree = self.get_feed_as_tree_at(settings, now).await?;
        let items = extract_items(&tree);
        let products = map_items(&items);
        debug!("mapped {} products from feed", products.len());

        let found = find_cheapest(&products, query)
            .ok_or_else(|| CatalogError::NotFound(query.to_string()))?;
        Ok(CheapestMatch {
            query: query.to_string(),
            total_matches: found.total_matches,
            cheapest: found.product.summary(),
        })
    }
}

/// Builder for [`Catalog`].
#[derive(Default)]
pub struct CatalogBuilder {
    fetcher: Option<Arc<dyn FeedFetcher>>,
    fetch_options: FetchOptions,
    cache: Option<Arc<FeedCache>>,
    coalesce_misses: bool,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom fetcher instead of [`HttpFetcher`].
    pub fn fetcher(mut self, fetcher: Arc<dyn FeedFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Options for the default [`HttpFetcher`]. Ignored with a custom fetcher.
    pub fn fetch_options(mut self, opts: FetchOptions) -> Self {
        self.fetch_options = opts;
        self
    }

    /// Share a cache between catalogs.
    pub fn cache(mut self, cache: Arc<FeedCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Make concurrent cache misses wait for a single download.
    pub fn coalesce_misses(mut self, coalesce: bool) -> Self {
        self.coalesce_misses = coalesce;
        self
    }

    pub fn build(self) -> Result<Catalog, FetchError> {
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(self.fetch_options)?),
        };
        Ok(Catalog {
            fetcher,
            cache: self.cache.unwrap_or_default(),
            coalesce_misses: self.coalesce_misses,
        })
    }
}
