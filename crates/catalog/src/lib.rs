// ABOUTME: Product catalog built from remote XML product feeds.
// ABOUTME: Fetches and caches a feed, locates its item records, maps them to products and finds the cheapest match.

//! socd-catalog - product search over Google-Merchant-style and generic XML feeds.
//!
//! # Example
//!
//! ```no_run
//! use socd_catalog::{AppSettings, Catalog, CatalogError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CatalogError> {
//!     let catalog = Catalog::builder().build().expect("http client");
//!     let settings = AppSettings {
//!         feed_source_urls: vec!["https://shop.example/feed.xml".to_string()],
//!         ..Default::default()
//!     };
//!     let found = catalog.find_cheapest_match(&settings, "panela").await?;
//!     println!("{:?} at {}", found.cheapest.title, found.cheapest.price);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod price;
pub mod product;
pub mod query;
pub mod settings;
pub mod tree;

pub use cache::{FeedCache, FeedCacheEntry, FEED_CACHE_KEY};
pub use catalog::{Catalog, CatalogBuilder, CheapestMatch};
pub use error::{CatalogError, FetchError, FetchErrorCode, SettingsError, TreeError};
pub use extract::extract_items;
pub use fetch::{fetch_first, FeedFetcher, FetchOptions, HttpFetcher, MAX_CONTENT_LENGTH};
pub use normalize::normalize_text;
pub use price::{parse_availability, parse_price, parse_price_str};
pub use product::{map_item, map_items, Product, ProductSummary};
pub use query::{find_cheapest, matching_products, select_cheapest, Cheapest};
pub use settings::{load_or_default, AppSettings, FileSettings, SettingsProvider, StaticSettings};
pub use tree::{parse_xml, Node, Scalar};
