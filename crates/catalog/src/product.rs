// ABOUTME: Canonical product model and the mapper from raw feed records.
// ABOUTME: Each field reads the first non-empty value among a fixed list of aliased tag names.

use serde::Serialize;

use crate::price::{parse_availability, parse_price};
use crate::tree::{Node, Scalar};

const ID_KEYS: &[&str] = &["id", "g:id", "sku"];
const TITLE_KEYS: &[&str] = &["title", "g:title", "name", "product_title"];
const LINK_KEYS: &[&str] = &["link", "g:link", "url", "product_link"];
const PRICE_KEYS: &[&str] = &["price", "g:price", "sale_price", "g:sale_price"];
const AVAILABILITY_KEYS: &[&str] = &["availability", "g:availability", "stock_status", "in_stock"];
const GTIN_KEYS: &[&str] = &["gtin", "g:gtin"];
const BRAND_KEYS: &[&str] = &["brand", "g:brand"];
const IMAGE_KEYS: &[&str] = &["image_link", "g:image_link", "image", "image_url"];
const CATEGORY_KEYS: &[&str] = &["g:product_type", "product_type", "category"];

/// A feed record in schema-independent form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    /// NaN when the feed gives no readable price.
    pub price: f64,
    pub in_stock: bool,
    pub gtin: Option<String>,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    /// The record exactly as parsed.
    pub raw_source: Node,
}

impl Product {
    pub fn has_price(&self) -> bool {
        self.price.is_finite()
    }

    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            link: self.link.clone(),
            price: self.price,
            in_stock: self.in_stock,
            brand: self.brand.clone(),
            image: self.image.clone(),
            category: self.category.clone(),
            gtin: self.gtin.clone(),
        }
    }
}

/// Response projection of a [`Product`] without the raw record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub price: f64,
    pub in_stock: bool,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub gtin: Option<String>,
}

/// Builds a [`Product`] from one raw item record. Never fails.
pub fn map_item(item: &Node) -> Product {
    Product {
        id: first_text(item, ID_KEYS),
        title: first_text(item, TITLE_KEYS),
        link: first_text(item, LINK_KEYS),
        price: parse_price(first_scalar(item, PRICE_KEYS)),
        in_stock: parse_availability(first_scalar(item, AVAILABILITY_KEYS)),
        gtin: first_text(item, GTIN_KEYS),
        brand: first_text(item, BRAND_KEYS),
        image: first_text(item, IMAGE_KEYS),
        category: first_text(item, CATEGORY_KEYS),
        raw_source: item.clone(),
    }
}

/// Maps every record, keeping feed order.
pub fn map_items(items: &[Node]) -> Vec<Product> {
    items.iter().map(map_item).collect()
}

/// First scalar under `keys` that is not empty, zero or false.
fn first_scalar<'a>(item: &'a Node, keys: &[&str]) -> Option<&'a Scalar> {
    keys.iter()
        .filter_map(|key| item.get(key))
        .filter_map(Node::as_scalar)
        .find(|s| s.is_truthy())
}

fn first_text(item: &Node, keys: &[&str]) -> Option<String> {
    first_scalar(item, keys).map(|s| s.to_string())
}
