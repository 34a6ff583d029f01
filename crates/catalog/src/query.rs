// ABOUTME: Title search and cheapest-product selection over mapped products.
// ABOUTME: Matches by normalized substring containment and picks the lowest finite price, else the first match.

use crate::normalize::normalize_text;
use crate::product::Product;

/// Products whose normalized title contains the normalized query, in feed order.
///
/// Products without a title never match.
pub fn matching_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = normalize_text(Some(query));
    products
        .iter()
        .filter(|p| p.title.is_some())
        .filter(|p| normalize_text(p.title.as_deref()).contains(&needle))
        .collect()
}

/// Picks the cheapest of `matches`.
///
/// Only finite prices take part in the ordering and ties keep feed order.
/// When no match has a price the first match is returned.
pub fn select_cheapest<'a>(matches: &[&'a Product]) -> Option<&'a Product> {
    matches
        .iter()
        .copied()
        .filter(|p| p.has_price())
        .min_by(|a, b| a.price.total_cmp(&b.price))
        .or_else(|| matches.first().copied())
}

/// Outcome of a successful search.
#[derive(Debug, Clone, Copy)]
pub struct Cheapest<'a> {
    pub product: &'a Product,
    pub total_matches: usize,
}

/// Finds the cheapest product whose title contains `query`, or `None` when nothing matches.
pub fn find_cheapest<'a>(products: &'a [Product], query: &str) -> Option<Cheapest<'a>> {
    let matches = matching_products(products, query);
    let product = select_cheapest(&matches)?;
    Some(Cheapest {
        product,
        total_matches: matches.len(),
    })
}
