// ABOUTME: Loose price and availability parsing for heterogeneous feed values.
// ABOUTME: Price is NaN when unknown; availability is a token heuristic over the lower-cased value.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tree::Scalar;

static PRICE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+[.,]?\d*").unwrap());

/// Substrings that mark an item as purchasable.
const IN_STOCK_TOKENS: &[&str] = &["in stock", "instock", "em estoque", "available"];

/// Extracts a price from a raw feed value.
///
/// Numbers pass through unchanged. Text yields the first `digits[.,]digits`
/// token with the first comma read as a decimal point, so "123.45 BRL" and
/// "BRL 123,45" both give 123.45. Anything else is NaN.
pub fn parse_price(raw: Option<&Scalar>) -> f64 {
    match raw {
        Some(Scalar::Number(n)) => *n,
        Some(Scalar::Text(s)) => parse_price_str(s),
        _ => f64::NAN,
    }
}

/// Text half of [`parse_price`].
pub fn parse_price_str(s: &str) -> f64 {
    PRICE_TOKEN_RE
        .find(s)
        .and_then(|m| m.as_str().replacen(',', ".", 1).parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Derives an in-stock flag from an availability value.
///
/// This is a heuristic: unlisted wordings read as out of stock.
pub fn parse_availability(raw: Option<&Scalar>) -> bool {
    let Some(raw) = raw else {
        return false;
    };
    let lower = raw.to_string().to_lowercase();
    lower == "true" || IN_STOCK_TOKENS.iter().any(|t| lower.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Scalar {
        Scalar::Text(s.to_string())
    }

    #[test]
    fn test_parse_price_text_formats() {
        assert_eq!(parse_price(Some(&text("123.45 BRL"))), 123.45);
        assert_eq!(parse_price(Some(&text("BRL 123,45"))), 123.45);
        assert_eq!(parse_price(Some(&text("R$ 89"))), 89.0);
        assert_eq!(parse_price(Some(&text("12."))), 12.0);
        // Thousands separators are not understood; the first token wins.
        assert_eq!(parse_price(Some(&text("BRL 1.234,56"))), 1.234);
    }

    #[test]
    fn test_parse_price_numbers_pass_through() {
        assert_eq!(parse_price(Some(&Scalar::Number(19.9))), 19.9);
        assert_eq!(parse_price(Some(&Scalar::Number(0.0))), 0.0);
    }

    #[test]
    fn test_parse_price_unknown_is_nan() {
        assert!(parse_price(None).is_nan());
        assert!(parse_price(Some(&text("sob consulta"))).is_nan());
        assert!(parse_price(Some(&text(""))).is_nan());
        assert!(parse_price(Some(&Scalar::Bool(true))).is_nan());
    }

    #[test]
    fn test_availability_in_stock_tokens() {
        assert!(parse_availability(Some(&text("in stock"))));
        assert!(parse_availability(Some(&text("InStock"))));
        assert!(parse_availability(Some(&text("Em Estoque"))));
        assert!(parse_availability(Some(&text("available for order"))));
        assert!(parse_availability(Some(&text("https://schema.org/InStock"))));
        assert!(parse_availability(Some(&text("TRUE"))));
        assert!(parse_availability(Some(&Scalar::Bool(true))));
    }

    #[test]
    fn test_availability_out_of_stock() {
        assert!(!parse_availability(Some(&text("out of stock"))));
        assert!(!parse_availability(Some(&text("preorder"))));
        assert!(!parse_availability(Some(&Scalar::Bool(false))));
        assert!(!parse_availability(Some(&Scalar::Number(1.0))));
        assert!(!parse_availability(Some(&text("true story"))));
        assert!(!parse_availability(None));
    }
}
