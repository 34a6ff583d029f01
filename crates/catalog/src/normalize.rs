// ABOUTME: Case and accent insensitive text canonicalization for search matching.
// ABOUTME: Applies NFKD decomposition, drops combining marks and lower-cases the result.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalizes text so that "Café" and "CAFE" compare equal.
///
/// Absent input is treated as the empty string. Lower-casing runs on both
/// sides of the decomposition so the result is a fixed point.
pub fn normalize_text(text: Option<&str>) -> String {
    text.unwrap_or_default()
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}
