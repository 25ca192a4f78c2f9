//! Web address detection in free text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"/$.?#][^\s<>"]*"#).expect("invalid url pattern")
});

/// A web address found in text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlMatch {
    /// The address, always starting with `https://`.
    pub url: String,
    /// Byte offset of the first character in the source text.
    pub start: usize,
    /// Byte offset one past the last character in the source text.
    pub end: usize,
}

/// Drop sentence punctuation that trails an address, and a closing bracket
/// that has no opening partner inside it.
fn trim_trailing(candidate: &str) -> &str {
    let mut end = candidate.len();
    loop {
        let current = &candidate[..end];
        let Some(last) = current.chars().next_back() else { break };
        let unbalanced = match last {
            ')' => current.matches(')').count() > current.matches('(').count(),
            ']' => current.matches(']').count() > current.matches('[').count(),
            '.' | ',' | ';' | ':' | '!' | '?' | '\'' => true,
            _ => false,
        };
        if !unbalanced {
            break;
        }
        end -= last.len_utf8();
    }
    &candidate[..end]
}

fn has_scheme(candidate: &str) -> bool {
    candidate
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("http"))
}

/// Find every web address in `text`, left to right, without overlaps.
pub fn detect_urls(text: &str) -> Vec<UrlMatch> {
    URL_PATTERN
        .find_iter(text)
        .filter_map(|found| {
            let trimmed = trim_trailing(found.as_str());
            // address without its scheme, or the whole `www.` match
            let address = if has_scheme(trimmed) {
                trimmed.find("://").map_or(trimmed, |i| &trimmed[i + 3..])
            } else {
                trimmed
            };
            let min_len = if has_scheme(trimmed) { 0 } else { 4 };
            if address.len() <= min_len {
                return None;
            }

            let url = format!("https://{address}");
            Some(UrlMatch { url, start: found.start(), end: found.start() + trimmed.len() })
        })
        .collect()
}

/// The first web address in `text`, if any.
pub fn extract_first_url(text: &str) -> Option<String> {
    detect_urls(text).into_iter().next().map(|m| m.url)
}
