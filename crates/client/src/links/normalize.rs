//! URL canonicalization for cache keys.

use url::Url;

/// Query parameters that only carry attribution data.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "dclid",
    "ref",
    "source",
    "yclid",
    "mc_cid",
    "mc_eid",
];

const TRACKING_PREFIXES: &[&str] = &["utm_", "fb_", "ga_", "_"];

/// Prefix `https://` when the input has no scheme separator.
pub(crate) fn ensure_scheme(input: &str) -> String {
    if input.contains("://") { input.to_string() } else { format!("https://{input}") }
}

fn is_tracking_param(name: &str) -> bool {
    TRACKING_PARAMS.contains(&name) || TRACKING_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Remove tracking parameters from a raw query string.
///
/// Surviving `name=value` pairs are copied byte for byte, in order.
fn strip_tracking_params(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let name = pair.split('=').next().unwrap_or_default();
            !is_tracking_param(name)
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonicalize a URL for use as a cache key.
///
/// Normalization steps:
/// 1. Trim whitespace and default the scheme to `https://`
/// 2. Parse; unparseable input is returned unchanged
/// 3. Remove the fragment
/// 4. Remove tracking query parameters
/// 5. Reassemble without a trailing slash
///
/// Applying this twice yields the same string as applying it once.
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();

    let mut parsed = match Url::parse(&ensure_scheme(trimmed)) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("leaving unparseable url as-is: {input} ({e})");
            return input.to_string();
        }
    };

    parsed.set_fragment(None);
    let query = parsed
        .query()
        .map(strip_tracking_params)
        .filter(|q| !q.is_empty());
    parsed.set_query(None);

    let mut normalized = String::from(parsed.as_str());
    if parsed.host_str().is_some_and(|host| !host.is_empty()) {
        let base_len = normalized.trim_end_matches('/').len();
        normalized.truncate(base_len);
    }

    if let Some(query) = query {
        normalized.push('?');
        normalized.push_str(&query);
    }

    normalized
}

/// Host of `input` without a leading `www.`.
///
/// Returns the input unchanged when it cannot be parsed or has no host.
pub fn get_domain_from_url(input: &str) -> String {
    match Url::parse(&ensure_scheme(input.trim())) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) if !host.is_empty() => host.strip_prefix("www.").unwrap_or(host).to_string(),
            _ => input.to_string(),
        },
        Err(_) => input.to_string(),
    }
}
