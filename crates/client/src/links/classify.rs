//! Coarse URL classification from host and path.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use super::normalize::ensure_scheme;

/// The kind of content a URL most likely points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlType {
    Video,
    SocialMedia,
    Image,
    Product,
    Article,
}

impl UrlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlType::Video => "video",
            UrlType::SocialMedia => "social_media",
            UrlType::Image => "image",
            UrlType::Product => "product",
            UrlType::Article => "article",
        }
    }
}

impl fmt::Display for UrlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single host/path match rule.
enum Rule {
    /// Host equals the domain or is a subdomain of it.
    Host(&'static str),
    /// Host rule plus a path prefix.
    HostPath(&'static str, &'static str),
    /// Host contains the fragment anywhere (e.g. `amazon.` for every TLD).
    HostContains(&'static str),
    /// Path ends with the suffix.
    PathSuffix(&'static str),
    /// Path contains the fragment.
    PathContains(&'static str),
}

impl Rule {
    fn matches(&self, host: &str, path: &str) -> bool {
        match self {
            Rule::Host(domain) => host_matches(host, domain),
            Rule::HostPath(domain, prefix) => host_matches(host, domain) && path.starts_with(prefix),
            Rule::HostContains(fragment) => host.contains(fragment),
            Rule::PathSuffix(suffix) => path.ends_with(suffix),
            Rule::PathContains(fragment) => path.contains(fragment),
        }
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|rest| rest.ends_with('.'))
}

const VIDEO_RULES: &[Rule] = &[
    Rule::Host("youtu.be"),
    Rule::HostPath("youtube.com", "/watch"),
    Rule::HostPath("youtube.com", "/shorts/"),
    Rule::HostPath("youtube.com", "/embed/"),
    Rule::HostPath("youtube.com", "/live/"),
    Rule::Host("vimeo.com"),
    Rule::Host("twitch.tv"),
    Rule::HostPath("dailymotion.com", "/video/"),
    Rule::HostPath("tiktok.com", "/@"),
    Rule::PathSuffix(".mp4"),
    Rule::PathSuffix(".webm"),
    Rule::PathSuffix(".mov"),
];

const SOCIAL_RULES: &[Rule] = &[
    Rule::Host("twitter.com"),
    Rule::Host("x.com"),
    Rule::Host("facebook.com"),
    Rule::Host("fb.com"),
    Rule::Host("instagram.com"),
    Rule::Host("linkedin.com"),
    Rule::Host("reddit.com"),
    Rule::Host("threads.net"),
    Rule::Host("bsky.app"),
    Rule::Host("mastodon.social"),
    Rule::Host("pinterest.com"),
    Rule::Host("tiktok.com"),
];

const IMAGE_RULES: &[Rule] = &[
    Rule::PathSuffix(".jpg"),
    Rule::PathSuffix(".jpeg"),
    Rule::PathSuffix(".png"),
    Rule::PathSuffix(".gif"),
    Rule::PathSuffix(".webp"),
    Rule::PathSuffix(".avif"),
    Rule::PathSuffix(".svg"),
    Rule::Host("imgur.com"),
    Rule::Host("flickr.com"),
    Rule::Host("unsplash.com"),
];

const PRODUCT_RULES: &[Rule] = &[
    Rule::HostContains("amazon."),
    Rule::HostContains("ebay."),
    Rule::Host("etsy.com"),
    Rule::Host("aliexpress.com"),
    Rule::Host("walmart.com"),
    Rule::Host("bestbuy.com"),
    Rule::HostContains("shop"),
    Rule::PathContains("/dp/"),
    Rule::PathContains("/product"),
    Rule::PathContains("/shop"),
    Rule::PathContains("/item/"),
];

/// Rule sets in evaluation order. The first matching set wins.
const CLASSIFIERS: &[(UrlType, &[Rule])] = &[
    (UrlType::Video, VIDEO_RULES),
    (UrlType::SocialMedia, SOCIAL_RULES),
    (UrlType::Image, IMAGE_RULES),
    (UrlType::Product, PRODUCT_RULES),
];

/// Classify `url` by host and path.
///
/// Unparseable input is classified as [`UrlType::Article`].
pub fn detect_url_type(url: &str) -> UrlType {
    let Ok(parsed) = Url::parse(&ensure_scheme(url.trim())) else {
        return UrlType::Article;
    };

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let path = parsed.path().to_lowercase();

    CLASSIFIERS
        .iter()
        .find(|(_, rules)| rules.iter().any(|rule| rule.matches(host, &path)))
        .map_or(UrlType::Article, |(kind, _)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_urls() {
        assert_eq!(detect_url_type("https://www.youtube.com/watch?v=abc"), UrlType::Video);
        assert_eq!(detect_url_type("https://youtu.be/abc"), UrlType::Video);
        assert_eq!(detect_url_type("https://vimeo.com/12345"), UrlType::Video);
        assert_eq!(detect_url_type("https://cdn.example.com/clip.MP4"), UrlType::Video);
    }

    #[test]
    fn test_social_urls() {
        assert_eq!(detect_url_type("https://twitter.com/rustlang"), UrlType::SocialMedia);
        assert_eq!(detect_url_type("https://x.com/rustlang/status/1"), UrlType::SocialMedia);
        assert_eq!(detect_url_type("https://old.reddit.com/r/rust"), UrlType::SocialMedia);
    }

    #[test]
    fn test_host_rules_need_label_boundary() {
        assert_eq!(detect_url_type("https://netflix.com/title/1"), UrlType::Article);
        assert_eq!(detect_url_type("https://notyoutube.com/watch"), UrlType::Article);
    }

    #[test]
    fn test_image_urls() {
        assert_eq!(detect_url_type("https://example.com/photos/cat.png"), UrlType::Image);
        assert_eq!(detect_url_type("https://i.imgur.com/abc"), UrlType::Image);
    }

    #[test]
    fn test_product_urls() {
        assert_eq!(detect_url_type("https://www.amazon.co.uk/dp/B000"), UrlType::Product);
        assert_eq!(detect_url_type("https://shop.example.com/items"), UrlType::Product);
        assert_eq!(detect_url_type("https://example.com/products/widget"), UrlType::Product);
    }

    #[test]
    fn test_video_beats_product() {
        assert_eq!(detect_url_type("https://www.youtube.com/watch?v=1&shop=1"), UrlType::Video);
        assert_eq!(detect_url_type("https://shop.example.com/promo.mp4"), UrlType::Video);
    }

    #[test]
    fn test_social_beats_image() {
        assert_eq!(detect_url_type("https://instagram.com/p/abc/photo.jpg"), UrlType::SocialMedia);
    }

    #[test]
    fn test_default_article() {
        assert_eq!(detect_url_type("https://blog.rust-lang.org/2024/01/01/post.html"), UrlType::Article);
        assert_eq!(detect_url_type("example.com"), UrlType::Article);
        assert_eq!(detect_url_type("http://[::1"), UrlType::Article);
    }

    #[test]
    fn test_display() {
        assert_eq!(UrlType::SocialMedia.to_string(), "social_media");
    }
}
