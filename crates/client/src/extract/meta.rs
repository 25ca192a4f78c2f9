//! Preview metadata harvesting from HTML `<head>` tags.
//!
//! Open Graph tags win over Twitter card tags, which win over plain HTML
//! (`<title>`, `<meta name="description">`).

use linkpeek_core::Metadata;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

use crate::links::get_domain_from_url;

static META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta[content]").expect("invalid selector"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").expect("invalid selector"));
static IMAGE_SRC: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"link[rel="image_src"][href]"#).expect("invalid selector"));

const TITLE_KEYS: &[&str] = &["og:title", "twitter:title"];
const DESCRIPTION_KEYS: &[&str] = &["og:description", "twitter:description", "description"];
const IMAGE_KEYS: &[&str] = &["og:image", "og:image:url", "og:image:secure_url", "twitter:image", "twitter:image:src"];
const SITE_NAME_KEYS: &[&str] = &["og:site_name", "application-name"];

/// Collapse runs of whitespace and drop empty results.
fn clean(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() { None } else { Some(collapsed) }
}

/// `property` or `name` of a meta tag.
fn meta_key<'a>(element: &ElementRef<'a>) -> Option<&'a str> {
    element.value().attr("property").or_else(|| element.value().attr("name"))
}

/// Every non-empty content value for `key`, in document order.
fn meta_values<'a>(document: &'a Html, key: &'a str) -> impl Iterator<Item = String> + 'a {
    document
        .select(&META)
        .filter(move |el| meta_key(el).is_some_and(|k| k.eq_ignore_ascii_case(key)))
        .filter_map(|el| el.value().attr("content").and_then(clean))
}

/// First non-empty content value among `keys`, in key priority order.
fn first_meta(document: &Html, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| meta_values(document, key).next())
}

fn title_text(document: &Html) -> Option<String> {
    document
        .select(&TITLE)
        .next()
        .and_then(|el| clean(&el.text().collect::<String>()))
}

/// Resolve image references against `base_url`, dropping duplicates and
/// anything that is not http(s).
fn collect_images(document: &Html, base_url: &Url) -> Vec<String> {
    let candidates = IMAGE_KEYS
        .iter()
        .flat_map(|key| meta_values(document, key).collect::<Vec<_>>())
        .chain(
            document
                .select(&IMAGE_SRC)
                .filter_map(|el| el.value().attr("href").and_then(clean)),
        );

    let mut seen = HashSet::new();
    let mut images = Vec::new();
    for candidate in candidates {
        let Ok(resolved) = base_url.join(&candidate) else { continue };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        let resolved = resolved.to_string();
        if seen.insert(resolved.clone()) {
            images.push(resolved);
        }
    }
    images
}

/// Build preview metadata from an HTML document served at `base_url`.
pub fn parse_metadata(html: &str, base_url: &Url) -> Metadata {
    let document = Html::parse_document(html);

    let title = first_meta(&document, TITLE_KEYS).or_else(|| title_text(&document));
    let description = first_meta(&document, DESCRIPTION_KEYS);
    let images = collect_images(&document, base_url);
    let site_name = first_meta(&document, SITE_NAME_KEYS).or_else(|| Some(get_domain_from_url(base_url.as_str())));
    let is_valid = title.is_some() || description.is_some();

    Metadata { title, description, images, site_name, final_url: base_url.to_string(), is_valid }
}

/// Metadata for a URL that serves an image directly.
pub fn image_metadata(final_url: &Url) -> Metadata {
    Metadata {
        title: None,
        description: None,
        images: vec![final_url.to_string()],
        site_name: Some(get_domain_from_url(final_url.as_str())),
        final_url: final_url.to_string(),
        is_valid: true,
    }
}
