//! URL detection, canonicalization and classification.
//!
//! ### Canonicalization
//! - Default scheme to `https://` when missing
//! - Drop fragments and tracking query parameters
//! - Keep the remaining query intact (order and raw values)
//! - No trailing slash
//!
//! ### Detection
//! - `http://`, `https://` and `www.` addresses in free text
//! - Byte offsets into the original text
//!
//! ### Classification
//! - Ordered host/path rules: video, social media, image, product
//! - Everything else is an article

pub mod classify;
pub mod detect;
pub mod normalize;

pub use classify::{UrlType, detect_url_type};
pub use detect::{UrlMatch, detect_urls, extract_first_url};
pub use normalize::{get_domain_from_url, normalize_url};
