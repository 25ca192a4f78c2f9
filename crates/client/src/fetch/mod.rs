//! HTTP transport for the default extraction engine.
//!
//! - Redirects are followed up to a fixed limit
//! - At most `max_bytes` of the body are read; previews only need the head
//!   of a document, so longer bodies are truncated rather than rejected
//! - Timeouts map to [`PreviewError::Timeout`], everything else on the wire
//!   to [`PreviewError::Network`]

use bytes::{Bytes, BytesMut};
use linkpeek_core::{AppConfig, PreviewError};
use reqwest::{Client, Url, header};
use std::time::{Duration, Instant};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "linkpeek/0.1")
    pub user_agent: String,

    /// Maximum number of body bytes to read (default: 2MB)
    pub max_bytes: usize,

    /// Request timeout (default: 10s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "linkpeek/0.1".to_string(),
            max_bytes: 2 * 1024 * 1024,
            timeout: Duration::from_millis(10_000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The final URL after redirects
    pub final_url: Url,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body, possibly truncated
    pub bytes: Bytes,
    /// Whether the body was cut at `max_bytes`
    pub truncated: bool,
}

impl FetchResponse {
    /// Whether the body is an HTML document.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_none_or(|ct| ct.contains("text/html") || ct.contains("application/xhtml"))
    }

    /// Whether the body is an image.
    pub fn is_image(&self) -> bool {
        self.content_type.as_deref().is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// Append `chunk` to `body` without growing it past `max_bytes`.
///
/// Returns `None` while there is room for more, otherwise whether any bytes
/// were dropped.
fn append_capped(body: &mut BytesMut, chunk: &[u8], max_bytes: usize) -> Option<bool> {
    let room = max_bytes.saturating_sub(body.len());
    if chunk.len() < room {
        body.extend_from_slice(chunk);
        return None;
    }
    body.extend_from_slice(&chunk[..room]);
    Some(chunk.len() > room)
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> PreviewError {
    if err.is_timeout() {
        PreviewError::Timeout(format!("{url}: {err}"))
    } else {
        PreviewError::Network(format!("{url}: {err}"))
    }
}

/// HTTP fetch client.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, PreviewError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| PreviewError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Fetch a URL, returning at most `max_bytes` of its body.
    ///
    /// With `no_cache`, intermediaries are asked to revalidate.
    pub async fn fetch(&self, url_str: &str, no_cache: bool) -> Result<FetchResponse, PreviewError> {
        let start = Instant::now();
        let url = Url::parse(url_str).map_err(|e| PreviewError::InvalidInput(format!("{url_str}: {e}")))?;

        let mut request = self.http.get(url.clone()).header(
            header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/*;q=0.8,*/*;q=0.5",
        );
        if no_cache {
            request = request.header(header::CACHE_CONTROL, "no-cache");
        }

        let mut response = request.send().await.map_err(|e| map_reqwest_error(url_str, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PreviewError::Network(format!("{url_str}: status {}", status.as_u16())));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_ascii_lowercase());

        let mut body = BytesMut::new();
        let mut truncated = false;
        while let Some(chunk) = response.chunk().await.map_err(|e| map_reqwest_error(url_str, e))? {
            if let Some(dropped) = append_capped(&mut body, &chunk, self.config.max_bytes) {
                truncated = dropped;
                break;
            }
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes{})",
            url,
            final_url,
            fetch_ms,
            body.len(),
            if truncated { ", truncated" } else { "" }
        );

        Ok(FetchResponse { final_url, content_type, bytes: body.freeze(), truncated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(content_type: Option<&str>) -> FetchResponse {
        FetchResponse {
            final_url: Url::parse("https://example.com/redirected").unwrap(),
            content_type: content_type.map(str::to_string),
            bytes: Bytes::new(),
            truncated: false,
        }
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "linkpeek/0.1");
        assert_eq!(config.max_bytes, 2 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(10_000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "custom/2.0".into(), timeout_ms: 2_500, max_bytes: 1024, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "custom/2.0");
        assert_eq!(config.timeout, Duration::from_millis(2_500));
        assert_eq!(config.max_bytes, 1024);
    }

    #[test]
    fn test_content_type_checks() {
        assert!(response_with(Some("text/html; charset=utf-8")).is_html());
        assert!(response_with(None).is_html());
        assert!(!response_with(Some("application/pdf")).is_html());
        assert!(response_with(Some("image/png")).is_image());
        assert!(!response_with(Some("text/html")).is_image());
    }

    #[test]
    fn test_append_capped() {
        let mut body = BytesMut::new();
        assert_eq!(append_capped(&mut body, b"abc", 8), None);
        assert_eq!(append_capped(&mut body, b"defghijk", 8), Some(true));
        assert_eq!(&body[..], b"abcdefgh");

        let mut exact = BytesMut::new();
        assert_eq!(append_capped(&mut exact, b"abcd", 4), Some(false));
        assert_eq!(&exact[..], b"abcd");

        assert_eq!(append_capped(&mut exact, b"e", 4), Some(true));
        assert_eq!(exact.len(), 4);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_rejects_unparseable_url() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let result = client.fetch("not a url", false).await;
        assert!(matches!(result, Err(PreviewError::InvalidInput(_))));
    }
}
