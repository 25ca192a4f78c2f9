//! detect_urls tool implementation.
//!
//! Finds web addresses in free text. No network requests are made.

use linkpeek_client::{detect_url_type, detect_urls, get_domain_from_url};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Input parameters for detect_urls tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectUrlsParams {
    /// Text to scan.
    pub text: String,
}

/// A URL found in the input text.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectedUrl {
    /// The URL, always with a scheme.
    pub url: String,
    /// Byte offset of the match start in the input.
    pub start: usize,
    /// Byte offset one past the match end in the input.
    pub end: usize,
    /// Host without a leading `www.`.
    pub domain: String,
    /// Coarse content category.
    pub url_type: String,
}

/// Output structure for detect_urls tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectUrlsOutput {
    /// Matches in order of occurrence.
    pub matches: Vec<DetectedUrl>,
}

/// Implementation of the detect_urls tool.
pub fn detect_impl(params: DetectUrlsParams) -> Result<CallToolResult, McpError> {
    let matches = detect_urls(&params.text)
        .into_iter()
        .map(|m| DetectedUrl {
            domain: get_domain_from_url(&m.url),
            url_type: detect_url_type(&m.url).as_str().to_string(),
            url: m.url,
            start: m.start,
            end: m.end,
        })
        .collect();

    json_result(&DetectUrlsOutput { matches })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::parse_output;

    #[test]
    fn test_detect_in_text() {
        let params = DetectUrlsParams { text: "see www.youtube.com/watch?v=1 and https://amazon.com/dp/B0".into() };

        let output: DetectUrlsOutput = parse_output(&detect_impl(params).unwrap());

        assert_eq!(output.matches.len(), 2);
        assert_eq!(output.matches[0].url, "https://www.youtube.com/watch?v=1");
        assert_eq!(output.matches[0].start, 4);
        assert_eq!(output.matches[0].domain, "youtube.com");
        assert_eq!(output.matches[0].url_type, "video");
        assert_eq!(output.matches[1].url, "https://amazon.com/dp/B0");
        assert_eq!(output.matches[1].url_type, "product");
    }

    #[test]
    fn test_detect_nothing() {
        let params = DetectUrlsParams { text: "no links here".into() };
        let output: DetectUrlsOutput = parse_output(&detect_impl(params).unwrap());
        assert!(output.matches.is_empty());
    }
}
