//! Fetching and decoding the posts payload.
//!
//! One GET against the posts endpoint, the full body read into memory, then
//! an all-or-nothing JSON decode. No retries, no backoff — a failed refresh
//! leaves the previously displayed feed untouched.

use std::time::Duration;

use thiserror::Error;

use super::types::Blog;

const API_BASE: &str = "https://api.tumblr.com/v2/blog";
const USER_AGENT: &str = concat!("tumbless/", env!("CARGO_PKG_VERSION"));

/// Why a fetch produced no payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network-level failure (connect, DNS, TLS, or read).
    #[error("transport: {0}")]
    Transport(String),
    /// Status outside the 200-299 range.
    #[error("unexpected status {0}")]
    BadStatus(u16),
    /// 2xx status but zero body bytes.
    #[error("empty response body")]
    EmptyBody,
}

/// Why a payload failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("decode: {0}")]
pub struct DecodeError(pub String);

/// Issues the posts request for one blog.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::blocking::Client,
    url: String,
}

impl Fetcher {
    /// Create a fetcher for `blog`, authenticating with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the HTTP client cannot be constructed.
    pub fn new(blog: &str, api_key: &str) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: posts_url(blog, api_key),
        })
    }

    /// Fetch the raw posts payload.
    ///
    /// Succeeds only for a 2xx status with a non-empty body.
    ///
    /// # Errors
    ///
    /// `Transport` for network failures, `BadStatus` for non-2xx responses,
    /// `EmptyBody` for a 2xx response with no bytes.
    pub fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        screen_response(status, bytes.to_vec())
    }
}

/// Acceptance rule for a completed response: 2xx and at least one byte.
///
/// Split out of [`Fetcher::fetch`] so the status/body edge cases are
/// testable without a socket.
pub fn screen_response(status: u16, bytes: Vec<u8>) -> Result<Vec<u8>, FetchError> {
    if !(200..=299).contains(&status) {
        return Err(FetchError::BadStatus(status));
    }
    if bytes.is_empty() {
        return Err(FetchError::EmptyBody);
    }
    Ok(bytes)
}

/// Decode a posts payload into the [`Blog`] envelope.
///
/// All-or-nothing: any missing or mistyped required field fails the whole
/// payload. Fields we don't model are ignored.
///
/// # Errors
///
/// Returns `DecodeError` with serde's diagnostic message.
pub fn decode(bytes: &[u8]) -> Result<Blog, DecodeError> {
    serde_json::from_slice(bytes).map_err(|e| DecodeError(e.to_string()))
}

fn posts_url(blog: &str, api_key: &str) -> String {
    format!("{API_BASE}/{blog}/posts/photo?api_key={api_key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = br#"{
        "meta": {"status": 200, "msg": "OK"},
        "response": {
            "blog": {"title": "ignored"},
            "posts": [
                {
                    "type": "photo",
                    "summary": "First",
                    "photos": [
                        {"caption": "", "original_size": {"url": "https://example.com/1.jpg", "width": 1280, "height": 847}}
                    ]
                },
                {"type": "text", "summary": "No photo here"},
                {
                    "summary": "",
                    "photos": [
                        {"original_size": {"url": "https://example.com/3.jpg", "width": 500, "height": 500}}
                    ]
                }
            ]
        }
    }"#;

    #[test]
    fn test_screen_response_accepts_2xx() {
        for status in [200, 204, 299] {
            assert_eq!(
                screen_response(status, b"x".to_vec()),
                Ok(b"x".to_vec()),
                "status {status} should be accepted"
            );
        }
    }

    #[test]
    fn test_screen_response_rejects_non_2xx() {
        for status in [199, 300, 404, 500] {
            assert_eq!(
                screen_response(status, b"x".to_vec()),
                Err(FetchError::BadStatus(status)),
                "status {status} should be rejected"
            );
        }
    }

    #[test]
    fn test_screen_response_empty_body_is_not_a_decode_attempt() {
        assert_eq!(screen_response(200, Vec::new()), Err(FetchError::EmptyBody));
    }

    #[test]
    fn test_decode_sample_payload() {
        let blog = decode(SAMPLE).unwrap();
        let posts = &blog.response.posts;
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].summary, "First");
        assert_eq!(posts[0].first_photo_url(), Some("https://example.com/1.jpg"));
        assert!(posts[1].photos.is_empty());
        assert_eq!(posts[2].summary, "");
        assert_eq!(posts[2].photos[0].original_size.width, 500);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let a = decode(SAMPLE).unwrap();
        let b = decode(SAMPLE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let payload = br#"{"response": {"posts": [], "total_posts": 42}, "meta": {}}"#;
        let blog = decode(payload).unwrap();
        assert!(blog.response.posts.is_empty());
    }

    #[test]
    fn test_decode_missing_summary_fails_whole_payload() {
        let payload = br#"{"response": {"posts": [
            {"summary": "ok"},
            {"photos": []}
        ]}}"#;
        let err = decode(payload).unwrap_err();
        assert!(err.0.contains("summary"), "diagnostic was: {}", err.0);
    }

    #[test]
    fn test_decode_mistyped_posts_fails() {
        let payload = br#"{"response": {"posts": "nope"}}"#;
        assert!(decode(payload).is_err());
    }

    #[test]
    fn test_decode_malformed_json_fails() {
        assert!(decode(b"{not json").is_err());
    }

    #[test]
    fn test_posts_url_shape() {
        let url = posts_url("humansofnewyork", "KEY");
        assert_eq!(
            url,
            "https://api.tumblr.com/v2/blog/humansofnewyork/posts/photo?api_key=KEY"
        );
    }
}
