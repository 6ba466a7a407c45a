//! Tumblr API client: fetch the posts payload and decode it.

mod fetch;
mod types;

pub use fetch::{DecodeError, FetchError, Fetcher, decode, screen_response};
pub use types::{Blog, BlogResponse, Photo, PhotoSize, Post};

/// A refresh fails either on the wire or in the decoder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("bad payload: {0}")]
    Decode(#[from] DecodeError),
}

/// Run the full fetch → decode pipeline once, yielding the fresh post list.
///
/// # Errors
///
/// Propagates the first failing stage; the caller's current list is expected
/// to stay untouched on error.
pub fn refresh_posts(fetcher: &Fetcher) -> Result<Vec<Post>, RefreshError> {
    let bytes = fetcher.fetch()?;
    let blog = decode(&bytes)?;
    Ok(blog.response.posts)
}
