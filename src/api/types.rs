//! Wire types for the Tumblr posts endpoint.
//!
//! The real API wraps the post list in a `meta`/`response` envelope with many
//! more fields than we care about; serde ignores the extras. Only the shape
//! below is required — anything missing or mistyped fails the whole decode.

use serde::Deserialize;

/// Top-level envelope returned by the posts endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Blog {
    pub response: BlogResponse,
}

/// The `response` object holding the ordered post list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlogResponse {
    pub posts: Vec<Post>,
}

/// One blog entry: a text summary and zero or more photos.
///
/// `photos` may be empty — the endpoint occasionally mixes in posts without
/// one, and "no photo" is a valid state, not an error. `summary` is always
/// present (possibly the empty string); a post without it is a decode error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Post {
    pub summary: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl Post {
    /// URL of the first photo's full-size rendition, if the post has one.
    pub fn first_photo_url(&self) -> Option<&str> {
        self.photos.first().map(|p| p.original_size.url.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Photo {
    pub original_size: PhotoSize,
}

/// A single rendition of a photo.
///
/// Width and height are kept so the feed layout can reserve rows with the
/// right aspect ratio before the pixels arrive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhotoSize {
    pub url: String,
    pub width: u32,
    pub height: u32,
}
