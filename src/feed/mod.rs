//! The in-memory feed and its per-row image bookkeeping.
//!
//! [`Feed`] is the single owner of the displayed post list. The only update
//! operation is [`Feed::replace`] — a full swap, no diffing — and all image
//! request/completion traffic goes through request tokens so a result that
//! arrives after its row was replaced or re-requested is discarded instead of
//! overwriting the row's current item.

use crate::api::Post;

/// Identity of one image request.
///
/// Tokens are minted from a monotonically increasing counter, so no two
/// requests ever share one — including across [`Feed::replace`] boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

/// Image state of a single feed row.
///
/// `Empty → Requesting → {Resolved | Placeholder}`, reset to `Empty` whenever
/// the backing list is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowImage {
    /// Nothing decided yet; no request in flight.
    Empty,
    /// A request with this token is in flight.
    Requesting(RequestToken),
    /// The row's photo arrived and is displayable.
    Resolved,
    /// Static fallback: the post has no photo, or its download failed.
    Placeholder,
}

/// A request handed to the image loader: which row, under which token,
/// fetching which URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub index: usize,
    pub token: RequestToken,
    pub url: String,
}

/// Owns the current post list and the image slot per row.
#[derive(Debug, Default)]
pub struct Feed {
    posts: Vec<Post>,
    rows: Vec<RowImage>,
    next_token: u64,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of posts currently held.
    pub fn count(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// The post at `index`.
    ///
    /// # Panics
    ///
    /// Out-of-range access is a programming error, not a recoverable state.
    pub fn item_at(&self, index: usize) -> &Post {
        &self.posts[index]
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Swap in a fresh post list and reset every image slot.
    ///
    /// Outstanding request tokens are implicitly invalidated: no row is in
    /// `Requesting` afterwards, so any late completion fails the token check.
    pub fn replace(&mut self, posts: Vec<Post>) {
        self.rows = vec![RowImage::Empty; posts.len()];
        self.posts = posts;
    }

    /// Image state of the row at `index`.
    pub fn row_image(&self, index: usize) -> RowImage {
        self.rows[index]
    }

    /// Ask for the row's photo, if it needs one.
    ///
    /// A photo-less post goes straight to `Placeholder` and no request is
    /// issued. A row already requesting, resolved, or placeholdered is left
    /// alone. Otherwise a token is minted, the row enters `Requesting`, and
    /// the returned request names the first photo's URL.
    pub fn request_image(&mut self, index: usize) -> Option<ImageRequest> {
        if self.rows[index] != RowImage::Empty {
            return None;
        }
        let Some(url) = self.posts[index].first_photo_url() else {
            self.rows[index] = RowImage::Placeholder;
            return None;
        };
        let token = RequestToken(self.next_token);
        self.next_token += 1;
        self.rows[index] = RowImage::Requesting(token);
        Some(ImageRequest {
            index,
            token,
            url: url.to_string(),
        })
    }

    /// Mark a row resolved without a request (its image was already cached).
    ///
    /// Only an `Empty` row with a photo is eligible; anything else is left
    /// untouched.
    pub fn resolve_from_cache(&mut self, index: usize) {
        if self.rows[index] == RowImage::Empty && self.posts[index].first_photo_url().is_some() {
            self.rows[index] = RowImage::Resolved;
        }
    }

    /// Apply an image completion, discarding it when stale.
    ///
    /// The completion is applied only if the row still exists and is still
    /// waiting on exactly this token; otherwise the row was replaced or
    /// re-requested in the meantime and the result must not touch it.
    /// Returns the row index when applied, `None` when discarded.
    pub fn complete_image(&mut self, request: &ImageRequest, ok: bool) -> Option<usize> {
        let slot = self.rows.get_mut(request.index)?;
        if *slot != RowImage::Requesting(request.token) {
            return None;
        }
        *slot = if ok {
            RowImage::Resolved
        } else {
            RowImage::Placeholder
        };
        Some(request.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Photo, PhotoSize, Post};

    fn photo_post(summary: &str, url: &str) -> Post {
        Post {
            summary: summary.to_string(),
            photos: vec![Photo {
                original_size: PhotoSize {
                    url: url.to_string(),
                    width: 1280,
                    height: 720,
                },
            }],
        }
    }

    fn text_post(summary: &str) -> Post {
        Post {
            summary: summary.to_string(),
            photos: Vec::new(),
        }
    }

    #[test]
    fn test_count_tracks_replace() {
        let mut feed = Feed::new();
        assert_eq!(feed.count(), 0);

        feed.replace(vec![text_post("a"), text_post("b")]);
        assert_eq!(feed.count(), 2);

        feed.replace(Vec::new());
        assert_eq!(feed.count(), 0);
        assert!(feed.is_empty());
    }

    #[test]
    fn test_item_at_returns_posts_in_order() {
        let mut feed = Feed::new();
        feed.replace(vec![text_post("first"), text_post("second")]);
        assert_eq!(feed.item_at(0).summary, "first");
        assert_eq!(feed.item_at(1).summary, "second");
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_item_at_out_of_range_panics() {
        let feed = Feed::new();
        let _ = feed.item_at(0);
    }

    #[test]
    fn test_photoless_row_placeholders_without_request() {
        let mut feed = Feed::new();
        feed.replace(vec![text_post("no photo")]);

        assert_eq!(feed.request_image(0), None);
        assert_eq!(feed.row_image(0), RowImage::Placeholder);
    }

    #[test]
    fn test_each_row_issues_exactly_one_request() {
        let mut feed = Feed::new();
        feed.replace(vec![
            photo_post("a", "https://example.com/a.jpg"),
            text_post("b"),
            photo_post("c", "https://example.com/c.jpg"),
        ]);

        let mut requests = Vec::new();
        for _ in 0..3 {
            for i in 0..feed.count() {
                requests.extend(feed.request_image(i));
            }
        }

        assert_eq!(requests.len(), 2, "rows 0 and 2 request once each");
        assert_eq!(requests[0].url, "https://example.com/a.jpg");
        assert_eq!(requests[1].url, "https://example.com/c.jpg");
        assert_eq!(feed.row_image(1), RowImage::Placeholder);
    }

    #[test]
    fn test_completion_applies_success_and_failure() {
        let mut feed = Feed::new();
        feed.replace(vec![
            photo_post("a", "https://example.com/a.jpg"),
            photo_post("b", "https://example.com/b.jpg"),
        ]);
        let req_a = feed.request_image(0).unwrap();
        let req_b = feed.request_image(1).unwrap();

        assert_eq!(feed.complete_image(&req_a, true), Some(0));
        assert_eq!(feed.row_image(0), RowImage::Resolved);

        assert_eq!(feed.complete_image(&req_b, false), Some(1));
        assert_eq!(feed.row_image(1), RowImage::Placeholder);
    }

    #[test]
    fn test_stale_completion_after_replace_is_discarded() {
        let mut feed = Feed::new();
        feed.replace(vec![photo_post("a", "https://example.com/a.jpg")]);
        let stale = feed.request_image(0).unwrap();

        // Row 0 now shows a different item with its own in-flight request.
        feed.replace(vec![photo_post("b", "https://example.com/b.jpg")]);
        let current = feed.request_image(0).unwrap();

        assert_eq!(feed.complete_image(&stale, true), None);
        assert_eq!(feed.row_image(0), RowImage::Requesting(current.token));

        assert_eq!(feed.complete_image(&current, true), Some(0));
        assert_eq!(feed.row_image(0), RowImage::Resolved);
    }

    #[test]
    fn test_stale_completion_out_of_range_is_discarded() {
        let mut feed = Feed::new();
        feed.replace(vec![
            photo_post("a", "https://example.com/a.jpg"),
            photo_post("b", "https://example.com/b.jpg"),
        ]);
        let stale = feed.request_image(1).unwrap();

        feed.replace(vec![photo_post("only", "https://example.com/c.jpg")]);
        assert_eq!(feed.complete_image(&stale, true), None);
    }

    #[test]
    fn test_resolve_from_cache_skips_request() {
        let mut feed = Feed::new();
        feed.replace(vec![photo_post("a", "https://example.com/a.jpg")]);
        feed.resolve_from_cache(0);
        assert_eq!(feed.row_image(0), RowImage::Resolved);
        assert_eq!(feed.request_image(0), None);
    }

    #[test]
    fn test_resolve_from_cache_ignores_photoless_row() {
        let mut feed = Feed::new();
        feed.replace(vec![text_post("a")]);
        feed.resolve_from_cache(0);
        assert_eq!(feed.row_image(0), RowImage::Empty);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn count_always_equals_replaced_length(len in 0..200usize) {
                let posts: Vec<Post> = (0..len).map(|i| text_post(&format!("post {i}"))).collect();
                let mut feed = Feed::new();
                feed.replace(posts);
                prop_assert_eq!(feed.count(), len);
            }

            #[test]
            fn tokens_are_never_reused(rounds in 1..20usize) {
                let mut feed = Feed::new();
                let mut seen = std::collections::HashSet::new();
                for round in 0..rounds {
                    feed.replace(vec![photo_post(
                        &format!("round {round}"),
                        "https://example.com/p.jpg",
                    )]);
                    let req = feed.request_image(0).unwrap();
                    prop_assert!(seen.insert(req.token), "token reused across replace");
                }
            }
        }
    }
}
