//! End-to-end tests of the fetch → decode → present pipeline against a
//! fixture payload, exercising the same path the refresh worker takes.

use tumbless::api::{FetchError, RefreshError, decode, screen_response};
use tumbless::app::{Message, Model, update};
use tumbless::feed::{Feed, RowImage};

const FEED_JSON: &[u8] = include_bytes!("fixtures/feed.json");

fn decoded_posts() -> Vec<tumbless::api::Post> {
    decode(FEED_JSON).unwrap().response.posts
}

#[test]
fn test_decode_is_deterministic_over_identical_bytes() {
    let first = decode(FEED_JSON).unwrap();
    let second = decode(FEED_JSON).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_screened_bytes_reach_the_decoder_intact() {
    let bytes = screen_response(200, FEED_JSON.to_vec()).unwrap();
    let blog = decode(&bytes).unwrap();
    assert_eq!(blog.response.posts.len(), 3);
}

#[test]
fn test_empty_2xx_body_never_reaches_the_decoder() {
    assert_eq!(
        screen_response(204, Vec::new()),
        Err(FetchError::EmptyBody)
    );
}

#[test]
fn test_fixture_feed_counts_and_photo_rows() {
    let posts = decoded_posts();

    let mut feed = Feed::new();
    feed.replace(posts);
    assert_eq!(feed.count(), 3);

    // Post #2 has no photos; its row placeholders without a request.
    assert!(feed.item_at(1).photos.is_empty());

    let mut requests = Vec::new();
    for i in 0..feed.count() {
        requests.extend(feed.request_image(i));
    }
    assert_eq!(feed.row_image(1), RowImage::Placeholder);

    // Rows 0 and 2 issue exactly one request each, for their first photo.
    let urls: Vec<&str> = requests.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://64.media.example.com/hony/745208841/1280.jpg",
            "https://64.media.example.com/hony/745208843/1280.jpg",
        ]
    );

    // Re-running the request pass issues nothing further.
    for i in 0..feed.count() {
        assert!(feed.request_image(i).is_none());
    }
}

#[test]
fn test_failed_refresh_leaves_displayed_list_unchanged() {
    let model = Model::new("humansofnewyork", (80, 24));
    let model = update(model, Message::RefreshFinished(Ok(decoded_posts())));
    assert_eq!(model.feed.count(), 3);

    // A later refresh hits malformed JSON; the decode error must not
    // partially replace anything.
    let malformed = br#"{"response": {"posts": [{"photos": []}]}}"#;
    let decode_err = decode(malformed).unwrap_err();
    let model = update(model, Message::Refresh);
    let model = update(
        model,
        Message::RefreshFinished(Err(RefreshError::Decode(decode_err))),
    );

    assert_eq!(model.feed.count(), 3);
    assert_eq!(
        model.feed.item_at(0).summary,
        "“I moved here for a fresh start.”"
    );
    assert!(!model.refresh_in_flight);
}

#[test]
fn test_row_reuse_discards_stale_photo_result() {
    let model = Model::new("humansofnewyork", (80, 24));
    let mut model = update(model, Message::RefreshFinished(Ok(decoded_posts())));

    // Row 0's download is in flight when the whole feed is replaced and the
    // row comes to show a different item.
    let stale = model
        .request_visible_photos()
        .into_iter()
        .find(|r| r.index == 0)
        .unwrap();

    let replacement = decode(
        br#"{"response": {"posts": [
            {"summary": "new occupant", "photos": [
                {"original_size": {"url": "https://64.media.example.com/other/1280.jpg", "width": 800, "height": 600}}
            ]}
        ]}}"#,
    )
    .unwrap()
    .response
    .posts;
    let mut model = update(
        std::mem::take(&mut model),
        Message::RefreshFinished(Ok(replacement)),
    );
    let current = model
        .request_visible_photos()
        .into_iter()
        .find(|r| r.index == 0)
        .unwrap();

    // The stale request resolves successfully — and must be dropped.
    model.apply_photo(
        &stale,
        Ok(image::DynamicImage::ImageRgba8(image::RgbaImage::new(4, 4))),
    );
    assert_eq!(model.row_image(0), RowImage::Requesting(current.token));

    // The current item's outcome is what the row displays.
    model.apply_photo(
        &current,
        Err(tumbless::image::ImageError::Download("timed out".to_string())),
    );
    assert_eq!(model.row_image(0), RowImage::Placeholder);
}
