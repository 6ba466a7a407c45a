//! Benchmarks for feed layout.

use std::collections::HashMap;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tumbless::api::decode;
use tumbless::ui::layout::FeedLayout;

const FEED_JSON: &[u8] = include_bytes!("../tests/fixtures/feed.json");

fn bench_decode_payload(c: &mut Criterion) {
    c.bench_function("decode_payload", |b| {
        b.iter(|| decode(black_box(FEED_JSON)).unwrap())
    });
}

fn bench_layout_feed(c: &mut Criterion) {
    let posts = decode(FEED_JSON).unwrap().response.posts;
    // Repeat the fixture into a feed large enough to be interesting.
    let posts: Vec<_> = posts
        .iter()
        .cycle()
        .take(200)
        .cloned()
        .collect();
    let heights = HashMap::new();

    c.bench_function("layout_200_posts", |b| {
        b.iter(|| FeedLayout::build(black_box(&posts), black_box(78), &heights))
    });
}

criterion_group!(benches, bench_decode_payload, bench_layout_feed);
criterion_main!(benches);
