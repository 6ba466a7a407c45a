//! Feed layout: posts become cards laid out on a vertical line grid.
//!
//! Each card is a wrapped summary, a photo slot, and a separator line. The
//! photo slot's height starts as an aspect-ratio reserve computed from the
//! wire's `PhotoSize` and is replaced by the rendered protocol height once
//! the photo arrives, at which point the whole feed is re-laid out (the
//! scroll offset is clamped by the viewport).

use std::collections::HashMap;
use std::ops::Range;

use unicode_width::UnicodeWidthChar;

use crate::api::Post;

/// Photo display width as a fraction of the card width, in percent.
const PHOTO_WIDTH_PERCENT: u16 = 65;

/// Rows reserved for a photo before its real rendered height is known.
const RESERVED_ROWS_MIN: u16 = 4;
const RESERVED_ROWS_MAX: u16 = 24;

/// Rows used for the static placeholder box of a photo-less post.
const PLACEHOLDER_ROWS: u16 = 3;

/// Terminal cells are roughly twice as tall as wide; photo row estimates
/// divide by this so the reserve is close to the final rendered height.
const CELL_ASPECT: u32 = 2;

/// The photo area of one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSlot {
    /// URL of the first photo, or `None` for a photo-less post (the slot
    /// then always renders the static placeholder).
    pub url: Option<String>,
    /// Rows this slot occupies, in feed-line coordinates.
    pub rows: Range<usize>,
    /// Display width in columns.
    pub width_cols: u16,
}

/// One post laid out as a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Index of the post this card displays.
    pub post_index: usize,
    /// Summary text wrapped to the card width.
    pub summary_lines: Vec<String>,
    /// All rows of the card including its trailing separator.
    pub rows: Range<usize>,
    pub photo: PhotoSlot,
}

/// The whole feed laid out on a line grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedLayout {
    cards: Vec<Card>,
    total_rows: usize,
    width: u16,
}

impl FeedLayout {
    /// Lay out `posts` for a card area `width` columns wide.
    ///
    /// `photo_heights` carries the real rendered height (in rows) for photos
    /// whose terminal protocol already exists, keyed by URL; other photos get
    /// an aspect-ratio reserve.
    pub fn build(posts: &[Post], width: u16, photo_heights: &HashMap<String, u16>) -> Self {
        let width = width.max(1);
        let mut cards = Vec::with_capacity(posts.len());
        let mut row = 0usize;

        for (post_index, post) in posts.iter().enumerate() {
            let start = row;
            let summary_lines = wrap_text(&post.summary, width as usize);
            row += summary_lines.len();

            let (url, slot_rows, width_cols) = match post.photos.first() {
                Some(photo) => {
                    let size = &photo.original_size;
                    let width_cols = photo_width_cols(width);
                    let height = photo_heights
                        .get(&size.url)
                        .copied()
                        .unwrap_or_else(|| reserve_rows(size.width, size.height, width_cols));
                    (Some(size.url.clone()), height, width_cols)
                }
                None => (None, PLACEHOLDER_ROWS, photo_width_cols(width)),
            };
            let photo = PhotoSlot {
                url,
                rows: row..row + slot_rows as usize,
                width_cols,
            };
            row += slot_rows as usize;

            // Separator line between cards.
            row += 1;

            cards.push(Card {
                post_index,
                summary_lines,
                rows: start..row,
                photo,
            });
        }

        Self {
            cards,
            total_rows: row,
            width,
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn card(&self, post_index: usize) -> Option<&Card> {
        self.cards.get(post_index)
    }

    /// Cards whose rows overlap `range` (e.g. the viewport plus lookahead).
    pub fn cards_in_rows(&self, range: Range<usize>) -> impl Iterator<Item = &Card> {
        self.cards
            .iter()
            .filter(move |card| card.rows.end > range.start && card.rows.start < range.end)
    }

    /// The card covering a feed line, for mouse hit-testing.
    pub fn card_at_row(&self, row: usize) -> Option<&Card> {
        self.cards.iter().find(|card| card.rows.contains(&row))
    }
}

fn photo_width_cols(width: u16) -> u16 {
    #[allow(clippy::cast_possible_truncation)]
    // 65% of a u16 always fits back into a u16.
    let cols = (u32::from(width) * u32::from(PHOTO_WIDTH_PERCENT) / 100) as u16;
    cols.max(1)
}

/// Estimate rendered rows for a photo of `px_width` x `px_height` pixels
/// scaled to `width_cols` columns.
fn reserve_rows(px_width: u32, px_height: u32, width_cols: u16) -> u16 {
    if px_width == 0 || px_height == 0 {
        return RESERVED_ROWS_MIN;
    }
    let rows = u64::from(px_height) * u64::from(width_cols) / u64::from(px_width) / u64::from(CELL_ASPECT);
    u16::try_from(rows)
        .unwrap_or(RESERVED_ROWS_MAX)
        .clamp(RESERVED_ROWS_MIN, RESERVED_ROWS_MAX)
}

/// Word-wrap `text` to `width` columns, measuring with `unicode-width`.
///
/// Always yields at least one (possibly empty) line so every card has a
/// summary row. Words wider than the line are hard-broken.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0usize;

    for word in text.split_whitespace() {
        let word_width: usize = word.chars().map(|c| c.width().unwrap_or(0)).sum();
        let sep = usize::from(!line.is_empty());

        if line_width + sep + word_width <= width {
            if sep == 1 {
                line.push(' ');
            }
            line.push_str(word);
            line_width += sep + word_width;
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
            line_width = 0;
        }

        if word_width <= width {
            line.push_str(word);
            line_width = word_width;
        } else {
            // Hard-break an over-long word.
            for c in word.chars() {
                let w = c.width().unwrap_or(0);
                if line_width + w > width && !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                line.push(c);
                line_width += w;
            }
        }
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}
