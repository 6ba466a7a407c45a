use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::Model;
use crate::feed::RowImage;

use super::{FEED_LEFT_PADDING, images, status, style};

/// Render the complete UI.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();

    let toast_active = model.active_toast().is_some();
    let footer_rows = 1 + u16::from(toast_active);
    // Reserve the last line for the status bar (+ one toast line when active).
    let feed_area = Rect {
        height: area.height.saturating_sub(footer_rows),
        ..area
    };
    let toast_area = Rect {
        y: area.y + area.height.saturating_sub(2),
        height: 1,
        ..area
    };
    let status_area = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: 1,
        ..area
    };

    render_feed(model, frame, feed_area);
    images::render_photos(model, frame, feed_area);

    status::render_status_bar(model, frame, status_area);
    if toast_active {
        status::render_toast_bar(model, frame, toast_area);
    }

    if model.help_visible {
        render_help_overlay(frame, area);
    }
}

/// Draw card text, placeholder boxes, and separators for the visible rows.
/// Resolved photos are blitted afterwards by [`images::render_photos`].
fn render_feed(model: &Model, frame: &mut Frame, area: Rect) {
    if model.feed.is_empty() {
        render_empty_feed(model, frame, area);
        return;
    }

    let offset = model.viewport.offset();
    let visible = offset..offset + area.height as usize;
    let text_x = area.x + FEED_LEFT_PADDING;
    let buf = frame.buffer_mut();

    for card in model.layout.cards_in_rows(visible.clone()) {
        let selected = model.selected == Some(card.post_index);

        for (i, line) in card.summary_lines.iter().enumerate() {
            let row = card.rows.start + i;
            if !visible.contains(&row) {
                continue;
            }
            #[allow(clippy::cast_possible_truncation)]
            let y = area.y + (row - offset) as u16;
            buf.set_stringn(
                text_x,
                y,
                line,
                area.width.saturating_sub(FEED_LEFT_PADDING) as usize,
                style::summary_style(selected),
            );
        }

        let state = model.feed.row_image(card.post_index);
        if state != RowImage::Resolved {
            render_photo_slot_fallback(card, state, offset, &visible, area, buf);
        }

        let separator_row = card.rows.end - 1;
        if visible.contains(&separator_row) {
            #[allow(clippy::cast_possible_truncation)]
            let y = area.y + (separator_row - offset) as u16;
            let rule = "─".repeat(area.width.saturating_sub(FEED_LEFT_PADDING) as usize);
            buf.set_stringn(text_x, y, &rule, rule.len(), style::separator_style());
        }
    }
}

/// Fill a photo slot that has no displayable protocol: the static placeholder
/// for photo-less or failed rows, a loading box while a download is pending.
fn render_photo_slot_fallback(
    card: &super::layout::Card,
    state: RowImage,
    offset: usize,
    visible: &std::ops::Range<usize>,
    area: Rect,
    buf: &mut ratatui::buffer::Buffer,
) {
    let (label, slot_style) = match state {
        RowImage::Placeholder => {
            if card.photo.url.is_none() {
                ("· no photo ·", style::placeholder_style())
            } else {
                ("· photo unavailable ·", style::placeholder_style())
            }
        }
        RowImage::Empty | RowImage::Requesting(_) => ("· loading ·", style::loading_style()),
        RowImage::Resolved => return,
    };

    let slot = &card.photo.rows;
    let label_row = slot.start + slot.len() / 2;
    let slot_width = card.photo.width_cols.min(area.width.saturating_sub(FEED_LEFT_PADDING));
    #[allow(clippy::cast_possible_truncation)]
    let label_cols = label.chars().count() as u16;

    for row in slot.clone() {
        if !visible.contains(&row) {
            continue;
        }
        #[allow(clippy::cast_possible_truncation)]
        let y = area.y + (row - offset) as u16;
        let fill = " ".repeat(slot_width as usize);
        buf.set_stringn(area.x + FEED_LEFT_PADDING, y, &fill, fill.len(), slot_style);
        if row == label_row {
            let x = area.x + FEED_LEFT_PADDING + slot_width.saturating_sub(label_cols) / 2;
            buf.set_stringn(x, y, label, label.len(), slot_style);
        }
    }
}

fn render_empty_feed(model: &Model, frame: &mut Frame, area: Rect) {
    let text = if model.refresh_in_flight {
        format!("{} Fetching {}…", model.spinner_char(), model.blog)
    } else {
        "No posts. Press r to refresh.".to_string()
    };
    let empty = Paragraph::new(text)
        .style(Style::default().add_modifier(Modifier::DIM))
        .block(Block::default().padding(Padding::new(
            FEED_LEFT_PADDING,
            0,
            area.height / 3,
            0,
        )));
    frame.render_widget(empty, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let lines = [
        "j/k, ↓/↑      select post",
        "space/b       page down / up",
        "g/G           first / last post",
        "r             refresh feed",
        "o, Enter      open photo in browser",
        "y             copy summary",
        "?             toggle this help",
        "q, Esc        quit",
    ];

    #[allow(clippy::cast_possible_truncation)]
    let height = (lines.len() as u16 + 2).min(area.height);
    let width = 44u16.min(area.width);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, popup);
    let help = Paragraph::new(lines.iter().map(|l| Line::raw(*l)).collect::<Vec<_>>()).block(
        Block::default()
            .title("Keys")
            .borders(Borders::ALL)
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(help, popup);
}
