use ratatui::prelude::*;
use ratatui_image::protocol::StatefulProtocolType;
use ratatui_image::{CropOptions, Resize, StatefulImage};

use crate::app::Model;
use crate::feed::RowImage;

use super::FEED_LEFT_PADDING;

/// Blit resolved photos into their card slots.
///
/// Renders each visible protocol to a temp buffer and copies the overlapping
/// rows to the frame, so partially scrolled photos clip cleanly.
pub fn render_photos(model: &mut Model, frame: &mut Frame, feed_area: Rect) {
    let vp_top = model.viewport.offset() as i32;
    let vp_bottom = vp_top + feed_area.height as i32;
    crate::perf::log_event(
        "render.feed",
        format!(
            "vp={}..{} feed_area={}x{} photos_cached={}",
            vp_top,
            vp_bottom,
            feed_area.width,
            feed_area.height,
            model.image_protocols.len()
        ),
    );

    if model.image_protocols.is_empty() {
        return;
    }

    for card in model.layout.cards() {
        if model.feed.row_image(card.post_index) != RowImage::Resolved {
            continue;
        }
        let Some(url) = card.photo.url.as_deref() else {
            continue;
        };
        let Some((protocol, img_width, img_height)) = model.image_protocols.get_mut(url) else {
            continue;
        };
        let img_width = *img_width;
        let img_height = *img_height;

        #[allow(clippy::cast_possible_wrap)]
        let img_top = card.photo.rows.start as i32;
        let img_bottom = img_top + i32::from(img_height);

        // Skip if no overlap with viewport
        if img_bottom <= vp_top || img_top >= vp_bottom {
            continue;
        }
        crate::perf::log_event(
            "render.photo.visible",
            format!("url={url} rows={img_top}..{img_bottom} size={img_width}x{img_height}"),
        );

        // Calculate which rows of the photo are visible
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rel_y = img_top - vp_top;
        let src_start = (-rel_y).max(0) as u16;
        let dst_y = feed_area.y + rel_y.max(0) as u16;
        let visible_rows = (img_bottom.min(vp_bottom) - img_top.max(vp_top)) as u16;
        let visible_cols = img_width.min(feed_area.width.saturating_sub(FEED_LEFT_PADDING));
        if visible_rows == 0 || visible_cols == 0 {
            continue;
        }
        let dst_x = feed_area.x + FEED_LEFT_PADDING;

        if matches!(protocol.protocol_type(), StatefulProtocolType::ITerm2(_)) {
            // iTerm2 inline graphics store the payload in a single anchor cell; row-slicing the
            // rendered buffer breaks scrolling and causes stale/overwritten content.
            let crop = if src_start > 0 {
                Resize::Crop(Some(CropOptions {
                    clip_top: true,
                    clip_left: false,
                }))
            } else {
                Resize::Crop(None)
            };
            let image_widget = StatefulImage::default().resize(crop);
            image_widget.render(
                Rect::new(dst_x, dst_y, visible_cols, visible_rows),
                frame.buffer_mut(),
                protocol,
            );
            crate::perf::log_event(
                "render.photo.direct",
                format!(
                    "url={url} y={dst_y} rows={visible_rows} cols={visible_cols} src_start={src_start} mode=iterm2-crop"
                ),
            );
            continue;
        }

        // Non-iTerm2 protocols are safe to render to a temp buffer and then blit row slices.
        let temp_area = Rect::new(0, 0, img_width, img_height);
        let mut temp_buf = ratatui::buffer::Buffer::empty(temp_area);
        let resize = if matches!(protocol.protocol_type(), StatefulProtocolType::Halfblocks(_)) {
            // Nearest-neighbor causes strong color aliasing artifacts in half-cell mode.
            Resize::Scale(Some(image::imageops::FilterType::CatmullRom))
        } else {
            Resize::Scale(None)
        };
        let image_widget = StatefulImage::default().resize(resize);
        image_widget.render(temp_area, &mut temp_buf, protocol);

        // Terminal.app and other non-truecolor terminals behave better with indexed colors
        // than repeated truecolor updates in halfblock mode.
        if matches!(protocol.protocol_type(), StatefulProtocolType::Halfblocks(_))
            && !crate::image::supports_truecolor_terminal()
        {
            for row in 0..temp_area.height {
                for col in 0..temp_area.width {
                    let cell = &mut temp_buf[(col, row)];
                    if let Color::Rgb(r, g, b) = cell.fg {
                        cell.fg = Color::Indexed(rgb_to_xterm_256(r, g, b));
                    }
                    if let Color::Rgb(r, g, b) = cell.bg {
                        cell.bg = Color::Indexed(rgb_to_xterm_256(r, g, b));
                    }
                }
            }
        }

        // Copy visible rows from temp buffer to frame buffer
        let frame_buf = frame.buffer_mut();
        for row in 0..visible_rows {
            let src_row = src_start + row;
            let dst_row = dst_y + row;
            if src_row < img_height && dst_row < frame_buf.area.height {
                for col in 0..visible_cols {
                    let src_cell = &temp_buf[(col, src_row)];
                    let dst_cell = &mut frame_buf[(dst_x + col, dst_row)];
                    *dst_cell = src_cell.clone();
                }
            }
        }
        crate::perf::log_event(
            "render.photo.blit",
            format!("url={url} src_start={src_start} dst_y={dst_y} rows={visible_rows} cols={visible_cols}"),
        );
    }
}

fn rgb_to_xterm_256(r: u8, g: u8, b: u8) -> u8 {
    let to_cube = |v: u8| ((v as u16 * 5) / 255) as u8;
    let ri = to_cube(r);
    let gi = to_cube(g);
    let bi = to_cube(b);
    16 + (36 * ri) + (6 * gi) + bi
}
