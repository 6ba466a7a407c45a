use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::Model;

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let percent = model.viewport.scroll_percent();
    let post_info = match model.selected {
        Some(idx) if !model.feed.is_empty() => {
            format!("Post {}/{}", idx + 1, model.feed.count())
        }
        _ => format!("{} posts", model.feed.count()),
    };

    let busy_indicator = if model.refresh_in_flight {
        format!("  {} refreshing", model.spinner_char())
    } else {
        String::new()
    };

    let status = format!(
        " {}  [{}%]  {}{}  r:refresh  ?:help",
        model.blog, percent, post_info, busy_indicator
    );

    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        crate::app::ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        crate::app::ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        crate::app::ToastLevel::Error => {
            ("[error]", Style::default().bg(Color::Red).fg(Color::White))
        }
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
