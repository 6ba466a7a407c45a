//! Theming and color definitions.
//!
//! Uses semantic ANSI colors that respect the terminal's palette.

use ratatui::style::{Color, Modifier, Style};

/// Style for a card's summary text.
pub fn summary_style(selected: bool) -> Style {
    let base = Style::default().add_modifier(Modifier::BOLD);
    if selected {
        base.add_modifier(Modifier::REVERSED)
    } else {
        base
    }
}

/// Style for the separator line between cards.
pub fn separator_style() -> Style {
    Style::default()
        .fg(Color::Indexed(240))
        .add_modifier(Modifier::DIM)
}

/// Style for the static placeholder box.
pub fn placeholder_style() -> Style {
    Style::default().fg(Color::Gray).bg(Color::DarkGray)
}

/// Style for a photo slot whose download is still in flight.
pub fn loading_style() -> Style {
    Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::ITALIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_summary_is_reversed() {
        assert!(
            summary_style(true)
                .add_modifier
                .contains(Modifier::REVERSED)
        );
        assert!(
            !summary_style(false)
                .add_modifier
                .contains(Modifier::REVERSED)
        );
    }
}
