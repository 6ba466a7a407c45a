use crate::api::{Post, RefreshError};
use crate::app::Model;

/// All possible events and actions in the application.
///
/// These represent user input, system events, and worker completions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Navigation
    /// Scroll up by n rows
    ScrollUp(usize),
    /// Scroll down by n rows
    ScrollDown(usize),
    /// Scroll up one page
    PageUp,
    /// Scroll down one page
    PageDown,
    /// Scroll up half page
    HalfPageUp,
    /// Scroll down half page
    HalfPageDown,
    /// Go to the first card
    GoToTop,
    /// Go to the last card
    GoToBottom,
    /// Move selection to the previous card
    SelectUp,
    /// Move selection to the next card
    SelectDown,
    /// Select the card covering a feed row (mouse click)
    SelectAt(usize),

    // Refresh pipeline
    /// Start a fetch+decode refresh (no-op while one is in flight)
    Refresh,
    /// A refresh worker completed
    RefreshFinished(Result<Vec<Post>, RefreshError>),

    // Selected card actions (side effects)
    /// Open the selected post's photo in the browser
    OpenSelected,
    /// Copy the selected post's summary to the clipboard
    CopySummary,

    // Overlays
    /// Toggle help overlay
    ToggleHelp,
    /// Hide help overlay
    HideHelp,

    // Window
    /// Terminal resized
    Resize(u16, u16),
    /// Redraw screen
    Redraw,

    // Application
    /// Quit the application
    Quit,
}

/// Pure state transition: consume the model and a message, produce the next
/// model. Side effects (spawning workers, browser, clipboard) happen in
/// `App::handle_message_side_effects` after the transition.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::ScrollUp(n) => model.viewport.scroll_up(n),
        Message::ScrollDown(n) => model.viewport.scroll_down(n),
        Message::PageUp => model.viewport.page_up(),
        Message::PageDown => model.viewport.page_down(),
        Message::HalfPageUp => model.viewport.half_page_up(),
        Message::HalfPageDown => model.viewport.half_page_down(),
        Message::GoToTop => {
            model.viewport.go_to_top();
            if !model.feed.is_empty() {
                model.selected = Some(0);
            }
        }
        Message::GoToBottom => {
            model.viewport.go_to_bottom();
            if !model.feed.is_empty() {
                model.selected = Some(model.feed.count() - 1);
            }
        }
        Message::SelectUp => model.move_selection(-1),
        Message::SelectDown => model.move_selection(1),
        Message::SelectAt(row) => {
            let offset = model.viewport.offset();
            if let Some(index) = model
                .layout
                .card_at_row(offset + row)
                .map(|card| card.post_index)
            {
                model.select(index);
            }
        }

        Message::Refresh => model.begin_refresh(),
        Message::RefreshFinished(result) => model.finish_refresh(result),

        Message::ToggleHelp => model.help_visible = !model.help_visible,
        Message::HideHelp => model.help_visible = false,

        Message::Resize(width, height) => {
            model.viewport.resize(width, height.saturating_sub(1));
            model.reflow_layout();
            model.rescale_photos();
        }
        Message::Redraw => {}

        // Pure no-ops; acted on by the side-effect layer.
        Message::OpenSelected | Message::CopySummary => {}

        Message::Quit => model.should_quit = true,
    }
    model
}
