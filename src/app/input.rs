use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEventKind};

use crate::app::{App, Message, Model};

use super::event_loop::ResizeDebouncer;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) => Self::handle_key(*key, model),
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => Some(Message::ScrollUp(3)),
                MouseEventKind::ScrollDown => Some(Message::ScrollDown(3)),
                MouseEventKind::Up(_) => Some(Message::SelectAt(mouse.row as usize)),
                _ => None,
            },
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        // Any key dismisses the help overlay first.
        if model.help_visible {
            return Some(Message::HideHelp);
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Message::Quit),
                KeyCode::Char('d') => Some(Message::HalfPageDown),
                KeyCode::Char('u') => Some(Message::HalfPageUp),
                KeyCode::Char('l') => Some(Message::Redraw),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Message::Quit),
            KeyCode::Char('j') | KeyCode::Down => Some(Message::SelectDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Message::SelectUp),
            KeyCode::Char(' ') | KeyCode::Char('f') | KeyCode::PageDown => Some(Message::PageDown),
            KeyCode::Char('b') | KeyCode::PageUp => Some(Message::PageUp),
            KeyCode::Char('g') | KeyCode::Home => Some(Message::GoToTop),
            KeyCode::Char('G') | KeyCode::End => Some(Message::GoToBottom),
            KeyCode::Char('r') => Some(Message::Refresh),
            KeyCode::Char('o') | KeyCode::Enter => Some(Message::OpenSelected),
            KeyCode::Char('y') => Some(Message::CopySummary),
            KeyCode::Char('?') => Some(Message::ToggleHelp),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_refresh_key_maps_to_refresh() {
        let model = Model::default();
        let mut debouncer = ResizeDebouncer::new(100);
        let msg = App::handle_event(&key(KeyCode::Char('r')), &model, 0, &mut debouncer);
        assert_eq!(msg, Some(Message::Refresh));
    }

    #[test]
    fn test_quit_keys() {
        let model = Model::default();
        let mut debouncer = ResizeDebouncer::new(100);
        for code in [KeyCode::Char('q'), KeyCode::Esc] {
            let msg = App::handle_event(&key(code), &model, 0, &mut debouncer);
            assert_eq!(msg, Some(Message::Quit));
        }
    }

    #[test]
    fn test_any_key_hides_help_first() {
        let mut model = Model::default();
        model.help_visible = true;
        let mut debouncer = ResizeDebouncer::new(100);
        let msg = App::handle_event(&key(KeyCode::Char('j')), &model, 0, &mut debouncer);
        assert_eq!(msg, Some(Message::HideHelp));
    }

    #[test]
    fn test_resize_is_debounced_not_immediate() {
        let model = Model::default();
        let mut debouncer = ResizeDebouncer::new(100);
        let msg = App::handle_event(&Event::Resize(100, 40), &model, 0, &mut debouncer);
        assert_eq!(msg, None);
        assert!(debouncer.is_pending());
    }
}
