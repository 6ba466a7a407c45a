use std::io::stdout;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::api::Fetcher;
use crate::app::worker::{FeedEvent, Workers};
use crate::app::{App, Message, Model, update};
use crate::image::ImageLoader;

/// Decoded photos kept in the download-side cache.
const PHOTO_CACHE_SIZE: usize = 50;

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or the HTTP clients fail,
    /// or if the event loop encounters an I/O failure.
    pub fn run(&self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        // Create image picker BEFORE initializing terminal (queries stdio)
        let picker = if self.images_enabled {
            let picker_scope = crate::perf::scope("app.create_picker");
            let picker = crate::image::create_picker(self.force_half_cell);
            drop(picker_scope);
            picker
        } else {
            None
        };

        let fetcher = Fetcher::new(&self.blog, &self.api_key)
            .context("Failed to build the API client")?;
        let loader = ImageLoader::new(PHOTO_CACHE_SIZE)
            .context("Failed to build the photo downloader")?;
        let (tx, rx) = mpsc::channel();
        let workers = Workers {
            tx,
            fetcher,
            loader,
        };

        // Initialize terminal
        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal — tumbless requires an interactive terminal")?;
        let size = terminal.size()?;
        drop(init_scope);

        let mut model = Model::new(self.blog.clone(), (size.width, size.height))
            .with_picker(picker);
        model.images_enabled = self.images_enabled;

        // Kick off the initial fetch before the first frame.
        model = update(model, Message::Refresh);
        Self::handle_message_side_effects(&mut model, &workers, &Message::Refresh);

        execute!(stdout(), EnableMouseCapture)?;
        let result = Self::event_loop(&mut terminal, &mut model, &workers, &rx);

        // Restore terminal
        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();

        result
    }

    fn event_loop(
        terminal: &mut DefaultTerminal,
        model: &mut Model,
        workers: &Workers,
        rx: &Receiver<FeedEvent>,
    ) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;
        let mut last_spinner_tick = Instant::now();

        loop {
            // Apply worker completions on the control thread.
            while let Ok(feed_event) = rx.try_recv() {
                match feed_event {
                    FeedEvent::RefreshFinished(result) => {
                        *model = update(std::mem::take(model), Message::RefreshFinished(result));
                    }
                    FeedEvent::PhotoLoaded { request, result } => {
                        model.apply_photo(&request, result);
                    }
                }
                needs_render = true;
            }

            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            // Advance the busy spinner at its own cadence, not per iteration,
            // so an in-flight refresh doesn't degenerate into a hot loop.
            if model.refresh_in_flight
                && last_spinner_tick.elapsed() >= Duration::from_millis(100)
            {
                model.tick_spinner();
                last_spinner_tick = Instant::now();
                needs_render = true;
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                crate::perf::log_event(
                    "event.resize.apply",
                    format!("frame={frame_idx} width={width} height={height}"),
                );
                *model = update(std::mem::take(model), Message::Resize(width, height));
                needs_render = true;
            }

            // Handle events
            let poll_ms = if needs_render {
                0
            } else if model.refresh_in_flight || resize_debouncer.is_pending() {
                100
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Refresh timestamp after poll wait so the debouncer uses accurate times.
                let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                let msg =
                    Self::handle_event(&event::read()?, model, event_ms, &mut resize_debouncer);
                if let Some(msg) = msg {
                    crate::perf::log_event("event.message", format!("frame={frame_idx} msg={msg:?}"));
                    let side_msg = msg.clone();
                    *model = update(std::mem::take(model), msg);
                    Self::handle_message_side_effects(model, workers, &side_msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                let mut drained = 0_u32;
                while event::poll(Duration::from_millis(0))? {
                    let drain_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    let msg = Self::handle_event(
                        &event::read()?,
                        model,
                        drain_ms,
                        &mut resize_debouncer,
                    );
                    if let Some(msg) = msg {
                        drained += 1;
                        let side_msg = msg.clone();
                        *model = update(std::mem::take(model), msg);
                        Self::handle_message_side_effects(model, workers, &side_msg);
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    crate::perf::log_event("event.drain", format!("frame={frame_idx} drained={drained}"));
                }
            }

            if needs_render {
                frame_idx += 1;

                // Start downloads for photos near the viewport before rendering.
                let prep_start = Instant::now();
                for request in model.request_visible_photos() {
                    workers.spawn_photo(request);
                }
                crate::perf::log_event(
                    "frame.prep",
                    format!(
                        "frame={} prep_ms={:.3} viewport={}..{}",
                        frame_idx,
                        prep_start.elapsed().as_secs_f64() * 1000.0,
                        model.viewport.offset(),
                        model.viewport.offset() + model.viewport.height() as usize,
                    ),
                );

                // Render
                let draw_start = Instant::now();
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0
                    ),
                );
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_debouncer_waits_for_delay() {
        let mut debouncer = ResizeDebouncer::new(100);
        debouncer.queue(120, 40, 0);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.take_ready(50), None);
        assert_eq!(debouncer.take_ready(100), Some((120, 40)));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_resize_debouncer_keeps_latest_size() {
        let mut debouncer = ResizeDebouncer::new(100);
        debouncer.queue(120, 40, 0);
        debouncer.queue(90, 30, 20);
        assert_eq!(debouncer.take_ready(120), Some((90, 30)));
    }
}
