use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use image::DynamicImage;
use ratatui_image::picker::{Picker, ProtocolType};
use ratatui_image::protocol::StatefulProtocol;

use crate::api::{Post, RefreshError};
use crate::feed::{Feed, ImageRequest, RowImage};
use crate::ui::layout::FeedLayout;
use crate::ui::viewport::Viewport;

/// How many viewport-heights beyond the visible area photos are prefetched.
const PHOTO_LOOKAHEAD_SCREENS: usize = 2;

/// Braille spinner shown in the status bar while a refresh is in flight.
const SPINNER_FRAMES: [char; 8] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state. The feed list is
/// owned by [`Feed`] and only ever changes through a full replace.
pub struct Model {
    /// The current feed of posts and their image slots
    pub feed: Feed,
    /// Posts laid out as cards on the line grid
    pub layout: FeedLayout,
    /// Viewport managing scroll position
    pub viewport: Viewport,
    /// Blog whose feed is shown
    pub blog: String,
    /// Selected card (post index)
    pub selected: Option<usize>,
    /// True while a refresh worker is running
    pub refresh_in_flight: bool,
    /// Set when a refresh transitions idle -> in flight; consumed by the
    /// side-effect layer to spawn exactly one worker
    pending_refresh_spawn: bool,
    /// Advances while the busy spinner is shown
    pub spinner_frame: usize,
    /// Whether help overlay is visible
    pub help_visible: bool,
    /// Whether inline images are enabled
    pub images_enabled: bool,
    /// Whether the app should quit
    pub should_quit: bool,
    toast: Option<Toast>,
    /// Image protocols for rendering (keyed by photo URL)
    /// Stores (protocol, `width_cols`, `height_rows`)
    pub image_protocols: HashMap<String, (StatefulProtocol, u16, u16)>,
    /// Cache of original photos (before scaling) for fast resize
    original_images: HashMap<String, DynamicImage>,
    /// Image picker for terminal rendering
    pub picker: Option<Picker>,
    /// Viewport width used when photos were last scaled (for detecting resize)
    last_image_scale_width: u16,
    /// Rendered photo heights currently baked into the layout (terminal rows)
    photo_layout_heights: HashMap<String, u16>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("blog", &self.blog)
            .field("posts", &self.feed.count())
            .field("refresh_in_flight", &self.refresh_in_flight)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Create a new model for `blog` with an empty feed.
    pub fn new(blog: impl Into<String>, terminal_size: (u16, u16)) -> Self {
        Self {
            feed: Feed::new(),
            layout: FeedLayout::default(),
            viewport: Viewport::new(terminal_size.0, terminal_size.1.saturating_sub(1), 0),
            blog: blog.into(),
            selected: None,
            refresh_in_flight: false,
            pending_refresh_spawn: false,
            spinner_frame: 0,
            help_visible: false,
            images_enabled: true,
            should_quit: false,
            toast: None,
            image_protocols: HashMap::new(),
            original_images: HashMap::new(),
            picker: None,
            last_image_scale_width: terminal_size.0,
            photo_layout_heights: HashMap::new(),
        }
    }

    /// Set the image picker.
    #[must_use]
    pub fn with_picker(mut self, picker: Option<Picker>) -> Self {
        self.picker = picker;
        self
    }

    /// Start a refresh unless one is already in flight.
    ///
    /// The second concurrent request is a no-op: two overlapping identical
    /// GETs produce the same list, so there is nothing to restart.
    pub fn begin_refresh(&mut self) {
        if self.refresh_in_flight {
            crate::perf::log_event("refresh.skip", "already in flight");
            return;
        }
        self.refresh_in_flight = true;
        self.pending_refresh_spawn = true;
        self.spinner_frame = 0;
    }

    /// Take the one-shot spawn flag set by [`Model::begin_refresh`].
    pub fn take_pending_refresh(&mut self) -> bool {
        std::mem::take(&mut self.pending_refresh_spawn)
    }

    /// Apply a completed refresh.
    ///
    /// The busy flag always clears, success or failure. On success the feed
    /// is fully replaced; on failure it is left untouched and the error
    /// surfaces as a toast.
    pub fn finish_refresh(&mut self, result: Result<Vec<Post>, RefreshError>) {
        self.refresh_in_flight = false;
        match result {
            Ok(posts) => {
                let count = posts.len();
                self.replace_posts(posts);
                crate::perf::log_event("refresh.done", format!("posts={count}"));
                self.show_toast(ToastLevel::Info, format!("Loaded {count} posts"));
            }
            Err(err) => {
                crate::perf::log_event("refresh.error", format!("{err}"));
                self.show_toast(ToastLevel::Error, format!("Refresh failed: {err}"));
            }
        }
    }

    /// Swap in a fresh post list, dropping cached protocols whose photos no
    /// longer appear in the feed, and re-lay out the cards.
    fn replace_posts(&mut self, posts: Vec<Post>) {
        self.feed.replace(posts);

        let valid: HashSet<&str> = self
            .feed
            .posts()
            .iter()
            .filter_map(Post::first_photo_url)
            .collect();
        self.image_protocols
            .retain(|url, _| valid.contains(url.as_str()));
        self.original_images
            .retain(|url, _| valid.contains(url.as_str()));
        self.photo_layout_heights
            .retain(|url, _| valid.contains(url.as_str()));

        self.selected = if self.feed.is_empty() { None } else { Some(0) };
        self.reflow_layout();
        self.viewport.go_to_top();
    }

    /// Rebuild the card layout from the current posts and known photo
    /// heights, keeping the scroll offset valid.
    pub fn reflow_layout(&mut self) {
        self.layout = FeedLayout::build(
            self.feed.posts(),
            card_width(self.viewport.width()),
            &self.photo_layout_heights,
        );
        self.viewport.set_total_rows(self.layout.total_rows());
    }

    /// Collect photo requests for cards near the viewport (lazy loading with
    /// lookahead). Cards whose photo protocol already exists resolve from
    /// cache without a request.
    pub fn request_visible_photos(&mut self) -> Vec<ImageRequest> {
        if !self.images_enabled {
            return Vec::new();
        }
        let lookahead = self.viewport.height() as usize * PHOTO_LOOKAHEAD_SCREENS;
        let visible = self.viewport.visible_range();
        let start = visible.start.saturating_sub(lookahead);
        let end = visible.end + lookahead;

        let candidates: Vec<(usize, Option<String>)> = self
            .layout
            .cards_in_rows(start..end)
            .map(|card| (card.post_index, card.photo.url.clone()))
            .collect();

        let mut requests = Vec::new();
        for (index, url) in candidates {
            match url {
                Some(url) if self.image_protocols.contains_key(&url) => {
                    self.feed.resolve_from_cache(index);
                }
                _ => {
                    // Photo-less cards placeholder here without a request.
                    requests.extend(self.feed.request_image(index));
                }
            }
        }
        if !requests.is_empty() {
            crate::perf::log_event(
                "photo.request.batch",
                format!("viewport={start}..{end} requests={}", requests.len()),
            );
        }
        requests
    }

    /// Apply a completed photo download.
    ///
    /// The feed's token check runs first: a stale result (row replaced or
    /// re-requested since the request was issued) is discarded without
    /// touching any display state.
    pub fn apply_photo(
        &mut self,
        request: &ImageRequest,
        result: Result<DynamicImage, crate::image::ImageError>,
    ) {
        let ok = result.is_ok();
        let Some(index) = self.feed.complete_image(request, ok) else {
            crate::perf::log_event("photo.stale", format!("url={}", request.url));
            return;
        };

        match result {
            Ok(image) => {
                crate::perf::log_event(
                    "photo.loaded",
                    format!("row={index} url={} {}x{}", request.url, image.width(), image.height()),
                );
                self.original_images.insert(request.url.clone(), image);
                self.build_protocol(&request.url);
            }
            Err(err) => {
                crate::perf::log_event("photo.error", format!("url={} err={err}", request.url));
            }
        }
    }

    /// Re-scale every cached photo protocol after a width change.
    pub fn rescale_photos(&mut self) {
        let current_width = card_width(self.viewport.width());
        if self.last_image_scale_width == current_width {
            return;
        }
        self.last_image_scale_width = current_width;

        let urls: Vec<String> = self.original_images.keys().cloned().collect();
        self.image_protocols.clear();
        for url in urls {
            self.build_protocol(&url);
        }
    }

    /// Build (or rebuild) the terminal protocol for one cached photo and fold
    /// its rendered height into the layout.
    fn build_protocol(&mut self, url: &str) {
        let Some(picker) = &self.picker else { return };
        let Some(original) = self.original_images.get(url) else {
            return;
        };
        let Some(slot_width) = self
            .layout
            .cards()
            .iter()
            .find(|card| card.photo.url.as_deref() == Some(url))
            .map(|card| card.photo.width_cols)
        else {
            return;
        };

        let use_halfblocks = matches!(picker.protocol_type(), ProtocolType::Halfblocks);
        let quantize = use_halfblocks && !crate::image::supports_truecolor_terminal();
        let font_size = picker.font_size();
        let target_width_px = u32::from(slot_width) * u32::from(font_size.0);

        // Scale to fit the slot width, preserving aspect ratio.
        let scale = f64::from(target_width_px) / f64::from(original.width().max(1));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        // Scaled image height is always positive and well within u32 range.
        let scaled_height_px = (f64::from(original.height()) * scale) as u32;

        let mut scaled = original.resize(
            target_width_px,
            scaled_height_px.max(1),
            if use_halfblocks {
                image::imageops::FilterType::CatmullRom
            } else {
                image::imageops::FilterType::Nearest
            },
        );
        if quantize {
            scaled = crate::image::quantize_to_ansi256(&scaled);
        }

        let protocol = picker.new_resize_protocol(scaled);
        let (width_cols, height_rows) = protocol_render_size(&protocol, slot_width);
        self.image_protocols
            .insert(url.to_string(), (protocol, width_cols, height_rows));
        crate::perf::log_event(
            "photo.protocol",
            format!("url={url} width_cols={width_cols} height_rows={height_rows} halfblocks={use_halfblocks}"),
        );

        if self.photo_layout_heights.get(url).copied() != Some(height_rows) {
            self.photo_layout_heights
                .insert(url.to_string(), height_rows);
            self.reflow_layout();
        }
    }

    /// Move the selection by `delta` cards and keep it in view.
    pub fn move_selection(&mut self, delta: isize) {
        if self.feed.is_empty() {
            return;
        }
        let max = self.feed.count() - 1;
        let current = self.selected.unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(max);
        self.select(next);
    }

    /// Select the card at `post_index` and scroll it into view.
    pub fn select(&mut self, post_index: usize) {
        if post_index >= self.feed.count() {
            return;
        }
        self.selected = Some(post_index);
        if let Some(card) = self.layout.card(post_index) {
            self.viewport.ensure_visible(card.rows.clone());
        }
    }

    /// The currently selected post, if any.
    pub fn selected_post(&self) -> Option<&Post> {
        self.selected.map(|i| self.feed.item_at(i))
    }

    /// Advance the busy spinner one frame.
    pub const fn tick_spinner(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }

    /// The spinner glyph for the current frame.
    pub const fn spinner_char(&self) -> char {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    /// Whether a photo URL is displayable right now.
    pub fn photo_ready(&self, url: &str) -> bool {
        self.image_protocols.contains_key(url)
    }

    /// Image state for the card at `post_index`.
    pub fn row_image(&self, post_index: usize) -> RowImage {
        self.feed.row_image(post_index)
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}

/// Width of the card column: full terminal width minus the left padding.
fn card_width(terminal_width: u16) -> u16 {
    terminal_width
        .saturating_sub(crate::ui::FEED_LEFT_PADDING)
        .max(1)
}

fn protocol_render_size(protocol: &StatefulProtocol, target_width_cols: u16) -> (u16, u16) {
    use ratatui::layout::Rect;
    use ratatui_image::Resize;
    let resize = if matches!(
        protocol.protocol_type(),
        ratatui_image::protocol::StatefulProtocolType::Halfblocks(_)
    ) {
        Resize::Scale(Some(image::imageops::FilterType::CatmullRom))
    } else {
        Resize::Scale(None)
    };
    let area = Rect::new(0, 0, target_width_cols, u16::MAX);
    let rect = protocol.size_for(resize, area);
    (rect.width.max(1), rect.height.max(1))
}

// Implement Default for Model to allow std::mem::take
impl Default for Model {
    fn default() -> Self {
        Self::new(String::new(), (80, 24))
    }
}
