//! Photo downloading and caching.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::DynamicImage;
use thiserror::Error;

/// Why a photo could not be resolved to pixels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// The HTTP download failed (transport or non-2xx status).
    #[error("download failed: {0}")]
    Download(String),
    /// The bytes arrived but are not a decodable image.
    #[error("undecodable image: {0}")]
    Decode(String),
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, DynamicImage>,
    order: VecDeque<String>,
}

/// Cache for downloaded photos, keyed by URL.
#[derive(Debug, Default, Clone)]
pub struct ImageCache {
    inner: Arc<Mutex<CacheInner>>,
    max_size: usize,
}

impl ImageCache {
    /// Create a new image cache with the given maximum number of entries.
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::default())),
            max_size,
        }
    }

    /// Get an image from the cache.
    pub fn get(&self, url: &str) -> Option<DynamicImage> {
        let guard = self.inner.lock().ok()?;
        guard.entries.get(url).cloned()
    }

    /// Insert an image into the cache.
    pub fn insert(&self, url: String, image: DynamicImage) {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if guard.entries.contains_key(&url) {
            guard.entries.insert(url, image);
            return;
        }

        guard.order.push_back(url.clone());
        guard.entries.insert(url, image);

        while guard.entries.len() > self.max_size {
            if let Some(oldest) = guard.order.pop_front() {
                guard.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    /// Check if an image is in the cache.
    pub fn contains(&self, url: &str) -> bool {
        let guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.entries.contains_key(url)
    }

    /// Clear the cache.
    pub fn clear(&self) {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.entries.clear();
        guard.order.clear();
    }

    /// Get the number of cached images.
    pub fn len(&self) -> usize {
        let guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Downloads photos over HTTP, caching the decoded result.
///
/// Cloneable so each download worker thread carries its own handle; the cache
/// itself is shared behind the `Arc`.
#[derive(Debug, Clone)]
pub struct ImageLoader {
    cache: ImageCache,
    client: reqwest::blocking::Client,
}

impl ImageLoader {
    /// Create a loader caching up to `max_cache` decoded photos.
    ///
    /// # Errors
    ///
    /// Returns `Download` if the HTTP client cannot be constructed.
    pub fn new(max_cache: usize) -> Result<Self, ImageError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("tumbless/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ImageError::Download(e.to_string()))?;
        Ok(Self {
            cache: ImageCache::new(max_cache),
            client,
        })
    }

    /// Load a photo, using the cache if available.
    ///
    /// # Errors
    ///
    /// `Download` for transport/status failures, `Decode` when the payload is
    /// not an image.
    pub fn load(&self, url: &str) -> Result<DynamicImage, ImageError> {
        if let Some(img) = self.cache.get(url) {
            return Ok(img);
        }

        let img = self.fetch_and_decode(url)?;
        self.cache.insert(url.to_string(), img.clone());
        Ok(img)
    }

    /// Look up a photo without touching the network.
    pub fn cached(&self, url: &str) -> Option<DynamicImage> {
        self.cache.get(url)
    }

    /// Whether a photo is already cached.
    pub fn is_cached(&self, url: &str) -> bool {
        self.cache.contains(url)
    }

    /// Drop every cached photo.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn fetch_and_decode(&self, url: &str) -> Result<DynamicImage, ImageError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ImageError::Download(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ImageError::Download(format!(
                "status {}",
                response.status().as_u16()
            )));
        }
        let bytes = response
            .bytes()
            .map_err(|e| ImageError::Download(e.to_string()))?;
        image::load_from_memory(&bytes).map_err(|e| ImageError::Decode(e.to_string()))
    }
}
