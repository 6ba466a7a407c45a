//! Background workers for network I/O.
//!
//! One short-lived thread per refresh and per photo download, each reporting
//! back over an mpsc channel drained by the event loop. Nothing is cancelled:
//! a superseded download runs to completion and its result is token-checked
//! on arrival.

use std::sync::mpsc::Sender;

use image::DynamicImage;

use crate::api::{Fetcher, Post, RefreshError, refresh_posts};
use crate::feed::ImageRequest;
use crate::image::{ImageError, ImageLoader};

/// Completions marshalled from worker threads to the control thread.
#[derive(Debug)]
pub enum FeedEvent {
    /// The refresh pipeline finished, success or failure.
    RefreshFinished(Result<Vec<Post>, RefreshError>),
    /// A photo download finished for the request's row/token.
    PhotoLoaded {
        request: ImageRequest,
        result: Result<DynamicImage, ImageError>,
    },
}

/// Shared handles the side-effect layer needs to start workers.
#[derive(Debug, Clone)]
pub struct Workers {
    pub tx: Sender<FeedEvent>,
    pub fetcher: Fetcher,
    pub loader: ImageLoader,
}

impl Workers {
    /// Run the fetch → decode pipeline on a background thread.
    ///
    /// Always reports completion, so the busy indicator always clears.
    pub fn spawn_refresh(&self) {
        let fetcher = self.fetcher.clone();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = refresh_posts(&fetcher);
            // Receiver gone means the app is shutting down.
            let _ = tx.send(FeedEvent::RefreshFinished(result));
        });
    }

    /// Download and decode one photo on a background thread.
    pub fn spawn_photo(&self, request: ImageRequest) {
        let loader = self.loader.clone();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = loader.load(&request.url);
            let _ = tx.send(FeedEvent::PhotoLoaded { request, result });
        });
    }
}
