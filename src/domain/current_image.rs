//! The most recently received image.
//!
//! [`CurrentImage`] is a last-write-wins cell backed by a
//! [`tokio::sync::watch`] channel. Writers replace the whole image at once,
//! so readers always observe either the previous image or the new one.

use std::sync::Arc;

use image::{DynamicImage, Rgb, RgbImage};
use sha2::{Digest, Sha256};
use tokio::sync::watch;

/// Shared handle to the current image.
///
/// Starts as a 1×1 white RGB placeholder. Cloning shares the same cell.
#[derive(Debug, Clone)]
pub struct CurrentImage {
    sender: Arc<watch::Sender<Arc<DynamicImage>>>,
}

impl Default for CurrentImage {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrentImage {
    /// Creates a cell holding the placeholder image.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(placeholder()));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Returns the image currently held.
    #[must_use]
    pub fn snapshot(&self) -> Arc<DynamicImage> {
        Arc::clone(&self.sender.borrow())
    }

    /// Replaces the held image and returns the previous one.
    pub fn replace(&self, image: DynamicImage) -> Arc<DynamicImage> {
        self.sender.send_replace(Arc::new(image))
    }

    /// Returns a receiver that is notified on every replacement.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<DynamicImage>> {
        self.sender.subscribe()
    }

    /// Hex SHA-256 of the held image's raw pixel bytes.
    ///
    /// Hosts compare successive values to decide whether a graph needs to
    /// run again.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let image = self.snapshot();
        hex::encode(Sha256::digest(image.as_bytes()))
    }
}

fn placeholder() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([255, 255, 255])))
}
