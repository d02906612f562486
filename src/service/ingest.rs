//! Image ingestion pipeline.
//!
//! An opaque frame is base64 image text. It is first published to the host
//! as a data URI, then decoded on the blocking pool; only a fully decoded
//! image replaces [`crate::domain::CurrentImage`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, GenericImageView};

use crate::app_state::TransceiverContext;
use crate::domain::{NotificationPayload, PayloadFormat, TRANSCEIVER_MSG};
use crate::error::TransceiverError;

/// Number of leading payload characters written to debug logs.
const PREVIEW_CHARS: usize = 32;

/// Summary of an image that replaced the current image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of notification receivers that got the data URI.
    pub delivered: usize,
}

/// Publishes and decodes one base64 image payload.
///
/// The payload is assumed to be PNG for the data URI; decoding sniffs the
/// actual format. Decoding runs on the blocking pool and the current image
/// is replaced only after it finishes, so dropping this future before then
/// leaves the current image untouched.
///
/// # Errors
///
/// Returns [`TransceiverError::Base64`], [`TransceiverError::Image`] or
/// [`TransceiverError::DecodeTask`]; the current image is left untouched
/// in all cases.
pub async fn ingest_image(
    payload: &str,
    context: &TransceiverContext,
) -> Result<IngestedImage, TransceiverError> {
    tracing::debug!(preview = %preview(payload), len = payload.len(), "incoming image");

    let data_uri = PayloadFormat::Png.data_uri(payload);
    let delivered = context
        .notifications
        .publish(TRANSCEIVER_MSG, NotificationPayload::PictCha(data_uri));

    let compact = strip_whitespace(payload);
    let image = tokio::task::spawn_blocking(move || decode_image(&compact)).await??;
    let (width, height) = image.dimensions();

    context.current_image.replace(image);
    tracing::info!(width, height, "current image replaced");

    Ok(IngestedImage {
        width,
        height,
        delivered,
    })
}

/// Decodes base64 text into an image. CPU-bound; call off the event loop.
///
/// # Errors
///
/// Returns [`TransceiverError::Base64`] or [`TransceiverError::Image`].
pub fn decode_image(base64_text: &str) -> Result<DynamicImage, TransceiverError> {
    let bytes = STANDARD.decode(base64_text.as_bytes())?;
    let image = image::load_from_memory(&bytes)?;
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        format = ?image::guess_format(&bytes).ok(),
        "decoded incoming image"
    );
    Ok(image)
}

/// Drops line breaks and other ASCII whitespace that editors insert into
/// long base64 strings.
fn strip_whitespace(payload: &str) -> String {
    payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect()
}

fn preview(payload: &str) -> &str {
    payload
        .char_indices()
        .nth(PREVIEW_CHARS)
        .and_then(|(end, _)| payload.get(..end))
        .unwrap_or(payload)
}
