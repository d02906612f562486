//! Message pipelines: control commands and image ingestion.
//!
//! [`dispatch`] classifies one frame and routes it to the matching
//! pipeline. Errors are returned to the caller, which decides how far they
//! travel (the connection handler only logs them).

pub mod control;
pub mod ingest;

use crate::app_state::TransceiverContext;
use crate::domain::Frame;
use crate::error::TransceiverError;

pub use control::ControlOutcome;
pub use ingest::IngestedImage;

/// Result of a successfully dispatched frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// A structured frame was handled as a control command.
    Command(ControlOutcome),
    /// An opaque frame was decoded into the current image.
    Image(IngestedImage),
}

/// Classifies a raw text frame and runs the matching pipeline.
///
/// # Errors
///
/// Returns the protocol or decode error raised by the pipeline.
pub async fn dispatch(
    raw: &str,
    context: &TransceiverContext,
) -> Result<Dispatched, TransceiverError> {
    match Frame::classify(raw) {
        Frame::Structured(document) => control::handle_command(&document, context)
            .await
            .map(Dispatched::Command),
        Frame::Opaque(payload) => ingest::ingest_image(payload, context)
            .await
            .map(Dispatched::Image),
    }
}
