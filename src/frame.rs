//! Decoded video frames and processing-scale conversion.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use tracing::trace;

/// One decoded RGB video frame.
pub type Frame = image::RgbImage;

/// Resize `frame` by `scale_factor` for detection and tracking.
///
/// A factor of exactly 1.0 borrows the input unchanged.
pub fn downscale(frame: &Frame, scale_factor: f32) -> Cow<'_, Frame> {
    if scale_factor == 1.0 {
        return Cow::Borrowed(frame);
    }

    let width = ((frame.width() as f32 * scale_factor) as u32).max(1);
    let height = ((frame.height() as f32 * scale_factor) as u32).max(1);
    trace!(scale_factor, width, height, "frame scaled for processing");
    Cow::Owned(imageops::resize(frame, width, height, FilterType::Triangle))
}
