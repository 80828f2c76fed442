//! FrameProcessor for combining face detection with tracking.

use crate::config::FaceTrackConfig;
use crate::error::Result;
use crate::frame::{self, Frame};
use crate::tracker::{FaceTracker, FrameReport, TrackerBackends};

use super::FaceDetector;

/// Bundles a [`FaceDetector`] with a [`FaceTracker`].
///
/// Frames are resized by the configured scale factor before detection and
/// tracking; every box and landmark in the returned report is mapped back to
/// the coordinates of the frame that was passed in.
pub struct FrameProcessor<D: FaceDetector> {
    detector: D,
    tracker: FaceTracker,
    scale_factor: f32,
}

impl<D: FaceDetector> FrameProcessor<D> {
    /// Fails when the configuration is invalid or `backends` cannot build
    /// the configured tracker algorithm.
    pub fn new(detector: D, config: FaceTrackConfig, backends: TrackerBackends) -> Result<Self> {
        let scale_factor = config.scale_factor;
        Ok(Self {
            detector,
            tracker: FaceTracker::new(config, backends)?,
            scale_factor,
        })
    }

    /// Create a processor with the default configuration.
    pub fn with_default_config(detector: D, backends: TrackerBackends) -> Result<Self> {
        Self::new(detector, FaceTrackConfig::default(), backends)
    }

    /// Process a single frame and return the tracker's report for it.
    pub fn process_frame(&mut self, input: &Frame) -> Result<FrameReport> {
        let processing = frame::downscale(input, self.scale_factor);
        let mut report = self.tracker.update(&processing, &mut self.detector)?;
        report.unscale(self.scale_factor);
        Ok(report)
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &FaceTracker {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut FaceTracker {
        &mut self.tracker
    }
}
