//! Integration module for connecting face detection and landmark backends
//! with the face tracker.
//!
//! This module provides the traits a host implements for its detector and
//! shape predictor, and a [`FrameProcessor`] that drives the tracker on
//! full-resolution frames.

mod detector;
mod pipeline;

pub use detector::{FaceDetector, LandmarkPredictor};
pub use pipeline::FrameProcessor;
