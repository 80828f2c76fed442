//! Traits for face detection and landmark backends.

use std::convert::Infallible;
use std::fmt;

use nalgebra::Point2;

use crate::frame::Frame;
use crate::tracker::Rect;

/// Trait for face detection backends.
///
/// Implement this trait to connect any face detector to the tracker. The
/// detector only runs on detection-phase frames. A returned error is logged
/// and the frame is treated as containing no faces.
///
/// # Example
///
/// ```ignore
/// use facetrack_rs::{FaceDetector, Frame, Rect};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl FaceDetector for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: &Frame) -> Result<Vec<Rect>, Self::Error> {
///         // Run inference and return face boxes in frame coordinates
///         Ok(vec![])
///     }
/// }
/// ```
pub trait FaceDetector {
    /// Error type for detection failures.
    type Error: fmt::Display;

    /// Find faces on `frame`. Order matters: it breaks assignment ties.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Rect>, Self::Error>;
}

impl<F> FaceDetector for F
where
    F: FnMut(&Frame) -> Vec<Rect>,
{
    type Error = Infallible;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Rect>, Self::Error> {
        Ok(self(frame))
    }
}

/// Facial shape predictor.
///
/// Returns the landmark points of the face inside `face`, in frame
/// coordinates. An empty result means no landmarks for this face.
pub trait LandmarkPredictor {
    fn predict(&self, frame: &Frame, face: Rect) -> Vec<Point2<f32>>;
}

impl<F> LandmarkPredictor for F
where
    F: Fn(&Frame, Rect) -> Vec<Point2<f32>>,
{
    fn predict(&self, frame: &Frame, face: Rect) -> Vec<Point2<f32>> {
        self(frame, face)
    }
}
