//! Multi-face identity tracking for video streams.
//!
//! A full-frame face detector runs periodically, and again whenever a face
//! loses its target. Between detection phases each face is followed by its
//! own [`VisualTracker`]. Detections are matched to known faces by centroid
//! distance with an optimal assignment, so identities stay stable across
//! frames. Faces that go unconfirmed for too long are removed.
//!
//! ```ignore
//! use facetrack_rs::{FaceTrackConfig, FrameProcessor, TrackerAlgorithm, TrackerBackends};
//!
//! let backends = TrackerBackends::new().with(TrackerAlgorithm::MedianFlow, || {
//!     Box::new(MyMedianFlow::default())
//! });
//! let mut processor = FrameProcessor::new(my_detector, FaceTrackConfig::default(), backends)?;
//! for frame in frames {
//!     let report = processor.process_frame(&frame)?;
//!     for face in report.visible_faces() {
//!         println!("face {} at {:?}", face.id, face.bounding_box);
//!     }
//! }
//! ```

pub mod config;
mod error;
pub mod frame;
pub mod integration;
pub mod tracker;

pub use config::{DisplayOptions, FaceTrackConfig};
pub use error::{Error, Result};
pub use frame::{Frame, downscale};
pub use integration::{FaceDetector, FrameProcessor, LandmarkPredictor};
pub use tracker::{
    AssignmentSolver, DetectionTrigger, EntityStore, FaceEntity, FacePayload, FaceSnapshot,
    FaceTracker, FrameReport, Rect, TrackerAlgorithm, TrackerBackends, TrackerState,
    VisualTracker,
};
