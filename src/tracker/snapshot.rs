//! Per-frame output handed to rendering and metadata export.

use std::collections::BTreeMap;

use nalgebra::Point2;
use serde::Serialize;

use crate::config::DisplayOptions;
use crate::tracker::cycle::DetectionTrigger;
use crate::tracker::face::FaceEntity;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackerState;

/// Exported view of one face.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceSnapshot {
    pub id: u32,
    pub bounding_box: Rect,
    pub landmark: Option<Vec<Point2<f32>>>,
    /// Confirmed on this frame with a running tracker.
    pub display: bool,
    pub state: TrackerState,
    pub last_detected_frame: u32,
}

impl FaceSnapshot {
    pub fn from_face(face: &FaceEntity, frame_number: u32) -> Self {
        let landmark = face.landmark();
        Self {
            id: face.id(),
            bounding_box: face.bounding_box(),
            landmark: (!landmark.is_empty()).then(|| landmark.to_vec()),
            display: face.state().is_live() && face.last_detected_frame() == frame_number,
            state: face.state(),
            last_detected_frame: face.last_detected_frame(),
        }
    }
}

/// Everything the tracker produced for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame_number: u32,
    /// Why the detector ran on this frame, if it did.
    pub trigger: Option<DetectionTrigger>,
    /// Raw detector output of this frame's detection phase.
    pub detections: Vec<Rect>,
    /// Every live face keyed by id.
    pub faces: BTreeMap<u32, FaceSnapshot>,
    /// Faces evicted on this frame.
    pub removed: Vec<u32>,
    /// Presentation toggles for the renderer; tracking ignores them.
    pub display: DisplayOptions,
}

impl FrameReport {
    pub fn is_detection_phase(&self) -> bool {
        self.trigger.is_some()
    }

    /// Faces a renderer should draw on this frame.
    pub fn visible_faces(&self) -> impl Iterator<Item = &FaceSnapshot> {
        self.faces.values().filter(|face| face.display)
    }

    /// Map every box and landmark from the processing frame back to a frame
    /// that was resized by `scale_factor`.
    pub fn unscale(&mut self, scale_factor: f32) {
        if scale_factor == 1.0 {
            return;
        }
        for detection in &mut self.detections {
            *detection = detection.unscaled(scale_factor);
        }
        for face in self.faces.values_mut() {
            face.bounding_box = face.bounding_box.unscaled(scale_factor);
            if let Some(landmark) = face.landmark.as_mut() {
                for point in landmark.iter_mut() {
                    *point = Point2::new(point.x / scale_factor, point.y / scale_factor);
                }
            }
        }
    }
}
