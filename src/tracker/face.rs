//! Tracked face entity and its tracker state machine.

use std::any::Any;
use std::fmt;

use nalgebra::Point2;
use tracing::trace;

use crate::error::Result;
use crate::frame::Frame;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackerState;
use crate::tracker::visual::{TrackerAlgorithm, TrackerBackends, VisualTracker};

type Destructor = Box<dyn FnOnce(Box<dyn Any>)>;

/// Opaque per-face value owned by a [`FaceEntity`].
///
/// Downstream decorators (sprite animation counters and the like) attach
/// their own state here. The destructor, if any, runs exactly once when the
/// payload is dropped: on face removal, on replacement, or at store teardown.
pub struct FacePayload {
    value: Option<Box<dyn Any>>,
    destructor: Option<Destructor>,
}

impl FacePayload {
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            value: Some(Box::new(value)),
            destructor: None,
        }
    }

    pub fn with_destructor<T, F>(value: T, destructor: F) -> Self
    where
        T: Any,
        F: FnOnce(T) + 'static,
    {
        Self {
            value: Some(Box::new(value)),
            destructor: Some(Box::new(move |boxed: Box<dyn Any>| {
                if let Ok(value) = boxed.downcast::<T>() {
                    destructor(*value);
                }
            })),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_deref()?.downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.as_deref_mut()?.downcast_mut()
    }
}

impl Drop for FacePayload {
    fn drop(&mut self) {
        if let (Some(value), Some(destructor)) = (self.value.take(), self.destructor.take()) {
            destructor(value);
        }
    }
}

impl fmt::Debug for FacePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacePayload")
            .field("has_destructor", &self.destructor.is_some())
            .finish_non_exhaustive()
    }
}

/// Outcome of [`FaceEntity::update_tracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerUpdate {
    /// The tracker found the target and the bounding box moved.
    Found,
    /// The tracker lost the target on this frame and was released.
    Lost,
    /// No tracker: the face is waiting to be re-acquired by a detection.
    Detached,
    /// The tracker never accepted its reference region.
    Inert,
}

/// A face with a persistent identity across frames.
pub struct FaceEntity {
    id: u32,
    bounding_box: Rect,
    previous_bounding_box: Option<Rect>,
    last_detected_frame: u32,
    landmark: Vec<Point2<f32>>,
    state: TrackerState,
    tracker: Option<Box<dyn VisualTracker>>,
    user_data: Option<FacePayload>,
}

impl FaceEntity {
    pub(crate) fn new(id: u32, bounding_box: Rect, frame_number: u32) -> Self {
        Self {
            id,
            bounding_box,
            previous_bounding_box: None,
            last_detected_frame: frame_number,
            landmark: Vec::new(),
            state: TrackerState::Uninitialized,
            tracker: None,
            user_data: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn bounding_box(&self) -> Rect {
        self.bounding_box
    }

    /// Box held before the most recent successful move, if any.
    pub fn previous_bounding_box(&self) -> Option<Rect> {
        self.previous_bounding_box
    }

    pub fn centroid(&self) -> Point2<f32> {
        self.bounding_box.centroid()
    }

    pub fn last_detected_frame(&self) -> u32 {
        self.last_detected_frame
    }

    pub fn landmark(&self) -> &[Point2<f32>] {
        &self.landmark
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn set_landmark(&mut self, landmark: Vec<Point2<f32>>) {
        self.landmark = landmark;
    }

    /// Attach a payload, dropping (and destroying) any previous one.
    pub fn set_user_data(&mut self, payload: FacePayload) {
        self.user_data = Some(payload);
    }

    pub fn user_data<T: 'static>(&self) -> Option<&T> {
        self.user_data.as_ref()?.downcast_ref()
    }

    pub fn user_data_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.user_data.as_mut()?.downcast_mut()
    }

    /// Record a confirmation on `frame_number`. Never moves backwards.
    pub fn mark_detected(&mut self, frame_number: u32) {
        self.last_detected_frame = self.last_detected_frame.max(frame_number);
    }

    /// Move the face onto a matched detection box.
    pub fn confirm_detection(&mut self, detection: Rect, frame_number: u32) {
        self.previous_bounding_box = Some(self.bounding_box);
        self.bounding_box = detection;
        self.mark_detected(frame_number);
        if self.state.is_live() {
            self.state = TrackerState::Waiting;
        }
    }

    /// Build a new tracker for this face. Any previous tracker is released.
    pub fn create_tracker(
        &mut self,
        backends: &TrackerBackends,
        algorithm: TrackerAlgorithm,
    ) -> Result<()> {
        let tracker = backends.create(algorithm)?;
        if let Some(mut old) = self.tracker.replace(tracker) {
            old.release();
        }
        self.state = TrackerState::Uninitialized;
        Ok(())
    }

    /// Seed the tracker with the current bounding box.
    ///
    /// On failure the face stays `Uninitialized`.
    pub fn init_tracker(&mut self, frame: &Frame) -> bool {
        if self.state != TrackerState::Uninitialized {
            return false;
        }
        let Some(tracker) = self.tracker.as_mut() else {
            return false;
        };
        let accepted = tracker.init(frame, self.bounding_box);
        if accepted {
            self.state = TrackerState::Initialized;
        } else {
            trace!(face_id = self.id, "tracker rejected its reference region");
        }
        accepted
    }

    /// Advance the tracker by one frame.
    pub fn update_tracker(&mut self, frame: &Frame, frame_number: u32) -> TrackerUpdate {
        if self.state == TrackerState::Unset {
            return TrackerUpdate::Detached;
        }
        if !self.state.is_live() {
            return TrackerUpdate::Inert;
        }
        let Some(tracker) = self.tracker.as_mut() else {
            self.state = TrackerState::Unset;
            return TrackerUpdate::Detached;
        };

        match tracker.update(frame) {
            Some(bounding_box) => {
                self.previous_bounding_box = Some(self.bounding_box);
                self.bounding_box = bounding_box;
                self.mark_detected(frame_number);
                self.state = TrackerState::Tracking;
                TrackerUpdate::Found
            }
            None => {
                self.release_tracker();
                TrackerUpdate::Lost
            }
        }
    }

    /// Drop the tracker; the face now needs a detection to be re-acquired.
    pub fn release_tracker(&mut self) {
        if let Some(mut tracker) = self.tracker.take() {
            tracker.release();
        }
        self.state = TrackerState::Unset;
    }
}

impl Drop for FaceEntity {
    fn drop(&mut self) {
        if let Some(mut tracker) = self.tracker.take() {
            tracker.release();
        }
    }
}

impl fmt::Debug for FaceEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceEntity")
            .field("id", &self.id)
            .field("bounding_box", &self.bounding_box)
            .field("previous_bounding_box", &self.previous_bounding_box)
            .field("last_detected_frame", &self.last_detected_frame)
            .field("landmark_len", &self.landmark.len())
            .field("state", &self.state)
            .field("user_data", &self.user_data)
            .finish_non_exhaustive()
    }
}
