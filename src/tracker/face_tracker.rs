//! Multi-face identity tracker.

use std::fmt;

use tracing::{debug, error, trace, warn};

use crate::config::FaceTrackConfig;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::integration::{FaceDetector, LandmarkPredictor};
use crate::tracker::association::AssociationEngine;
use crate::tracker::cycle::CycleController;
use crate::tracker::eviction::EvictionPolicy;
use crate::tracker::face::{FacePayload, TrackerUpdate};
use crate::tracker::snapshot::{FaceSnapshot, FrameReport};
use crate::tracker::store::EntityStore;
use crate::tracker::visual::{TrackerBackends, TrackerSeeder};

/// Frame numbers start here.
const FIRST_FRAME: u32 = 1;

type PayloadFactory = Box<dyn Fn(u32) -> FacePayload>;

/// Keeps face identities stable across frames.
///
/// Each call to [`FaceTracker::update`] runs, in order: eviction, per-face
/// tracker updates, the detection-phase decision, detection and association
/// when needed, landmark annotation, and report export. All geometry is in
/// the coordinates of the frame passed in.
pub struct FaceTracker {
    store: EntityStore,
    frame_number: u32,
    config: FaceTrackConfig,
    cycle: CycleController,
    association: AssociationEngine,
    eviction: EvictionPolicy,
    backends: TrackerBackends,
    landmark_predictor: Option<Box<dyn LandmarkPredictor>>,
    payload_factory: Option<PayloadFactory>,
}

impl FaceTracker {
    /// Fails when the configuration is invalid or no backend is registered
    /// for the configured tracker algorithm.
    pub fn new(config: FaceTrackConfig, backends: TrackerBackends) -> Result<Self> {
        config.validate()?;
        if !backends.supports(config.tracker_algorithm) {
            return Err(Error::UnsupportedTracker(config.tracker_algorithm));
        }

        Ok(Self {
            store: EntityStore::new(),
            frame_number: FIRST_FRAME,
            cycle: CycleController::new(config.detection_gap_duration),
            association: AssociationEngine::new(config.distance_factor, config.solver),
            eviction: EvictionPolicy::new(config.delete_threshold),
            config,
            backends,
            landmark_predictor: None,
            payload_factory: None,
        })
    }

    /// Number of the frame the next [`FaceTracker::update`] will process.
    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }

    pub fn config(&self) -> &FaceTrackConfig {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn set_landmark_predictor(&mut self, predictor: Box<dyn LandmarkPredictor>) {
        self.landmark_predictor = Some(predictor);
    }

    /// Install a freshly loaded landmark model. A load error is logged and
    /// disables landmark annotation; tracking is unaffected.
    pub fn load_landmark_predictor<E: fmt::Display>(
        &mut self,
        loaded: std::result::Result<Box<dyn LandmarkPredictor>, E>,
    ) -> bool {
        match loaded {
            Ok(predictor) => {
                self.landmark_predictor = Some(predictor);
                true
            }
            Err(err) => {
                error!(error = %err, "error when loading landmark predictor model");
                self.landmark_predictor = None;
                false
            }
        }
    }

    pub fn has_landmark_predictor(&self) -> bool {
        self.landmark_predictor.is_some()
    }

    /// Attach a payload built by `factory` to every face created from now on.
    pub fn set_payload_factory<F>(&mut self, factory: F)
    where
        F: Fn(u32) -> FacePayload + 'static,
    {
        self.payload_factory = Some(Box::new(factory));
    }

    /// Drop every face and restart frame and id numbering.
    pub fn reset(&mut self) {
        self.store.reset();
        self.frame_number = FIRST_FRAME;
    }

    pub fn update<D: FaceDetector>(
        &mut self,
        frame: &Frame,
        detector: &mut D,
    ) -> Result<FrameReport> {
        let frame_number = self.frame_number;
        debug!(frame = frame_number, faces = self.store.len(), "processing frame");

        // Step 1: Delete faces that have not been confirmed for too long
        let removed = self.eviction.evict(&mut self.store, frame_number);

        // Step 2: Advance every face's own tracker
        for face in self.store.iter_mut() {
            match face.update_tracker(frame, frame_number) {
                TrackerUpdate::Found => trace!(face_id = face.id(), "tracker updated"),
                TrackerUpdate::Lost => debug!(face_id = face.id(), "tracker lost its target"),
                TrackerUpdate::Detached | TrackerUpdate::Inert => {}
            }
        }

        // Step 3: Detection phase, periodic or forced by a lost target
        let trigger = self.cycle.decide(frame_number, &self.store);
        let mut detections = Vec::new();
        if let Some(trigger) = trigger {
            debug!(frame = frame_number, %trigger, "detection phase");
            detections = match detector.detect(frame) {
                Ok(detections) => detections,
                Err(err) => {
                    warn!(frame = frame_number, error = %err, "face detection failed");
                    Vec::new()
                }
            };

            let seeder = TrackerSeeder {
                backends: &self.backends,
                algorithm: self.config.tracker_algorithm,
                frame,
            };
            let outcome = self.association.associate(
                &mut self.store,
                &detections,
                &seeder,
                frame_number,
            )?;

            if let Some(factory) = &self.payload_factory {
                for &id in &outcome.created {
                    if let Some(face) = self.store.get_mut(id) {
                        face.set_user_data(factory(id));
                    }
                }
            }
        }

        // Step 4: Landmarks for faces with a running tracker; every other
        // face, and every face without a predictor, is cleared
        let predictor = self.landmark_predictor.as_deref();
        for face in self.store.iter_mut() {
            let landmark = match predictor {
                Some(predictor) if face.state().is_live() => {
                    predictor.predict(frame, face.bounding_box())
                }
                _ => Vec::new(),
            };
            face.set_landmark(landmark);
        }

        // Step 5: Export
        let report = FrameReport {
            frame_number,
            trigger,
            detections,
            faces: self
                .store
                .iter()
                .map(|face| (face.id(), FaceSnapshot::from_face(face, frame_number)))
                .collect(),
            removed,
            display: self.config.display,
        };

        self.frame_number += 1;
        Ok(report)
    }
}

impl fmt::Debug for FaceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceTracker")
            .field("frame_number", &self.frame_number)
            .field("config", &self.config)
            .field("store", &self.store)
            .field("backends", &self.backends)
            .field("has_landmark_predictor", &self.landmark_predictor.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use nalgebra::Point2;

    use super::*;
    use crate::tracker::cycle::DetectionTrigger;
    use crate::tracker::rect::Rect;
    use crate::tracker::track_state::TrackerState;
    use crate::tracker::visual::{TrackerAlgorithm, VisualTracker};

    struct Still(Rect);

    impl VisualTracker for Still {
        fn init(&mut self, _frame: &Frame, roi: Rect) -> bool {
            self.0 = roi;
            true
        }

        fn update(&mut self, _frame: &Frame) -> Option<Rect> {
            Some(self.0)
        }
    }

    struct Rejecting;

    impl VisualTracker for Rejecting {
        fn init(&mut self, _frame: &Frame, _roi: Rect) -> bool {
            false
        }

        fn update(&mut self, _frame: &Frame) -> Option<Rect> {
            None
        }
    }

    /// Loses the target on its first update.
    struct Blind;

    impl VisualTracker for Blind {
        fn init(&mut self, _frame: &Frame, _roi: Rect) -> bool {
            true
        }

        fn update(&mut self, _frame: &Frame) -> Option<Rect> {
            None
        }
    }

    struct Failing;

    impl FaceDetector for Failing {
        type Error = &'static str;

        fn detect(&mut self, _frame: &Frame) -> std::result::Result<Vec<Rect>, Self::Error> {
            Err("model not loaded")
        }
    }

    fn still_backends() -> TrackerBackends {
        TrackerBackends::new().with(TrackerAlgorithm::MedianFlow, || {
            Box::new(Still(Rect::default()))
        })
    }

    fn one_face(_frame: &Frame) -> Vec<Rect> {
        vec![Rect::new(0.0, 0.0, 20.0, 20.0)]
    }

    #[test]
    fn test_refuses_unregistered_algorithm() {
        let config = FaceTrackConfig {
            tracker_algorithm: TrackerAlgorithm::Tld,
            ..Default::default()
        };
        let err = FaceTracker::new(config, still_backends()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedTracker(TrackerAlgorithm::Tld)));
    }

    #[test]
    fn test_frame_numbers_advance() {
        let frame = Frame::new(4, 4);
        let mut tracker = FaceTracker::new(FaceTrackConfig::default(), still_backends()).unwrap();
        let mut detector = one_face;

        let first = tracker.update(&frame, &mut detector).unwrap();
        let second = tracker.update(&frame, &mut detector).unwrap();

        assert_eq!(first.frame_number, 1);
        assert_eq!(first.trigger, Some(DetectionTrigger::Periodic));
        assert_eq!(second.frame_number, 2);
        assert_eq!(second.trigger, None);
        assert_eq!(tracker.frame_number(), 3);
    }

    #[test]
    fn test_detector_error_is_recovered() {
        let frame = Frame::new(4, 4);
        let mut tracker = FaceTracker::new(FaceTrackConfig::default(), still_backends()).unwrap();

        let report = tracker.update(&frame, &mut Failing).unwrap();
        assert!(report.faces.is_empty());
        assert!(report.detections.is_empty());
        assert_eq!(tracker.frame_number(), 2);
    }

    #[test]
    fn test_failed_init_is_quarantined_until_next_phase() {
        let frame = Frame::new(4, 4);
        let backends =
            TrackerBackends::new().with(TrackerAlgorithm::MedianFlow, || Box::new(Rejecting));
        let config = FaceTrackConfig {
            detection_gap_duration: 5,
            ..Default::default()
        };
        let mut tracker = FaceTracker::new(config, backends).unwrap();
        let mut detector = one_face;

        let report = tracker.update(&frame, &mut detector).unwrap();
        assert_eq!(report.faces[&1].state, TrackerState::Uninitialized);
        assert!(!report.faces[&1].display);

        // Inert faces neither update nor force a detection phase.
        let report = tracker.update(&frame, &mut detector).unwrap();
        assert_eq!(report.trigger, None);
        assert_eq!(report.faces[&1].last_detected_frame, 1);

        for _ in 3..=5 {
            tracker.update(&frame, &mut detector).unwrap();
        }
        // Frame 6 is a detection phase: the same face is matched and retried.
        let report = tracker.update(&frame, &mut detector).unwrap();
        assert_eq!(report.trigger, Some(DetectionTrigger::Periodic));
        assert_eq!(report.faces.len(), 1);
        assert_eq!(report.faces[&1].last_detected_frame, 6);
    }

    #[test]
    fn test_landmarks_and_payloads() {
        let frame = Frame::new(4, 4);
        let mut tracker = FaceTracker::new(FaceTrackConfig::default(), still_backends()).unwrap();
        let loaded: std::result::Result<Box<dyn LandmarkPredictor>, String> =
            Ok(Box::new(|_frame: &Frame, face: Rect| vec![Point2::new(face.x, face.y)]));
        assert!(tracker.load_landmark_predictor(loaded));

        let created = Rc::new(Cell::new(0));
        let counter = created.clone();
        tracker.set_payload_factory(move |id| {
            counter.set(counter.get() + 1);
            FacePayload::new(id * 100)
        });

        let report = tracker.update(&frame, &mut one_face).unwrap();

        assert_eq!(report.faces[&1].landmark, Some(vec![Point2::new(0.0, 0.0)]));
        assert_eq!(created.get(), 1);
        assert_eq!(tracker.store().get(1).unwrap().user_data::<u32>(), Some(&100));
    }

    #[test]
    fn test_landmark_load_failure_disables_annotation() {
        let frame = Frame::new(4, 4);
        let mut tracker = FaceTracker::new(FaceTrackConfig::default(), still_backends()).unwrap();
        let loaded: std::result::Result<Box<dyn LandmarkPredictor>, String> =
            Err("truncated model file".to_string());

        assert!(!tracker.load_landmark_predictor(loaded));
        assert!(!tracker.has_landmark_predictor());
        let report = tracker.update(&frame, &mut one_face).unwrap();
        assert!(report.faces[&1].landmark.is_none());
    }

    #[test]
    fn test_failed_reload_clears_previous_landmarks() {
        let frame = Frame::new(4, 4);
        let mut tracker = FaceTracker::new(FaceTrackConfig::default(), still_backends()).unwrap();
        let loaded: std::result::Result<Box<dyn LandmarkPredictor>, String> =
            Ok(Box::new(|_frame: &Frame, face: Rect| vec![Point2::new(face.x, face.y)]));
        assert!(tracker.load_landmark_predictor(loaded));

        let report = tracker.update(&frame, &mut one_face).unwrap();
        assert_eq!(report.faces[&1].landmark, Some(vec![Point2::new(0.0, 0.0)]));

        let reloaded: std::result::Result<Box<dyn LandmarkPredictor>, String> =
            Err("corrupt model".to_string());
        assert!(!tracker.load_landmark_predictor(reloaded));

        let report = tracker.update(&frame, &mut one_face).unwrap();
        assert_eq!(report.faces[&1].state, TrackerState::Tracking);
        assert!(report.faces[&1].landmark.is_none());
        assert!(tracker.store().get(1).unwrap().landmark().is_empty());
    }

    #[test]
    fn test_lost_face_drops_its_landmarks() {
        let frame = Frame::new(4, 4);
        let backends =
            TrackerBackends::new().with(TrackerAlgorithm::MedianFlow, || Box::new(Blind));
        let mut tracker = FaceTracker::new(FaceTrackConfig::default(), backends).unwrap();
        tracker.set_landmark_predictor(Box::new(|_frame: &Frame, face: Rect| {
            vec![face.centroid()]
        }));
        // Only the first detection phase sees the face.
        let mut calls = 0;
        let mut detector = |frame: &Frame| {
            calls += 1;
            if calls == 1 {
                one_face(frame)
            } else {
                Vec::new()
            }
        };

        let report = tracker.update(&frame, &mut detector).unwrap();
        assert!(report.faces[&1].landmark.is_some());

        let report = tracker.update(&frame, &mut detector).unwrap();
        assert_eq!(report.faces[&1].state, TrackerState::Unset);
        assert!(report.faces[&1].landmark.is_none());
    }

    #[test]
    fn test_reset() {
        let frame = Frame::new(4, 4);
        let mut tracker = FaceTracker::new(FaceTrackConfig::default(), still_backends()).unwrap();
        tracker.update(&frame, &mut one_face).unwrap();
        tracker.reset();

        assert!(tracker.store().is_empty());
        assert_eq!(tracker.frame_number(), 1);
    }
}
