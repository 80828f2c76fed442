//! Detection/tracking cycle control.

use std::fmt;

use serde::Serialize;

use crate::tracker::store::EntityStore;
use crate::tracker::track_state::TrackerState;

/// Reason a frame runs the full-frame face detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionTrigger {
    /// Regular detection phase of the cycle
    Periodic,
    /// A face has no tracker and needs to be re-acquired
    TargetLost,
}

impl fmt::Display for DetectionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionTrigger::Periodic => write!(f, "periodic"),
            DetectionTrigger::TargetLost => write!(f, "target-lost"),
        }
    }
}

/// Decides per frame between a detection phase and tracking only.
#[derive(Debug, Clone, Copy)]
pub struct CycleController {
    gap_duration: u32,
}

impl CycleController {
    /// `gap_duration` is clamped to at least 1.
    pub fn new(gap_duration: u32) -> Self {
        Self {
            gap_duration: gap_duration.max(1),
        }
    }

    pub fn gap_duration(&self) -> u32 {
        self.gap_duration
    }

    /// Frames 1, 1 + gap, 1 + 2 * gap, ... are detection phases.
    ///
    /// Frame numbers start at 1. A gap of 1 makes every frame a detection
    /// phase.
    pub fn is_detection_phase(&self, frame_number: u32) -> bool {
        frame_number.wrapping_sub(1) % self.gap_duration == 0
    }

    /// Trigger for this frame, if any. Must be called after tracker updates
    /// so that faces which lost their target this frame are `Unset`.
    pub fn decide(&self, frame_number: u32, store: &EntityStore) -> Option<DetectionTrigger> {
        if self.is_detection_phase(frame_number) {
            Some(DetectionTrigger::Periodic)
        } else if store
            .iter()
            .any(|face| face.state() == TrackerState::Unset)
        {
            Some(DetectionTrigger::TargetLost)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::rect::Rect;

    #[test]
    fn test_periodic_phases() {
        let cycle = CycleController::new(10);
        let phases: Vec<u32> = (1..=31).filter(|&f| cycle.is_detection_phase(f)).collect();
        assert_eq!(phases, vec![1, 11, 21, 31]);
    }

    #[test]
    fn test_gap_of_one_detects_every_frame() {
        let cycle = CycleController::new(1);
        assert!((1..=5).all(|f| cycle.is_detection_phase(f)));
        assert_eq!(CycleController::new(0).gap_duration(), 1);
    }

    #[test]
    fn test_lost_target_forces_detection() {
        let cycle = CycleController::new(10);
        let mut store = EntityStore::new();
        let id = store.create(Rect::default(), 1);

        assert_eq!(cycle.decide(5, &store), None);
        store.get_mut(id).unwrap().release_tracker();
        assert_eq!(cycle.decide(5, &store), Some(DetectionTrigger::TargetLost));
        assert_eq!(cycle.decide(11, &store), Some(DetectionTrigger::Periodic));
    }

    #[test]
    fn test_trigger_display_matches_serialized_name() {
        for trigger in [DetectionTrigger::Periodic, DetectionTrigger::TargetLost] {
            let json = serde_json::to_string(&trigger).unwrap();
            assert_eq!(json, format!("\"{trigger}\""));
        }
        assert_eq!(DetectionTrigger::TargetLost.to_string(), "target-lost");
    }
}
