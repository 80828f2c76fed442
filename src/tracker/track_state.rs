use serde::{Deserialize, Serialize};

/// Lifecycle of the visual tracker attached to a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackerState {
    /// No tracker; the face needs a detection to be re-acquired
    #[default]
    Unset,
    /// Tracker created but not yet accepted a reference region
    Uninitialized,
    /// Tracker seeded from a detection on the current frame
    Initialized,
    /// Confirmed by a detection while the tracker keeps running
    Waiting,
    /// Last tracker update found the target
    Tracking,
}

impl TrackerState {
    /// Whether the face owns a running tracker.
    #[inline]
    pub fn is_live(self) -> bool {
        matches!(
            self,
            TrackerState::Initialized | TrackerState::Waiting | TrackerState::Tracking
        )
    }

    /// Whether a matching detection must create and seed a fresh tracker.
    #[inline]
    pub fn needs_seed(self) -> bool {
        matches!(self, TrackerState::Unset | TrackerState::Uninitialized)
    }
}
