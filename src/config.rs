//! Tracker configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tracker::{AssignmentSolver, TrackerAlgorithm};

/// Presentation toggles. They only reach the renderer through
/// [`FrameReport`](crate::FrameReport) and never change tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DisplayOptions {
    pub bounding_box: bool,
    pub id: bool,
    pub landmark: bool,
    pub detection_phase: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            bounding_box: true,
            id: true,
            landmark: true,
            detection_phase: true,
        }
    }
}

/// Configuration for the face tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FaceTrackConfig {
    /// Frames without confirmation after which a face is deleted.
    pub delete_threshold: u32,
    /// Maximum number of frames between periodic detection phases.
    pub detection_gap_duration: u32,
    /// Gate factor applied to the detection width.
    #[serde(rename = "max-distance-factor")]
    pub distance_factor: f64,
    /// Resize factor applied to frames before detection and tracking.
    pub scale_factor: f32,
    #[serde(rename = "tracker")]
    pub tracker_algorithm: TrackerAlgorithm,
    pub solver: AssignmentSolver,
    pub display: DisplayOptions,
}

impl Default for FaceTrackConfig {
    fn default() -> Self {
        Self {
            delete_threshold: 72,
            detection_gap_duration: 10,
            distance_factor: 10.0,
            scale_factor: 1.0,
            tracker_algorithm: TrackerAlgorithm::default(),
            solver: AssignmentSolver::default(),
            display: DisplayOptions::default(),
        }
    }
}

impl FaceTrackConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.detection_gap_duration == 0 {
            return Err(Error::InvalidConfig(
                "detection-gap-duration must be at least 1".into(),
            ));
        }
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "scale-factor must be a positive number, got {}",
                self.scale_factor
            )));
        }
        if !(self.distance_factor.is_finite() && self.distance_factor >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max-distance-factor must be a non-negative number, got {}",
                self.distance_factor
            )));
        }
        Ok(())
    }
}
