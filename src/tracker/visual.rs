//! Pluggable single-object visual trackers.
//!
//! The face tracker never implements a tracking algorithm itself. Each face
//! owns one boxed [`VisualTracker`] built from the [`TrackerBackends`]
//! registry for the configured [`TrackerAlgorithm`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::tracker::face::FaceEntity;
use crate::tracker::rect::Rect;

/// Single-object tracker capability.
///
/// # Example
///
/// ```ignore
/// use facetrack_rs::{Frame, Rect, VisualTracker};
///
/// struct MyKcf { /* native handle */ }
///
/// impl VisualTracker for MyKcf {
///     fn init(&mut self, frame: &Frame, roi: Rect) -> bool {
///         // Accept `roi` as the reference region
///         true
///     }
///
///     fn update(&mut self, frame: &Frame) -> Option<Rect> {
///         // Return the new region, or None when the target is lost
///         None
///     }
/// }
/// ```
pub trait VisualTracker {
    /// Take `roi` on `frame` as the reference region. Returns false if the
    /// algorithm rejects it.
    fn init(&mut self, frame: &Frame, roi: Rect) -> bool;

    /// Locate the target on `frame`. `None` means the target was lost.
    fn update(&mut self, frame: &Frame) -> Option<Rect>;

    /// Free backend resources. Called once before the handle is dropped.
    fn release(&mut self) {}
}

/// Tracking algorithm selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackerAlgorithm {
    Boosting,
    Goturn,
    /// Kernelized Correlation Filters
    Kcf,
    #[default]
    MedianFlow,
    /// Multiple Instance Learning
    Mil,
    /// Tracking Learning Detection
    Tld,
}

impl TrackerAlgorithm {
    pub const ALL: [TrackerAlgorithm; 6] = [
        TrackerAlgorithm::Boosting,
        TrackerAlgorithm::Goturn,
        TrackerAlgorithm::Kcf,
        TrackerAlgorithm::MedianFlow,
        TrackerAlgorithm::Mil,
        TrackerAlgorithm::Tld,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrackerAlgorithm::Boosting => "boosting",
            TrackerAlgorithm::Goturn => "goturn",
            TrackerAlgorithm::Kcf => "kcf",
            TrackerAlgorithm::MedianFlow => "median-flow",
            TrackerAlgorithm::Mil => "mil",
            TrackerAlgorithm::Tld => "tld",
        }
    }
}

impl fmt::Display for TrackerAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackerAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TrackerAlgorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownTrackerAlgorithm(s.to_string()))
    }
}

type TrackerConstructor = Box<dyn Fn() -> Box<dyn VisualTracker>>;

/// Registry of tracker constructors, one per supported algorithm.
#[derive(Default)]
pub struct TrackerBackends {
    constructors: HashMap<TrackerAlgorithm, TrackerConstructor>,
}

impl TrackerBackends {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the constructor for `algorithm`.
    pub fn register<F>(&mut self, algorithm: TrackerAlgorithm, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn VisualTracker> + 'static,
    {
        self.constructors.insert(algorithm, Box::new(constructor));
        self
    }

    /// Builder-style variant of [`TrackerBackends::register`].
    pub fn with<F>(mut self, algorithm: TrackerAlgorithm, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn VisualTracker> + 'static,
    {
        self.register(algorithm, constructor);
        self
    }

    pub fn supports(&self, algorithm: TrackerAlgorithm) -> bool {
        self.constructors.contains_key(&algorithm)
    }

    pub fn create(&self, algorithm: TrackerAlgorithm) -> Result<Box<dyn VisualTracker>> {
        self.constructors
            .get(&algorithm)
            .map(|constructor| constructor())
            .ok_or(Error::UnsupportedTracker(algorithm))
    }
}

impl fmt::Debug for TrackerBackends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

/// Everything needed to give a face a fresh tracker on the current frame.
pub struct TrackerSeeder<'a> {
    pub backends: &'a TrackerBackends,
    pub algorithm: TrackerAlgorithm,
    pub frame: &'a Frame,
}

impl TrackerSeeder<'_> {
    /// Create a tracker for `face` and initialize it on its current box.
    /// Returns whether initialization succeeded.
    pub fn seed(&self, face: &mut FaceEntity) -> Result<bool> {
        face.create_tracker(self.backends, self.algorithm)?;
        Ok(face.init_tracker(self.frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert;

    impl VisualTracker for Inert {
        fn init(&mut self, _frame: &Frame, _roi: Rect) -> bool {
            true
        }

        fn update(&mut self, _frame: &Frame) -> Option<Rect> {
            None
        }
    }

    #[test]
    fn test_algorithm_names_round_trip() {
        for algorithm in TrackerAlgorithm::ALL {
            assert_eq!(algorithm.as_str().parse::<TrackerAlgorithm>().unwrap(), algorithm);
        }
        assert_eq!("KCF".parse::<TrackerAlgorithm>().unwrap(), TrackerAlgorithm::Kcf);
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        let err = "csrt".parse::<TrackerAlgorithm>().unwrap_err();
        assert!(matches!(err, Error::UnknownTrackerAlgorithm(name) if name == "csrt"));
    }

    #[test]
    fn test_backends_create() {
        let backends = TrackerBackends::new().with(TrackerAlgorithm::Kcf, || Box::new(Inert));

        assert!(backends.supports(TrackerAlgorithm::Kcf));
        assert!(backends.create(TrackerAlgorithm::Kcf).is_ok());
        assert!(matches!(
            backends.create(TrackerAlgorithm::Tld),
            Err(Error::UnsupportedTracker(TrackerAlgorithm::Tld))
        ));
    }
}
