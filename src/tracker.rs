mod association;
mod cycle;
mod eviction;
mod face;
mod face_tracker;
mod matching;
mod rect;
mod snapshot;
mod store;
mod track_state;
mod visual;

pub use association::{AssociationEngine, AssociationOutcome};
pub use cycle::{CycleController, DetectionTrigger};
pub use eviction::EvictionPolicy;
pub use face::{FaceEntity, FacePayload, TrackerUpdate};
pub use face_tracker::FaceTracker;
pub use matching::{AssignmentSolver, centroid_distance};
pub use rect::Rect;
pub use snapshot::{FaceSnapshot, FrameReport};
pub use store::EntityStore;
pub use track_state::TrackerState;
pub use visual::{TrackerAlgorithm, TrackerBackends, TrackerSeeder, VisualTracker};
