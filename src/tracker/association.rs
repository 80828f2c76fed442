//! Detection-to-face data association.

use tracing::{debug, trace};

use crate::error::Result;
use crate::tracker::matching::{self, AssignmentSolver};
use crate::tracker::rect::Rect;
use crate::tracker::store::EntityStore;
use crate::tracker::visual::TrackerSeeder;

/// What happened to detections and faces during one association pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationOutcome {
    /// Accepted `(detection index, face id)` pairs.
    pub matched: Vec<(usize, u32)>,
    /// Faces whose assigned detection was too far away.
    pub rejected: Vec<u32>,
    /// Faces created for detections without an accepted match.
    pub created: Vec<u32>,
    /// Faces that received a fresh tracker from their matched detection.
    pub reseeded: Vec<u32>,
}

/// Matches a detection phase's boxes against the faces already in the store.
///
/// Costs are centroid distances. After the global assignment each pair is
/// gated individually: a pair is accepted only when its distance is below
/// `distance_factor` times the detection width.
#[derive(Debug, Clone, Copy)]
pub struct AssociationEngine {
    distance_factor: f64,
    solver: AssignmentSolver,
}

impl AssociationEngine {
    pub fn new(distance_factor: f64, solver: AssignmentSolver) -> Self {
        Self {
            distance_factor,
            solver,
        }
    }

    /// Largest centroid distance accepted for `detection`.
    pub fn max_distance(&self, detection: &Rect) -> f64 {
        self.distance_factor * detection.width as f64
    }

    pub fn associate(
        &self,
        store: &mut EntityStore,
        detections: &[Rect],
        seeder: &TrackerSeeder<'_>,
        frame_number: u32,
    ) -> Result<AssociationOutcome> {
        let mut outcome = AssociationOutcome::default();
        if detections.is_empty() {
            return Ok(outcome);
        }

        let face_ids = store.ids();
        if face_ids.is_empty() {
            for detection in detections {
                outcome
                    .created
                    .push(spawn(store, *detection, seeder, frame_number)?);
            }
            return Ok(outcome);
        }

        let face_boxes: Vec<Rect> = face_ids
            .iter()
            .filter_map(|&id| store.get(id).map(|face| face.bounding_box()))
            .collect();
        let dists = matching::centroid_distance(detections, &face_boxes);

        debug!(
            rows = detections.len(),
            cols = face_ids.len(),
            "solving detection-to-face assignment"
        );
        let assignment = self.solver.solve(&dists);

        for (idet, assigned) in assignment.into_iter().enumerate() {
            let detection = detections[idet];
            let accepted = match assigned {
                Some(iface) => {
                    let id = face_ids[iface];
                    let distance = dists[[idet, iface]];
                    let max_distance = self.max_distance(&detection);
                    let within_gate = distance < max_distance;

                    if let Some(face) = store.get_mut(id) {
                        if within_gate {
                            face.confirm_detection(detection, frame_number);
                            if face.state().needs_seed() {
                                debug!(
                                    face_id = id,
                                    "creating a new tracker because target was lost"
                                );
                                seeder.seed(face)?;
                                outcome.reseeded.push(id);
                            }
                            outcome.matched.push((idet, id));
                        } else {
                            debug!(
                                face_id = id,
                                distance,
                                max_distance,
                                "face is too far from its detection"
                            );
                            face.release_tracker();
                            outcome.rejected.push(id);
                        }
                    }
                    within_gate
                }
                None => false,
            };

            if !accepted {
                trace!(detection = idet, "detection could not be assigned");
                outcome
                    .created
                    .push(spawn(store, detection, seeder, frame_number)?);
            }
        }

        Ok(outcome)
    }
}

fn spawn(
    store: &mut EntityStore,
    detection: Rect,
    seeder: &TrackerSeeder<'_>,
    frame_number: u32,
) -> Result<u32> {
    let id = store.create(detection, frame_number);
    if let Some(face) = store.get_mut(id) {
        seeder.seed(face)?;
    }
    debug!(face_id = id, "face created");
    Ok(id)
}
