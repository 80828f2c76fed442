//! Removal of faces that have not been confirmed for too long.

use tracing::{debug, trace};

use crate::tracker::store::EntityStore;

#[derive(Debug, Clone, Copy)]
pub struct EvictionPolicy {
    delete_threshold: u32,
}

impl EvictionPolicy {
    pub fn new(delete_threshold: u32) -> Self {
        Self { delete_threshold }
    }

    pub fn delete_threshold(&self) -> u32 {
        self.delete_threshold
    }

    /// Ids whose last confirmation is more than `delete_threshold` frames old.
    pub fn expired(&self, store: &EntityStore, frame_number: u32) -> Vec<u32> {
        store
            .iter()
            .filter(|face| {
                let delta = frame_number.saturating_sub(face.last_detected_frame());
                trace!(face_id = face.id(), delta, "frames since last detection");
                delta > self.delete_threshold
            })
            .map(|face| face.id())
            .collect()
    }

    /// Remove every expired face and return the removed ids.
    pub fn evict(&self, store: &mut EntityStore, frame_number: u32) -> Vec<u32> {
        let expired = self.expired(store, frame_number);
        for &id in &expired {
            store.remove(id);
            debug!(
                face_id = id,
                delete_threshold = self.delete_threshold,
                "face deleted"
            );
        }
        expired
    }
}
