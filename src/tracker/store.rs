//! Identifier-keyed face storage.

use std::collections::BTreeMap;

use crate::tracker::face::FaceEntity;
use crate::tracker::rect::Rect;

/// Owns every live [`FaceEntity`] of a tracking session.
///
/// Identifiers start at 1 and are never reused within a session. Iteration
/// is in ascending id order.
#[derive(Debug, Default)]
pub struct EntityStore {
    faces: BTreeMap<u32, FaceEntity>,
    last_id: u32,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new `Uninitialized` face and return its identifier.
    pub fn create(&mut self, bounding_box: Rect, frame_number: u32) -> u32 {
        self.last_id += 1;
        let id = self.last_id;
        self.faces
            .insert(id, FaceEntity::new(id, bounding_box, frame_number));
        id
    }

    pub fn get(&self, id: u32) -> Option<&FaceEntity> {
        self.faces.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut FaceEntity> {
        self.faces.get_mut(&id)
    }

    /// Remove and destroy a face. Returns false for an unknown id.
    pub fn remove(&mut self, id: u32) -> bool {
        self.faces.remove(&id).is_some()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.faces.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Most recently allocated identifier (0 before the first face).
    pub fn last_id(&self) -> u32 {
        self.last_id
    }

    pub fn ids(&self) -> Vec<u32> {
        self.faces.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FaceEntity> {
        self.faces.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FaceEntity> {
        self.faces.values_mut()
    }

    /// Visit every face for in-place mutation.
    pub fn for_each<F>(&mut self, f: F)
    where
        F: FnMut(&mut FaceEntity),
    {
        self.faces.values_mut().for_each(f);
    }

    /// Destroy every face and restart identifier allocation.
    pub fn reset(&mut self) {
        self.faces.clear();
        self.last_id = 0;
    }
}
