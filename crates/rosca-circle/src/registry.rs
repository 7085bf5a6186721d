//! # Circle Registry
//!
//! Circle records keyed by id, plus the set of ids retired by
//! decommission. The registry is the single source of truth for rotation
//! state.

use std::collections::{HashMap, HashSet};

use rosca_core::CircleId;

use crate::circle::Circle;

#[derive(Debug, Default)]
pub struct CircleRegistry {
    circles: HashMap<CircleId, Circle>,
    retired: HashSet<CircleId>,
}

impl CircleRegistry {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &CircleId) -> Option<&Circle> {
        self.circles.get(id)
    }

    pub fn contains(&self, id: &CircleId) -> bool {
        self.circles.contains_key(id)
    }

    pub fn is_retired(&self, id: &CircleId) -> bool {
        self.retired.contains(id)
    }

    /// Insert a new record. Returns `false` and leaves the registry unchanged
    /// if the id is live.
    pub fn insert(&mut self, circle: Circle) -> bool {
        if self.circles.contains_key(&circle.id) {
            return false;
        }
        self.circles.insert(circle.id, circle);
        true
    }

    /// Advance the rotation pointer of a live circle.
    pub fn set_index(&mut self, id: &CircleId, index: usize) -> bool {
        match self.circles.get_mut(id) {
            Some(circle) if index < circle.members.len() => {
                circle.current_index = index;
                true
            }
            _ => false,
        }
    }

    /// Remove a record, optionally retiring its id.
    pub fn remove(&mut self, id: &CircleId, retire: bool) -> Option<Circle> {
        let removed = self.circles.remove(id);
        if removed.is_some() && retire {
            self.retired.insert(*id);
        }
        removed
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.circles.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }
}
