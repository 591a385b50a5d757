//! Index-addressed body storage.

use spume_core::BodyId;

use crate::body::Body;

/// Owns all bodies of a simulation.
///
/// `BodyId(n)` addresses the n-th body in registration order. Bodies
/// are registered once during setup; the store never grows or shrinks
/// inside the integration loop.
#[derive(Clone, Debug, Default)]
pub struct BodyStore {
    bodies: Vec<Body>,
}

impl BodyStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body and return its id.
    pub fn push(&mut self, body: Body) -> BodyId {
        let id = BodyId(u32::try_from(self.bodies.len()).expect("body count fits in u32"));
        self.bodies.push(body);
        id
    }

    /// Number of registered bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the store holds zero bodies.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Look up a body.
    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0 as usize)
    }

    /// Look up a body mutably.
    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.0 as usize)
    }

    /// Mutable access to two distinct bodies at once.
    ///
    /// Needed by cross-body operators (force transfer reads the fluid
    /// while writing the solid). Returns `None` if either id is out of
    /// range or the ids are equal.
    pub fn pair_mut(&mut self, a: BodyId, b: BodyId) -> Option<(&mut Body, &mut Body)> {
        let (ia, ib) = (a.0 as usize, b.0 as usize);
        if ia == ib || ia >= self.bodies.len() || ib >= self.bodies.len() {
            return None;
        }
        if ia < ib {
            let (left, right) = self.bodies.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.bodies.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    /// Iterate over `(id, body)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(i, b)| (BodyId(i as u32), b))
    }
}
