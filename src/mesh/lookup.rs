//! Keyed lookups owned by the mesh.
//!
//! - [`CoincidenceIndex`] maps an exact 3D position to the vertex at that
//!   position. Keys compare coordinates bit for bit, with `-0.0` folded into
//!   `0.0`; no tolerance is applied.
//! - [`PairingIndex`] maps a directed vertex pair `(tail, head)` to the
//!   half-edge running along it. The twin of a half-edge is found under the
//!   reversed key.
//!
//! Both are only mutated by the mesh itself. Every mutation returns the value
//! it displaced so the collapse engine can undo it.

use std::collections::HashMap;

use nalgebra::Point3;

use super::index::{HalfEdgeId, MeshIndex, VertexId};

/// Bit-exact hashable key for a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PositionKey([u64; 3]);

impl PositionKey {
    /// Build the key for a position.
    pub fn new(p: &Point3<f64>) -> Self {
        // Adding 0.0 turns -0.0 into +0.0 and leaves every other value alone.
        Self([(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()])
    }
}

/// Position to vertex lookup.
#[derive(Debug, Clone)]
pub struct CoincidenceIndex<I: MeshIndex> {
    map: HashMap<PositionKey, VertexId<I>>,
}

impl<I: MeshIndex> Default for CoincidenceIndex<I> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<I: MeshIndex> CoincidenceIndex<I> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Vertex registered at exactly this position.
    pub fn get(&self, p: &Point3<f64>) -> Option<VertexId<I>> {
        self.map.get(&PositionKey::new(p)).copied()
    }

    /// Number of registered positions.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn insert(&mut self, p: &Point3<f64>, v: VertexId<I>) -> Option<VertexId<I>> {
        self.map.insert(PositionKey::new(p), v)
    }

    /// Remove the entry for `p` only if it belongs to `v`.
    pub(crate) fn remove_if(&mut self, p: &Point3<f64>, v: VertexId<I>) -> Option<VertexId<I>> {
        let key = PositionKey::new(p);
        if self.map.get(&key) == Some(&v) {
            self.map.remove(&key)
        } else {
            None
        }
    }

    pub(crate) fn raw(&self, key: PositionKey) -> Option<VertexId<I>> {
        self.map.get(&key).copied()
    }

    pub(crate) fn set_raw(&mut self, key: PositionKey, value: Option<VertexId<I>>) {
        match value {
            Some(v) => {
                self.map.insert(key, v);
            }
            None => {
                self.map.remove(&key);
            }
        }
    }
}

/// Directed vertex pair to half-edge lookup.
#[derive(Debug, Clone)]
pub struct PairingIndex<I: MeshIndex> {
    map: HashMap<(VertexId<I>, VertexId<I>), HalfEdgeId<I>>,
}

impl<I: MeshIndex> Default for PairingIndex<I> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<I: MeshIndex> PairingIndex<I> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Half-edge running from `tail` to `head`.
    pub fn get(&self, tail: VertexId<I>, head: VertexId<I>) -> Option<HalfEdgeId<I>> {
        self.map.get(&(tail, head)).copied()
    }

    /// Number of directed pairs.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Register `he` under `(tail, head)` unless the key is already taken.
    ///
    /// Returns the current owner of the key when it was already taken.
    pub(crate) fn try_insert(
        &mut self,
        tail: VertexId<I>,
        head: VertexId<I>,
        he: HalfEdgeId<I>,
    ) -> std::result::Result<(), HalfEdgeId<I>> {
        match self.map.get(&(tail, head)) {
            Some(&owner) if owner != he => Err(owner),
            _ => {
                self.map.insert((tail, head), he);
                Ok(())
            }
        }
    }

    /// Remove the entry for `(tail, head)` only if it belongs to `he`.
    pub(crate) fn remove_if(
        &mut self,
        tail: VertexId<I>,
        head: VertexId<I>,
        he: HalfEdgeId<I>,
    ) -> bool {
        if self.map.get(&(tail, head)) == Some(&he) {
            self.map.remove(&(tail, head));
            true
        } else {
            false
        }
    }

    pub(crate) fn set_raw(
        &mut self,
        key: (VertexId<I>, VertexId<I>),
        value: Option<HalfEdgeId<I>>,
    ) {
        match value {
            Some(he) => {
                self.map.insert(key, he);
            }
            None => {
                self.map.remove(&key);
            }
        }
    }

    pub(crate) fn raw(&self, key: (VertexId<I>, VertexId<I>)) -> Option<HalfEdgeId<I>> {
        self.map.get(&key).copied()
    }
}
