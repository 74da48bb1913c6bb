//! Slot arena owning one kind of mesh element.
//!
//! Elements are appended in insertion order and removed by tombstoning their
//! slot, so handles of surviving elements never move and iteration order is
//! insertion order. Slots are not recycled; a removed slot can only be filled
//! again by [`Arena::restore`], which the collapse engine uses to roll back.

use std::marker::PhantomData;

use super::index::Handle;

/// Storage for one element kind, addressed by handle `H`.
#[derive(Debug, Clone)]
pub(crate) struct Arena<T, H> {
    slots: Vec<Option<T>>,
    live: usize,
    _handle: PhantomData<H>,
}

impl<T, H: Handle> Default for Arena<T, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, H: Handle> Arena<T, H> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an arena with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            live: 0,
            _handle: PhantomData,
        }
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether there are no live elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever handed out, live or removed.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Append an element and return its handle.
    pub fn insert(&mut self, value: T) -> H {
        let handle = H::from_slot(self.slots.len());
        self.slots.push(Some(value));
        self.live += 1;
        handle
    }

    /// Whether `handle` refers to a live element.
    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        matches!(self.slots.get(handle.slot()), Some(Some(_)))
    }

    /// Get an element, or `None` if the handle is removed or out of range.
    #[inline]
    pub fn get(&self, handle: H) -> Option<&T> {
        self.slots.get(handle.slot()).and_then(Option::as_ref)
    }

    /// Mutable counterpart of [`Arena::get`].
    #[inline]
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.slots.get_mut(handle.slot()).and_then(Option::as_mut)
    }

    /// Remove an element, returning it if it was live.
    pub fn remove(&mut self, handle: H) -> Option<T> {
        let taken = self.slots.get_mut(handle.slot()).and_then(Option::take);
        if taken.is_some() {
            self.live -= 1;
        }
        taken
    }

    /// Put an element back into a removed slot.
    ///
    /// Returns `false` (and drops nothing) if the slot is live or was never
    /// handed out.
    pub fn restore(&mut self, handle: H, value: T) -> bool {
        match self.slots.get_mut(handle.slot()) {
            Some(slot @ None) => {
                *slot = Some(value);
                self.live += 1;
                true
            }
            _ => false,
        }
    }

    /// Iterate over live handles in insertion order.
    pub fn handles(&self) -> impl Iterator<Item = H> + '_ {
        self.iter().map(|(h, _)| h)
    }

    /// Iterate over live elements with their handles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (H::from_slot(i), v)))
    }

    /// Mutable counterpart of [`Arena::iter`].
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (H, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|v| (H::from_slot(i), v)))
    }
}

impl<T, H: Handle> std::ops::Index<H> for Arena<T, H> {
    type Output = T;

    fn index(&self, handle: H) -> &T {
        match self.get(handle) {
            Some(v) => v,
            None => panic!("stale or null handle {:?}", handle),
        }
    }
}

impl<T, H: Handle> std::ops::IndexMut<H> for Arena<T, H> {
    fn index_mut(&mut self, handle: H) -> &mut T {
        match self.slots.get_mut(handle.slot()).and_then(Option::as_mut) {
            Some(v) => v,
            None => panic!("stale or null handle {:?}", handle),
        }
    }
}
