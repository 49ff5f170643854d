use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// The three entity kinds stored by a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Point,
    Polygon,
    Object,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Point => "point",
            Self::Polygon => "polygon",
            Self::Object => "object",
        })
    }
}

/// A slot index into one entity table.
///
/// Ids carry no generation: once a slot is freed and reallocated, an old id
/// silently refers to the new occupant.
pub trait EntityId: Copy + Eq + Hash + fmt::Debug {
    /// Which table this id indexes.
    const KIND: EntityKind;

    /// Wraps a raw slot number.
    fn from_raw(raw: u16) -> Self;

    /// The raw slot number.
    fn raw(self) -> u16;

    /// The slot number as a table offset.
    fn slot(self) -> usize {
        usize::from(self.raw())
    }

    /// Builds a [`ModelError::NotFound`] for this id.
    fn not_found(self) -> ModelError {
        ModelError::NotFound {
            kind: Self::KIND,
            index: self.raw(),
        }
    }
}

/// Declares a transparent `u16` newtype implementing [`EntityId`].
macro_rules! entity_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident => $kind:expr;) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        $vis struct $name(u16);

        impl $name {
            /// Wraps a raw slot number. The id may be out of range or refer to
            /// a free slot; every lookup checks.
            #[must_use]
            pub const fn new(raw: u16) -> Self {
                Self(raw)
            }
        }

        impl $crate::model::EntityId for $name {
            const KIND: $crate::model::EntityKind = $kind;

            fn from_raw(raw: u16) -> Self {
                Self(raw)
            }

            fn raw(self) -> u16 {
                self.0
            }
        }
    };
}

pub(crate) use entity_id;

#[derive(Debug, Clone, Default)]
struct Slot<T> {
    live: bool,
    selected: bool,
    record: T,
}

/// Fixed-capacity slot table with a liveness and a selection flag per slot.
///
/// Allocation is first-fit: the lowest free slot is always reused. Freeing
/// never compacts and never touches other records, so links held elsewhere
/// may dangle until their owner is updated.
#[derive(Debug, Clone)]
pub struct Arena<K, T> {
    slots: Vec<Slot<T>>,
    high_water: usize,
    last_allocated: Option<K>,
    _kind: PhantomData<K>,
}

impl<K: EntityId, T: Default> Arena<K, T> {
    /// Creates an empty table with `capacity` slots.
    ///
    /// Capacities beyond the `u16` index space are clamped.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(usize::from(u16::MAX) + 1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::default);
        Self {
            slots,
            high_water: 0,
            last_allocated: None,
            _kind: PhantomData,
        }
    }

    /// Stores `record` in the lowest free slot.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CapacityExhausted`] if every slot is live.
    pub fn allocate(&mut self, record: T) -> Result<K, ModelError> {
        let Some(slot) = self.slots.iter().position(|s| !s.live) else {
            tracing::warn!(kind = %K::KIND, capacity = self.capacity(), "table full");
            return Err(ModelError::CapacityExhausted {
                kind: K::KIND,
                capacity: self.capacity(),
            });
        };
        let Ok(raw) = u16::try_from(slot) else {
            return Err(ModelError::CapacityExhausted {
                kind: K::KIND,
                capacity: self.capacity(),
            });
        };

        self.slots[slot] = Slot {
            live: true,
            selected: false,
            record,
        };
        if slot >= self.high_water {
            self.high_water = slot + 1;
        }
        let id = K::from_raw(raw);
        self.last_allocated = Some(id);
        tracing::debug!(kind = %K::KIND, index = raw, "allocated");
        Ok(id)
    }

    /// Marks the slot free. Returns `false` if it was out of range or
    /// already free.
    ///
    /// The record itself is left in place and must not be trusted.
    pub fn free(&mut self, id: K) -> bool {
        match self.slots.get_mut(id.slot()) {
            Some(slot) if slot.live => {
                slot.live = false;
                slot.selected = false;
                tracing::debug!(kind = %K::KIND, index = id.raw(), "freed");
                true
            }
            _ => false,
        }
    }

    /// Empties every slot and resets the high-water mark.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::default();
        }
        self.high_water = 0;
        self.last_allocated = None;
    }
}

impl<K: EntityId, T> Arena<K, T> {
    /// Total number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// One past the greatest slot ever allocated since the last clear.
    #[must_use]
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// The most recent successful allocation.
    #[must_use]
    pub fn last_allocated(&self) -> Option<K> {
        self.last_allocated
    }

    /// Returns `true` if `id` is in range and its slot is live.
    #[must_use]
    pub fn is_valid(&self, id: K) -> bool {
        self.slots.get(id.slot()).is_some_and(|s| s.live)
    }

    /// The record at `id`, if live.
    #[must_use]
    pub fn get(&self, id: K) -> Option<&T> {
        self.slots
            .get(id.slot())
            .filter(|s| s.live)
            .map(|s| &s.record)
    }

    /// Mutable access to the record at `id`, if live.
    pub fn get_mut(&mut self, id: K) -> Option<&mut T> {
        self.slots
            .get_mut(id.slot())
            .filter(|s| s.live)
            .map(|s| &mut s.record)
    }

    /// Selection flag of a live slot; `false` for anything else.
    #[must_use]
    pub fn is_selected(&self, id: K) -> bool {
        self.slots.get(id.slot()).is_some_and(|s| s.live && s.selected)
    }

    /// Sets the selection flag of a live slot. Returns `false` if `id` is
    /// not valid.
    pub(crate) fn set_selected(&mut self, id: K, selected: bool) -> bool {
        match self.slots.get_mut(id.slot()) {
            Some(slot) if slot.live => {
                slot.selected = selected;
                true
            }
            _ => false,
        }
    }

    /// Clears the selection flag of every slot.
    pub(crate) fn clear_selected(&mut self) {
        for slot in &mut self.slots[..self.high_water] {
            slot.selected = false;
        }
    }

    /// Live records in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> + '_ {
        self.slots[..self.high_water]
            .iter()
            .zip(0..=u16::MAX)
            .filter(|(s, _)| s.live)
            .map(|(s, raw)| (K::from_raw(raw), &s.record))
    }

    /// Ids of live records in ascending slot order.
    pub fn ids(&self) -> impl Iterator<Item = K> + '_ {
        self.iter().map(|(id, _)| id)
    }

    /// Number of live records.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots[..self.high_water].iter().filter(|s| s.live).count()
    }
}

impl<K: EntityId, T: Clone> Arena<K, T> {
    /// Copies the table up to its high-water mark; free slots become `None`.
    #[must_use]
    pub fn to_table(&self) -> Vec<Option<T>> {
        self.slots[..self.high_water]
            .iter()
            .map(|s| s.live.then(|| s.record.clone()))
            .collect()
    }
}

impl<K: EntityId, T: Default> Arena<K, T> {
    /// Replaces the contents with `table`, where the position is the slot.
    /// Selection flags start clear.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CapacityExhausted`] if `table` has more entries
    /// than this arena has slots. The arena is left untouched in that case.
    pub fn load_table(&mut self, table: Vec<Option<T>>) -> Result<(), ModelError> {
        if table.len() > self.capacity() {
            return Err(ModelError::CapacityExhausted {
                kind: K::KIND,
                capacity: self.capacity(),
            });
        }
        self.clear();
        self.high_water = table.len();
        for (slot, entry) in self.slots.iter_mut().zip(table) {
            if let Some(record) = entry {
                slot.live = true;
                slot.record = record;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    entity_id! {
        struct TestId => EntityKind::Point;
    }

    fn arena(capacity: usize) -> Arena<TestId, u32> {
        Arena::with_capacity(capacity)
    }

    #[test]
    fn allocate_takes_lowest_free_slot() {
        let mut a = arena(4);
        let ids: Vec<_> = (0..3).map(|v| a.allocate(v).unwrap()).collect();
        assert_eq!(ids, vec![TestId(0), TestId(1), TestId(2)]);

        assert!(a.free(TestId(1)));
        assert!(a.free(TestId(0)));
        assert_eq!(a.allocate(10).unwrap(), TestId(0));
        assert_eq!(a.allocate(11).unwrap(), TestId(1));
        assert_eq!(a.allocate(12).unwrap(), TestId(3));
        assert_eq!(a.last_allocated(), Some(TestId(3)));
    }

    #[test]
    fn capacity_exhausted_when_full() {
        let mut a = arena(2);
        a.allocate(1).unwrap();
        a.allocate(2).unwrap();
        assert_eq!(
            a.allocate(3),
            Err(ModelError::CapacityExhausted {
                kind: EntityKind::Point,
                capacity: 2
            })
        );
        assert_eq!(a.last_allocated(), Some(TestId(1)));
    }

    #[test]
    fn validity_follows_liveness() {
        let mut a = arena(4);
        assert!(!a.is_valid(TestId(0)));
        assert!(!a.is_valid(TestId(100)));
        assert!(a.get(TestId(100)).is_none());

        let id = a.allocate(7).unwrap();
        assert!(a.is_valid(id));
        assert_eq!(a.get(id), Some(&7));

        assert!(a.free(id));
        assert!(!a.is_valid(id));
        assert!(a.get(id).is_none());
        assert!(!a.free(id));
        assert!(!a.free(TestId(100)));
    }

    #[test]
    fn high_water_never_shrinks_on_free() {
        let mut a = arena(8);
        for v in 0..5 {
            a.allocate(v).unwrap();
        }
        assert_eq!(a.high_water(), 5);
        a.free(TestId(4));
        a.free(TestId(2));
        assert_eq!(a.high_water(), 5);
        assert_eq!(a.active_count(), 3);
        assert_eq!(a.ids().collect::<Vec<_>>(), vec![TestId(0), TestId(1), TestId(3)]);

        a.clear();
        assert_eq!(a.high_water(), 0);
        assert_eq!(a.last_allocated(), None);
    }

    #[test]
    fn free_clears_selection_flag() {
        let mut a = arena(2);
        let id = a.allocate(0).unwrap();
        assert!(a.set_selected(id, true));
        assert!(a.is_selected(id));
        a.free(id);
        let again = a.allocate(0).unwrap();
        assert_eq!(again, id);
        assert!(!a.is_selected(again));
        assert!(!a.set_selected(TestId(1), true));
    }

    #[test]
    fn table_round_trip_keeps_holes() {
        let mut a = arena(4);
        for v in 0..3 {
            a.allocate(v).unwrap();
        }
        a.free(TestId(2));
        let table = a.to_table();
        assert_eq!(table, vec![Some(0), Some(1), None]);

        let mut b = arena(4);
        b.load_table(table).unwrap();
        assert_eq!(b.high_water(), 3);
        assert_eq!(b.active_count(), 2);
        assert_eq!(b.allocate(9).unwrap(), TestId(2));
    }

    #[test]
    fn oversized_table_is_rejected() {
        let mut a = arena(2);
        a.allocate(5).unwrap();
        assert!(a.load_table(vec![None, None, Some(1)]).is_err());
        assert_eq!(a.get(TestId(0)), Some(&5));
    }
}
