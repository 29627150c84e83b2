//! Generational arena holding the simplices of one dimension.
//!
//! Slots move through three states:
//!
//! * **live**: visible to `find` and iteration;
//! * **erased**: invisible, but the record is kept so that `undo` can revive
//!   it under the very same key;
//! * **vacant**: reclaimed by `garbage_collect` (or by `undo` of a creation)
//!   and available for reuse with a bumped generation.
//!
//! Erased slots are never reused before `garbage_collect`, so a key stays
//! unique while any undo mark could still refer to it.

use crate::mesh_error::IsMeshError;
use crate::topology::key::SimplexKey;
use std::marker::PhantomData;
use std::num::NonZeroU32;

#[derive(Clone, Debug)]
enum Entry<S> {
    Live(S),
    Erased(S),
    Vacant,
}

#[derive(Clone, Debug)]
struct Slot<S> {
    generation: NonZeroU32,
    entry: Entry<S>,
}

/// Membership changes recorded since one undo mark.
#[derive(Clone, Debug)]
struct Mark<K> {
    created: Vec<K>,
    erased: Vec<K>,
}

impl<K> Default for Mark<K> {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            erased: Vec::new(),
        }
    }
}

/// Arena of simplex records addressed by generational keys.
#[derive(Clone, Debug)]
pub struct Kernel<K, S> {
    slots: Vec<Slot<S>>,
    free: Vec<u32>,
    live: usize,
    marks: Vec<Mark<K>>,
    _key: PhantomData<K>,
}

impl<K, S> Default for Kernel<K, S> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            marks: Vec::new(),
            _key: PhantomData,
        }
    }
}

impl<K: SimplexKey, S> Kernel<K, S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` and return its fresh key. O(1) amortized.
    pub fn create(&mut self, record: S) -> K {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].entry = Entry::Live(record);
                index
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .unwrap_or_else(|_| panic!("{:?} kernel exhausted its u32 index space", K::DIM));
                self.slots.push(Slot {
                    generation: NonZeroU32::MIN,
                    entry: Entry::Live(record),
                });
                index
            }
        };
        self.live += 1;
        let key = K::from_parts(index, self.slots[index as usize].generation);
        if let Some(mark) = self.marks.last_mut() {
            mark.created.push(key);
        }
        key
    }

    fn slot(&self, key: K) -> Option<&Slot<S>> {
        self.slots
            .get(key.index() as usize)
            .filter(|slot| slot.generation == key.generation())
    }

    fn slot_mut(&mut self, key: K) -> Option<&mut Slot<S>> {
        self.slots
            .get_mut(key.index() as usize)
            .filter(|slot| slot.generation == key.generation())
    }

    pub fn find(&self, key: K) -> Result<&S, IsMeshError> {
        match self.slot(key).map(|s| &s.entry) {
            Some(Entry::Live(record)) => Ok(record),
            _ => Err(IsMeshError::InvalidKey(key.into())),
        }
    }

    pub fn find_mut(&mut self, key: K) -> Result<&mut S, IsMeshError> {
        match self.slot_mut(key).map(|s| &mut s.entry) {
            Some(Entry::Live(record)) => Ok(record),
            _ => Err(IsMeshError::InvalidKey(key.into())),
        }
    }

    #[inline]
    pub fn is_valid(&self, key: K) -> bool {
        matches!(self.slot(key).map(|s| &s.entry), Some(Entry::Live(_)))
    }

    /// Hide the record. The slot is only reclaimed by `garbage_collect`.
    pub fn erase(&mut self, key: K) -> Result<(), IsMeshError> {
        let slot = self
            .slot_mut(key)
            .ok_or(IsMeshError::InvalidKey(key.into()))?;
        match std::mem::replace(&mut slot.entry, Entry::Vacant) {
            Entry::Live(record) => slot.entry = Entry::Erased(record),
            other => {
                slot.entry = other;
                return Err(IsMeshError::InvalidKey(key.into()));
            }
        }
        self.live -= 1;
        if let Some(mark) = self.marks.last_mut() {
            mark.erased.push(key);
        }
        Ok(())
    }

    /// Number of live records.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live records in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &S)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| match &slot.entry {
            Entry::Live(record) => Some((K::from_parts(i as u32, slot.generation), record)),
            _ => None,
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Number of outstanding undo marks.
    #[inline]
    pub fn mark_depth(&self) -> usize {
        self.marks.len()
    }

    /// Start recording creations and erasures.
    pub fn set_undo_mark(&mut self) {
        self.marks.push(Mark::default());
    }

    /// Roll membership back to the most recent mark: records created since
    /// then are dropped, records erased since then come back under their keys.
    pub fn undo(&mut self) -> Result<(), IsMeshError> {
        let mark = self.marks.pop().ok_or(IsMeshError::NoUndoMark)?;
        for &key in mark.created.iter().rev() {
            self.release(key);
        }
        for &key in mark.erased.iter().rev() {
            if let Some(slot) = self.slot_mut(key) {
                if let Entry::Erased(record) = std::mem::replace(&mut slot.entry, Entry::Vacant) {
                    slot.entry = Entry::Live(record);
                    self.live += 1;
                }
            }
        }
        Ok(())
    }

    /// Drop the most recent mark and keep the current state. Changes recorded
    /// under it are folded into the enclosing mark, if any.
    pub fn commit(&mut self) -> Result<(), IsMeshError> {
        let mark = self.marks.pop().ok_or(IsMeshError::NoUndoMark)?;
        if let Some(parent) = self.marks.last_mut() {
            parent.created.extend(mark.created);
            parent.erased.extend(mark.erased);
        }
        Ok(())
    }

    pub fn undo_all(&mut self) {
        while self.undo().is_ok() {}
    }

    pub fn commit_all(&mut self) {
        while self.commit().is_ok() {}
    }

    /// Reclaim every erased slot and forget all marks. Returns the number of
    /// slots reclaimed.
    pub fn garbage_collect(&mut self) -> usize {
        self.marks.clear();
        let erased: Vec<u32> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot.entry, Entry::Erased(_)))
            .map(|(i, _)| i as u32)
            .collect();
        for &index in &erased {
            let generation = self.slots[index as usize].generation;
            self.release(K::from_parts(index, generation));
        }
        erased.len()
    }

    /// Drop every record and mark.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.marks.clear();
        self.live = 0;
    }

    /// Turn the slot of `key` vacant and make it reusable under a new generation.
    fn release(&mut self, key: K) {
        let Some(slot) = self.slot_mut(key) else {
            return;
        };
        let was_live = matches!(slot.entry, Entry::Live(_));
        slot.entry = Entry::Vacant;
        let next = slot.generation.checked_add(1);
        if let Some(next) = next {
            slot.generation = next;
        }
        if was_live {
            self.live -= 1;
        }
        // A slot whose generation would wrap is retired for good.
        if next.is_some() {
            self.free.push(key.index());
        }
    }
}
