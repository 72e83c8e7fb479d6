//! Per-node memo of materialized children.
//!
//! Each slot is an atomic pointer that moves exactly once, from null to a
//! fully built child. Readers that lose the race to fill a slot drop their
//! own construction and adopt the winner's, so no lock is ever taken and a
//! reader can never observe a half-built child.

use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::GreenNode;
use crate::list::ListShape;
use crate::red::RedData;

pub(crate) enum SlotCache {
    Empty,
    /// Inline slot; no array is allocated.
    Single(AtomicPtr<RedData>),
    Many(Box<[AtomicPtr<RedData>]>),
}

impl SlotCache {
    pub(crate) fn for_green(green: &GreenNode) -> Self {
        match green.list_shape() {
            Some(ListShape::Empty) => Self::Empty,
            Some(ListShape::Single) => Self::Single(AtomicPtr::default()),
            Some(ListShape::Many | ListShape::SeparatedMany) => Self::many(green.slot_count()),
            None => match green.slot_count() {
                0 => Self::Empty,
                1 => Self::Single(AtomicPtr::default()),
                len => Self::many(len),
            },
        }
    }

    fn many(len: usize) -> Self {
        Self::Many((0..len).map(|_| AtomicPtr::default()).collect())
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Many(slots) => slots.len(),
        }
    }

    #[inline]
    #[track_caller]
    fn slot(&self, index: usize) -> &AtomicPtr<RedData> {
        match self {
            Self::Single(slot) if index == 0 => slot,
            Self::Many(slots) if index < slots.len() => &slots[index],
            _ => panic!("slot index {index} is out of range for a cache of {} slots", self.len()),
        }
    }

    /// Returns the child in slot `index` if it was already materialized.
    #[inline]
    #[track_caller]
    pub(crate) fn get(&self, index: usize) -> Option<&RedData> {
        let ptr = self.slot(index).load(Ordering::Acquire);
        // SAFETY: non-null pointers come from `Box::into_raw` in
        // `get_or_create` and are only freed by `&mut self` methods.
        unsafe { ptr.as_ref() }
    }

    /// Returns the child in slot `index`, building it with `create` on a miss.
    ///
    /// `create` may run on several threads for the same slot; only the first
    /// result to be stored is kept.
    #[track_caller]
    pub(crate) fn get_or_create(
        &self,
        index: usize,
        create: impl FnOnce() -> Box<RedData>,
    ) -> &RedData {
        let slot = self.slot(index);
        let current = slot.load(Ordering::Acquire);
        // SAFETY: see `get`.
        if let Some(existing) = unsafe { current.as_ref() } {
            return existing;
        }

        let new = Box::into_raw(create());
        match slot.compare_exchange(ptr::null_mut(), new, Ordering::AcqRel, Ordering::Acquire) {
            // SAFETY: `new` is now owned by the slot and lives as long as `self`.
            Ok(_) => unsafe { &*new },
            Err(winner) => {
                // SAFETY: `new` was never published, so this is the only pointer to it.
                drop(unsafe { Box::from_raw(new) });
                tracing::trace!(index, "slot was filled concurrently; keeping the stored child");
                // SAFETY: see `get`.
                unsafe { &*winner }
            }
        }
    }

    /// Moves every materialized child out of the cache.
    pub(crate) fn drain_into(&mut self, out: &mut Vec<Box<RedData>>) {
        let mut take = |slot: &mut AtomicPtr<RedData>| {
            let ptr = std::mem::replace(slot.get_mut(), ptr::null_mut());
            if !ptr.is_null() {
                // SAFETY: the pointer came from `Box::into_raw` and the slot no
                // longer refers to it.
                out.push(unsafe { Box::from_raw(ptr) });
            }
        };
        match self {
            Self::Empty => {}
            Self::Single(slot) => take(slot),
            Self::Many(slots) => slots.iter_mut().for_each(take),
        }
    }
}

impl Drop for SlotCache {
    fn drop(&mut self) {
        let mut children = Vec::new();
        self.drain_into(&mut children);
    }
}
