//! Facade node storage.
//!
//! A `RedData` is one placement of a green node: the green node itself, the
//! absolute offset it starts at, a back pointer to its parent, and the slot
//! cache owning whatever children were materialized so far. Ownership only
//! flows downwards; the parent pointer never keeps anything alive.

use std::ptr;

use text_size::{TextRange, TextSize};

use crate::slots::SlotCache;
use crate::{GreenNode, GreenToken, NodeOrToken};

pub(crate) struct RedData {
    green: GreenNode,
    /// Null for roots.
    parent: *const Self,
    index: u32,
    offset: TextSize,
    slots: SlotCache,
}

// SAFETY: `parent` is only dereferenced as a shared reference, and the slot
// cache synchronizes its own interior mutability.
unsafe impl Send for RedData {}
unsafe impl Sync for RedData {}

/// Narrows a slot index for storage in a facade node or token handle.
#[inline]
pub(crate) fn compact_index(index: usize) -> u32 {
    u32::try_from(index).expect("slot index fits in u32")
}

impl RedData {
    pub(crate) fn new_root(green: GreenNode, offset: TextSize) -> Box<Self> {
        let slots = SlotCache::for_green(&green);
        Box::new(Self { green, parent: ptr::null(), index: 0, offset, slots })
    }

    /// Builds the facade for slot `index` of `parent`, which must hold `green`.
    pub(crate) fn new_child(parent: &Self, index: usize, green: GreenNode) -> Box<Self> {
        debug_assert!(parent.green.child_at(index).as_node().is_some_and(|it| it.ptr_eq(&green)));
        let offset = parent.offset + parent.green.child_offset(index);
        let slots = SlotCache::for_green(&green);
        Box::new(Self {
            green,
            parent: ptr::from_ref(parent),
            index: compact_index(index),
            offset,
            slots,
        })
    }

    #[inline]
    pub(crate) fn green(&self) -> &GreenNode {
        &self.green
    }

    #[inline]
    pub(crate) fn parent(&self) -> Option<&Self> {
        // SAFETY: the parent owns `self` through its slot cache (or is the
        // root owned by the tree), so it outlives every borrow of `self`.
        unsafe { self.parent.as_ref() }
    }

    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub(crate) fn offset(&self) -> TextSize {
        self.offset
    }

    #[inline]
    pub(crate) fn text_range(&self) -> TextRange {
        TextRange::at(self.offset, self.green.text_len())
    }

    /// Returns slot `index`, materializing it first if it holds a node.
    /// Tokens are never cached.
    #[inline]
    #[track_caller]
    pub(crate) fn child(&self, index: usize) -> NodeOrToken<&Self, &GreenToken> {
        match self.green.child_at(index) {
            NodeOrToken::Node(green) => NodeOrToken::Node(
                self.slots.get_or_create(index, || Self::new_child(self, index, green.clone())),
            ),
            NodeOrToken::Token(token) => NodeOrToken::Token(token),
        }
    }

    #[inline]
    #[track_caller]
    pub(crate) fn cached_child_node(&self, index: usize) -> Option<&Self> {
        if index >= self.green.slot_count() {
            panic!(
                "slot index {index} is out of range for `{:?}` with {} slots",
                self.green.kind(),
                self.green.slot_count()
            );
        }
        self.slots.get(index)
    }

    pub(crate) fn drain_children(&mut self, out: &mut Vec<Box<Self>>) {
        self.slots.drain_into(out);
    }
}
