//! Variable-arity list nodes.
//!
//! A list picks one of four shapes from its arity when it is built, and the
//! shape never changes afterwards. The facade side sizes its slot cache from
//! the shape, so the empty and single-element lists (by far the most common
//! ones) never allocate a cache array.

use std::fmt;

use crate::green::NodeShape;
use crate::{BuildError, GreenElement, GreenNode, GreenToken, NodeOrToken, SyntaxKind};
use crate::{SyntaxNode, SyntaxToken};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListShape {
    /// No slots.
    Empty,
    /// Exactly one element and no separator.
    Single,
    /// Two or more elements, no separators.
    Many,
    /// Elements at even slots, separators at odd slots; a trailing separator
    /// is allowed.
    SeparatedMany,
}

impl GreenNode {
    /// Builds an unseparated list over `elements`.
    pub fn list(
        kind: SyntaxKind,
        elements: impl IntoIterator<Item = GreenNode>,
    ) -> Result<Self, BuildError> {
        from_slots(kind, elements.into_iter().map(NodeOrToken::Node).collect())
    }

    /// Builds a separated list. `separators` holds either one separator less
    /// than `elements`, or as many when the list has a trailing separator.
    pub fn separated_list(
        kind: SyntaxKind,
        elements: Vec<GreenNode>,
        separators: Vec<GreenToken>,
    ) -> Result<Self, BuildError> {
        let (n_elements, n_separators) = (elements.len(), separators.len());
        if n_separators > n_elements || n_separators + 1 < n_elements {
            return Err(BuildError::SeparatorCount {
                elements: n_elements,
                separators: n_separators,
            });
        }

        let mut slots = Vec::with_capacity(n_elements + n_separators);
        let mut separators = separators.into_iter();
        for element in elements {
            slots.push(NodeOrToken::Node(element));
            if let Some(separator) = separators.next() {
                slots.push(NodeOrToken::Token(separator));
            }
        }
        from_slots(kind, slots)
    }
}

/// Builds a list node from interleaved slots, selecting its shape.
pub(crate) fn from_slots(
    kind: SyntaxKind,
    slots: Vec<GreenElement>,
) -> Result<GreenNode, BuildError> {
    let shape = classify(kind, &slots)?;
    Ok(GreenNode::alloc(kind, NodeShape::List(shape), None, slots))
}

pub(crate) fn classify(kind: SyntaxKind, slots: &[GreenElement]) -> Result<ListShape, BuildError> {
    if !kind.is_list() {
        return Err(BuildError::NodeKindAsList { kind });
    }

    let separated = slots.iter().any(|slot| matches!(slot, NodeOrToken::Token(_)));
    for (index, slot) in slots.iter().enumerate() {
        match slot {
            NodeOrToken::Token(token) if !separated || index % 2 == 0 => {
                return Err(BuildError::TokenInList { index, kind: token.kind() });
            }
            NodeOrToken::Node(node) if separated && index % 2 == 1 => {
                return Err(BuildError::ExpectedSeparator { index, kind: node.kind() });
            }
            _ => {}
        }
    }

    Ok(match slots.len() {
        0 => ListShape::Empty,
        1 => ListShape::Single,
        _ if separated => ListShape::SeparatedMany,
        _ => ListShape::Many,
    })
}

/// Element-indexed view over a list node.
///
/// Element `i` lives in physical slot `i` for unseparated shapes and in slot
/// `2 * i` for separated ones; separator `i` follows element `i`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyntaxList<'a> {
    node: SyntaxNode<'a>,
    shape: ListShape,
}

impl<'a> SyntaxList<'a> {
    pub(crate) fn new(node: SyntaxNode<'a>, shape: ListShape) -> Self {
        Self { node, shape }
    }

    #[inline]
    pub fn syntax(self) -> SyntaxNode<'a> {
        self.node
    }

    #[inline]
    pub fn shape(self) -> ListShape {
        self.shape
    }

    /// Number of elements, separators not counted.
    #[inline]
    pub fn len(self) -> usize {
        let slots = self.node.slot_count();
        match self.shape {
            ListShape::SeparatedMany => slots.div_ceil(2),
            ListShape::Empty | ListShape::Single | ListShape::Many => slots,
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.shape == ListShape::Empty
    }

    #[inline]
    pub fn separator_count(self) -> usize {
        self.node.slot_count() - self.len()
    }

    /// Returns `true` when the last slot is a separator.
    pub fn has_trailing_separator(self) -> bool {
        self.shape == ListShape::SeparatedMany && self.node.slot_count() % 2 == 0
    }

    /// Physical slot holding element `element`.
    #[inline]
    pub fn element_slot(self, element: usize) -> usize {
        match self.shape {
            ListShape::SeparatedMany => element * 2,
            ListShape::Empty | ListShape::Single | ListShape::Many => element,
        }
    }

    /// Element index stored in physical slot `slot`, or `None` for
    /// separator slots.
    #[inline]
    pub fn slot_element(self, slot: usize) -> Option<usize> {
        match self.shape {
            ListShape::SeparatedMany => (slot % 2 == 0).then_some(slot / 2),
            ListShape::Empty | ListShape::Single | ListShape::Many => Some(slot),
        }
    }

    /// Returns element `index`, materializing it if needed.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[track_caller]
    pub fn element(self, index: usize) -> SyntaxNode<'a> {
        assert!(index < self.len(), "element {index} is out of range for a list of {}", self.len());
        self.element_node(self.element_slot(index))
    }

    pub fn get(self, index: usize) -> Option<SyntaxNode<'a>> {
        (index < self.len()).then(|| self.element_node(self.element_slot(index)))
    }

    /// Returns element `index` only if it was already materialized.
    pub fn cached_element(self, index: usize) -> Option<SyntaxNode<'a>> {
        if index >= self.len() {
            return None;
        }
        self.node.cached_child_at(self.element_slot(index))
    }

    /// Returns the separator following element `index`, if any.
    pub fn separator(self, index: usize) -> Option<SyntaxToken<'a>> {
        if self.shape != ListShape::SeparatedMany {
            return None;
        }
        let slot = index * 2 + 1;
        self.node.get_child(slot).and_then(NodeOrToken::into_token)
    }

    pub fn iter(self) -> SyntaxListIter<'a> {
        SyntaxListIter { list: self, front: 0, back: self.len() }
    }

    pub fn separators(self) -> impl Iterator<Item = SyntaxToken<'a>> {
        (0..self.separator_count()).filter_map(move |index| self.separator(index))
    }

    fn element_node(self, slot: usize) -> SyntaxNode<'a> {
        match self.node.child_at(slot) {
            NodeOrToken::Node(node) => node,
            NodeOrToken::Token(_) => unreachable!("list element slots only hold nodes"),
        }
    }
}

impl fmt::Debug for SyntaxList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxList")
            .field("node", &self.node)
            .field("shape", &self.shape)
            .field("len", &self.len())
            .finish()
    }
}

impl<'a> IntoIterator for SyntaxList<'a> {
    type Item = SyntaxNode<'a>;
    type IntoIter = SyntaxListIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the elements of a [`SyntaxList`].
#[derive(Clone)]
pub struct SyntaxListIter<'a> {
    list: SyntaxList<'a>,
    front: usize,
    back: usize,
}

impl<'a> Iterator for SyntaxListIter<'a> {
    type Item = SyntaxNode<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let element = self.list.element(self.front);
        self.front += 1;
        Some(element)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for SyntaxListIter<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.list.element(self.back))
    }
}

impl ExactSizeIterator for SyntaxListIter<'_> {}
