//! Immutable, position-free green nodes and tokens.
//!
//! A green node knows its kind, its width and its children, and nothing about
//! where it sits. That is what lets a single green subtree be shared by any
//! number of trees and tree versions.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use text_size::{TextRange, TextSize};
use triomphe::{Arc, ThinArc};

use crate::list::{self, ListShape};
use crate::{BuildError, GreenTrivia, NodeOrToken, SyntaxKind};

pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

impl GreenElement {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    pub fn text_len(&self) -> TextSize {
        match self {
            NodeOrToken::Node(node) => node.text_len(),
            NodeOrToken::Token(token) => token.text_len(),
        }
    }

    /// Identity comparison; never descends into children.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NodeOrToken::Node(lhs), NodeOrToken::Node(rhs)) => lhs.ptr_eq(rhs),
            (NodeOrToken::Token(lhs), NodeOrToken::Token(rhs)) => lhs.ptr_eq(rhs),
            _ => false,
        }
    }

    pub(crate) fn addr(&self) -> *const () {
        match self {
            NodeOrToken::Node(node) => node.addr(),
            NodeOrToken::Token(token) => token.addr(),
        }
    }
}

impl From<GreenNode> for GreenElement {
    fn from(node: GreenNode) -> Self {
        NodeOrToken::Node(node)
    }
}

impl From<GreenToken> for GreenElement {
    fn from(token: GreenToken) -> Self {
        NodeOrToken::Token(token)
    }
}

/// Whether a node has a fixed child layout or is one of the list shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeShape {
    Node,
    List(ListShape),
}

/// Opaque attachment carried by a green node, such as a parse diagnostic.
///
/// The range is relative to the start of the node it is attached to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Annotation {
    range: TextRange,
    message: Box<str>,
}

impl Annotation {
    pub fn new(range: TextRange, message: impl Into<Box<str>>) -> Self {
        Self { range, message: message.into() }
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct GreenNodeHead {
    kind: SyntaxKind,
    shape: NodeShape,
    text_len: TextSize,
    annotations: Option<Box<[Annotation]>>,
}

#[derive(Clone, Debug)]
struct GreenChild {
    /// Offset from the start of the parent, fixed at construction.
    rel_offset: TextSize,
    element: GreenElement,
}

impl GreenChild {
    fn rel_range(&self) -> TextRange {
        TextRange::at(self.rel_offset, self.element.text_len())
    }
}

/// Immutable interior node. Cloning is a reference count bump.
#[derive(Clone)]
pub struct GreenNode {
    data: ThinArc<GreenNodeHead, GreenChild>,
}

impl GreenNode {
    /// Creates an ordinary node with a fixed child layout.
    pub fn new(
        kind: SyntaxKind,
        children: impl IntoIterator<Item = GreenElement>,
    ) -> Result<Self, BuildError> {
        if kind.is_list() {
            return Err(BuildError::ListKindAsNode { kind });
        }
        Ok(Self::alloc(kind, NodeShape::Node, None, children.into_iter().collect()))
    }

    /// Allocates a node without validating `shape` against `children`.
    pub(crate) fn alloc(
        kind: SyntaxKind,
        shape: NodeShape,
        annotations: Option<Box<[Annotation]>>,
        children: Vec<GreenElement>,
    ) -> Self {
        let text_len = children.iter().map(GreenElement::text_len).sum();
        let head = GreenNodeHead { kind, shape, text_len, annotations };

        let mut offset = TextSize::new(0);
        let children = children.into_iter().map(|element| {
            let rel_offset = offset;
            offset += element.text_len();
            GreenChild { rel_offset, element }
        });

        Self { data: ThinArc::from_header_and_iter(head, children) }
    }

    #[inline]
    fn head(&self) -> &GreenNodeHead {
        &self.data.header.header
    }

    #[inline]
    fn slots(&self) -> &[GreenChild] {
        &self.data.slice
    }

    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.head().kind
    }

    /// Width of the node, trivia included.
    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.head().text_len
    }

    #[inline]
    pub fn shape(&self) -> NodeShape {
        self.head().shape
    }

    /// Returns the list shape, or `None` for ordinary nodes.
    #[inline]
    pub fn list_shape(&self) -> Option<ListShape> {
        match self.shape() {
            NodeShape::Node => None,
            NodeShape::List(shape) => Some(shape),
        }
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots().len()
    }

    /// Returns the child in slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    #[track_caller]
    pub fn child_at(&self, index: usize) -> &GreenElement {
        match self.get(index) {
            Some(child) => child,
            None => out_of_range(self.kind(), index, self.slot_count()),
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&GreenElement> {
        self.slots().get(index).map(|child| &child.element)
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = &GreenElement> + DoubleEndedIterator {
        self.slots().iter().map(|child| &child.element)
    }

    /// Offset of slot `index` from the start of this node.
    #[inline]
    #[track_caller]
    pub fn child_offset(&self, index: usize) -> TextSize {
        match self.slots().get(index) {
            Some(child) => child.rel_offset,
            None => out_of_range(self.kind(), index, self.slot_count()),
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.head().annotations.as_deref().unwrap_or_default()
    }

    /// Identity comparison; never descends into children.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }

    #[inline]
    pub(crate) fn addr(&self) -> *const () {
        std::ptr::from_ref(&self.data.header).cast()
    }

    /// Returns a copy of this node carrying `annotations` instead of its
    /// current ones. Children are shared.
    pub fn with_annotations(&self, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        let annotations: Box<[Annotation]> = annotations.into_iter().collect();
        let annotations = if annotations.is_empty() { None } else { Some(annotations) };
        Self::alloc(self.kind(), self.shape(), annotations, self.children().cloned().collect())
    }

    /// Returns a new node with slot `index` replaced. Every other child is
    /// shared with `self`.
    #[track_caller]
    pub fn replace_child(
        &self,
        index: usize,
        new_child: impl Into<GreenElement>,
    ) -> Result<Self, BuildError> {
        if index >= self.slot_count() {
            out_of_range(self.kind(), index, self.slot_count());
        }
        let mut children: Vec<_> = self.children().cloned().collect();
        children[index] = new_child.into();
        self.rebuild(children)
    }

    /// Returns a new node with `new_child` inserted before slot `index`.
    #[track_caller]
    pub fn insert_child(
        &self,
        index: usize,
        new_child: impl Into<GreenElement>,
    ) -> Result<Self, BuildError> {
        if index > self.slot_count() {
            out_of_range(self.kind(), index, self.slot_count());
        }
        let mut children: Vec<_> = self.children().cloned().collect();
        children.insert(index, new_child.into());
        self.rebuild(children)
    }

    /// Returns a new node without slot `index`.
    #[track_caller]
    pub fn remove_child(&self, index: usize) -> Result<Self, BuildError> {
        if index >= self.slot_count() {
            out_of_range(self.kind(), index, self.slot_count());
        }
        let mut children: Vec<_> = self.children().cloned().collect();
        children.remove(index);
        self.rebuild(children)
    }

    /// Rebuilds a node of the same kind over new children. Annotations
    /// describe the old layout and are not carried over.
    fn rebuild(&self, children: Vec<GreenElement>) -> Result<Self, BuildError> {
        match self.shape() {
            NodeShape::Node => Ok(Self::alloc(self.kind(), NodeShape::Node, None, children)),
            NodeShape::List(_) => list::from_slots(self.kind(), children),
        }
    }

    /// Slots that contain `rel` (inclusive of both ends), skipping empty
    /// children. At most two slots qualify.
    pub(crate) fn child_indices_at_offset(
        &self,
        rel: TextSize,
    ) -> impl Iterator<Item = usize> + '_ {
        let slots = self.slots();
        let start = slots.partition_point(|child| child.rel_range().end() < rel);
        slots[start..]
            .iter()
            .enumerate()
            .take_while(move |(_, child)| child.rel_offset <= rel)
            .filter(|(_, child)| !child.rel_range().is_empty())
            .map(move |(index, _)| start + index)
    }

    /// The slot whose range contains `rel`, if any.
    pub(crate) fn child_index_covering(&self, rel: TextRange) -> Option<usize> {
        let slots = self.slots();
        let index = slots.partition_point(|child| child.rel_range().end() <= rel.start());
        let index = index.min(slots.len().saturating_sub(1));
        slots.get(index).filter(|child| child.rel_range().contains_range(rel)).map(|_| index)
    }
}

#[cold]
#[track_caller]
fn out_of_range(kind: SyntaxKind, index: usize, slot_count: usize) -> ! {
    panic!("slot index {index} is out of range for `{kind:?}` with {slot_count} slots")
}

/// Childless node swapped into the slots of a node that is being freed.
static DETACHED: LazyLock<GreenNode> =
    LazyLock::new(|| GreenNode::alloc(SyntaxKind::ERROR, NodeShape::Node, None, Vec::new()));

impl GreenNode {
    /// Moves the child nodes out of `self` if this is the last reference to
    /// it, so that freeing `self` does not recurse into them.
    fn detach_children(&mut self, out: &mut Vec<Self>) {
        self.data.with_arc_mut(|data| {
            let Some(data) = Arc::get_mut(data) else { return };
            for child in data.slice_mut() {
                if let NodeOrToken::Node(node) = &mut child.element {
                    out.push(std::mem::replace(node, DETACHED.clone()));
                }
            }
        });
    }
}

impl Drop for GreenNode {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

impl PartialEq for GreenNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((lhs, rhs)) = pending.pop() {
            if lhs.ptr_eq(rhs) {
                continue;
            }
            if lhs.head() != rhs.head() || lhs.slot_count() != rhs.slot_count() {
                return false;
            }
            for (lhs, rhs) in lhs.children().zip(rhs.children()) {
                match (lhs, rhs) {
                    (NodeOrToken::Node(lhs), NodeOrToken::Node(rhs)) => pending.push((lhs, rhs)),
                    (NodeOrToken::Token(lhs), NodeOrToken::Token(rhs)) if lhs == rhs => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

impl Eq for GreenNode {}

impl Hash for GreenNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            node.head().hash(state);
            node.slot_count().hash(state);
            for child in node.children() {
                match child {
                    NodeOrToken::Node(node) => {
                        state.write_u8(0);
                        pending.push(node);
                    }
                    NodeOrToken::Token(token) => {
                        state.write_u8(1);
                        token.hash(state);
                    }
                }
            }
        }
    }
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenNode")
            .field("kind", &self.kind())
            .field("shape", &self.shape())
            .field("text_len", &self.text_len())
            .field("slot_count", &self.slot_count())
            .finish()
    }
}

/// Writes the exact source text covered by the node.
impl fmt::Display for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![self.slots().iter()];
        while let Some(top) = stack.last_mut() {
            match top.next() {
                None => {
                    stack.pop();
                }
                Some(child) => match &child.element {
                    NodeOrToken::Node(node) => stack.push(node.slots().iter()),
                    NodeOrToken::Token(token) => f.write_str(token.text())?,
                },
            }
        }
        Ok(())
    }
}

#[derive(PartialEq, Eq, Hash)]
struct GreenTokenData {
    kind: SyntaxKind,
    leading: GreenTrivia,
    /// Full token text, attached trivia included.
    text: Box<str>,
    trailing: GreenTrivia,
}

/// Immutable leaf. Cloning is a reference count bump.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GreenToken {
    data: Arc<GreenTokenData>,
}

impl GreenToken {
    pub fn new(kind: SyntaxKind, text: &str) -> Self {
        Self::with_trivia(GreenTrivia::empty(), kind, text, GreenTrivia::empty())
    }

    /// Creates a token whose `text` spans the attached trivia as well.
    ///
    /// # Panics
    ///
    /// Panics if the trivia is longer than `text`, or if either trivia
    /// boundary does not fall on a `char` boundary of `text`.
    #[track_caller]
    pub fn with_trivia(
        leading: GreenTrivia,
        kind: SyntaxKind,
        text: &str,
        trailing: GreenTrivia,
    ) -> Self {
        let (leading_len, trailing_len) = (usize::from(leading.len()), usize::from(trailing.len()));
        assert!(
            leading_len + trailing_len <= text.len(),
            "trivia of `{kind:?}` does not fit into {text:?}"
        );
        assert!(
            text.is_char_boundary(leading_len) && text.is_char_boundary(text.len() - trailing_len),
            "trivia of `{kind:?}` splits a character of {text:?}"
        );
        Self { data: Arc::new(GreenTokenData { kind, leading, text: text.into(), trailing }) }
    }

    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.data.kind
    }

    /// Full text, trivia included.
    #[inline]
    pub fn text(&self) -> &str {
        &self.data.text
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        TextSize::of(self.text())
    }

    #[inline]
    pub fn leading(&self) -> &GreenTrivia {
        &self.data.leading
    }

    #[inline]
    pub fn trailing(&self) -> &GreenTrivia {
        &self.data.trailing
    }

    /// Range of the token text without trivia, relative to the token start.
    pub fn trimmed_range(&self) -> TextRange {
        TextRange::new(self.leading().len(), self.text_len() - self.trailing().len())
    }

    pub fn text_trimmed(&self) -> &str {
        &self.text()[self.trimmed_range()]
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    #[inline]
    pub(crate) fn addr(&self) -> *const () {
        Arc::as_ptr(&self.data).cast()
    }
}

impl fmt::Debug for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenToken")
            .field("kind", &self.kind())
            .field("text", &self.text())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
