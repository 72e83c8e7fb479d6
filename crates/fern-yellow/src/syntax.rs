//! Public syntax tree API: lazily materialized, parent-linked facade nodes
//! over a shared green tree.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::ptr;

use text_size::{TextRange, TextSize};

use crate::ast::AstNode;
use crate::list::SyntaxList;
use crate::maybe_dangling::MaybeDangling;
use crate::red::{RedData, compact_index};
use crate::{BuildError, GreenNode, GreenToken, GreenTrivia, SyntaxKind};

/// Owner of one facade tree.
///
/// Every [`SyntaxNode`] and [`SyntaxToken`] borrows the tree, so handles can
/// never outlive the storage their parent pointers refer to. Building several
/// trees over the same green root is cheap; they share all green nodes and
/// none of their facade nodes.
pub struct SyntaxTree {
    root: MaybeDangling<Box<RedData>>,
}

impl SyntaxTree {
    /// Creates a tree whose root starts at offset zero.
    pub fn new(green: GreenNode) -> Self {
        Self::new_at(green, TextSize::new(0))
    }

    /// Creates a tree whose root starts at `offset`, for subtrees placed
    /// inside a larger text.
    pub fn new_at(green: GreenNode, offset: TextSize) -> Self {
        Self { root: MaybeDangling::new(RedData::new_root(green, offset)) }
    }

    /// Returns the root syntax node.
    #[inline]
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode { data: &**self.root }
    }

    #[inline]
    pub fn green(&self) -> &GreenNode {
        self.root.green()
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree").field("root", &self.root()).finish_non_exhaustive()
    }
}

impl Drop for SyntaxTree {
    /// Tears the facade down iteratively so deep trees cannot overflow the
    /// stack through nested slot cache drops.
    fn drop(&mut self) {
        // SAFETY: no handle borrows the tree anymore, and the root itself is
        // left in place for `MaybeDangling` to drop.
        let root = unsafe { &mut **self.root.as_mut_ptr() };
        let mut pending = Vec::new();
        root.drain_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.drain_children(&mut pending);
        }
    }
}

/// Node handle tied to the lifetime of the tree.
///
/// Two handles are equal when they refer to the same facade node.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'a> {
    data: &'a RedData,
}

impl<'a> SyntaxNode<'a> {
    #[inline]
    fn new(data: &'a RedData) -> Self {
        Self { data }
    }

    /// Returns this node's kind.
    #[inline]
    pub fn kind(self) -> SyntaxKind {
        self.data.green().kind()
    }

    /// Returns the green node this facade wraps.
    #[inline]
    pub fn green(self) -> &'a GreenNode {
        self.data.green()
    }

    #[inline]
    pub fn slot_count(self) -> usize {
        self.data.green().slot_count()
    }

    /// Returns the absolute text range covered by this node, trivia included.
    #[inline]
    pub fn text_range(self) -> TextRange {
        self.data.text_range()
    }

    #[inline]
    pub fn start(self) -> TextSize {
        self.data.offset()
    }

    #[inline]
    pub fn end(self) -> TextSize {
        self.text_range().end()
    }

    #[inline]
    pub fn width(self) -> TextSize {
        self.data.green().text_len()
    }

    /// Returns the parent node if any.
    #[inline]
    pub fn parent(self) -> Option<Self> {
        self.data.parent().map(Self::new)
    }

    /// Slot index of this node inside its parent; zero for roots.
    #[inline]
    pub fn index(self) -> usize {
        self.data.index()
    }

    /// Returns an iterator of ancestors starting from this node.
    #[inline]
    pub fn ancestors(self) -> impl Iterator<Item = SyntaxNode<'a>> + Clone {
        std::iter::successors(Some(self), |it| it.parent())
    }

    /// Returns slot `index`, materializing it on first access.
    ///
    /// Repeated calls with the same index return the same facade node.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    #[track_caller]
    pub fn child_at(self, index: usize) -> SyntaxElement<'a> {
        match self.data.child(index) {
            NodeOrToken::Node(node) => NodeOrToken::Node(Self::new(node)),
            NodeOrToken::Token(token) => {
                NodeOrToken::Token(SyntaxToken::new(self.data, index, token))
            }
        }
    }

    /// Checked variant of [`SyntaxNode::child_at`].
    #[inline]
    pub fn get_child(self, index: usize) -> Option<SyntaxElement<'a>> {
        (index < self.slot_count()).then(|| self.child_at(index))
    }

    /// Returns the node in slot `index` only if it was already materialized.
    ///
    /// Never allocates. Token slots always report `None`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    #[track_caller]
    pub fn cached_child_at(self, index: usize) -> Option<SyntaxNode<'a>> {
        self.data.cached_child_node(index).map(Self::new)
    }

    /// Typed variant of [`SyntaxNode::cached_child_at`]: a cached node that
    /// does not cast to `N` is reported as absent.
    #[inline]
    #[track_caller]
    pub fn cached_child<N: AstNode<'a>>(self, index: usize) -> Option<N> {
        self.cached_child_at(index).and_then(N::cast)
    }

    #[inline]
    fn node_at(self, index: usize) -> Option<Self> {
        self.data.child(index).into_node().map(Self::new)
    }

    /// Iterates children including tokens.
    #[inline]
    pub fn children_with_tokens(self) -> ChildrenWithTokens<'a> {
        ChildrenWithTokens { parent: self, slots: 0..self.slot_count() }
    }

    /// Iterates child nodes, skipping tokens.
    #[inline]
    pub fn children(self) -> Children<'a> {
        Children { parent: self, slots: 0..self.slot_count() }
    }

    pub fn first_child(self) -> Option<Self> {
        self.children().next()
    }

    pub fn last_child(self) -> Option<Self> {
        self.children().next_back()
    }

    pub fn next_sibling(self) -> Option<Self> {
        let parent = self.parent()?;
        (self.index() + 1..parent.slot_count()).find_map(|index| parent.node_at(index))
    }

    pub fn prev_sibling(self) -> Option<Self> {
        let parent = self.parent()?;
        (0..self.index()).rev().find_map(|index| parent.node_at(index))
    }

    pub fn next_sibling_or_token(self) -> Option<SyntaxElement<'a>> {
        self.parent()?.get_child(self.index() + 1)
    }

    pub fn prev_sibling_or_token(self) -> Option<SyntaxElement<'a>> {
        let index = self.index().checked_sub(1)?;
        self.parent()?.get_child(index)
    }

    /// Returns the first token inside this node, if it has any.
    pub fn first_token(self) -> Option<SyntaxToken<'a>> {
        self.children_with_tokens().find_map(|child| match child {
            NodeOrToken::Node(node) => node.first_token(),
            NodeOrToken::Token(token) => Some(token),
        })
    }

    /// Returns the last token inside this node, if it has any.
    pub fn last_token(self) -> Option<SyntaxToken<'a>> {
        self.children_with_tokens().rev().find_map(|child| match child {
            NodeOrToken::Node(node) => node.last_token(),
            NodeOrToken::Token(token) => Some(token),
        })
    }

    /// Returns this node and every node below it, in preorder.
    pub fn descendants(self) -> impl Iterator<Item = SyntaxNode<'a>> {
        self.preorder().filter_map(|event| match event {
            WalkEvent::Enter(node) => Some(node),
            WalkEvent::Leave(_) => None,
        })
    }

    /// Returns a preorder iterator over nodes.
    #[inline]
    pub fn preorder(self) -> Preorder<'a> {
        Preorder::new(self)
    }

    /// Returns a preorder iterator over nodes and tokens.
    #[inline]
    pub fn preorder_with_tokens(self) -> PreorderWithTokens<'a> {
        PreorderWithTokens::new(self)
    }

    /// Returns the token(s) touching `offset`.
    ///
    /// Only the slots on the path to the offset are materialized.
    pub fn token_at_offset(self, offset: TextSize) -> TokenAtOffset<SyntaxToken<'a>> {
        let range = self.text_range();
        if range.is_empty() || offset < range.start() || offset > range.end() {
            return TokenAtOffset::None;
        }

        let mut indices = self.green().child_indices_at_offset(offset - range.start());
        let Some(left) = indices.next() else {
            return TokenAtOffset::None;
        };
        let left = self.child_at(left).token_at_offset(offset);
        let Some(right) = indices.next() else {
            return left;
        };
        let right = self.child_at(right).token_at_offset(offset);

        match (left.left_biased(), right.right_biased()) {
            (Some(left), Some(right)) => TokenAtOffset::Between(left, right),
            (Some(token), None) | (None, Some(token)) => TokenAtOffset::Single(token),
            (None, None) => TokenAtOffset::None,
        }
    }

    /// Returns the smallest element that fully covers `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is not inside this node.
    #[track_caller]
    pub fn covering_element(self, range: TextRange) -> SyntaxElement<'a> {
        assert!(
            self.text_range().contains_range(range),
            "range {range:?} is not inside the node {self:?}"
        );

        let mut node = self;
        loop {
            let Some(index) = node.green().child_index_covering(range - node.start()) else {
                return NodeOrToken::Node(node);
            };
            match node.child_at(index) {
                NodeOrToken::Node(child) => node = child,
                token @ NodeOrToken::Token(_) => return token,
            }
        }
    }

    /// Returns the annotations of the green node, with absolute ranges.
    pub fn annotations(self) -> impl ExactSizeIterator<Item = SyntaxAnnotation<'a>> {
        let start = self.start();
        self.green()
            .annotations()
            .iter()
            .map(move |it| SyntaxAnnotation { range: it.range() + start, message: it.message() })
    }

    /// Returns the list view of this node if it is a list.
    #[inline]
    pub fn as_list(self) -> Option<SyntaxList<'a>> {
        self.green().list_shape().map(|shape| SyntaxList::new(self, shape))
    }

    /// Returns a new green root in which this node is replaced by
    /// `replacement`. Every subtree off the path to the root is shared.
    pub fn replace_with(self, replacement: GreenNode) -> Result<GreenNode, BuildError> {
        let mut green = replacement;
        let mut node = self;
        while let Some(parent) = node.parent() {
            green = parent.green().replace_child(node.index(), green)?;
            node = parent;
        }
        Ok(green)
    }

    /// Renders the subtree as an indented kind/range listing.
    pub fn debug_tree(self) -> String {
        DebugTree(self).to_string()
    }
}

impl PartialEq for SyntaxNode<'_> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.data, other.data)
    }
}

impl Eq for SyntaxNode<'_> {}

impl Hash for SyntaxNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ptr::hash(self.data, state);
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.text_range())
    }
}

/// Writes the exact source text of the node.
impl fmt::Display for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.green(), f)
    }
}

struct DebugTree<'a>(SyntaxNode<'a>);

impl fmt::Display for DebugTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0;
        for event in self.0.preorder_with_tokens() {
            match event {
                WalkEventWithTokens::EnterNode(node) => {
                    write!(f, "{:indent$}{node:?}", "", indent = depth * 2)?;
                    match node.green().list_shape() {
                        Some(shape) => writeln!(f, " {shape:?}")?,
                        None => writeln!(f)?,
                    }
                    depth += 1;
                }
                WalkEventWithTokens::LeaveNode(_) => depth -= 1,
                WalkEventWithTokens::Token(token) => {
                    writeln!(f, "{:indent$}{token:?}", "", indent = depth * 2)?;
                }
            }
        }
        Ok(())
    }
}

/// Annotation of a facade node, positioned in the tree's text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyntaxAnnotation<'a> {
    pub range: TextRange,
    pub message: &'a str,
}

/// Token handle tied to the lifetime of the tree.
///
/// Tokens are not cached; a handle is recomputed from its parent on demand.
#[derive(Clone, Copy)]
pub struct SyntaxToken<'a> {
    parent: &'a RedData,
    green: &'a GreenToken,
    index: u32,
    offset: TextSize,
}

impl<'a> SyntaxToken<'a> {
    #[inline]
    fn new(parent: &'a RedData, index: usize, green: &'a GreenToken) -> Self {
        let offset = parent.offset() + parent.green().child_offset(index);
        Self { parent, green, index: compact_index(index), offset }
    }

    /// Returns this token's kind.
    #[inline]
    pub fn kind(self) -> SyntaxKind {
        self.green.kind()
    }

    #[inline]
    pub fn green(self) -> &'a GreenToken {
        self.green
    }

    /// Returns the token text including trivia.
    #[inline]
    pub fn text(self) -> &'a str {
        self.green.text()
    }

    /// Returns the token text excluding trivia.
    #[inline]
    pub fn text_trimmed(self) -> &'a str {
        self.green.text_trimmed()
    }

    /// Returns the token text range including attached trivia.
    #[inline]
    pub fn text_range(self) -> TextRange {
        TextRange::at(self.offset, self.green.text_len())
    }

    /// Returns the token text range excluding trivia.
    #[inline]
    pub fn trimmed_range(self) -> TextRange {
        self.green.trimmed_range() + self.offset
    }

    #[inline]
    pub fn start(self) -> TextSize {
        self.offset
    }

    #[inline]
    pub fn end(self) -> TextSize {
        self.text_range().end()
    }

    #[inline]
    pub fn leading_trivia(self) -> &'a GreenTrivia {
        self.green.leading()
    }

    #[inline]
    pub fn trailing_trivia(self) -> &'a GreenTrivia {
        self.green.trailing()
    }

    /// Returns the parent node.
    #[inline]
    pub fn parent(self) -> SyntaxNode<'a> {
        SyntaxNode::new(self.parent)
    }

    /// Slot index of this token inside its parent.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Returns an iterator of parent nodes, starting from the immediate parent.
    #[inline]
    pub fn parent_ancestors(self) -> impl Iterator<Item = SyntaxNode<'a>> + Clone {
        self.parent().ancestors()
    }

    pub fn next_sibling_or_token(self) -> Option<SyntaxElement<'a>> {
        self.parent().get_child(self.index() + 1)
    }

    pub fn prev_sibling_or_token(self) -> Option<SyntaxElement<'a>> {
        self.parent().get_child(self.index().checked_sub(1)?)
    }

    /// Returns the next token in text order, if any.
    pub fn next_token(self) -> Option<Self> {
        let mut node = self.parent();
        let mut from = self.index() + 1;
        loop {
            let found = (from..node.slot_count()).find_map(|index| match node.child_at(index) {
                NodeOrToken::Node(child) => child.first_token(),
                NodeOrToken::Token(token) => Some(token),
            });
            if found.is_some() {
                return found;
            }
            from = node.index() + 1;
            node = node.parent()?;
        }
    }

    /// Returns the previous token in text order, if any.
    pub fn prev_token(self) -> Option<Self> {
        let mut node = self.parent();
        let mut until = self.index();
        loop {
            let found = (0..until).rev().find_map(|index| match node.child_at(index) {
                NodeOrToken::Node(child) => child.last_token(),
                NodeOrToken::Token(token) => Some(token),
            });
            if found.is_some() {
                return found;
            }
            until = node.index();
            node = node.parent()?;
        }
    }

    /// Returns a new green root in which this token is replaced.
    pub fn replace_with(self, replacement: GreenToken) -> Result<GreenNode, BuildError> {
        let parent = self.parent();
        let new_parent = parent.green().replace_child(self.index(), replacement)?;
        parent.replace_with(new_parent)
    }
}

impl PartialEq for SyntaxToken<'_> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.parent, other.parent) && self.index == other.index
    }
}

impl Eq for SyntaxToken<'_> {}

impl Hash for SyntaxToken<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ptr::hash(self.parent, state);
        self.index.hash(state);
    }
}

impl fmt::Debug for SyntaxToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?} {:?}", self.kind(), self.text_range(), self.text())
    }
}

impl fmt::Display for SyntaxToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Node or token element inside the tree.
pub type SyntaxElement<'a> = NodeOrToken<SyntaxNode<'a>, SyntaxToken<'a>>;

impl<'a> SyntaxElement<'a> {
    pub fn kind(self) -> SyntaxKind {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    pub fn text_range(self) -> TextRange {
        match self {
            NodeOrToken::Node(node) => node.text_range(),
            NodeOrToken::Token(token) => token.text_range(),
        }
    }

    pub fn parent(self) -> Option<SyntaxNode<'a>> {
        match self {
            NodeOrToken::Node(node) => node.parent(),
            NodeOrToken::Token(token) => Some(token.parent()),
        }
    }

    pub fn index(self) -> usize {
        match self {
            NodeOrToken::Node(node) => node.index(),
            NodeOrToken::Token(token) => token.index(),
        }
    }

    fn token_at_offset(self, offset: TextSize) -> TokenAtOffset<SyntaxToken<'a>> {
        match self {
            NodeOrToken::Node(node) => node.token_at_offset(offset),
            NodeOrToken::Token(token) => TokenAtOffset::Single(token),
        }
    }
}

/// Iterator over children including tokens.
#[derive(Clone)]
pub struct ChildrenWithTokens<'a> {
    parent: SyntaxNode<'a>,
    slots: Range<usize>,
}

impl ChildrenWithTokens<'_> {
    /// Makes the iterator yield nothing further.
    fn exhaust(&mut self) {
        self.slots.start = self.slots.end;
    }
}

impl<'a> Iterator for ChildrenWithTokens<'a> {
    type Item = SyntaxElement<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.slots.next().map(|index| self.parent.child_at(index))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl DoubleEndedIterator for ChildrenWithTokens<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.slots.next_back().map(|index| self.parent.child_at(index))
    }
}

impl ExactSizeIterator for ChildrenWithTokens<'_> {}

/// Iterator over child nodes only. Token slots are skipped without building
/// token handles.
#[derive(Clone)]
pub struct Children<'a> {
    parent: SyntaxNode<'a>,
    slots: Range<usize>,
}

impl<'a> Iterator for Children<'a> {
    type Item = SyntaxNode<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let parent = self.parent;
        self.slots.find_map(|index| parent.node_at(index))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.slots.len()))
    }
}

impl DoubleEndedIterator for Children<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let parent = self.parent;
        let index = self.slots.rfind(|&index| parent.green().child_at(index).as_node().is_some())?;
        parent.node_at(index)
    }
}

/// Preorder traversal over nodes.
#[derive(Clone)]
pub struct Preorder<'a> {
    inner: PreorderWithTokens<'a>,
}

impl<'a> Preorder<'a> {
    #[inline]
    fn new(start: SyntaxNode<'a>) -> Self {
        Self { inner: PreorderWithTokens::new(start) }
    }

    /// Skips the children of the node entered last; its `Leave` event comes
    /// next.
    #[inline]
    pub fn skip_subtree(&mut self) {
        self.inner.skip_subtree();
    }
}

impl<'a> Iterator for Preorder<'a> {
    type Item = WalkEvent<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.find_map(|item| match item {
            WalkEventWithTokens::EnterNode(it) => Some(WalkEvent::Enter(it)),
            WalkEventWithTokens::LeaveNode(it) => Some(WalkEvent::Leave(it)),
            WalkEventWithTokens::Token(_) => None,
        })
    }
}

/// Preorder walk event for nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkEvent<'a> {
    Enter(SyntaxNode<'a>),
    Leave(SyntaxNode<'a>),
}

/// Preorder traversal over nodes and tokens.
#[derive(Clone)]
pub struct PreorderWithTokens<'a> {
    stack: Vec<(SyntaxNode<'a>, ChildrenWithTokens<'a>)>,
    root: Option<SyntaxNode<'a>>,
}

impl<'a> PreorderWithTokens<'a> {
    #[inline]
    fn new(start: SyntaxNode<'a>) -> Self {
        Self { stack: Vec::with_capacity(32), root: Some(start) }
    }

    /// Skips the children of the node entered last; its `LeaveNode` event
    /// comes next.
    #[inline]
    pub fn skip_subtree(&mut self) {
        let (_, children) = self.stack.last_mut().expect("must have a subtree to skip");
        children.exhaust();
    }
}

impl<'a> Iterator for PreorderWithTokens<'a> {
    type Item = WalkEventWithTokens<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let Some((_, active_node)) = self.stack.last_mut() else {
            let root = self.root.take()?;
            self.stack.push((root, root.children_with_tokens()));
            return Some(WalkEventWithTokens::EnterNode(root));
        };
        match active_node.next() {
            Some(NodeOrToken::Node(child)) => {
                self.stack.push((child, child.children_with_tokens()));
                Some(WalkEventWithTokens::EnterNode(child))
            }
            Some(NodeOrToken::Token(child)) => Some(WalkEventWithTokens::Token(child)),
            None => {
                let (exited_node, _) = self.stack.pop().expect("should have an exited-from node");
                Some(WalkEventWithTokens::LeaveNode(exited_node))
            }
        }
    }
}

/// Preorder walk event including tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkEventWithTokens<'a> {
    EnterNode(SyntaxNode<'a>),
    LeaveNode(SyntaxNode<'a>),
    Token(SyntaxToken<'a>),
}

/// Node-or-token wrapper used throughout the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeOrToken<N, T> {
    Node(N),
    Token(T),
}

impl<N, T> NodeOrToken<N, T> {
    /// Converts into the node variant, if any.
    pub fn into_node(self) -> Option<N> {
        match self {
            NodeOrToken::Node(node) => Some(node),
            NodeOrToken::Token(_) => None,
        }
    }

    /// Converts into the token variant, if any.
    pub fn into_token(self) -> Option<T> {
        match self {
            NodeOrToken::Node(_) => None,
            NodeOrToken::Token(token) => Some(token),
        }
    }

    /// Returns a shared reference to the node, if any.
    pub fn as_node(&self) -> Option<&N> {
        match self {
            NodeOrToken::Node(node) => Some(node),
            NodeOrToken::Token(_) => None,
        }
    }

    /// Returns a shared reference to the token, if any.
    pub fn as_token(&self) -> Option<&T> {
        match self {
            NodeOrToken::Node(_) => None,
            NodeOrToken::Token(token) => Some(token),
        }
    }
}

impl<N: fmt::Display, T: fmt::Display> fmt::Display for NodeOrToken<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeOrToken::Node(node) => fmt::Display::fmt(node, f),
            NodeOrToken::Token(token) => fmt::Display::fmt(token, f),
        }
    }
}

/// There might be zero, one or two tokens at a given offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenAtOffset<T> {
    None,
    Single(T),
    /// The offset is the end of the first token and the start of the second.
    Between(T, T),
}

impl<T> TokenAtOffset<T> {
    /// The token ending at the offset when it sits on a boundary.
    pub fn left_biased(self) -> Option<T> {
        self.pick(|left, _| left)
    }

    /// The token starting at the offset when it sits on a boundary.
    pub fn right_biased(self) -> Option<T> {
        self.pick(|_, right| right)
    }

    fn pick(self, tie: impl FnOnce(T, T) -> T) -> Option<T> {
        match self {
            Self::None => None,
            Self::Single(token) => Some(token),
            Self::Between(left, right) => Some(tie(left, right)),
        }
    }

    fn remaining(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Single(_) => 1,
            Self::Between(..) => 2,
        }
    }
}

/// Yields the tokens left to right.
impl<T> Iterator for TokenAtOffset<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let (first, rest) = match std::mem::replace(self, Self::None) {
            Self::None => return None,
            Self::Single(token) => (token, Self::None),
            Self::Between(left, right) => (left, Self::Single(right)),
        };
        *self = rest;
        Some(first)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl<T> ExactSizeIterator for TokenAtOffset<T> {}
