//! Incremental builder for green trees.

use std::ops::{Deref, DerefMut};

use crate::green::NodeShape;
use crate::{BuildError, GreenElement, GreenNode, GreenTrivia, NodeCache, SyntaxKind, TriviaPiece};

enum MaybeOwned<'a, T> {
    Owned(T),
    Borrowed(&'a mut T),
}

impl<T> Deref for MaybeOwned<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            MaybeOwned::Owned(it) => it,
            MaybeOwned::Borrowed(it) => it,
        }
    }
}

impl<T> DerefMut for MaybeOwned<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self {
            MaybeOwned::Owned(it) => it,
            MaybeOwned::Borrowed(it) => it,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Opened {
    Node { kind: SyntaxKind, first_child: usize },
    List { kind: SyntaxKind, first_child: usize },
}

impl Opened {
    fn first_child(self) -> usize {
        match self {
            Opened::Node { first_child, .. } | Opened::List { first_child, .. } => first_child,
        }
    }
}

/// A position in the child buffer that a node can later be started at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Builds a [`GreenNode`] from parser events.
///
/// Nodes and tokens go through a [`NodeCache`], so identical subtrees built
/// by one builder (or by several builders sharing a cache) are the same
/// allocation.
///
/// A failed `finish_node` or `finish_list` abandons everything built so far;
/// the builder is left empty.
pub struct Builder<'cache> {
    cache: MaybeOwned<'cache, NodeCache>,
    opened: Vec<Opened>,
    children: Vec<GreenElement>,
}

impl Drop for Builder<'_> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.opened.is_empty() {
            panic!("you should call `Builder::finish()`");
        }
    }
}

const DEFAULT_TREE_DEPTH: usize = 128;
const DEFAULT_CHILDREN_LEN: usize = 1024;

impl Default for Builder<'_> {
    fn default() -> Self {
        Self::from_cache(MaybeOwned::Owned(NodeCache::new()))
    }
}

impl<'cache> Builder<'cache> {
    /// Creates a builder with a private cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder interning into `cache`.
    pub fn with_cache(cache: &'cache mut NodeCache) -> Self {
        Self::from_cache(MaybeOwned::Borrowed(cache))
    }

    fn from_cache(cache: MaybeOwned<'cache, NodeCache>) -> Self {
        Self {
            cache,
            opened: Vec::with_capacity(DEFAULT_TREE_DEPTH),
            children: Vec::with_capacity(DEFAULT_CHILDREN_LEN),
        }
    }

    /// Starts a new node of the given kind.
    pub fn start_node(&mut self, kind: SyntaxKind) {
        self.opened.push(Opened::Node { kind, first_child: self.children.len() });
    }

    /// Starts a list node. Its direct children are elements and, for a
    /// separated list, the separator tokens between them.
    pub fn start_list(&mut self, kind: SyntaxKind) {
        self.opened.push(Opened::List { kind, first_child: self.children.len() });
    }

    /// Finishes the most recently started node.
    ///
    /// # Panics
    ///
    /// Panics if the innermost open entry is a list.
    #[track_caller]
    pub fn finish_node(&mut self) -> Result<(), BuildError> {
        let (kind, first_child) = match self.opened.pop() {
            Some(Opened::Node { kind, first_child }) => (kind, first_child),
            Some(Opened::List { .. }) => {
                panic!("expected an opened node, found an opened list")
            }
            None => panic!("no opened nodes?"),
        };
        if kind.is_list() {
            self.abandon();
            return Err(BuildError::ListKindAsNode { kind });
        }

        let children = self.children.split_off(first_child);
        let node = self.cache.node(kind, NodeShape::Node, children);
        self.children.push(node.into());
        Ok(())
    }

    /// Finishes the most recently started list, picking its shape from the
    /// children it received.
    ///
    /// # Panics
    ///
    /// Panics if the innermost open entry is an ordinary node.
    #[track_caller]
    pub fn finish_list(&mut self) -> Result<(), BuildError> {
        let (kind, first_child) = match self.opened.pop() {
            Some(Opened::List { kind, first_child }) => (kind, first_child),
            Some(Opened::Node { .. }) => {
                panic!("expected an opened list, found an opened node")
            }
            None => panic!("no opened nodes?"),
        };
        let shape = match crate::list::classify(kind, &self.children[first_child..]) {
            Ok(shape) => shape,
            Err(error) => {
                self.abandon();
                return Err(error);
            }
        };

        let children = self.children.split_off(first_child);
        let node = self.cache.node(kind, NodeShape::List(shape), children);
        self.children.push(node.into());
        Ok(())
    }

    /// Adds a token without trivia.
    pub fn token(&mut self, kind: SyntaxKind, text: &str) {
        let token = self.cache.token(GreenTrivia::empty(), kind, text, GreenTrivia::empty());
        self.children.push(token.into());
    }

    /// Adds a token with attached trivia. `text` is the full text, trivia
    /// included.
    ///
    /// # Panics
    ///
    /// Panics if the trivia is longer than `text`.
    #[track_caller]
    pub fn token_with_trivia(
        &mut self,
        leading: &[TriviaPiece],
        kind: SyntaxKind,
        text: &str,
        trailing: &[TriviaPiece],
    ) {
        let token =
            self.cache.token(GreenTrivia::new(leading), kind, text, GreenTrivia::new(trailing));
        self.children.push(token.into());
    }

    /// Adds an already built subtree.
    pub fn node(&mut self, node: GreenNode) {
        self.children.push(node.into());
    }

    /// Marks the current position so a node can be wrapped around the
    /// children added after it.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.children.len())
    }

    /// Starts a node whose first child is the one added right after
    /// `checkpoint` was taken.
    ///
    /// # Panics
    ///
    /// Panics if `checkpoint` does not belong to the innermost open entry.
    #[track_caller]
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        let Checkpoint(first_child) = checkpoint;
        assert!(
            first_child <= self.children.len(),
            "checkpoint no longer valid, was `finish_node` called early?"
        );
        if let Some(parent) = self.opened.last() {
            assert!(
                first_child >= parent.first_child(),
                "checkpoint no longer valid, was an unmatched `start_node` called?"
            );
        }
        self.opened.push(Opened::Node { kind, first_child });
    }

    /// Returns the finished root.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn finish(mut self) -> Result<GreenNode, BuildError> {
        if !self.opened.is_empty() {
            let open = self.opened.len();
            self.abandon();
            return Err(BuildError::UnfinishedNodes { open });
        }

        let count = self.children.len();
        match self.children.pop() {
            Some(GreenElement::Node(root)) if count == 1 => {
                tracing::debug!(
                    kind = ?root.kind(),
                    nodes = self.cache.node_count(),
                    tokens = self.cache.token_count(),
                    "finished green tree"
                );
                Ok(root)
            }
            _ => Err(BuildError::RootCount { count }),
        }
    }

    fn abandon(&mut self) {
        self.opened.clear();
        self.children.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyntaxKind::*;
    use crate::{ListShape, NodeOrToken, TriviaPieceKind};

    fn literal(builder: &mut Builder<'_>, text: &str) {
        builder.start_node(LITERAL);
        builder.token(NUMBER, text);
        builder.finish_node().unwrap();
    }

    #[test]
    fn builds_nested_nodes() {
        let mut builder = Builder::new();
        builder.start_node(PAREN_EXPR);
        builder.token(LEFT_PAREN, "(");
        literal(&mut builder, "42");
        builder.token(RIGHT_PAREN, ")");
        builder.finish_node().unwrap();
        let root = builder.finish().unwrap();

        assert_eq!(root.kind(), PAREN_EXPR);
        assert_eq!(root.slot_count(), 3);
        assert_eq!(root.to_string(), "(42)");
        assert_eq!(root.child_offset(2), 3.into());
    }

    #[test]
    fn list_shape_follows_children() {
        let shape = |elements: usize, separators: bool| {
            let mut builder = Builder::new();
            builder.start_list(ARG_LIST);
            for i in 0..elements {
                if separators && i > 0 {
                    builder.token(COMMA, ",");
                }
                literal(&mut builder, "1");
            }
            builder.finish_list().unwrap();
            builder.finish().unwrap().list_shape()
        };

        assert_eq!(shape(0, false), Some(ListShape::Empty));
        assert_eq!(shape(1, false), Some(ListShape::Single));
        assert_eq!(shape(3, false), Some(ListShape::Many));
        assert_eq!(shape(3, true), Some(ListShape::SeparatedMany));
    }

    #[test]
    fn checkpoint_wraps_previous_children() {
        let mut builder = Builder::new();
        builder.start_node(EXPR_STMT);
        let checkpoint = builder.checkpoint();
        literal(&mut builder, "1");
        builder.start_node_at(checkpoint, BINARY_EXPR);
        builder.token(BINARY_OPERATOR, "+");
        literal(&mut builder, "2");
        builder.finish_node().unwrap();
        builder.token(SEMICOLON, ";");
        builder.finish_node().unwrap();
        let root = builder.finish().unwrap();

        let NodeOrToken::Node(binary) = root.child_at(0) else { panic!("expected a node") };
        assert_eq!(binary.kind(), BINARY_EXPR);
        assert_eq!(binary.to_string(), "1+2");
        assert_eq!(root.slot_count(), 2);
    }

    #[test]
    fn shared_cache_shares_subtrees() {
        let mut cache = NodeCache::new();
        let build = |cache: &mut NodeCache| {
            let mut builder = Builder::with_cache(cache);
            builder.start_node(PAREN_EXPR);
            literal(&mut builder, "7");
            builder.finish_node().unwrap();
            builder.finish().unwrap()
        };

        let first = build(&mut cache);
        let second = build(&mut cache);

        assert!(first.ptr_eq(&second));
        assert_eq!(cache.node_count(), 2);
    }

    #[test]
    fn trivia_is_part_of_the_token() {
        let mut builder = Builder::new();
        builder.start_node(NAME_REF);
        builder.token_with_trivia(
            &[TriviaPiece::new(TriviaPieceKind::Whitespace, 2.into())],
            NAME,
            "  x\n",
            &[TriviaPiece::new(TriviaPieceKind::Newline, 1.into())],
        );
        builder.finish_node().unwrap();
        let root = builder.finish().unwrap();

        let NodeOrToken::Token(token) = root.child_at(0) else { panic!("expected a token") };
        assert_eq!(token.text_trimmed(), "x");
        assert_eq!(root.text_len(), 4.into());
    }

    #[test]
    fn reports_unfinished_nodes() {
        let mut builder = Builder::new();
        builder.start_node(MODULE);
        builder.start_list(ITEM_LIST);

        assert_eq!(builder.finish(), Err(BuildError::UnfinishedNodes { open: 2 }));
    }

    #[test]
    fn reports_root_count() {
        let mut builder = Builder::new();
        literal(&mut builder, "1");
        literal(&mut builder, "2");
        assert_eq!(builder.finish(), Err(BuildError::RootCount { count: 2 }));

        assert_eq!(Builder::new().finish(), Err(BuildError::RootCount { count: 0 }));
    }

    #[test]
    fn rejects_malformed_lists() {
        let mut builder = Builder::new();
        builder.start_node(MODULE);
        builder.start_list(ITEM_LIST);
        builder.token(COMMA, ",");

        assert_eq!(builder.finish_list(), Err(BuildError::TokenInList { index: 0, kind: COMMA }));
        assert_eq!(builder.finish(), Err(BuildError::RootCount { count: 0 }));
    }

    #[test]
    fn rejects_list_kind_as_node() {
        let mut builder = Builder::new();
        builder.start_node(STMT_LIST);

        assert_eq!(builder.finish_node(), Err(BuildError::ListKindAsNode { kind: STMT_LIST }));
    }

    #[test]
    #[should_panic(expected = "you should call `Builder::finish()`")]
    fn dropping_an_open_builder_panics() {
        let mut builder = Builder::new();
        builder.start_node(MODULE);
    }
}
