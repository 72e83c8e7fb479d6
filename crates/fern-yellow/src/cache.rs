//! Interner deduplicating identical green nodes and tokens.
//!
//! The cache is an explicit handle: a parse that wants sharing passes one to
//! its [`Builder`](crate::Builder), and the sharing lives exactly as long as
//! that handle. Nothing is global.

use std::fmt;
use std::hash::{Hash, Hasher};

use hashbrown::HashTable;
use rustc_hash::FxHasher;

use crate::green::NodeShape;
use crate::{GreenElement, GreenNode, GreenToken, GreenTrivia, SyntaxKind};

/// Nodes with more children than this are rarely repeated and are not
/// interned.
const MAX_CACHED_CHILDREN: usize = 3;

#[derive(Default)]
pub struct NodeCache {
    nodes: HashTable<GreenNode>,
    tokens: HashTable<GreenToken>,
}

impl NodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct interned nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct interned tokens.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Returns the interned token with this content, creating it on a miss.
    pub fn token(
        &mut self,
        leading: GreenTrivia,
        kind: SyntaxKind,
        text: &str,
        trailing: GreenTrivia,
    ) -> GreenToken {
        let hash = {
            let mut hasher = FxHasher::default();
            (kind, text, &leading, &trailing).hash(&mut hasher);
            hasher.finish()
        };
        let eq = |token: &GreenToken| {
            token.kind() == kind
                && token.text() == text
                && *token.leading() == leading
                && *token.trailing() == trailing
        };
        if let Some(token) = self.tokens.find(hash, eq) {
            return token.clone();
        }

        let token = GreenToken::with_trivia(leading, kind, text, trailing);
        self.tokens.insert_unique(hash, token.clone(), token_hash);
        token
    }

    /// Returns the interned node with this kind, shape and (identical)
    /// children, creating it on a miss. `shape` must already be validated.
    pub(crate) fn node(
        &mut self,
        kind: SyntaxKind,
        shape: NodeShape,
        children: Vec<GreenElement>,
    ) -> GreenNode {
        if children.len() > MAX_CACHED_CHILDREN {
            return GreenNode::alloc(kind, shape, None, children);
        }

        let hash = node_hash_parts(kind, shape, children.iter());
        let eq = |node: &GreenNode| {
            node.kind() == kind
                && node.shape() == shape
                && node.annotations().is_empty()
                && node.slot_count() == children.len()
                && node.children().zip(&children).all(|(lhs, rhs)| lhs.ptr_eq(rhs))
        };
        if let Some(node) = self.nodes.find(hash, eq) {
            tracing::trace!(?kind, "node cache hit");
            return node.clone();
        }

        let node = GreenNode::alloc(kind, shape, None, children);
        self.nodes.insert_unique(hash, node.clone(), node_hash);
        node
    }
}

impl fmt::Debug for NodeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCache")
            .field("nodes", &self.node_count())
            .field("tokens", &self.token_count())
            .finish()
    }
}

/// Children are hashed by identity; they are interned before their parent.
fn node_hash_parts<'c>(
    kind: SyntaxKind,
    shape: NodeShape,
    children: impl Iterator<Item = &'c GreenElement>,
) -> u64 {
    let mut hasher = FxHasher::default();
    (kind, shape).hash(&mut hasher);
    for child in children {
        child.addr().hash(&mut hasher);
    }
    hasher.finish()
}

fn node_hash(node: &GreenNode) -> u64 {
    node_hash_parts(node.kind(), node.shape(), node.children())
}

fn token_hash(token: &GreenToken) -> u64 {
    let mut hasher = FxHasher::default();
    (token.kind(), token.text(), token.leading(), token.trailing()).hash(&mut hasher);
    hasher.finish()
}
