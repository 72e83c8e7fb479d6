//! Lossless syntax tree split into two layers.
//!
//! Green nodes are immutable, position-free and structurally shared, so edits
//! rebuild only the path from the change to the root. Facade nodes are built
//! lazily on top of them, carry parent links and absolute offsets, and are
//! cached per parent slot so repeated navigation returns the same node.

/// Typed AST wrappers around the raw syntax tree.
pub mod ast;
mod builder;
mod cache;
mod error;
mod green;
mod list;
mod maybe_dangling;
mod red;
mod slots;
mod syntax;
mod syntax_kind;
mod syntax_set;
mod trivia;

/// Event-driven construction of green trees.
pub use builder::{Builder, Checkpoint};
/// Interner for sharing identical green nodes and tokens.
pub use cache::NodeCache;
pub use error::BuildError;
/// Immutable, shareable tree layer.
pub use green::{Annotation, GreenElement, GreenNode, GreenToken, NodeShape};
/// Variable-arity list nodes.
pub use list::{ListShape, SyntaxList, SyntaxListIter};
/// Primary syntax tree API types and adapters.
pub use syntax::{
    Children, ChildrenWithTokens, NodeOrToken, Preorder, PreorderWithTokens, SyntaxAnnotation,
    SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTree, TokenAtOffset, WalkEvent,
    WalkEventWithTokens,
};
/// Token and node kinds used throughout the tree.
pub use syntax_kind::SyntaxKind;
/// Compact set for grouping `SyntaxKind` values.
pub use syntax_set::SyntaxSet;
pub use text_size::{TextRange, TextSize};
/// Trivia pieces attached to tokens.
pub use trivia::{GreenTrivia, TriviaPiece, TriviaPieceKind};
