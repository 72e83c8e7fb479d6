use thiserror::Error;

use crate::SyntaxKind;

/// Inconsistencies rejected while constructing green nodes.
///
/// These are reported before any facade node exists, so no slot cache ever
/// observes a malformed node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("`{kind:?}` is a list kind and must be built as a list")]
    ListKindAsNode { kind: SyntaxKind },
    #[error("`{kind:?}` is not a list kind")]
    NodeKindAsList { kind: SyntaxKind },
    #[error("expected a list element at slot {index}, found token `{kind:?}`")]
    TokenInList { index: usize, kind: SyntaxKind },
    #[error("expected a separator at slot {index}, found node `{kind:?}`")]
    ExpectedSeparator { index: usize, kind: SyntaxKind },
    #[error("a list of {elements} elements cannot take {separators} separators")]
    SeparatorCount { elements: usize, separators: usize },
    #[error("{open} node(s) were started but never finished")]
    UnfinishedNodes { open: usize },
    #[error("expected exactly one root node, found {count} top-level element(s)")]
    RootCount { count: usize },
}
