//! Typed wrappers over syntax nodes.
//!
//! Casting checks the node kind and fails closed: a node of the wrong kind is
//! `None`, never a misinterpreted wrapper.

use std::fmt;
use std::marker::PhantomData;

use crate::SyntaxKind::{self, *};
use crate::list::{ListShape, SyntaxList};
use crate::{NodeOrToken, SyntaxNode, SyntaxSet, SyntaxToken};

pub trait AstNode<'a>: Copy {
    fn can_cast(kind: SyntaxKind) -> bool;

    fn cast(syntax: SyntaxNode<'a>) -> Option<Self>;

    fn syntax(self) -> SyntaxNode<'a>;
}

macro_rules! ast_node {
    ($(#[$attr:meta])* $name:ident => $kind:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name<'a>(SyntaxNode<'a>);

        impl<'a> AstNode<'a> for $name<'a> {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind == $kind
            }

            fn cast(syntax: SyntaxNode<'a>) -> Option<Self> {
                Self::can_cast(syntax.kind()).then_some(Self(syntax))
            }

            fn syntax(self) -> SyntaxNode<'a> {
                self.0
            }
        }
    };
}

ast_node!(Module => MODULE);
ast_node!(Function => FUNCTION);
ast_node!(Param => PARAM);
ast_node!(TypeRef => TYPE_REF);
ast_node!(Block => BLOCK);
ast_node!(ValStmt => VAL_STMT);
ast_node!(ExprStmt => EXPR_STMT);
ast_node!(Literal => LITERAL);
ast_node!(NameRef => NAME_REF);
ast_node!(BinaryExpr => BINARY_EXPR);
ast_node!(PrefixExpr => PREFIX_EXPR);
ast_node!(PostfixExpr => POSTFIX_EXPR);
ast_node!(ParenExpr => PAREN_EXPR);
ast_node!(CallExpr => CALL_EXPR);

impl<'a> Module<'a> {
    pub fn functions(self) -> Option<AstList<'a, Function<'a>>> {
        support::list(self.0, ITEM_LIST)
    }
}

impl<'a> Function<'a> {
    pub fn name(self) -> Option<SyntaxToken<'a>> {
        support::token(self.0, NAME)
    }

    pub fn params(self) -> Option<AstList<'a, Param<'a>>> {
        support::list(self.0, PARAM_LIST)
    }

    pub fn body(self) -> Option<Block<'a>> {
        support::child(self.0)
    }
}

impl<'a> Param<'a> {
    pub fn name(self) -> Option<SyntaxToken<'a>> {
        support::token(self.0, NAME)
    }

    pub fn ty(self) -> Option<TypeRef<'a>> {
        support::child(self.0)
    }
}

impl<'a> TypeRef<'a> {
    pub fn name(self) -> Option<SyntaxToken<'a>> {
        support::token(self.0, NAME)
    }
}

impl<'a> Block<'a> {
    pub fn statements(self) -> Option<AstList<'a, Stmt<'a>>> {
        support::list(self.0, STMT_LIST)
    }
}

impl<'a> ValStmt<'a> {
    pub fn name(self) -> Option<SyntaxToken<'a>> {
        support::token(self.0, NAME)
    }

    pub fn initializer(self) -> Option<Expr<'a>> {
        support::child(self.0)
    }
}

impl<'a> ExprStmt<'a> {
    pub fn expr(self) -> Option<Expr<'a>> {
        support::child(self.0)
    }
}

impl<'a> Literal<'a> {
    pub fn token(self) -> Option<SyntaxToken<'a>> {
        self.0.children_with_tokens().find_map(NodeOrToken::into_token)
    }
}

impl<'a> NameRef<'a> {
    pub fn name(self) -> Option<SyntaxToken<'a>> {
        support::token(self.0, NAME)
    }
}

impl<'a> BinaryExpr<'a> {
    pub fn lhs(self) -> Option<Expr<'a>> {
        support::child(self.0)
    }

    pub fn op(self) -> Option<SyntaxToken<'a>> {
        support::token(self.0, BINARY_OPERATOR)
    }

    pub fn rhs(self) -> Option<Expr<'a>> {
        self.0.children().filter_map(Expr::cast).nth(1)
    }
}

impl<'a> PrefixExpr<'a> {
    pub fn op(self) -> Option<SyntaxToken<'a>> {
        support::token(self.0, PREFIX_OPERATOR)
    }

    pub fn expr(self) -> Option<Expr<'a>> {
        support::child(self.0)
    }
}

impl<'a> PostfixExpr<'a> {
    pub fn expr(self) -> Option<Expr<'a>> {
        support::child(self.0)
    }

    pub fn op(self) -> Option<SyntaxToken<'a>> {
        support::token(self.0, POSTFIX_OPERATOR)
    }
}

impl<'a> ParenExpr<'a> {
    pub fn expr(self) -> Option<Expr<'a>> {
        support::child(self.0)
    }
}

impl<'a> CallExpr<'a> {
    pub fn callee(self) -> Option<Expr<'a>> {
        support::child(self.0)
    }

    pub fn args(self) -> Option<AstList<'a, Expr<'a>>> {
        support::list(self.0, ARG_LIST)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stmt<'a> {
    Val(ValStmt<'a>),
    Expr(ExprStmt<'a>),
}

impl<'a> AstNode<'a> for Stmt<'a> {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(kind, VAL_STMT | EXPR_STMT)
    }

    fn cast(syntax: SyntaxNode<'a>) -> Option<Self> {
        match syntax.kind() {
            VAL_STMT => Some(Stmt::Val(ValStmt(syntax))),
            EXPR_STMT => Some(Stmt::Expr(ExprStmt(syntax))),
            _ => None,
        }
    }

    fn syntax(self) -> SyntaxNode<'a> {
        match self {
            Stmt::Val(it) => it.0,
            Stmt::Expr(it) => it.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expr<'a> {
    Literal(Literal<'a>),
    NameRef(NameRef<'a>),
    Binary(BinaryExpr<'a>),
    Prefix(PrefixExpr<'a>),
    Postfix(PostfixExpr<'a>),
    Paren(ParenExpr<'a>),
    Call(CallExpr<'a>),
}

impl Expr<'_> {
    const KINDS: SyntaxSet = SyntaxSet::new([
        LITERAL,
        NAME_REF,
        BINARY_EXPR,
        PREFIX_EXPR,
        POSTFIX_EXPR,
        PAREN_EXPR,
        CALL_EXPR,
    ]);
}

impl<'a> AstNode<'a> for Expr<'a> {
    fn can_cast(kind: SyntaxKind) -> bool {
        Self::KINDS.contains(kind)
    }

    fn cast(syntax: SyntaxNode<'a>) -> Option<Self> {
        Some(match syntax.kind() {
            LITERAL => Expr::Literal(Literal(syntax)),
            NAME_REF => Expr::NameRef(NameRef(syntax)),
            BINARY_EXPR => Expr::Binary(BinaryExpr(syntax)),
            PREFIX_EXPR => Expr::Prefix(PrefixExpr(syntax)),
            POSTFIX_EXPR => Expr::Postfix(PostfixExpr(syntax)),
            PAREN_EXPR => Expr::Paren(ParenExpr(syntax)),
            CALL_EXPR => Expr::Call(CallExpr(syntax)),
            _ => return None,
        })
    }

    fn syntax(self) -> SyntaxNode<'a> {
        match self {
            Expr::Literal(it) => it.0,
            Expr::NameRef(it) => it.0,
            Expr::Binary(it) => it.0,
            Expr::Prefix(it) => it.0,
            Expr::Postfix(it) => it.0,
            Expr::Paren(it) => it.0,
            Expr::Call(it) => it.0,
        }
    }
}

/// Typed view over a list node.
///
/// Elements that do not cast to `N` (error recovery nodes, for instance) are
/// reported as `None` by [`AstList::get`] and skipped by [`AstList::iter`].
pub struct AstList<'a, N> {
    list: SyntaxList<'a>,
    _marker: PhantomData<fn() -> N>,
}

impl<'a, N: AstNode<'a>> AstList<'a, N> {
    pub fn new(list: SyntaxList<'a>) -> Self {
        Self { list, _marker: PhantomData }
    }

    pub fn syntax(self) -> SyntaxList<'a> {
        self.list
    }

    pub fn shape(self) -> ListShape {
        self.list.shape()
    }

    pub fn len(self) -> usize {
        self.list.len()
    }

    pub fn is_empty(self) -> bool {
        self.list.is_empty()
    }

    pub fn get(self, index: usize) -> Option<N> {
        self.list.get(index).and_then(N::cast)
    }

    /// Like [`AstList::get`], but never materializes the element.
    pub fn cached(self, index: usize) -> Option<N> {
        self.list.cached_element(index).and_then(N::cast)
    }

    pub fn iter(self) -> impl DoubleEndedIterator<Item = N> {
        self.list.iter().filter_map(N::cast)
    }

    pub fn separators(self) -> impl Iterator<Item = SyntaxToken<'a>> {
        self.list.separators()
    }
}

impl<N> Clone for AstList<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for AstList<'_, N> {}

impl<N> fmt::Debug for AstList<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AstList").field(&self.list).finish()
    }
}

mod support {
    use super::{AstList, AstNode};
    use crate::{NodeOrToken, SyntaxKind, SyntaxNode, SyntaxToken};

    pub(super) fn child<'a, N: AstNode<'a>>(parent: SyntaxNode<'a>) -> Option<N> {
        parent.children().find_map(N::cast)
    }

    pub(super) fn token(parent: SyntaxNode<'_>, kind: SyntaxKind) -> Option<SyntaxToken<'_>> {
        parent
            .children_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .find(|token| token.kind() == kind)
    }

    pub(super) fn list<'a, N: AstNode<'a>>(
        parent: SyntaxNode<'a>,
        kind: SyntaxKind,
    ) -> Option<AstList<'a, N>> {
        parent.children().find(|child| child.kind() == kind)?.as_list().map(AstList::new)
    }
}
