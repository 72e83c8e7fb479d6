use crate::SyntaxSet;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[repr(u16)]
pub enum SyntaxKind {
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACKET,
    RIGHT_BRACKET,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    SEMICOLON,
    COLON,
    EQ,
    DOT,

    FUN_KW,
    IF_KW,
    ELSE_KW,
    LOOP_KW,
    VAL_KW,
    WHILE_KW,
    NAME,

    NUMBER,
    STRING,
    BINARY_OPERATOR,
    POSTFIX_OPERATOR,
    PREFIX_OPERATOR,

    UNKNOWN,
    EOF,

    MODULE,
    FUNCTION,
    PARAM,
    TYPE_REF,
    BLOCK,
    VAL_STMT,
    EXPR_STMT,
    LITERAL,
    NAME_REF,
    BINARY_EXPR,
    POSTFIX_EXPR,
    PREFIX_EXPR,
    PAREN_EXPR,
    CALL_EXPR,
    SKIPPED_TOKENS,
    ERROR,

    ITEM_LIST,
    STMT_LIST,
    PARAM_LIST,
    ARG_LIST,
}

impl SyntaxKind {
    const TOKENS: SyntaxSet = SyntaxSet::new([
        SyntaxKind::LEFT_PAREN,
        SyntaxKind::RIGHT_PAREN,
        SyntaxKind::LEFT_BRACKET,
        SyntaxKind::RIGHT_BRACKET,
        SyntaxKind::LEFT_BRACE,
        SyntaxKind::RIGHT_BRACE,
        SyntaxKind::COMMA,
        SyntaxKind::SEMICOLON,
        SyntaxKind::COLON,
        SyntaxKind::EQ,
        SyntaxKind::DOT,
        SyntaxKind::FUN_KW,
        SyntaxKind::IF_KW,
        SyntaxKind::ELSE_KW,
        SyntaxKind::LOOP_KW,
        SyntaxKind::VAL_KW,
        SyntaxKind::WHILE_KW,
        SyntaxKind::NAME,
        SyntaxKind::NUMBER,
        SyntaxKind::STRING,
        SyntaxKind::BINARY_OPERATOR,
        SyntaxKind::POSTFIX_OPERATOR,
        SyntaxKind::PREFIX_OPERATOR,
        SyntaxKind::UNKNOWN,
        SyntaxKind::EOF,
    ]);

    const LISTS: SyntaxSet = SyntaxSet::new([
        SyntaxKind::ITEM_LIST,
        SyntaxKind::STMT_LIST,
        SyntaxKind::PARAM_LIST,
        SyntaxKind::ARG_LIST,
    ]);

    /// Returns `true` for kinds that only ever label tokens.
    pub const fn is_token(self) -> bool {
        Self::TOKENS.contains(self)
    }

    /// Returns `true` for kinds that label variable-arity list nodes.
    ///
    /// Such nodes must be built through the list constructors so their shape
    /// reflects their arity.
    pub const fn is_list(self) -> bool {
        Self::LISTS.contains(self)
    }

    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::FUN_KW
                | Self::IF_KW
                | Self::ELSE_KW
                | Self::LOOP_KW
                | Self::VAL_KW
                | Self::WHILE_KW
        )
    }
}
