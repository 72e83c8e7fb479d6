use std::hash::{BuildHasher, RandomState};
use std::sync::Barrier;

use expect_test::expect;
use fern_yellow::SyntaxKind::*;
use fern_yellow::ast::{self, AstNode as _, Expr, Stmt};
use fern_yellow::{
    Annotation, Builder, GreenNode, GreenToken, ListShape, NodeCache, SyntaxKind, SyntaxNode,
    SyntaxTree, TextRange, TextSize, TokenAtOffset, TriviaPiece, TriviaPieceKind, WalkEvent,
};

fn leaf(kind: SyntaxKind, token: SyntaxKind, text: &str) -> GreenNode {
    GreenNode::new(kind, [GreenToken::new(token, text).into()]).unwrap()
}

fn name_ref(builder: &mut Builder<'_>, name: &str) {
    builder.start_node(NAME_REF);
    builder.token(NAME, name);
    builder.finish_node().unwrap();
}

/// `fun add(a,b:int){val x=a+b;f(x);}`
fn sample(cache: &mut NodeCache) -> GreenNode {
    let space = [TriviaPiece::new(TriviaPieceKind::Whitespace, 1.into())];
    let mut builder = Builder::with_cache(cache);

    builder.start_node(MODULE);
    builder.start_list(ITEM_LIST);
    builder.start_node(FUNCTION);
    builder.token_with_trivia(&[], FUN_KW, "fun ", &space);
    builder.token(NAME, "add");
    builder.token(LEFT_PAREN, "(");

    builder.start_list(PARAM_LIST);
    builder.start_node(PARAM);
    builder.token(NAME, "a");
    builder.finish_node().unwrap();
    builder.token(COMMA, ",");
    builder.start_node(PARAM);
    builder.token(NAME, "b");
    builder.token(COLON, ":");
    builder.start_node(TYPE_REF);
    builder.token(NAME, "int");
    builder.finish_node().unwrap();
    builder.finish_node().unwrap();
    builder.finish_list().unwrap();
    builder.token(RIGHT_PAREN, ")");

    builder.start_node(BLOCK);
    builder.token(LEFT_BRACE, "{");
    builder.start_list(STMT_LIST);

    builder.start_node(VAL_STMT);
    builder.token_with_trivia(&[], VAL_KW, "val ", &space);
    builder.token(NAME, "x");
    builder.token(EQ, "=");
    let lhs = builder.checkpoint();
    name_ref(&mut builder, "a");
    builder.start_node_at(lhs, BINARY_EXPR);
    builder.token(BINARY_OPERATOR, "+");
    name_ref(&mut builder, "b");
    builder.finish_node().unwrap();
    builder.token(SEMICOLON, ";");
    builder.finish_node().unwrap();

    builder.start_node(EXPR_STMT);
    builder.start_node(CALL_EXPR);
    name_ref(&mut builder, "f");
    builder.token(LEFT_PAREN, "(");
    builder.start_list(ARG_LIST);
    name_ref(&mut builder, "x");
    builder.finish_list().unwrap();
    builder.token(RIGHT_PAREN, ")");
    builder.finish_node().unwrap();
    builder.token(SEMICOLON, ";");
    builder.finish_node().unwrap();

    builder.finish_list().unwrap();
    builder.token(RIGHT_BRACE, "}");
    builder.finish_node().unwrap();

    builder.finish_node().unwrap();
    builder.finish_list().unwrap();
    builder.finish_node().unwrap();
    builder.finish().unwrap()
}

fn function(tree: &SyntaxTree) -> SyntaxNode<'_> {
    let items = tree.root().first_child().unwrap();
    items.first_child().unwrap()
}

fn node_at(parent: SyntaxNode<'_>, index: usize) -> SyntaxNode<'_> {
    parent.child_at(index).into_node().unwrap()
}

#[test]
fn positions_accumulate_from_widths() {
    let b = leaf(NAME_REF, NAME, "b");
    let d = leaf(LITERAL, NUMBER, "42");
    let e = leaf(NAME_REF, NAME, "e");
    let c = GreenNode::new(BINARY_EXPR, [d.into(), e.into()]).unwrap();
    let a = GreenNode::new(EXPR_STMT, [b.into(), c.into()]).unwrap();

    let tree = SyntaxTree::new(a);
    let root = tree.root();
    let c = node_at(root, 1);
    let e = node_at(c, 1);

    assert_eq!(root.width(), TextSize::new(4));
    assert_eq!(c.start(), TextSize::new(1));
    assert_eq!(e.start(), TextSize::new(3));
    assert_eq!(e.parent(), Some(c));
    assert_eq!(c.parent(), Some(root));
}

#[test]
fn widths_add_up() {
    let mut cache = NodeCache::new();
    let tree = SyntaxTree::new(sample(&mut cache));
    assert_eq!(tree.root().to_string(), "fun add(a,b:int){val x=a+b;f(x);}");

    for node in tree.root().descendants() {
        let mut expected_start = node.start();
        for child in node.children_with_tokens() {
            assert_eq!(child.text_range().start(), expected_start, "{child:?} in {node:?}");
            expected_start = child.text_range().end();
        }
        assert_eq!(expected_start, node.end(), "{node:?}");
    }
}

#[test]
fn materialization_is_idempotent() {
    let mut cache = NodeCache::new();
    let tree = SyntaxTree::new(sample(&mut cache));
    let function = function(&tree);

    assert_eq!(function.cached_child_at(5), None);
    let first = node_at(function, 5);
    let second = node_at(function, 5);

    assert_eq!(first, second);
    assert_eq!(function.cached_child_at(5), Some(first));
    assert!(first.green().ptr_eq(function.green().child_at(5).as_node().unwrap()));
}

#[test]
fn typed_cache_lookup_fails_closed() {
    let mut cache = NodeCache::new();
    let tree = SyntaxTree::new(sample(&mut cache));
    let function = function(&tree);

    assert_eq!(function.cached_child::<ast::Block<'_>>(5), None);
    let block = node_at(function, 5);

    assert_eq!(function.cached_child::<ast::Block<'_>>(5).map(|it| it.syntax()), Some(block));
    assert_eq!(function.cached_child::<ast::Function<'_>>(5), None);
    // Token slots are never cached.
    assert!(function.child_at(1).as_token().is_some());
    assert_eq!(function.cached_child_at(1), None);
}

#[test]
#[should_panic(expected = "slot index 6 is out of range for `FUNCTION` with 6 slots")]
fn probing_past_the_end_panics() {
    let mut cache = NodeCache::new();
    let tree = SyntaxTree::new(sample(&mut cache));
    function(&tree).cached_child_at(6);
}

#[test]
fn trees_share_green_but_not_facades() {
    let mut cache = NodeCache::new();
    let green = sample(&mut cache);
    let first = SyntaxTree::new(green.clone());
    let second = SyntaxTree::new_at(green, TextSize::new(10));

    let (lhs, rhs) = (function(&first), function(&second));
    assert!(lhs.green().ptr_eq(rhs.green()));
    assert_eq!(rhs.text_range(), lhs.text_range() + TextSize::new(10));

    let lhs_block = node_at(lhs, 5);
    assert_eq!(second.root().first_child().unwrap().cached_child_at(0), Some(rhs));
    assert_eq!(rhs.cached_child_at(5), None);
    assert_eq!(lhs.cached_child_at(5), Some(lhs_block));
}

#[test]
fn identical_subtrees_are_interned() {
    let mut cache = NodeCache::new();
    let first = sample(&mut cache);
    let second = sample(&mut cache);

    assert_eq!(first, second);
    // Function nodes have more than three children and are never interned,
    // but their small children are.
    assert!(!first.ptr_eq(&second));
    let tree = SyntaxTree::new(first);
    let other = SyntaxTree::new(second);
    let (lhs, rhs) = (function(&tree), function(&other));
    assert!(node_at(lhs, 3).green().ptr_eq(node_at(rhs, 3).green()));
}

#[test]
fn concurrent_materialization_agrees() {
    const THREADS: usize = 8;

    let mut cache = NodeCache::new();
    let tree = SyntaxTree::new(sample(&mut cache));
    let function = function(&tree);
    let barrier = Barrier::new(THREADS);

    let blocks: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    let block = node_at(function, 5);
                    let statements = block.first_child().unwrap();
                    (block, statements.children().collect::<Vec<_>>())
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let (block, statements) = &blocks[0];
    assert_eq!(statements.len(), 2);
    for (other_block, other_statements) in &blocks[1..] {
        assert_eq!(other_block, block);
        assert_eq!(other_statements, statements);
    }
    assert_eq!(function.cached_child_at(5), Some(*block));
}

#[test]
fn concurrent_materialization_of_a_single_slot() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 64;

    let literal = leaf(LITERAL, NUMBER, "1");
    let paren = GreenNode::new(PAREN_EXPR, [literal.into()]).unwrap();

    for _ in 0..ROUNDS {
        let tree = SyntaxTree::new(paren.clone());
        let root = tree.root();
        let barrier = Barrier::new(THREADS);

        let children: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        node_at(root, 0)
                    })
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        assert!(children.iter().all(|&child| child == children[0]));
        assert_eq!(root.cached_child_at(0), Some(children[0]));
        assert_eq!(children[0].parent(), Some(root));
    }
}

#[test]
fn deep_trees_are_built_walked_and_dropped() {
    const DEPTH: usize = 200_000;

    let nested = || {
        let mut node = leaf(LITERAL, NUMBER, "1");
        for _ in 0..DEPTH {
            node = GreenNode::new(PAREN_EXPR, [node.into()]).unwrap();
        }
        node
    };
    let (first, second) = (nested(), nested());
    let hasher = RandomState::new();
    assert!(!first.ptr_eq(&second));
    assert_eq!(first, second);
    assert_eq!(hasher.hash_one(&first), hasher.hash_one(&second));

    let tree = SyntaxTree::new(first);
    assert_eq!(tree.root().descendants().count(), DEPTH + 1);
    assert_eq!(tree.root().to_string(), "1");
    drop(tree);

    assert_eq!(second.text_len(), TextSize::new(1));
    drop(second);
}

#[test]
fn list_shapes_and_separators() {
    let mut cache = NodeCache::new();
    let tree = SyntaxTree::new(sample(&mut cache));
    let items = tree.root().first_child().unwrap().as_list().unwrap();
    let function = function(&tree);
    let params = node_at(function, 3).as_list().unwrap();
    let statements = node_at(node_at(function, 5), 1).as_list().unwrap();

    assert_eq!(items.shape(), ListShape::Single);
    assert_eq!(params.shape(), ListShape::SeparatedMany);
    assert_eq!(statements.shape(), ListShape::Many);

    assert_eq!(params.len(), 2);
    assert_eq!(params.separator_count(), 1);
    assert!(!params.has_trailing_separator());
    assert_eq!(params.element_slot(1), 2);
    assert_eq!(params.slot_element(1), None);
    assert_eq!(params.separators().map(|it| it.text()).collect::<Vec<_>>(), [","]);
    assert_eq!(params.element(1).to_string(), "b:int");
    assert_eq!(params.get(2), None);
    assert_eq!(params.iter().rev().map(|it| it.to_string()).collect::<Vec<_>>(), ["b:int", "a"]);
    assert!(function.as_list().is_none());
}

#[test]
fn typed_navigation() {
    let mut cache = NodeCache::new();
    let tree = SyntaxTree::new(sample(&mut cache));
    let module = ast::Module::cast(tree.root()).unwrap();

    let function = module.functions().unwrap().get(0).unwrap();
    assert_eq!(function.name().unwrap().text(), "add");

    let params = function.params().unwrap();
    let names: Vec<_> = params.iter().filter_map(|it| it.name()).map(|it| it.text()).collect();
    assert_eq!(names, ["a", "b"]);
    let ty = params.get(1).and_then(|it| it.ty()).and_then(|it| it.name()).unwrap();
    assert_eq!(ty.text(), "int");

    let statements: Vec<_> = function.body().unwrap().statements().unwrap().iter().collect();
    let [Stmt::Val(val), Stmt::Expr(call)] = statements[..] else {
        panic!("unexpected statements: {statements:?}");
    };
    assert_eq!(val.name().unwrap().text(), "x");
    let Some(Expr::Binary(binary)) = val.initializer() else { panic!("expected a binary") };
    assert_eq!(binary.op().unwrap().text(), "+");
    assert_eq!(binary.lhs().unwrap().syntax().to_string(), "a");
    assert_eq!(binary.rhs().unwrap().syntax().to_string(), "b");

    let Some(Expr::Call(call)) = call.expr() else { panic!("expected a call") };
    assert_eq!(call.callee().unwrap().syntax().to_string(), "f");
    let args = call.args().unwrap();
    assert_eq!(args.shape(), ListShape::Single);
    assert_eq!(args.cached(0), None);
    assert!(matches!(args.get(0), Some(Expr::NameRef(_))));
    assert!(matches!(args.cached(0), Some(Expr::NameRef(_))));
}

#[test]
fn tokens_and_offsets() {
    let mut cache = NodeCache::new();
    let tree = SyntaxTree::new(sample(&mut cache));
    let root = tree.root();

    let TokenAtOffset::Between(left, right) = root.token_at_offset(8.into()) else {
        panic!("expected two tokens at offset 8");
    };
    assert_eq!((left.text(), right.text()), ("(", "a"));
    assert_eq!(right.text_range(), TextRange::new(8.into(), 9.into()));
    assert_eq!(root.token_at_offset(100.into()), TokenAtOffset::None);
    let at_paren = root.token_at_offset(8.into());
    assert_eq!(at_paren.len(), 2);
    assert_eq!(at_paren.clone().left_biased(), Some(left));
    assert_eq!(at_paren.map(|token| token.text()).collect::<Vec<_>>(), ["(", "a"]);

    let binary = root.covering_element(TextRange::new(23.into(), 26.into()));
    assert_eq!(binary.kind(), BINARY_EXPR);
    let plus = root.covering_element(TextRange::new(24.into(), 25.into()));
    assert_eq!(plus.kind(), BINARY_OPERATOR);

    let fun = root.first_token().unwrap();
    assert_eq!(fun.text(), "fun ");
    assert_eq!(fun.text_trimmed(), "fun");
    assert_eq!(fun.trimmed_range(), TextRange::new(0.into(), 3.into()));
    assert_eq!(fun.trailing_trivia().len(), TextSize::new(1));

    let add = fun.next_token().unwrap();
    assert_eq!(add.text(), "add");
    assert_eq!(add.prev_token(), Some(fun));
    let last = root.last_token().unwrap();
    assert_eq!(last.text(), "}");
    assert_eq!(last.next_token(), None);
    // `a` is the first token of the first parameter.
    assert_eq!(add.next_token().unwrap().next_token(), Some(right));
    assert_eq!(right.parent_ancestors().map(|it| it.kind()).collect::<Vec<_>>(), [
        PARAM, PARAM_LIST, FUNCTION, ITEM_LIST, MODULE
    ]);
}

#[test]
fn preorder_visits_in_text_order() {
    let mut cache = NodeCache::new();
    let tree = SyntaxTree::new(sample(&mut cache));
    let function = function(&tree);

    let kinds: Vec<_> = node_at(function, 3).descendants().map(|it| it.kind()).collect();
    assert_eq!(kinds, [PARAM_LIST, PARAM, PARAM, TYPE_REF]);

    let mut preorder = function.preorder();
    let mut entered = Vec::new();
    while let Some(event) = preorder.next() {
        if let WalkEvent::Enter(node) = event {
            entered.push(node.kind());
            if node.kind() == PARAM_LIST {
                preorder.skip_subtree();
            }
        }
    }
    assert_eq!(entered[..4], [FUNCTION, PARAM_LIST, BLOCK, STMT_LIST]);
}

#[test]
fn replacing_a_node_shares_the_rest() {
    let mut cache = NodeCache::new();
    let tree = SyntaxTree::new(sample(&mut cache));
    let rhs = tree.root().covering_element(TextRange::new(25.into(), 26.into()));
    let rhs = rhs.parent().unwrap();
    assert_eq!(rhs.kind(), NAME_REF);

    let edited = rhs.replace_with(leaf(NAME_REF, NAME, "bb")).unwrap();
    assert_eq!(edited.to_string(), "fun add(a,b:int){val x=a+bb;f(x);}");

    let edited = SyntaxTree::new(edited);
    let (before, after) = (function(&tree), function(&edited));
    assert!(node_at(before, 3).green().ptr_eq(node_at(after, 3).green()));
    assert!(!node_at(before, 5).green().ptr_eq(node_at(after, 5).green()));

    let fun = edited.root().first_token().unwrap();
    let renamed = fun.replace_with(GreenToken::new(FUN_KW, "fn ")).unwrap();
    assert!(renamed.to_string().starts_with("fn add("));
}

#[test]
fn annotations_are_positioned() {
    let x = leaf(NAME_REF, NAME, "x");
    let range = TextRange::new(0.into(), 1.into());
    let annotated = x.with_annotations([Annotation::new(range, "unresolved name")]);
    let root = GreenNode::new(PAREN_EXPR, [
        GreenToken::new(LEFT_PAREN, "(").into(),
        annotated.into(),
        GreenToken::new(RIGHT_PAREN, ")").into(),
    ])
    .unwrap();

    let tree = SyntaxTree::new_at(root, 5.into());
    let x = node_at(tree.root(), 1);
    let annotations: Vec<_> = x.annotations().collect();

    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].range, TextRange::new(6.into(), 7.into()));
    assert_eq!(annotations[0].message, "unresolved name");
    assert_eq!(tree.root().annotations().len(), 0);
}

#[test]
fn debug_tree() {
    let mut builder = Builder::new();
    builder.start_node(CALL_EXPR);
    name_ref(&mut builder, "f");
    builder.token(LEFT_PAREN, "(");
    builder.start_list(ARG_LIST);
    for (i, digit) in ["1", "2"].into_iter().enumerate() {
        if i > 0 {
            builder.token(COMMA, ",");
        }
        builder.start_node(LITERAL);
        builder.token(NUMBER, digit);
        builder.finish_node().unwrap();
    }
    builder.finish_list().unwrap();
    builder.token(RIGHT_PAREN, ")");
    builder.finish_node().unwrap();
    let tree = SyntaxTree::new(builder.finish().unwrap());

    expect![[r#"
        CALL_EXPR@0..6
          NAME_REF@0..1
            NAME@0..1 "f"
          LEFT_PAREN@1..2 "("
          ARG_LIST@2..5 SeparatedMany
            LITERAL@2..3
              NUMBER@2..3 "1"
            COMMA@3..4 ","
            LITERAL@4..5
              NUMBER@4..5 "2"
          RIGHT_PAREN@5..6 ")"
    "#]]
    .assert_eq(&tree.root().debug_tree());
}
