//! Tests for the parser

use crate::ast::*;
use crate::source::SourceSet;
use crate::{DeclarationProvider, ParseError};

fn parse(text: &str) -> SourceSet {
    let mut set = SourceSet::new();
    set.add_file("main.sema", text, Origin::Source)
        .expect("parse main.sema");
    set
}

fn root(set: &SourceSet) -> NodeIndex {
    set.files()[0].root
}

fn kind_of<'a>(set: &'a SourceSet, node: NodeIndex) -> &'a NodeKind {
    set.arena().kind(node).expect("node kind")
}

#[test]
fn test_package_and_imports() {
    let set = parse("package app.core\nimport lib.A\nimport lib.B as C\nimport other.*\n");
    let root = root(&set);
    assert_eq!(set.interner().join(&set.package_of(root)), "app.core");
    let imports = set.imports(root);
    assert_eq!(imports.len(), 3);
    let NodeKind::Import(a) = kind_of(&set, imports[0]) else {
        panic!("expected import");
    };
    assert_eq!(set.interner().join(&a.path), "lib.A");
    let NodeKind::Import(b) = kind_of(&set, imports[1]) else {
        panic!("expected import");
    };
    assert_eq!(set.interner().resolve(b.imported_name()), "C");
    let NodeKind::Import(star) = kind_of(&set, imports[2]) else {
        panic!("expected import");
    };
    assert!(star.all_under);
    assert_eq!(set.interner().join(&star.path), "other");
}

#[test]
fn test_class_with_constructor_and_supertypes() {
    let set = parse(
        "open class Box<out T : Any>(val item: T, count: Int = 1) : Base(1), Marker {\n    fun get(): T = item\n}\n",
    );
    let classes = set.classes(root(&set));
    assert_eq!(classes.len(), 1);
    let NodeKind::Class(class) = kind_of(&set, classes[0]) else {
        panic!("expected class");
    };
    assert!(class.modifiers.contains(Modifiers::OPEN));
    assert!(class.has_primary_constructor);
    assert_eq!(class.constructor_params.len(), 2);
    assert_eq!(class.supertypes.len(), 2);
    assert_eq!(class.super_call_args.len(), 1);
    assert_eq!(set.functions(classes[0]).len(), 1);

    let NodeKind::TypeParameter(tp) = kind_of(&set, class.type_params[0]) else {
        panic!("expected type parameter");
    };
    assert_eq!(tp.variance, Variance::Out);
    assert!(tp.bound.is_some());

    let NodeKind::Parameter(item) = kind_of(&set, class.constructor_params[0]) else {
        panic!("expected parameter");
    };
    assert_eq!(item.property, Some(false));
    let NodeKind::Parameter(count) = kind_of(&set, class.constructor_params[1]) else {
        panic!("expected parameter");
    };
    assert_eq!(count.property, None);
    assert!(count.default.is_some());
}

#[test]
fn test_extension_function_receiver() {
    let set = parse("fun <T> List<T>.second(): T = get(1)\nfun Int.double() = this * 2\nfun plain(x: Int) {}\n");
    let functions = set.functions(root(&set));
    assert_eq!(functions.len(), 3);
    for (idx, has_receiver) in [(0, true), (1, true), (2, false)] {
        let NodeKind::Function(f) = kind_of(&set, functions[idx]) else {
            panic!("expected function");
        };
        assert_eq!(f.receiver.is_some(), has_receiver, "function {idx}");
    }
    let NodeKind::Function(second) = kind_of(&set, functions[0]) else {
        panic!("expected function");
    };
    assert_eq!(set.interner().resolve(second.name), "second");
    assert!(second.expression_body);
}

#[test]
fn test_type_mentions() {
    let set = parse("val f: (Int, String) -> Boolean? = g\nval h: ((Int) -> Unit)? = null\nval d: dynamic = x\nval q: a.b.C<Int>? = y\n");
    let props = set.properties(root(&set));
    let type_of = |i: usize| {
        let NodeKind::Property(p) = kind_of(&set, props[i]) else {
            panic!("expected property");
        };
        kind_of(&set, p.type_ref)
    };
    let NodeKind::FunctionType(f) = type_of(0) else {
        panic!("expected function type");
    };
    assert_eq!(f.params.len(), 2);
    assert!(!f.nullable);
    let NodeKind::FunctionType(h) = type_of(1) else {
        panic!("expected function type");
    };
    assert!(h.nullable);
    assert!(matches!(type_of(2), NodeKind::DynamicType));
    let NodeKind::TypeReference(q) = type_of(3) else {
        panic!("expected type reference");
    };
    assert_eq!(q.path.len(), 3);
    assert_eq!(q.args.len(), 1);
    assert!(q.nullable);
}

#[test]
fn test_operator_precedence() {
    let set = parse("val x = a + b * c < d && e ?: f\n");
    let expr = set.find_by_text("main.sema", "a + b * c < d && e ?: f").expect("expr");
    let NodeKind::Binary(and) = kind_of(&set, expr) else {
        panic!("expected &&");
    };
    assert_eq!(and.op, BinaryOp::And);
    let NodeKind::Binary(lt) = kind_of(&set, and.lhs) else {
        panic!("expected <");
    };
    assert_eq!(lt.op, BinaryOp::Lt);
    let NodeKind::Binary(add) = kind_of(&set, lt.lhs) else {
        panic!("expected +");
    };
    assert_eq!(add.op, BinaryOp::Add);
    assert!(matches!(kind_of(&set, add.rhs), NodeKind::Binary(m) if m.op == BinaryOp::Mul));
    assert!(matches!(kind_of(&set, and.rhs), NodeKind::Elvis(_)));
}

#[test]
fn test_newline_terminates_binary_expression() {
    let set = parse("fun f() {\n    val x = 1\n    -2\n}\n");
    let f = set.find_declaration("main.sema", "f").expect("f");
    let NodeKind::Function(data) = kind_of(&set, f) else {
        panic!("expected function");
    };
    let NodeKind::Block(body) = kind_of(&set, data.body) else {
        panic!("expected block");
    };
    assert_eq!(body.statements.len(), 2);
    assert!(matches!(kind_of(&set, body.statements[1]), NodeKind::Unary(_)));
}

#[test]
fn test_calls_with_type_arguments_and_trailing_lambda() {
    let set = parse("val a = listOf<Int>(1, 2)\nval b = xs.map { it + 1 }\nval c = p < q\nval d = obj?.run(1) { x: Int, y -> x }\n");
    let call = set.find_by_text("main.sema", "listOf<Int>(1, 2)").expect("call");
    let NodeKind::Call(a) = kind_of(&set, call) else {
        panic!("expected call");
    };
    assert_eq!(a.type_args.len(), 1);
    assert_eq!(a.args.len(), 2);
    assert!(a.receiver.is_none());

    let call = set.find_by_text("main.sema", "xs.map { it + 1 }").expect("call");
    let NodeKind::Call(b) = kind_of(&set, call) else {
        panic!("expected call");
    };
    assert_eq!(set.interner().resolve(b.callee), "map");
    assert!(matches!(kind_of(&set, b.args[0]), NodeKind::Lambda(l) if l.params.is_empty()));

    let cmp = set.find_by_text("main.sema", "p < q").expect("comparison");
    assert!(matches!(kind_of(&set, cmp), NodeKind::Binary(c) if c.op == BinaryOp::Lt));

    let call = set.find_by_text("main.sema", "obj?.run(1) { x: Int, y -> x }").expect("call");
    let NodeKind::Call(d) = kind_of(&set, call) else {
        panic!("expected call");
    };
    assert!(d.safe);
    assert_eq!(d.args.len(), 2);
    let NodeKind::Lambda(lambda) = kind_of(&set, d.args[1]) else {
        panic!("expected lambda");
    };
    assert_eq!(lambda.params.len(), 2);
}

#[test]
fn test_call_on_expression_becomes_invoke() {
    let set = parse("val r = make()(3)\n");
    let call = set.find_by_text("main.sema", "make()(3)").expect("call");
    let NodeKind::Call(outer) = kind_of(&set, call) else {
        panic!("expected call");
    };
    assert_eq!(set.interner().resolve(outer.callee), "invoke");
    assert!(matches!(kind_of(&set, outer.receiver), NodeKind::Call(_)));
}

#[test]
fn test_statements() {
    let set = parse(
        "fun f(xs: List<Int>): Int {\n    var total = 0\n    for (x in xs) total = total + x\n    while (total > 10) { total = total - 1 }\n    if (total is Int) return total else return 0\n}\n",
    );
    let f = set.find_declaration("main.sema", "f").expect("f");
    let NodeKind::Function(data) = kind_of(&set, f) else {
        panic!("expected function");
    };
    let NodeKind::Block(body) = kind_of(&set, data.body) else {
        panic!("expected block");
    };
    let kinds: Vec<_> = body
        .statements
        .iter()
        .map(|&s| kind_of(&set, s).describe())
        .collect();
    assert_eq!(kinds, vec!["property", "statement", "statement", "expression"]);
    assert_eq!(set.properties(data.body).len(), 1);
}

#[test]
fn test_parent_links() {
    let set = parse("class A {\n    fun f() = 1 + 2\n}\n");
    let f = set.find_declaration("main.sema", "A.f").expect("A.f");
    let class = set.find_declaration("main.sema", "A").expect("A");
    assert_eq!(set.arena().parent(f), class);
    let one = set.find_by_text("main.sema", "1").expect("literal");
    assert!(set.arena().ancestors(one).any(|a| a == f));
    assert_eq!(set.arena().ancestors(one).last(), Some(root(&set)));
}

#[test]
fn test_syntax_error_reports_position() {
    let mut set = SourceSet::new();
    let err = set
        .add_file("bad.sema", "fun f( {\n}", Origin::Source)
        .expect_err("syntax error");
    let ParseError::Syntax { line, column, .. } = err else {
        panic!("expected syntax error");
    };
    assert_eq!((line, column), (1, 8));
}

#[test]
fn test_two_statements_on_one_line_need_separator() {
    let mut set = SourceSet::new();
    assert!(
        set.add_file("bad.sema", "fun f() { val a = 1 val b = 2 }", Origin::Source)
            .is_err()
    );
    assert!(
        set.add_file("ok.sema", "fun f() { val a = 1; val b = 2 }", Origin::Source)
            .is_ok()
    );
}
