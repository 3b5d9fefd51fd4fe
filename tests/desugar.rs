use {
    frontend::ast::{Ast, Expr, Form, FuncLit, Symbol, TypeDef},
    middle::{normalize, RewriteError},
    rstest::rstest,
    std::rc::Rc,
};

fn parse(src: &str) -> Expr {
    let ast = Ast::try_from(src).unwrap();
    let [form] = ast.forms.as_slice() else {
        panic!("expected a single form in {src:?}");
    };
    form.clone()
}

fn symbols(names: &[&str]) -> Vec<Symbol> {
    names.iter().copied().map(Symbol::new).collect()
}

fn func_of(expr: &Expr) -> FuncLit {
    match *expr.as_node().expect("a node").form() {
        Form::Func(ref func) => func.clone(),
        ref form => panic!("expected a function literal, got {form}"),
    }
}

fn type_def_of(expr: &Expr) -> TypeDef {
    match *expr.as_node().expect("a node").form() {
        Form::TypeDef(ref def) => def.clone(),
        ref form => panic!("expected a type definition, got {form}"),
    }
}

#[rstest]
fn recognizes_function_literals() {
    let func = func_of(&normalize(parse("(func (a b) (+ a b))")).unwrap());
    assert_eq!(func.params, symbols(&["a", "b"]));
    assert_eq!(func.body.len(), 1);
    assert_eq!(func.body[0].to_string(), "(+ a b)");
}

#[rstest]
fn function_body_may_be_empty() {
    let func = func_of(&normalize(parse("(func ())")).unwrap());
    assert!(func.params.is_empty());
    assert!(func.body.is_empty());
}

#[rstest]
fn nops_are_dropped_before_functions_are_recognized() {
    let func = func_of(&normalize(parse("(func () (nop))")).unwrap());
    assert!(func.body.is_empty());
}

#[rstest]
#[case::middle("(a (nop) b)", "(a b)")]
#[case::several("((nop 1) a (nop) (nop x))", "(a)")]
#[case::nop_itself("(nop)", "(nop)")]
fn eliminates_nops(#[case] src: &str, #[case] expected: &str) {
    assert_eq!(normalize(parse(src)).unwrap().to_string(), expected);
}

#[rstest]
#[case::no_params("(func)")]
#[case::symbol_params("(func x x)")]
#[case::literal_param("(func (a 1) a)")]
#[case::duplicate_param("(func (a a) a)")]
fn rejects_malformed_functions(#[case] src: &str) {
    let err = normalize(parse(src)).unwrap_err();
    assert!(matches!(err, RewriteError::Malformed { .. }), "{err}");
}

#[rstest]
fn desugars_type_definitions() {
    let src = "(def-type point (x y) (+ x y) (distance (func (other) (- other 1))))";
    let def = type_def_of(&normalize(parse(src)).unwrap());
    assert_eq!(def.name, Symbol::new("point"));
    assert_eq!(def.fields, symbols(&["x", "y"]));
    assert_eq!(def.predicate_name(), Symbol::new("point?"));

    let ctor = func_of(&Expr::Node(Rc::clone(&def.ctor)));
    assert_eq!(ctor.params, symbols(&["x", "y"]));
    assert_eq!(ctor.body.len(), 1);
    assert_eq!(ctor.body[0].to_string(), "(+ x y)");

    let [(name, method)] = def.methods.as_slice() else {
        panic!("expected one method, got {}", def.methods.len());
    };
    assert_eq!(*name, Symbol::new("distance"));
    let method = func_of(&Expr::Node(Rc::clone(method)));
    assert_eq!(method.params, symbols(&["this", "other"]));
    assert_eq!(method.body[0].to_string(), "(- other 1)");
}

#[rstest]
fn type_definition_without_methods() {
    let def = type_def_of(&normalize(parse("(def-type unit () 0)")).unwrap());
    assert!(def.fields.is_empty());
    assert!(def.methods.is_empty());
}

#[rstest]
fn nop_constructor_body_is_kept() {
    let def = type_def_of(&normalize(parse("(def-type point (x y) (nop))")).unwrap());
    assert_eq!(def.fields, symbols(&["x", "y"]));
    let ctor = func_of(&Expr::Node(Rc::clone(&def.ctor)));
    assert_eq!(ctor.body.len(), 1);
    assert_eq!(ctor.body[0].to_string(), "(nop)");
}

#[rstest]
#[case::method_named_like_type("(def-type point (x) x (point (func () 1)))", "point")]
#[case::method_named_like_predicate("(def-type point (x) x (point? (func () 1)))", "point?")]
#[case::repeated_method("(def-type point (x) x (m (func () 1)) (m (func () 2)))", "m")]
fn rejects_duplicate_names(#[case] src: &str, #[case] duplicate: &str) {
    match normalize(parse(src)).unwrap_err() {
        RewriteError::DuplicateName { ty, name } => {
            assert_eq!(ty, "point");
            assert_eq!(name, duplicate);
        }
        err => panic!("expected a duplicate name error, got {err}"),
    }
}

#[rstest]
#[case::too_short("(def-type point (x))")]
#[case::name_not_symbol("(def-type 1 (x) x)")]
#[case::field_not_symbol("(def-type point (x 1) x)")]
#[case::method_not_function("(def-type point (x) x (m 1))")]
#[case::method_not_pair("(def-type point (x) x (m (func () 1) extra))")]
#[case::method_declares_receiver("(def-type point (x) x (m (func (this) 1)))")]
#[case::duplicate_field("(def-type point (x x) x)")]
fn rejects_malformed_type_definitions(#[case] src: &str) {
    let err = normalize(parse(src)).unwrap_err();
    assert!(matches!(err, RewriteError::Malformed { .. }), "{err}");
}
