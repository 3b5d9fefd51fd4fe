use {
    backend::{
        emit::Label,
        env::{Environment, Value},
        registers::Register,
    },
    frontend::ast::Symbol,
    rstest::rstest,
};

fn sym(name: &str) -> Symbol {
    Symbol::new(name)
}

#[rstest]
fn inner_scopes_see_and_shadow_outer_bindings() {
    let mut env = Environment::new();
    env.bind(sym("x"), Register(32));
    env.enter();
    assert_eq!(env.lookup(&sym("x"), false), Some(Value::Register(Register(32))));
    env.bind(sym("x"), Register(33));
    assert_eq!(env.lookup(&sym("x"), false), Some(Value::Register(Register(33))));
    env.leave();
    assert_eq!(env.lookup(&sym("x"), false), Some(Value::Register(Register(32))));
}

#[rstest]
fn boundaries_hide_enclosing_locals() {
    let mut env = Environment::new();
    env.bind(sym("outer"), Register(4));
    env.enter_boundary();
    env.bind(sym("inner"), Register(4));
    assert_eq!(env.lookup(&sym("outer"), false), None);
    assert_eq!(
        env.lookup(&sym("outer"), true),
        Some(Value::Register(Register(4)))
    );
    assert!(env.lookup(&sym("inner"), false).is_some());
}

#[rstest]
fn globals_are_visible_through_boundaries() {
    let mut env = Environment::new();
    assert!(env.global(&sym("square")).is_none());
    env.bind_global(sym("square"), Label::export("square"));
    env.enter_boundary();
    env.enter_boundary();
    assert_eq!(
        env.lookup(&sym("square"), false),
        Some(Value::Label(Label::export("square")))
    );
}

#[rstest]
fn locals_shadow_globals() {
    let mut env = Environment::new();
    env.bind_global(sym("f"), Label::export("f"));
    env.enter_boundary();
    env.bind(sym("f"), Register(4));
    assert_eq!(env.lookup(&sym("f"), false), Some(Value::Register(Register(4))));
}

#[rstest]
fn unknown_symbols_are_unbound() {
    let env = Environment::new();
    assert_eq!(env.lookup(&sym("missing"), true), None);
}

#[rstest]
fn the_root_scope_is_never_left() {
    let mut env = Environment::new();
    env.bind(sym("x"), Register(32));
    env.leave();
    env.leave();
    assert_eq!(env.depth(), 1);
    assert!(env.lookup(&sym("x"), false).is_some());
}

#[rstest]
#[case::plain("square", ".square")]
#[case::punctuation("empty?", ".empty_quest_")]
#[case::dashes("sum-of-squares", ".sum_dash_of_dash_squares")]
#[case::method("point.norm", ".point.norm")]
fn exported_labels_are_slugged(#[case] name: &str, #[case] expected: &str) {
    assert_eq!(Label::export(name).to_string(), expected);
}
