use {
    backend::{
        emit::Label,
        env::Value,
        registers::{Register, RegisterMask, RETURN_REGISTER},
        CodegenError, Generator,
    },
    frontend::ast::{Ast, Expr, Symbol},
    middle::normalize,
    rstest::rstest,
};

fn parse(src: &str) -> Vec<Expr> {
    Ast::try_from(src)
        .unwrap()
        .forms
        .into_iter()
        .map(|form| normalize(form).unwrap())
        .collect()
}

fn lines(generator: Generator<Vec<u8>>) -> Vec<String> {
    String::from_utf8(generator.into_inner())
        .unwrap()
        .lines()
        .map(|line| line.trim().to_string())
        .collect()
}

fn compile(src: &str) -> Result<Vec<String>, CodegenError> {
    let mut generator = Generator::new(Vec::new());
    generator.generate_program(&parse(src))?;
    Ok(lines(generator))
}

#[rstest]
fn square_uses_an_argument_and_a_temporary() {
    let mut generator = Generator::new(Vec::new());
    let [form] = parse("(define square (func (n) (* n n)))")
        .try_into()
        .unwrap_or_else(|forms: Vec<Expr>| panic!("expected one form, got {}", forms.len()));
    let value = generator.generate(&form).unwrap();
    assert_eq!(value, Value::Label(Label::export("square")));
    assert_eq!(
        generator.env().global(&Symbol::new("square")),
        Some(&Label::export("square"))
    );
    assert_eq!(generator.registers().live(), RegisterMask::RESERVED);
    assert_eq!(
        lines(generator),
        [".square:", "mov r32 r4", "fmul r32 r4", "return r32", "// end of function .square"]
    );
}

#[rstest]
#[case::number("2.5", "load r32 2.5")]
#[case::integer("7", "load r32 7.0")]
#[case::boolean("true", "load r32 1.0")]
#[case::string(r#""hi""#, r#"load r32 "hi""#)]
fn literals_load_into_a_temporary(#[case] src: &str, #[case] expected: &str) {
    let mut generator = Generator::new(Vec::new());
    let [form] = parse(src).try_into().unwrap_or_else(|_: Vec<Expr>| panic!());
    assert_eq!(
        generator.generate(&form).unwrap(),
        Value::Register(Register(32))
    );
    assert_eq!(lines(generator), [expected]);
}

#[rstest]
#[case::negate("(func (x) (- x))", "fneg r32")]
#[case::not("(func (x) (not x))", "lognot r32")]
#[case::bitwise_not("(func (x) (bitwise-not x))", "not r32")]
fn unary_operators(#[case] src: &str, #[case] instruction: &str) {
    let output = compile(src).unwrap();
    assert!(output.contains(&"mov r32 r4".to_string()), "{output:#?}");
    assert!(output.contains(&instruction.to_string()), "{output:#?}");
}

#[rstest]
#[case::immediate("(func (x) (remainder x 3))", "fmodi r32 3.0")]
#[case::register("(func (x y) (bitwise-shift x y))", "fshift r32 r5")]
#[case::comparison("(func (x y) (<= x y))", "flte r32 r5")]
#[case::equality("(func (x) (eq x 0))", "feqi r32 0.0")]
fn binary_operators_accumulate_into_the_output(#[case] src: &str, #[case] instruction: &str) {
    let output = compile(src).unwrap();
    assert!(output.contains(&instruction.to_string()), "{output:#?}");
}

#[rstest]
fn anonymous_functions_are_jumped_over() {
    let output = compile("(func () 1)").unwrap();
    assert_eq!(
        output,
        [
            "// (func () 1)",
            "jmpl @_skip_1__",
            "@_anonfunc_0__:",
            "load r32 1.0",
            "return r32",
            "// end of function @_anonfunc_0__",
            "@_skip_1__:",
        ]
    );
}

#[rstest]
fn empty_bodies_return_the_return_register() {
    let output = compile("(define noop (func ()))").unwrap();
    assert!(output.contains(&format!("return {RETURN_REGISTER}")), "{output:#?}");
}

#[rstest]
fn recursion_resolves_through_the_global_table() {
    let output = compile("(define loop (func (n) (loop (- n 1))))").unwrap();
    assert!(output.contains(&"call .loop".to_string()), "{output:#?}");
    assert!(output.contains(&"push [r4]".to_string()), "{output:#?}");
    assert!(output.contains(&"pop [r4]".to_string()), "{output:#?}");
}

#[rstest]
fn function_labels_are_truthy() {
    let output = compile("(define f (func ())) (define g (func () (or f 0)))").unwrap();
    assert!(output.contains(&"load r32 .f".to_string()), "{output:#?}");
    assert!(output.contains(&"jmpl @_success_1__".to_string()), "{output:#?}");
}

#[rstest]
fn type_definitions_export_constructor_and_methods() {
    let mut generator = Generator::new(Vec::new());
    let forms = parse("(def-type pair (a b) (+ a b) (first (func () this)))");
    generator.generate_program(&forms).unwrap();
    let env = generator.env();
    assert_eq!(env.global(&Symbol::new("pair")), Some(&Label::export("pair")));
    assert_eq!(
        env.global(&Symbol::new("pair.first")),
        Some(&Label::export("pair.first"))
    );
    let output = lines(generator);
    assert!(output.contains(&".pair.first:".to_string()), "{output:#?}");
    assert!(output.contains(&"return r4".to_string()), "{output:#?}");
}

#[rstest]
fn nop_generates_nothing() {
    let mut generator = Generator::new(Vec::new());
    let value = generator.generate(&parse("(nop 1 2)")[0]).unwrap();
    assert_eq!(value, Value::Register(RETURN_REGISTER));
    assert!(lines(generator).is_empty());
}

#[rstest]
fn locals_do_not_leak_into_nested_functions() {
    let err = compile("(func (x) (func () x))").unwrap_err();
    assert!(matches!(err, CodegenError::Unbound(ref name) if name == "x"), "{err}");
}

#[rstest]
#[case::quoted("'(1 2)")]
#[case::define_value("(define x 1)")]
#[case::literal_head("(1 2)")]
#[case::empty_list("()")]
fn unsupported_forms(#[case] src: &str) {
    let err = compile(src).unwrap_err();
    assert!(matches!(err, CodegenError::Unsupported(_)), "{err}");
}

#[rstest]
fn too_many_call_arguments() {
    let err = compile("(define f (func ())) (f 1 2 3 4 5 6 7 8 9)").unwrap_err();
    assert!(matches!(err, CodegenError::Alloc(_)), "{err}");
}

#[rstest]
fn comparisons_need_two_operands() {
    let mut generator = Generator::new(Vec::new());
    let form = Expr::list(vec![Expr::symbol("<"), Expr::symbol("x")]);
    let err = generator.generate(&form).unwrap_err();
    assert!(matches!(err, CodegenError::Arity { found: 1, .. }), "{err}");
}

#[rstest]
fn failed_generation_releases_registers() {
    let mut generator = Generator::new(Vec::new());
    let form = Expr::list(vec![Expr::symbol("+"), Expr::from(1.0), Expr::symbol("nowhere")]);
    assert!(generator.generate(&form).is_err());
    assert_eq!(generator.registers().live(), RegisterMask::RESERVED);
    assert_eq!(generator.registers().depth(), 0);
}

#[rstest]
fn nop_constructor_returns_the_return_register() {
    let output = compile("(def-type marker (x) (nop))").unwrap();
    assert!(output.contains(&".marker:".to_string()), "{output:#?}");
    assert!(output.contains(&format!("return {RETURN_REGISTER}")), "{output:#?}");
}
