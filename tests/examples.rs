use {
    backend::Assembly,
    frontend::ast::Ast,
    middle::Normalized,
    rstest::rstest,
    rstest_reuse::{apply, template},
    std::path::PathBuf,
};

#[template]
#[rstest]
fn examples(#[files("example_programs/*.lisp")] path: PathBuf) {}

#[apply(examples)]
fn compile_to_assembly(path: PathBuf) {
    let example = ExampleProgram::from(path);
    let assembly = Assembly::try_from(&example.program).unwrap();
    assert_eq!(assembly.to_string(), example.expected_assembly);
}

#[apply(examples)]
fn normalizing_twice_changes_nothing(path: PathBuf) {
    let example = ExampleProgram::from(path);
    for form in &example.program.0.forms {
        let again = middle::normalize(form.clone()).unwrap();
        assert_eq!(again.to_string(), form.to_string());
    }
}

struct ExampleProgram {
    program: Normalized,
    expected_assembly: String,
}

impl From<PathBuf> for ExampleProgram {
    fn from(mut path: PathBuf) -> Self {
        let code = std::fs::read_to_string(&path).unwrap();
        let ast = Ast::try_from(&*code).unwrap();
        let program = Normalized::try_from(ast).unwrap();

        path.set_extension("asm");
        let expected_assembly = std::fs::read_to_string(&path).unwrap_or_else(|e| {
            panic!("failed to read expected assembly file at path {path:?}: {e}")
        });

        ExampleProgram {
            program,
            expected_assembly,
        }
    }
}
