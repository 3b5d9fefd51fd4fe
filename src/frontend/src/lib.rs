pub mod ast;
mod macros;
mod reader;

impl TryFrom<&str> for ast::Ast {
    type Error = anyhow::Error;

    fn try_from(src: &str) -> Result<Self, Self::Error> {
        use chumsky::Parser;

        match reader::ast_parser().parse(src).into_result() {
            Ok(ast) => Ok(ast),
            Err(errs) => anyhow::bail!(errs
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")),
        }
    }
}
