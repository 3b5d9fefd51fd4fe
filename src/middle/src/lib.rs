mod desugar;
mod error;
mod fold;
pub mod op;
mod rewrite;

pub use {error::RewriteError, rewrite::normalize};

use frontend::ast::Ast;

impl TryFrom<Ast> for Normalized {
    type Error = RewriteError;

    fn try_from(ast: Ast) -> Result<Self, Self::Error> {
        let forms = ast
            .forms
            .into_iter()
            .map(normalize)
            .collect::<Result<_, _>>()?;
        Ok(Normalized(Ast { forms }))
    }
}

/// A program every top-level form of which has been through [`normalize`].
#[derive(Debug, Clone)]
pub struct Normalized(pub Ast);
