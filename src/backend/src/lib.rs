pub mod codegen;
pub mod emit;
pub mod env;
mod error;
pub mod registers;

pub use {codegen::Generator, error::CodegenError, registers::AllocError};

use {middle::Normalized, std::fmt};

/// Assembly text for a whole program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly(String);

impl TryFrom<&Normalized> for Assembly {
    type Error = CodegenError;

    fn try_from(program: &Normalized) -> Result<Self, Self::Error> {
        let mut generator = Generator::new(Vec::new());
        generator.generate_program(&program.0.forms)?;
        let text = String::from_utf8_lossy(&generator.into_inner()).into_owned();
        Ok(Assembly(text))
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
