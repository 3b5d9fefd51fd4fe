use {
    crate::registers::AllocError,
    derive_more::Display,
    middle::op::Operator,
    std::io,
};

#[derive(Debug, Display)]
pub enum CodegenError {
    #[display("unbound symbol `{_0}`")]
    Unbound(String),
    #[display("cannot generate code for `{_0}`")]
    Unsupported(String),
    #[display("`{operator}` expects {expected} operand(s), found {found}")]
    Arity {
        operator: Operator,
        expected: &'static str,
        found: usize,
    },
    #[display("{_0}")]
    Alloc(AllocError),
    #[display("failed to write assembly: {_0}")]
    Io(io::Error),
}

impl std::error::Error for CodegenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodegenError::Alloc(err) => Some(err),
            CodegenError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AllocError> for CodegenError {
    fn from(err: AllocError) -> Self {
        CodegenError::Alloc(err)
    }
}

impl From<io::Error> for CodegenError {
    fn from(err: io::Error) -> Self {
        CodegenError::Io(err)
    }
}
