use derive_more::Display;

/// Failures of the rewrite pass. Names and forms are stored as text so the
/// error can leave the thread that built the tree.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum RewriteError {
    #[display("malformed `{form}`: {reason}")]
    Malformed { form: String, reason: String },
    #[display("`{name}` is defined more than once in type `{ty}`")]
    DuplicateName { ty: String, name: String },
    #[display("`{operator}` expects {expected} operand(s), found {found}")]
    Arity {
        operator: String,
        expected: &'static str,
        found: usize,
    },
}

impl std::error::Error for RewriteError {}

impl RewriteError {
    pub(crate) fn malformed(form: &impl ToString, reason: impl Into<String>) -> Self {
        RewriteError::Malformed {
            form: form.to_string(),
            reason: reason.into(),
        }
    }
}
