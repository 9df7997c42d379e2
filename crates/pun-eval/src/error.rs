//! Runtime errors.

use pun_error::{Diagnostic, ErrorCode, Span};

/// A runtime error. Evaluation stops at the first one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("name `{0}` is not defined")]
    NameError(String),

    #[error("`{ty}` object has no attribute `{attr}`")]
    AttributeError { ty: String, attr: String },

    #[error("{0}")]
    TypeError(String),

    #[error("division by zero")]
    ZeroDivision,

    #[error("index {index} out of range (length is {len})")]
    IndexError { index: i64, len: usize },

    #[error("integer overflow")]
    Overflow,

    #[error("match statement was not lowered")]
    UnloweredMatch { span: Span },

    #[error("{0} are not supported by the evaluator")]
    Unsupported(&'static str),

    #[error("`{0}` outside of a {1}")]
    Misplaced(&'static str, &'static str),
}

impl EvalError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError(message.into())
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.to_string()).with_code(ErrorCode::RUNTIME);
        match self {
            Self::UnloweredMatch { span } => diagnostic
                .with_label(*span, "still contains pattern syntax")
                .with_note("run the module through the lowering pass first"),
            _ => diagnostic,
        }
    }
}
