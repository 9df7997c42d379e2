//! Errors raised while lowering a match statement

use pun_error::{Diagnostic, ErrorCode, Span};
use thiserror::Error;

/// Failure of the lowering pass. The first error aborts the pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LowerError {
    /// The input breaks an invariant the lowering relies on
    #[error("{message}")]
    Structural { message: String, span: Span },

    /// A pattern form with no lowering
    #[error("{kind} patterns cannot be lowered")]
    UnsupportedPattern { kind: &'static str, span: Span },
}

impl LowerError {
    pub fn structural(message: impl Into<String>, span: Span) -> Self {
        Self::Structural {
            message: message.into(),
            span,
        }
    }

    pub fn unsupported(kind: &'static str, span: Span) -> Self {
        Self::UnsupportedPattern { kind, span }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Structural { span, .. } | Self::UnsupportedPattern { span, .. } => *span,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Structural { .. } => ErrorCode::MATCH_STRUCTURE,
            Self::UnsupportedPattern { .. } => ErrorCode::UNSUPPORTED_PATTERN,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.to_string()).with_code(self.code());

        match self {
            Self::Structural { span, .. } => diagnostic.with_label(*span, "cannot lower this"),
            Self::UnsupportedPattern { span, .. } => diagnostic
                .with_label(*span, "unsupported pattern")
                .with_help(
                    "only wildcard, capture, value, singleton, as, or and class patterns are supported",
                ),
        }
    }
}

impl From<LowerError> for Diagnostic {
    fn from(error: LowerError) -> Self {
        error.to_diagnostic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_message_and_code() {
        let error = LowerError::unsupported("sequence", Span::default());
        assert_eq!(error.to_string(), "sequence patterns cannot be lowered");

        let diagnostic = error.to_diagnostic();
        assert_eq!(diagnostic.code, Some(ErrorCode::UNSUPPORTED_PATTERN));
        assert_eq!(diagnostic.help.len(), 1);
    }

    #[test]
    fn test_structural_keeps_span() {
        let span = Span::new(
            pun_error::Position::new(3, 5, 20),
            pun_error::Position::new(3, 15, 30),
            0,
        );
        let error = LowerError::structural("int() accepts at most one sub-pattern", span);
        assert_eq!(error.span(), span);
        assert_eq!(error.code(), ErrorCode::MATCH_STRUCTURE);
    }
}
