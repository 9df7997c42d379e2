//! pun-error - Spans and diagnostics for the pun toolchain
//!
//! Every stage (lexer, parser, match lowering, evaluator) reports problems
//! as [`Diagnostic`]s pointing into the original source.
//!
//! # Example
//!
//! ```rust
//! use pun_error::{Diagnostic, ErrorCode, SourceCache, DiagnosticRenderer};
//! use pun_error::span::{Span, Position};
//!
//! let mut cache = SourceCache::new();
//! let file_id = cache.add("example.py", "match x:\n    case [a, b]:\n        pass\n");
//!
//! let span = Span::new(
//!     Position::new(2, 10, 18),
//!     Position::new(2, 16, 24),
//!     file_id,
//! );
//!
//! let diagnostic = Diagnostic::error("sequence patterns cannot be lowered")
//!     .with_code(ErrorCode::UNSUPPORTED_PATTERN)
//!     .with_label(span, "unsupported pattern");
//!
//! let renderer = DiagnosticRenderer::new(&cache);
//! println!("{}", renderer.render(&diagnostic));
//! ```

pub mod diagnostic;
pub mod span;

pub use diagnostic::{
    Diagnostic, DiagnosticRenderer, ErrorCode, Label, Level, SourceCache, SourceFile,
};
pub use span::{Position, Span, Spanned};

/// Collection of diagnostics accumulated by one stage
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.level == Level::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Renders all diagnostics
    pub fn render(&self, cache: &SourceCache) -> String {
        let renderer = DiagnosticRenderer::new(cache);
        self.render_with(&renderer)
    }

    pub fn render_with(&self, renderer: &DiagnosticRenderer<'_>) -> String {
        self.items
            .iter()
            .map(|d| renderer.render(d))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            items: vec![diagnostic],
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_errors_ignores_warnings() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning("unused capture"));
        assert!(!diagnostics.has_errors());

        diagnostics.extend(Diagnostic::error("bad pattern").into());
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.len(), 2);
    }
}
