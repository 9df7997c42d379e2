//! Compiler-style diagnostics
//!
//! A diagnostic carries a severity, an optional code (`EL001`, `EM002`, ...),
//! labelled source spans, notes and help lines. `DiagnosticRenderer` prints
//! it with the offending source line underneath.

use crate::span::Span;
use std::fmt::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message attached to a source region
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
    /// Primary labels are underlined with `^`, secondary ones with `-`
    pub primary: bool,
}

/// `E` + category letter + three digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode {
    /// L = lexer, P = parser, M = match lowering, R = evaluation
    pub category: char,
    pub number: u16,
}

impl ErrorCode {
    pub const fn new(category: char, number: u16) -> Self {
        Self { category, number }
    }

    pub const UNEXPECTED_CHAR: Self = Self::new('L', 1);
    pub const UNTERMINATED_STRING: Self = Self::new('L', 2);
    pub const INVALID_NUMBER: Self = Self::new('L', 3);
    pub const INVALID_INDENT: Self = Self::new('L', 4);

    pub const UNEXPECTED_TOKEN: Self = Self::new('P', 1);
    pub const EXPECTED_EXPRESSION: Self = Self::new('P', 2);
    pub const EXPECTED_PATTERN: Self = Self::new('P', 3);
    pub const INVALID_TARGET: Self = Self::new('P', 4);

    pub const MATCH_STRUCTURE: Self = Self::new('M', 1);
    pub const UNSUPPORTED_PATTERN: Self = Self::new('M', 2);

    pub const RUNTIME: Self = Self::new('R', 1);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}{:03}", self.category, self.number)
    }
}

/// A complete diagnostic, built with the `with_*` methods
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub code: Option<ErrorCode>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Vec<String>,
}

impl Diagnostic {
    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_label(self, span: Span, message: impl Into<String>) -> Self {
        self.labelled(span, message.into(), true)
    }

    pub fn with_secondary_label(self, span: Span, message: impl Into<String>) -> Self {
        self.labelled(span, message.into(), false)
    }

    fn labelled(mut self, span: Span, message: String, primary: bool) -> Self {
        self.labels.push(Label {
            span,
            message,
            primary,
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.level.as_str())?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// One source file with its line index
#[derive(Debug)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));

        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Text of a 1-indexed line, without its newline
    pub fn get_line(&self, line: u32) -> Option<&str> {
        let index = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(index)?;
        let end = match self.line_starts.get(index + 1) {
            Some(next) => next - 1,
            None => self.source.len(),
        };
        self.source.get(start..end).map(|text| text.trim_end_matches('\r'))
    }
}

/// Source files known to the renderer, indexed by `Span::file_id`
#[derive(Debug, Default)]
pub struct SourceCache {
    files: Vec<SourceFile>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file and returns the id its spans should carry
    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> u32 {
        self.files.push(SourceFile::new(name, source));
        (self.files.len() - 1) as u32
    }

    pub fn get(&self, id: u32) -> Option<&SourceFile> {
        self.files.get(id as usize)
    }
}

/// ANSI escapes, all empty when colours are off
#[derive(Clone, Copy)]
struct Palette {
    error: &'static str,
    warning: &'static str,
    accent: &'static str,
    help: &'static str,
    bold: &'static str,
    reset: &'static str,
}

impl Palette {
    const COLORED: Palette = Palette {
        error: "\x1b[1;31m",
        warning: "\x1b[1;33m",
        accent: "\x1b[1;34m",
        help: "\x1b[1;32m",
        bold: "\x1b[1m",
        reset: "\x1b[0m",
    };

    const PLAIN: Palette = Palette {
        error: "",
        warning: "",
        accent: "",
        help: "",
        bold: "",
        reset: "",
    };

    fn level(&self, level: Level) -> &'static str {
        match level {
            Level::Error => self.error,
            Level::Warning => self.warning,
        }
    }
}

/// Renders diagnostics with source snippets
pub struct DiagnosticRenderer<'a> {
    cache: &'a SourceCache,
    palette: Palette,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(cache: &'a SourceCache) -> Self {
        Self {
            cache,
            palette: Palette::COLORED,
        }
    }

    pub fn without_colors(mut self) -> Self {
        self.palette = Palette::PLAIN;
        self
    }

    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_diagnostic(&mut out, diagnostic);
        out
    }

    fn write_diagnostic(&self, out: &mut String, diagnostic: &Diagnostic) -> fmt::Result {
        let p = self.palette;
        let level_color = p.level(diagnostic.level);

        write!(out, "{}{}", level_color, diagnostic.level)?;
        if let Some(code) = diagnostic.code {
            write!(out, "[{}]", code)?;
        }
        writeln!(out, "{}{}: {}{}", p.reset, p.bold, diagnostic.message, p.reset)?;

        for label in diagnostic.labels.iter().filter(|l| !l.span.is_synthetic()) {
            self.write_label(out, label, level_color)?;
        }

        for note in &diagnostic.notes {
            writeln!(out, "   = {}note{}: {}", p.bold, p.reset, note)?;
        }
        for help in &diagnostic.help {
            writeln!(out, "   = {}help{}: {}", p.help, p.reset, help)?;
        }
        Ok(())
    }

    fn write_label(&self, out: &mut String, label: &Label, level_color: &str) -> fmt::Result {
        let p = self.palette;
        let Some(file) = self.cache.get(label.span.file_id) else {
            return Ok(());
        };

        let start = label.span.start;
        writeln!(
            out,
            " {}-->{} {}:{}:{}",
            p.accent, p.reset, file.name, start.line, start.column
        )?;

        let Some(text) = file.get_line(start.line) else {
            return Ok(());
        };
        let gutter = " ".repeat(start.line.to_string().len());
        writeln!(out, " {} {}|{}", gutter, p.accent, p.reset)?;
        writeln!(out, " {}{}{} | {}", p.accent, start.line, p.reset, text)?;

        let indent = (start.column as usize).saturating_sub(1);
        let width = if label.span.end.line == start.line {
            label.span.end.column.saturating_sub(start.column) as usize
        } else {
            text.len().saturating_sub(indent)
        };
        let (marker, color) = if label.primary {
            ('^', level_color)
        } else {
            ('-', p.accent)
        };

        writeln!(
            out,
            " {} {}|{} {}{}{}{} {}",
            gutter,
            p.accent,
            p.reset,
            " ".repeat(indent),
            color,
            marker.to_string().repeat(width.max(1)),
            p.reset,
            label.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;

    fn cache_with(source: &str) -> (SourceCache, u32) {
        let mut cache = SourceCache::new();
        let id = cache.add("shapes.py", source);
        (cache, id)
    }

    #[test]
    fn test_diagnostic_rendering() {
        let (cache, file_id) = cache_with("match p:\n    case int(x, y):\n        pass\n");
        let span = Span::new(Position::new(2, 10, 18), Position::new(2, 19, 27), file_id);

        let diagnostic = Diagnostic::error("too many positional sub-patterns for `int`")
            .with_code(ErrorCode::MATCH_STRUCTURE)
            .with_label(span, "built-in types accept at most one")
            .with_help("match the value itself: `case int(x)`");

        let output = DiagnosticRenderer::new(&cache).without_colors().render(&diagnostic);

        assert!(output.starts_with("error[EM001]: too many positional"));
        assert!(output.contains("shapes.py:2:10"));
        assert!(output.contains(" 2 |     case int(x, y):"));
        assert!(output.contains("^^^^^^^^^ built-in types accept at most one"));
        assert!(output.contains("   = help: match the value itself"));
    }

    #[test]
    fn test_secondary_label_marker() {
        let (cache, file_id) = cache_with("case C(x=1, 2):\n");
        let keyword = Span::new(Position::new(1, 8, 7), Position::new(1, 11, 10), file_id);

        let diagnostic = Diagnostic::error("positional after keyword")
            .with_secondary_label(keyword, "keyword here");
        let output = DiagnosticRenderer::new(&cache).without_colors().render(&diagnostic);

        assert!(output.contains("       --- keyword here"));
    }

    #[test]
    fn test_synthetic_labels_are_skipped() {
        let cache = SourceCache::new();
        let diagnostic = Diagnostic::error("generated node").with_label(Span::default(), "here");

        let output = DiagnosticRenderer::new(&cache).without_colors().render(&diagnostic);

        assert_eq!(output, "error: generated node\n");
    }

    #[test]
    fn test_display_includes_code() {
        let diagnostic = Diagnostic::error("unsupported").with_code(ErrorCode::UNSUPPORTED_PATTERN);
        assert_eq!(diagnostic.to_string(), "error[EM002]: unsupported");
        assert_eq!(Diagnostic::warning("unused").to_string(), "warning: unused");
    }

    #[test]
    fn test_get_line_bounds() {
        let file = SourceFile::new("a.py", "x = 1\r\ny = 2");
        assert_eq!(file.get_line(1), Some("x = 1"));
        assert_eq!(file.get_line(2), Some("y = 2"));
        assert_eq!(file.get_line(0), None);
        assert_eq!(file.get_line(3), None);
    }
}
