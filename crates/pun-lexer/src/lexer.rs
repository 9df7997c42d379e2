//! Lexer for the pun Python subset
//!
//! Produces `Indent`/`Dedent`/`Newline` layout tokens the way the host
//! grammar does: blank and comment-only lines are invisible, newlines inside
//! brackets are joined, and one line start can close several blocks.

use crate::token::{Token, TokenKind};
use pun_error::{
    span::{Position, Span},
    Diagnostic, Diagnostics, ErrorCode,
};
use unicode_xid::UnicodeXID;

pub struct Lexer {
    chars: Vec<char>,
    /// Index into `chars`
    pos: usize,
    /// Current line (1-indexed)
    line: u32,
    /// Current column (1-indexed)
    column: u32,
    /// Byte offset
    offset: usize,
    file_id: u32,
    /// Stack of indentation widths, bottom is always 0
    indent_stack: Vec<u32>,
    /// DEDENT tokens still owed from the last indentation change
    pending_dedents: u32,
    at_line_start: bool,
    /// Open `(`, `[` and `{` count; layout is suspended while non-zero
    bracket_depth: u32,
    /// A token was emitted on the current logical line
    line_has_tokens: bool,
    diagnostics: Diagnostics,
}

impl Lexer {
    pub fn new(source: &str, file_id: u32) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            offset: 0,
            file_id,
            indent_stack: vec![0],
            pending_dedents: 0,
            at_line_start: true,
            bracket_depth: 0,
            line_has_tokens: false,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        self.offset += ch.len_utf8();

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
            self.at_line_start = true;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Advances and appends the consumed character to `buf`
    fn bump_into(&mut self, buf: &mut String) {
        if let Some(ch) = self.advance() {
            buf.push(ch);
        }
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    fn make_span(&self, start: Position) -> Span {
        Span::new(start, self.current_position(), self.file_id)
    }

    /// Skips spaces, explicit `\` continuations and, inside brackets, newlines
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\r' | '\x0c' => {
                    self.advance();
                }
                '\\' if self.peek_at(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                    self.at_line_start = false;
                }
                '\n' if self.bracket_depth > 0 => {
                    self.advance();
                    self.at_line_start = false;
                }
                '#' if self.bracket_depth > 0 => self.skip_comment(),
                _ => break,
            }
        }
    }

    /// Skips comments (# until end of line)
    fn skip_comment(&mut self) {
        if self.peek() == Some('#') {
            while let Some(ch) = self.peek() {
                if ch == '\n' {
                    break;
                }
                self.advance();
            }
        }
    }

    /// Counts indentation columns at the beginning of a line
    fn count_indent(&mut self) -> u32 {
        let mut width = 0u32;

        while let Some(ch) = self.peek() {
            match ch {
                ' ' => width += 1,
                // Tabs advance to the next multiple of 8
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            self.advance();
        }

        width
    }

    /// Consumes the indentation of the next non-blank line and returns the
    /// first layout token it produces, queueing further DEDENTs
    fn handle_indentation(&mut self) -> Option<Token> {
        loop {
            let start = self.current_position();
            let indent = self.count_indent();

            match self.peek() {
                Some('\n') => {
                    self.advance();
                }
                Some('\r') => {
                    self.advance();
                }
                Some('#') => self.skip_comment(),
                Some('\\') if self.peek_at(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                None => {
                    self.at_line_start = false;
                    return None;
                }
                Some(_) => {
                    self.at_line_start = false;
                    return self.apply_indent(indent, start);
                }
            }
        }
    }

    fn apply_indent(&mut self, indent: u32, start: Position) -> Option<Token> {
        let current = self.indent_stack.last().copied().unwrap_or(0);

        if indent > current {
            self.indent_stack.push(indent);
            return Some(Token::new(TokenKind::Indent, self.make_span(start)));
        }

        if indent == current {
            return None;
        }

        let mut closed = 0u32;
        while self.indent_stack.last().is_some_and(|&level| level > indent) {
            self.indent_stack.pop();
            closed += 1;
        }

        if self.indent_stack.last().copied().unwrap_or(0) != indent {
            self.diagnostics.push(
                Diagnostic::error("unindent does not match any outer indentation level")
                    .with_code(ErrorCode::INVALID_INDENT)
                    .with_label(self.make_span(start), "inconsistent indentation")
                    .with_help("use the same indentation for every line of a block"),
            );
        }

        self.pending_dedents = closed.saturating_sub(1);
        Some(Token::new(TokenKind::Dedent, self.make_span(start)))
    }

    fn read_digits(&mut self, buf: &mut String, accept: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if accept(ch) {
                buf.push(ch);
                self.advance();
            } else if ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.current_position();
        let mut num_str = String::new();

        if self.peek() == Some('0') {
            let radix = match self.peek_at(1) {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };

            if let Some(radix) = radix {
                self.advance();
                self.advance();
                self.read_digits(&mut num_str, |c| c.is_digit(radix));
                let span = self.make_span(start);
                return match i64::from_str_radix(&num_str, radix) {
                    Ok(value) => Token::new(TokenKind::IntLit(value), span),
                    Err(_) => self.invalid_number(span, "integer literal out of range or empty"),
                };
            }
        }

        let mut is_float = false;
        self.read_digits(&mut num_str, |c| c.is_ascii_digit());

        if self.peek() == Some('.')
            && (!num_str.is_empty() || self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
        {
            is_float = true;
            self.bump_into(&mut num_str);
            self.read_digits(&mut num_str, |c| c.is_ascii_digit());
        }

        if let Some('e' | 'E') = self.peek() {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.bump_into(&mut num_str);
                if signed {
                    self.bump_into(&mut num_str);
                }
                self.read_digits(&mut num_str, |c| c.is_ascii_digit());
            }
        }

        let span = self.make_span(start);

        if is_float {
            match num_str.parse::<f64>() {
                Ok(value) => Token::new(TokenKind::FloatLit(value), span),
                Err(_) => self.invalid_number(span, "could not convert to float"),
            }
        } else {
            match num_str.parse::<i64>() {
                Ok(value) => Token::new(TokenKind::IntLit(value), span),
                Err(_) => self.invalid_number(span, "integer literal out of range"),
            }
        }
    }

    fn invalid_number(&mut self, span: Span, label: &str) -> Token {
        self.diagnostics.push(
            Diagnostic::error("invalid number literal")
                .with_code(ErrorCode::INVALID_NUMBER)
                .with_label(span, label),
        );
        Token::new(TokenKind::Error("invalid number".into()), span)
    }

    /// Reads a string literal; `start` is where its prefix (if any) began
    fn read_string(&mut self, start: Position, raw: bool) -> Token {
        let Some(quote) = self.advance() else {
            return Token::new(TokenKind::Error("expected string".into()), self.make_span(start));
        };

        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }

        let mut value = String::new();

        loop {
            match self.peek() {
                None => return self.unterminated(start, value, quote),
                Some('\n') if !triple => return self.unterminated(start, value, quote),
                Some(ch) if ch == quote => {
                    if !triple {
                        self.advance();
                        break;
                    }
                    if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                        self.advance();
                        self.advance();
                        self.advance();
                        break;
                    }
                    value.push(ch);
                    self.advance();
                }
                Some('\\') if raw => {
                    self.advance();
                    value.push('\\');
                    if let Some(next) = self.advance() {
                        value.push(next);
                    }
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('0') => value.push('\0'),
                        Some('\\') => value.push('\\'),
                        Some('\'') => value.push('\''),
                        Some('"') => value.push('"'),
                        // Escaped newline joins lines
                        Some('\n') => {}
                        Some(other) => {
                            value.push('\\');
                            value.push(other);
                        }
                        None => return self.unterminated(start, value, quote),
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        // A triple-quoted string may have crossed newlines; we are still mid-line
        self.at_line_start = false;
        Token::new(TokenKind::StringLit(value), self.make_span(start))
    }

    fn unterminated(&mut self, start: Position, value: String, quote: char) -> Token {
        let span = self.make_span(start);
        self.at_line_start = false;
        self.diagnostics.push(
            Diagnostic::error("unterminated string")
                .with_code(ErrorCode::UNTERMINATED_STRING)
                .with_label(span, "string starts here but was not closed")
                .with_help(format!("add {} at the end of the string", quote)),
        );
        Token::new(TokenKind::StringLit(value), span)
    }

    /// Reads an identifier, keyword or prefixed string (`r"..."`)
    fn read_identifier(&mut self) -> Token {
        let start = self.current_position();
        let mut ident = String::new();

        while let Some(ch) = self.peek() {
            if ch.is_xid_continue() {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if matches!(self.peek(), Some('"' | '\'')) {
            let prefix = ident.to_ascii_lowercase();
            match prefix.as_str() {
                "r" => return self.read_string(start, true),
                "u" => return self.read_string(start, false),
                "b" | "rb" | "br" | "f" | "rf" | "fr" => {
                    let token = self.read_string(start, prefix.contains('r'));
                    self.diagnostics.push(
                        Diagnostic::error(format!("`{}` string literals are not supported", ident))
                            .with_code(ErrorCode::UNEXPECTED_CHAR)
                            .with_label(token.span, "unsupported string prefix"),
                    );
                    return token;
                }
                _ => {}
            }
        }

        let span = self.make_span(start);
        let kind = TokenKind::keyword_from_str(&ident).unwrap_or(TokenKind::Ident(ident));

        Token::new(kind, span)
    }

    /// Consumes `next` if it follows, yielding `long`, otherwise `short`
    fn either(&mut self, next: char, long: TokenKind, short: TokenKind) -> TokenKind {
        if self.peek() == Some(next) {
            self.advance();
            long
        } else {
            short
        }
    }

    pub fn next_token(&mut self) -> Token {
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            let span = Span::point(self.current_position(), self.file_id);
            return Token::new(TokenKind::Dedent, span);
        }

        if self.at_line_start && self.bracket_depth == 0 {
            if let Some(token) = self.handle_indentation() {
                return token;
            }
        }

        self.skip_whitespace();
        self.skip_comment();

        let start = self.current_position();

        let Some(ch) = self.peek() else {
            if self.line_has_tokens {
                self.line_has_tokens = false;
                return Token::new(TokenKind::Newline, self.make_span(start));
            }
            if self.indent_stack.len() > 1 {
                self.indent_stack.pop();
                return Token::new(TokenKind::Dedent, self.make_span(start));
            }
            return Token::new(TokenKind::Eof, self.make_span(start));
        };

        if ch == '\n' {
            self.advance();
            if self.line_has_tokens {
                self.line_has_tokens = false;
                return Token::new(TokenKind::Newline, self.make_span(start));
            }
            return self.next_token();
        }

        self.line_has_tokens = true;

        if ch.is_ascii_digit() || ch == '.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            return self.read_number();
        }

        if ch == '"' || ch == '\'' {
            return self.read_string(start, false);
        }

        if ch.is_xid_start() || ch == '_' {
            return self.read_identifier();
        }

        self.advance();
        let kind = match ch {
            '+' => self.either('=', TokenKind::PlusEq, TokenKind::Plus),
            '-' => match self.peek() {
                Some('>') => {
                    self.advance();
                    TokenKind::Arrow
                }
                _ => self.either('=', TokenKind::MinusEq, TokenKind::Minus),
            },
            '*' => match self.peek() {
                Some('*') => {
                    self.advance();
                    TokenKind::DoubleStar
                }
                _ => self.either('=', TokenKind::StarEq, TokenKind::Star),
            },
            '/' => match self.peek() {
                Some('/') => {
                    self.advance();
                    TokenKind::DoubleSlash
                }
                _ => self.either('=', TokenKind::SlashEq, TokenKind::Slash),
            },
            '%' => TokenKind::Percent,
            '|' => TokenKind::Pipe,
            '=' => self.either('=', TokenKind::EqEq, TokenKind::Eq),
            '<' => self.either('=', TokenKind::Le, TokenKind::Lt),
            '>' => self.either('=', TokenKind::Ge, TokenKind::Gt),
            ':' => self.either('=', TokenKind::ColonEq, TokenKind::Colon),
            '!' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::Ne
            }
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '(' | '[' | '{' => {
                self.bracket_depth += 1;
                match ch {
                    '(' => TokenKind::LParen,
                    '[' => TokenKind::LBracket,
                    _ => TokenKind::LBrace,
                }
            }
            ')' | ']' | '}' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                match ch {
                    ')' => TokenKind::RParen,
                    ']' => TokenKind::RBracket,
                    _ => TokenKind::RBrace,
                }
            }
            _ => {
                let span = self.make_span(start);
                self.diagnostics.push(
                    Diagnostic::error(format!("unexpected character: '{}'", ch))
                        .with_code(ErrorCode::UNEXPECTED_CHAR)
                        .with_label(span, "unrecognized character"),
                );
                TokenKind::Error(format!("unexpected character: {}", ch))
            }
        };

        Token::new(kind, self.make_span(start))
    }

    /// Tokenizes the entire source, always ending with `Eof`
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        tokens
    }
}

/// Tokenizes source code and returns the tokens
pub fn tokenize(source: &str, file_id: u32) -> (Vec<Token>, Diagnostics) {
    let mut lexer = Lexer::new(source, file_id);
    let tokens = lexer.tokenize();
    (tokens, lexer.take_diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use TokenKind::*;

    fn lex(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source, 0);
        lexer
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !matches!(k, Newline | Eof))
            .collect()
    }

    fn lex_all(source: &str) -> Vec<TokenKind> {
        Lexer::new(source, 0).tokenize().into_iter().map(|t| t.kind).collect()
    }

    fn ident(name: &str) -> TokenKind {
        Ident(name.into())
    }

    #[test]
    fn test_soft_keywords_stay_identifiers() {
        assert_eq!(
            lex("match x case _"),
            vec![ident("match"), ident("x"), ident("case"), ident("_")]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            lex("if elif else is not and or None True False"),
            vec![If, Elif, Else, Is, Not, And, Or, None, True, False]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex("42 3.14 0xFF 0b1010 0o17 1_000 2e3 .5"),
            vec![
                IntLit(42),
                FloatLit(3.14),
                IntLit(255),
                IntLit(10),
                IntLit(15),
                IntLit(1000),
                FloatLit(2000.0),
                FloatLit(0.5),
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            lex(r#""hello" 'it\'s' r"\d" "a\n""#),
            vec![
                StringLit("hello".into()),
                StringLit("it's".into()),
                StringLit("\\d".into()),
                StringLit("a\n".into()),
            ]
        );
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        let tokens = lex_all("x = \"\"\"one\ntwo\"\"\"\ny");
        assert_eq!(
            tokens,
            vec![
                ident("x"),
                Eq,
                StringLit("one\ntwo".into()),
                Newline,
                ident("y"),
                Newline,
                Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            lex(":= | == != <= >= // ** -> += :"),
            vec![ColonEq, Pipe, EqEq, Ne, Le, Ge, DoubleSlash, DoubleStar, Arrow, PlusEq, Colon]
        );
    }

    #[test]
    fn test_indentation() {
        let tokens = lex_all("if x:\n    y\nz\n");
        assert_eq!(
            tokens,
            vec![
                If,
                ident("x"),
                Colon,
                Newline,
                Indent,
                ident("y"),
                Newline,
                Dedent,
                ident("z"),
                Newline,
                Eof,
            ]
        );
    }

    #[test]
    fn test_multiple_dedents_at_one_line_start() {
        let source = "match p:\n    case 1:\n        a\nb\n";
        let tokens = lex_all(source);
        let dedents = tokens.iter().filter(|k| **k == Dedent).count();
        assert_eq!(dedents, 2);
        assert_eq!(&tokens[tokens.len() - 5..], &[Dedent, Dedent, ident("b"), Newline, Eof]);
    }

    #[test]
    fn test_unclosed_blocks_closed_at_eof() {
        let tokens = lex_all("def f():\n    if x:\n        pass");
        assert_eq!(&tokens[tokens.len() - 4..], &[Newline, Dedent, Dedent, Eof]);
        assert_eq!(tokens.iter().filter(|k| **k == Indent).count(), 2);
        assert_eq!(tokens.iter().filter(|k| **k == Dedent).count(), 2);
    }

    #[test]
    fn test_blank_and_comment_lines_are_ignored() {
        let source = "if x:\n\n    # note\n        # deeper note\n    y\n";
        assert_eq!(lex(source), vec![If, ident("x"), Colon, Indent, ident("y"), Dedent]);
    }

    #[test]
    fn test_newlines_inside_brackets_are_joined() {
        let tokens = lex_all("f(a,\n  b)\n");
        assert_eq!(
            tokens,
            vec![ident("f"), LParen, ident("a"), Comma, ident("b"), RParen, Newline, Eof]
        );
    }

    #[test]
    fn test_inconsistent_dedent_reports() {
        let (_, diagnostics) = tokenize("if x:\n    y\n  z\n", 0);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_unexpected_character() {
        let (tokens, diagnostics) = tokenize("x = $", 0);
        assert!(diagnostics.has_errors());
        assert!(tokens.iter().any(|t| t.is_error()));
    }
}
