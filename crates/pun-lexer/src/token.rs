//! Tokens of the Python subset understood by pun
//!
//! `match`, `case` and `_` are soft keywords and come out of the lexer as
//! plain identifiers; the parser decides from context.

use pun_error::span::Span;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // =========================================
    // Keywords
    // =========================================
    False,
    None,
    True,
    And,
    As,
    Break,
    Class,
    Continue,
    Def,
    Elif,
    Else,
    For,
    From,
    If,
    Import,
    In,
    Is,
    Not,
    Or,
    Pass,
    Return,
    While,

    // =========================================
    // Literals
    // =========================================
    /// Integer literal: `42`, `0xFF`, `0b1010`, `1_000`
    IntLit(i64),
    /// Float literal: `3.14`, `2.5e10`
    FloatLit(f64),
    /// String literal, escapes already decoded
    StringLit(String),
    /// Identifier, including the soft keywords `match`, `case` and `_`
    Ident(String),

    // =========================================
    // Operators
    // =========================================
    Plus,
    Minus,
    Star,
    /// `**`
    DoubleStar,
    Slash,
    /// `//`
    DoubleSlash,
    Percent,
    /// `|`
    Pipe,

    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    /// `=`
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    /// `:=`
    ColonEq,

    // =========================================
    // Punctuation and delimiters
    // =========================================
    /// `->`
    Arrow,
    Colon,
    Semicolon,
    Comma,
    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // =========================================
    // Layout
    // =========================================
    /// End of a logical line
    Newline,
    Indent,
    Dedent,
    Eof,

    /// Invalid character or lexing error
    Error(String),
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::False
                | TokenKind::None
                | TokenKind::True
                | TokenKind::And
                | TokenKind::As
                | TokenKind::Break
                | TokenKind::Class
                | TokenKind::Continue
                | TokenKind::Def
                | TokenKind::Elif
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::From
                | TokenKind::If
                | TokenKind::Import
                | TokenKind::In
                | TokenKind::Is
                | TokenKind::Not
                | TokenKind::Or
                | TokenKind::Pass
                | TokenKind::Return
                | TokenKind::While
        )
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLit(_) | TokenKind::FloatLit(_) | TokenKind::StringLit(_)
        )
    }

    /// Augmented assignment operators (`+=`, ...)
    pub fn is_aug_assign(&self) -> bool {
        matches!(
            self,
            TokenKind::PlusEq | TokenKind::MinusEq | TokenKind::StarEq | TokenKind::SlashEq
        )
    }

    /// Soft keywords are not listed here
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        let kind = match s {
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            "True" => TokenKind::True,
            "and" => TokenKind::And,
            "as" => TokenKind::As,
            "break" => TokenKind::Break,
            "class" => TokenKind::Class,
            "continue" => TokenKind::Continue,
            "def" => TokenKind::Def,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "from" => TokenKind::From,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "in" => TokenKind::In,
            "is" => TokenKind::Is,
            "not" => TokenKind::Not,
            "or" => TokenKind::Or,
            "pass" => TokenKind::Pass,
            "return" => TokenKind::Return,
            "while" => TokenKind::While,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::False => "False",
            TokenKind::None => "None",
            TokenKind::True => "True",
            TokenKind::And => "and",
            TokenKind::As => "as",
            TokenKind::Break => "break",
            TokenKind::Class => "class",
            TokenKind::Continue => "continue",
            TokenKind::Def => "def",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::From => "from",
            TokenKind::If => "if",
            TokenKind::Import => "import",
            TokenKind::In => "in",
            TokenKind::Is => "is",
            TokenKind::Not => "not",
            TokenKind::Or => "or",
            TokenKind::Pass => "pass",
            TokenKind::Return => "return",
            TokenKind::While => "while",

            TokenKind::IntLit(n) => return write!(f, "{}", n),
            TokenKind::FloatLit(n) => return write!(f, "{}", n),
            TokenKind::StringLit(s) => return write!(f, "{:?}", s),
            TokenKind::Ident(name) => return write!(f, "{}", name),

            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::DoubleStar => "**",
            TokenKind::Slash => "/",
            TokenKind::DoubleSlash => "//",
            TokenKind::Percent => "%",
            TokenKind::Pipe => "|",
            TokenKind::EqEq => "==",
            TokenKind::Ne => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::Eq => "=",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::ColonEq => ":=",

            TokenKind::Arrow => "->",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",

            TokenKind::Newline => "NEWLINE",
            TokenKind::Indent => "INDENT",
            TokenKind::Dedent => "DEDENT",
            TokenKind::Eof => "EOF",
            TokenKind::Error(msg) => return write!(f, "ERROR({})", msg),
        };
        f.write_str(text)
    }
}

/// A token with its location in the source code
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Compares token kinds by variant only
    pub fn is(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.kind) == std::mem::discriminant(kind)
    }

    /// True for an identifier spelled `name`, used for soft keywords
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(ident) if ident == name)
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TokenKind::Error(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.kind, self.span.start.line, self.span.start.column
        )
    }
}
