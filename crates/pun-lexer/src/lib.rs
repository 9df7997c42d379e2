//! pun-lexer - Tokenizer for the Python subset handled by pun
//!
//! # Features
//!
//! - Significant indentation with `Indent`/`Dedent` layout tokens
//! - Implicit line joining inside brackets and explicit `\` continuations
//! - `match`, `case` and `_` kept as identifiers (soft keywords)
//! - Integer, float and string literals, including triple-quoted strings
//!
//! # Example
//!
//! ```rust
//! use pun_lexer::{Lexer, TokenKind};
//!
//! let source = "match point:\n    case Point(x=0):\n        pass\n";
//!
//! let mut lexer = Lexer::new(source, 0);
//! let tokens = lexer.tokenize();
//!
//! assert!(matches!(&tokens[0].kind, TokenKind::Ident(name) if name == "match"));
//! ```

pub mod lexer;
pub mod token;

pub use lexer::{tokenize, Lexer};
pub use token::{Token, TokenKind};
