//! pun-parser - Parser for the Python subset handled by pun
//!
//! Converts a token stream into a [`Module`]. Besides ordinary statements
//! the parser understands the full `match`/`case` pattern grammar, including
//! pattern forms the lowering pass later rejects, so those errors can point
//! at the exact pattern.
//!
//! # Example
//!
//! ```rust
//! use pun_lexer::Lexer;
//! use pun_parser::{parse, Stmt};
//!
//! let source = "match point:\n    case Point(x, y=0):\n        pass\n";
//! let mut lexer = Lexer::new(source, 0);
//! let tokens = lexer.tokenize();
//!
//! let (module, diagnostics) = parse(tokens);
//! assert!(!diagnostics.has_errors());
//! assert!(matches!(module.body[0], Stmt::Match(_)));
//! ```

pub mod ast;
pub mod parser;

pub use ast::*;
pub use parser::{parse, Parser};
