//! pun-lower - Lowers `match` statements into plain conditionals
//!
//! Each match statement becomes an assignment of the subject to
//! `__match_subject` followed by ordinary `if` statements built from
//! comparisons, `isinstance`/`hasattr`/`getattr` calls and variable
//! bindings. Class patterns destructure through the class's
//! `__match_args__` manifest.
//!
//! # Example
//!
//! ```rust
//! use pun_lexer::Lexer;
//! use pun_lower::{lower_module, LowerOptions};
//! use pun_parser::{parse, Stmt};
//!
//! let source = "match point:\n    case Point(x, 0):\n        pass\n";
//! let mut lexer = Lexer::new(source, 0);
//! let (module, _) = parse(lexer.tokenize());
//!
//! let lowered = lower_module(&module, &LowerOptions::default()).unwrap();
//! assert!(matches!(lowered.body[1], Stmt::If { .. }));
//! ```

pub mod case;
pub mod error;
pub mod lower;
pub mod pattern;
pub mod scope;

pub use error::LowerError;
pub use lower::{lower_match, lower_module};
pub use pattern::{compile_pattern, CompiledStep};

use std::fmt;

/// How lowered cases are written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// One condition per case; binds use assignment expressions
    #[default]
    Expression,
    /// Guarded statement sequences and a case selector, no assignment
    /// expressions
    Statements,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Expression => write!(f, "expression"),
            Strategy::Statements => write!(f, "statements"),
        }
    }
}

/// Lowering options
#[derive(Debug, Clone, Default)]
pub struct LowerOptions {
    pub strategy: Strategy,
}
