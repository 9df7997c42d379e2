//! pun-eval - Reference evaluator for lowered modules
//!
//! Runs the statement subset the lowering pass emits, plus enough of the
//! rest of the language (functions, classes, loops) to drive test programs.
//! `print` writes to an in-memory buffer so runs can be compared.
//!
//! ```
//! use pun_lexer::Lexer;
//!
//! let mut lexer = Lexer::new("x = 2\nprint(x * 21)\n", 0);
//! let (module, _) = pun_parser::parse(lexer.tokenize());
//! assert_eq!(pun_eval::evaluate(&module).unwrap(), "42\n");
//! ```

pub mod builtins;
pub mod env;
pub mod error;
pub mod interp;
pub mod value;

pub use error::EvalError;
pub use interp::{evaluate, Interpreter};
pub use value::Value;
