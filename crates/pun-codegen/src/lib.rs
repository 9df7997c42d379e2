//! pun-codegen - Source emitter for pun syntax trees
//!
//! Prints a [`Module`] back to Python source. Parentheses are inserted from
//! operator precedence, so synthesized trees need none of their own.
//!
//! # Example
//!
//! ```rust
//! use pun_codegen::{CodeGen, PythonBackend};
//! use pun_parser::{Expr, Module, Stmt};
//!
//! let module = Module {
//!     body: vec![Stmt::assign("__match_subject", Expr::int(1))],
//! };
//! let source = PythonBackend::new().generate(&module);
//! assert_eq!(source, "__match_subject = 1\n");
//! ```

pub mod python_backend;

pub use python_backend::PythonBackend;

use pun_parser::Module;

/// Trait for code generation backends
pub trait CodeGen {
    /// Backend output type
    type Output;

    /// Generates code from a module
    fn generate(&self, module: &Module) -> Self::Output;
}

/// Emission options
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Spaces per indentation level
    pub indent_width: usize,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}
