//! Environment for variable bindings.
//!
//! Names resolve in the local scope of the running function (or class
//! body), then the module globals. Assignments go to the innermost scope.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type Scope = Rc<RefCell<HashMap<String, Value>>>;

#[derive(Clone)]
pub struct Environment {
    globals: Scope,
    locals: Option<Scope>,
}

impl Environment {
    /// Module-level environment
    pub fn new() -> Self {
        Self {
            globals: Rc::default(),
            locals: None,
        }
    }

    /// Environment for a function call or class body sharing these globals
    pub fn child(&self) -> Self {
        Self {
            globals: Rc::clone(&self.globals),
            locals: Some(Rc::default()),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(locals) = &self.locals {
            if let Some(value) = locals.borrow().get(name) {
                return Some(value.clone());
            }
        }
        self.globals.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Value) {
        let scope = self.locals.as_ref().unwrap_or(&self.globals);
        scope.borrow_mut().insert(name.to_string(), value);
    }

    /// Bindings of the innermost scope, used to build a class namespace
    pub fn take_locals(&self) -> HashMap<String, Value> {
        let scope = self.locals.as_ref().unwrap_or(&self.globals);
        std::mem::take(&mut *scope.borrow_mut())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_reads_globals_and_writes_locals() {
        let globals = Environment::new();
        globals.set("x", Value::Int(1));

        let child = globals.child();
        assert!(matches!(child.get("x"), Some(Value::Int(1))));

        child.set("x", Value::Int(2));
        assert!(matches!(child.get("x"), Some(Value::Int(2))));
        assert!(matches!(globals.get("x"), Some(Value::Int(1))));
    }

    #[test]
    fn test_take_locals() {
        let globals = Environment::new();
        let body = globals.child();
        body.set("__match_args__", Value::tuple(vec![Value::str("x")]));

        let attrs = body.take_locals();
        assert!(attrs.contains_key("__match_args__"));
        assert!(body.get("__match_args__").is_none());
    }
}
