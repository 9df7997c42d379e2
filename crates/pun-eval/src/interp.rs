//! Tree-walking interpreter for lowered modules.

use crate::builtins;
use crate::env::Environment;
use crate::error::EvalError;
use crate::value::{Builtin, BuiltinType, Class, Function, Instance, Number, Value};
use pun_parser::{BinOp, BoolOp, CmpOp, Expr, Keyword, Module, Stmt, UnaryOp};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

/// How a statement finished
enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

pub struct Interpreter {
    globals: Environment,
    output: String,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            globals: Environment::new(),
            output: String::new(),
        }
    }

    /// Runs `module` at top level
    pub fn run(&mut self, module: &Module) -> Result<(), EvalError> {
        debug!(statements = module.body.len(), "evaluating module");
        let env = self.globals.clone();
        match self.exec_block(&module.body, &env)? {
            Flow::Normal => Ok(()),
            Flow::Return(_) => Err(EvalError::Misplaced("return", "function")),
            Flow::Break => Err(EvalError::Misplaced("break", "loop")),
            Flow::Continue => Err(EvalError::Misplaced("continue", "loop")),
        }
    }

    /// Everything written by `print` so far
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Value of a module-level name
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name)
    }

    // =========================================
    // Statements
    // =========================================

    fn exec_block(&mut self, stmts: &[Stmt], env: &Environment) -> Result<Flow, EvalError> {
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Environment) -> Result<Flow, EvalError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr, env)?;
            }
            Stmt::Assign { targets, value, .. } => {
                let value = self.eval(value, env)?;
                for target in targets {
                    self.assign(target, value.clone(), env)?;
                }
            }
            Stmt::AugAssign {
                target, op, value, ..
            } => {
                let current = self.eval(target, env)?;
                let rhs = self.eval(value, env)?;
                let result = binary_op(*op, &current, &rhs)?;
                self.assign(target, result, env)?;
            }
            Stmt::AnnAssign { target, value, .. } => {
                if let Some(value) = value {
                    let value = self.eval(value, env)?;
                    self.assign(target, value, env)?;
                }
            }
            Stmt::If {
                test, body, orelse, ..
            } => {
                let branch = if self.eval(test, env)?.is_truthy() {
                    body
                } else {
                    orelse
                };
                return self.exec_block(branch, env);
            }
            Stmt::While { test, body, .. } => {
                while self.eval(test, env)?.is_truthy() {
                    match self.exec_block(body, env)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }
            Stmt::For {
                target, iter, body, ..
            } => {
                let items = builtins::iterate(&self.eval(iter, env)?)?;
                for item in items {
                    self.assign(target, item, env)?;
                    match self.exec_block(body, env)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }
            Stmt::FunctionDef(def) => {
                let mut defaults = Vec::with_capacity(def.params.len());
                for param in &def.params {
                    defaults.push(match &param.default {
                        Some(default) => Some(self.eval(default, env)?),
                        None => None,
                    });
                }
                let function = Function {
                    def: Rc::new(def.clone()),
                    defaults,
                };
                env.set(&def.name, Value::Function(Rc::new(function)));
            }
            Stmt::ClassDef(def) => {
                let mut bases = Vec::new();
                for base in &def.bases {
                    match self.eval(base, env)? {
                        Value::Class(class) => bases.push(class),
                        Value::Type(BuiltinType::Object) => {}
                        other => {
                            return Err(EvalError::type_error(format!(
                                "cannot inherit from '{}'",
                                other.type_name()
                            )))
                        }
                    }
                }

                let body_env = env.child();
                match self.exec_block(&def.body, &body_env)? {
                    Flow::Normal => {}
                    Flow::Return(_) => return Err(EvalError::Misplaced("return", "function")),
                    Flow::Break => return Err(EvalError::Misplaced("break", "loop")),
                    Flow::Continue => return Err(EvalError::Misplaced("continue", "loop")),
                }

                let class = Class {
                    name: def.name.clone(),
                    bases,
                    attrs: RefCell::new(body_env.take_locals()),
                };
                env.set(&def.name, Value::Class(Rc::new(class)));
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.eval(value, env)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::Pass(_) => {}
            Stmt::Break(_) => return Ok(Flow::Break),
            Stmt::Continue(_) => return Ok(Flow::Continue),
            Stmt::Import { .. } | Stmt::ImportFrom { .. } => {
                return Err(EvalError::Unsupported("import statements"))
            }
            Stmt::Match(stmt) => return Err(EvalError::UnloweredMatch { span: stmt.span }),
        }

        Ok(Flow::Normal)
    }

    fn assign(&mut self, target: &Expr, value: Value, env: &Environment) -> Result<(), EvalError> {
        match target {
            Expr::Name(name, _) => env.set(name, value),
            Expr::Attribute {
                value: object, attr, ..
            } => match self.eval(object, env)? {
                Value::Instance(instance) => {
                    instance.attrs.borrow_mut().insert(attr.clone(), value);
                }
                Value::Class(class) => {
                    class.attrs.borrow_mut().insert(attr.clone(), value);
                }
                other => {
                    return Err(EvalError::AttributeError {
                        ty: other.type_name(),
                        attr: attr.clone(),
                    })
                }
            },
            Expr::Subscript {
                value: object, index, ..
            } => {
                let object = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                match object {
                    Value::List(items) => {
                        let mut items = items.borrow_mut();
                        let slot = normalize_index(&index, items.len())?;
                        items[slot] = value;
                    }
                    other => {
                        return Err(EvalError::type_error(format!(
                            "'{}' object does not support item assignment",
                            other.type_name()
                        )))
                    }
                }
            }
            Expr::Tuple(targets, _) | Expr::List(targets, _) => {
                let items = builtins::iterate(&value)?;
                if items.len() != targets.len() {
                    return Err(EvalError::type_error(format!(
                        "cannot unpack {} values into {} targets",
                        items.len(),
                        targets.len()
                    )));
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign(target, item, env)?;
                }
            }
            _ => return Err(EvalError::type_error("cannot assign to expression")),
        }
        Ok(())
    }

    // =========================================
    // Expressions
    // =========================================

    fn eval(&mut self, expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
        match expr {
            Expr::Name(name, _) => env
                .get(name)
                .or_else(|| builtins::lookup(name))
                .ok_or_else(|| EvalError::NameError(name.clone())),
            Expr::Int(n, _) => Ok(Value::Int(*n)),
            Expr::Float(n, _) => Ok(Value::Float(*n)),
            Expr::Str(s, _) => Ok(Value::str(s)),
            Expr::Bool(b, _) => Ok(Value::Bool(*b)),
            Expr::None(_) => Ok(Value::None),
            Expr::Tuple(elements, _) => Ok(Value::tuple(self.eval_all(elements, env)?)),
            Expr::List(elements, _) => Ok(Value::list(self.eval_all(elements, env)?)),
            Expr::Attribute { value, attr, .. } => {
                let object = self.eval(value, env)?;
                builtins::getattr(&object, attr).ok_or_else(|| EvalError::AttributeError {
                    ty: object.type_name(),
                    attr: attr.clone(),
                })
            }
            Expr::Subscript { value, index, .. } => {
                let object = self.eval(value, env)?;
                let index = self.eval(index, env)?;
                subscript(&object, &index)
            }
            Expr::Call {
                func,
                args,
                keywords,
                ..
            } => {
                let callee = self.eval(func, env)?;
                let args = self.eval_all(args, env)?;
                let kwargs = self.eval_keywords(keywords, env)?;
                self.call(callee, args, kwargs)
            }
            Expr::BinOp {
                left, op, right, ..
            } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                binary_op(*op, &left, &right)
            }
            Expr::UnaryOp { op, operand, .. } => {
                let operand = self.eval(operand, env)?;
                unary_op(*op, &operand)
            }
            Expr::BoolOp { op, values, .. } => {
                let mut result = Value::None;
                for value in values {
                    result = self.eval(value, env)?;
                    let stop = match op {
                        BoolOp::And => !result.is_truthy(),
                        BoolOp::Or => result.is_truthy(),
                    };
                    if stop {
                        break;
                    }
                }
                Ok(result)
            }
            Expr::Compare {
                left,
                ops,
                comparators,
                ..
            } => {
                let mut left = self.eval(left, env)?;
                for (op, comparator) in ops.iter().zip(comparators) {
                    let right = self.eval(comparator, env)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::NamedExpr { target, value, .. } => {
                let value = self.eval(value, env)?;
                trace!(name = %target, "assignment expression");
                env.set(target, value.clone());
                Ok(value)
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr], env: &Environment) -> Result<Vec<Value>, EvalError> {
        exprs.iter().map(|e| self.eval(e, env)).collect()
    }

    fn eval_keywords(
        &mut self,
        keywords: &[Keyword],
        env: &Environment,
    ) -> Result<Vec<(String, Value)>, EvalError> {
        let mut values = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            values.push((keyword.name.clone(), self.eval(&keyword.value, env)?));
        }
        Ok(values)
    }

    // =========================================
    // Calls
    // =========================================

    fn call(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value, EvalError> {
        match callee {
            Value::Builtin(Builtin::Print) => {
                self.print(&args, &kwargs)?;
                Ok(Value::None)
            }
            Value::Builtin(builtin) => {
                reject_keywords(builtin.name(), &kwargs)?;
                builtins::call(builtin, &args)
            }
            Value::Type(ty) => {
                reject_keywords(ty.name(), &kwargs)?;
                builtins::convert(ty, &args)
            }
            Value::Function(function) => self.call_function(&function, None, args, kwargs),
            Value::BoundMethod { receiver, function } => {
                self.call_function(&function, Some(Value::Instance(receiver)), args, kwargs)
            }
            Value::Class(class) => {
                let instance = Rc::new(Instance {
                    class: Rc::clone(&class),
                    attrs: RefCell::default(),
                });
                match class.lookup("__init__") {
                    Some(Value::Function(init)) => {
                        let receiver = Value::Instance(Rc::clone(&instance));
                        self.call_function(&init, Some(receiver), args, kwargs)?;
                    }
                    _ if !args.is_empty() || !kwargs.is_empty() => {
                        return Err(EvalError::type_error(format!(
                            "{}() takes no arguments",
                            class.name
                        )));
                    }
                    _ => {}
                }
                Ok(Value::Instance(instance))
            }
            other => Err(EvalError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn call_function(
        &mut self,
        function: &Function,
        receiver: Option<Value>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value, EvalError> {
        let def = &function.def;
        let positional: Vec<Value> = receiver.into_iter().chain(args).collect();

        if positional.len() > def.params.len() {
            return Err(EvalError::type_error(format!(
                "{}() takes {} positional arguments but {} were given",
                def.name,
                def.params.len(),
                positional.len()
            )));
        }

        let mut slots: Vec<Option<Value>> = positional.into_iter().map(Some).collect();
        slots.resize(def.params.len(), None);

        for (name, value) in kwargs {
            let Some(index) = def.params.iter().position(|p| p.name == name) else {
                return Err(EvalError::type_error(format!(
                    "{}() got an unexpected keyword argument '{}'",
                    def.name, name
                )));
            };
            if slots[index].is_some() {
                return Err(EvalError::type_error(format!(
                    "{}() got multiple values for argument '{}'",
                    def.name, name
                )));
            }
            slots[index] = Some(value);
        }

        let env = self.globals.child();
        for ((param, slot), default) in def.params.iter().zip(slots).zip(&function.defaults) {
            let value = slot.or_else(|| default.clone()).ok_or_else(|| {
                EvalError::type_error(format!(
                    "{}() missing required argument: '{}'",
                    def.name, param.name
                ))
            })?;
            env.set(&param.name, value);
        }

        match self.exec_block(&def.body, &env)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::None),
            Flow::Break => Err(EvalError::Misplaced("break", "loop")),
            Flow::Continue => Err(EvalError::Misplaced("continue", "loop")),
        }
    }

    fn print(&mut self, args: &[Value], kwargs: &[(String, Value)]) -> Result<(), EvalError> {
        let mut sep = " ".to_string();
        let mut end = "\n".to_string();
        for (name, value) in kwargs {
            let text = match value {
                Value::None => continue,
                Value::Str(s) => s.to_string(),
                other => {
                    return Err(EvalError::type_error(format!(
                        "{} must be None or a string, not {}",
                        name,
                        other.type_name()
                    )))
                }
            };
            match name.as_str() {
                "sep" => sep = text,
                "end" => end = text,
                other => {
                    return Err(EvalError::type_error(format!(
                        "'{}' is an invalid keyword argument for print()",
                        other
                    )))
                }
            }
        }

        let line: Vec<String> = args.iter().map(Value::to_string).collect();
        self.output.push_str(&line.join(&sep));
        self.output.push_str(&end);
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn reject_keywords(name: &str, kwargs: &[(String, Value)]) -> Result<(), EvalError> {
    match kwargs.first() {
        Some((key, _)) => Err(EvalError::type_error(format!(
            "{}() takes no keyword argument '{}'",
            name, key
        ))),
        None => Ok(()),
    }
}

// =========================================
// Operators
// =========================================

fn normalize_index(index: &Value, len: usize) -> Result<usize, EvalError> {
    let raw = match index {
        Value::Int(n) => *n,
        Value::Bool(b) => *b as i64,
        other => {
            return Err(EvalError::type_error(format!(
                "indices must be integers, not {}",
                other.type_name()
            )))
        }
    };
    let adjusted = if raw < 0 { raw + len as i64 } else { raw };
    if adjusted < 0 || adjusted >= len as i64 {
        return Err(EvalError::IndexError { index: raw, len });
    }
    Ok(adjusted as usize)
}

fn subscript(object: &Value, index: &Value) -> Result<Value, EvalError> {
    match object {
        Value::Tuple(items) => Ok(items[normalize_index(index, items.len())?].clone()),
        Value::List(items) => {
            let items = items.borrow();
            Ok(items[normalize_index(index, items.len())?].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let c = chars[normalize_index(index, chars.len())?];
            Ok(Value::str(&c.to_string()))
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn unsupported_operands(op: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op,
        left.type_name(),
        right.type_name()
    ))
}

fn binary_op(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return numeric_op(op, a, b);
    }

    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::str(&format!("{}{}", a, b))),
        (BinOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            let items = a.borrow().iter().chain(b.borrow().iter()).cloned().collect();
            Ok(Value::list(items))
        }
        (BinOp::Mul, Value::Str(s), Value::Int(n)) | (BinOp::Mul, Value::Int(n), Value::Str(s)) => {
            Ok(Value::str(&s.repeat((*n).max(0) as usize)))
        }
        _ => Err(unsupported_operands(op.as_str(), left, right)),
    }
}

fn numeric_op(op: BinOp, a: Number, b: Number) -> Result<Value, EvalError> {
    if let (Number::Int(x), Number::Int(y)) = (a, b) {
        let result = match op {
            BinOp::Add => x.checked_add(y),
            BinOp::Sub => x.checked_sub(y),
            BinOp::Mul => x.checked_mul(y),
            BinOp::Div => {
                if y == 0 {
                    return Err(EvalError::ZeroDivision);
                }
                return Ok(Value::Float(x as f64 / y as f64));
            }
            BinOp::FloorDiv | BinOp::Mod => {
                if y == 0 {
                    return Err(EvalError::ZeroDivision);
                }
                // floor semantics: the remainder takes the sign of the divisor
                let quotient = x.checked_div(y).ok_or(EvalError::Overflow)?;
                let remainder = x - quotient * y;
                let adjust = remainder != 0 && ((remainder < 0) != (y < 0));
                if op == BinOp::FloorDiv {
                    Some(if adjust { quotient - 1 } else { quotient })
                } else {
                    Some(if adjust { remainder + y } else { remainder })
                }
            }
            BinOp::Pow => {
                if y < 0 {
                    return Ok(Value::Float((x as f64).powf(y as f64)));
                }
                u32::try_from(y).ok().and_then(|exp| x.checked_pow(exp))
            }
        };
        return result.map(Value::Int).ok_or(EvalError::Overflow);
    }

    let (x, y) = (a.as_f64(), b.as_f64());
    let result = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div | BinOp::FloorDiv | BinOp::Mod if y == 0.0 => {
            return Err(EvalError::ZeroDivision)
        }
        BinOp::Div => x / y,
        BinOp::FloorDiv => (x / y).floor(),
        BinOp::Mod => x - y * (x / y).floor(),
        BinOp::Pow => x.powf(y),
    };
    Ok(Value::Float(result))
}

fn unary_op(op: UnaryOp, operand: &Value) -> Result<Value, EvalError> {
    match (op, operand.as_number()) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!operand.is_truthy())),
        (UnaryOp::Neg, Some(Number::Int(n))) => {
            n.checked_neg().map(Value::Int).ok_or(EvalError::Overflow)
        }
        (UnaryOp::Neg, Some(Number::Float(n))) => Ok(Value::Float(-n)),
        (UnaryOp::Pos, Some(Number::Int(n))) => Ok(Value::Int(n)),
        (UnaryOp::Pos, Some(Number::Float(n))) => Ok(Value::Float(n)),
        _ => Err(EvalError::type_error(format!(
            "bad operand type for unary operator: '{}'",
            operand.type_name()
        ))),
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    match op {
        CmpOp::Eq => Ok(left.py_eq(right)),
        CmpOp::NotEq => Ok(!left.py_eq(right)),
        CmpOp::Is => Ok(left.py_is(right)),
        CmpOp::IsNot => Ok(!left.py_is(right)),
        CmpOp::In => contains(right, left),
        CmpOp::NotIn => contains(right, left).map(|found| !found),
        CmpOp::Lt | CmpOp::LtE | CmpOp::Gt | CmpOp::GtE => {
            let ordering = match (left.as_number(), right.as_number(), left, right) {
                (Some(a), Some(b), _, _) => a.as_f64().partial_cmp(&b.as_f64()),
                (_, _, Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                _ => return Err(unsupported_operands(op.as_str(), left, right)),
            };
            let Some(ordering) = ordering else {
                return Ok(false);
            };
            Ok(match op {
                CmpOp::Lt => ordering.is_lt(),
                CmpOp::LtE => ordering.is_le(),
                CmpOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
    }
}

fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match (container, item) {
        (Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(&**needle)),
        (Value::Str(_), other) => Err(EvalError::type_error(format!(
            "'in <string>' requires string as left operand, not {}",
            other.type_name()
        ))),
        (Value::Tuple(_), _) | (Value::List(_), _) => {
            Ok(builtins::iterate(container)?.iter().any(|element| element.py_eq(item)))
        }
        (other, _) => Err(EvalError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// Runs `module` and returns what it printed
pub fn evaluate(module: &Module) -> Result<String, EvalError> {
    let mut interpreter = Interpreter::new();
    interpreter.run(module)?;
    Ok(interpreter.take_output())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pun_lexer::Lexer;
    use pun_parser::parse;

    fn run(source: &str) -> Result<String, EvalError> {
        let mut lexer = Lexer::new(source, 0);
        let (module, diags) = parse(lexer.tokenize());
        assert!(!diags.has_errors(), "{:?}", diags);
        evaluate(&module)
    }

    #[test]
    fn test_print_and_arithmetic() {
        assert_eq!(
            run("print(1 + 2 * 3, 7 // 2, -7 // 2, -7 % 3, 2 ** 10)\n").unwrap(),
            "7 3 -4 2 1024\n"
        );
        assert_eq!(run("print(1 / 2, 'a' + 'b', sep='|')\n").unwrap(), "0.5|ab\n");
    }

    #[test]
    fn test_equality_versus_identity() {
        let output = run("print(1 == True, 1 is True, None is None, 0 == False)\n").unwrap();
        assert_eq!(output, "True False True True\n");
    }

    #[test]
    fn test_short_circuit() {
        let source = "\
def loud(x):
    print('loud', x)
    return x

r = loud(0) and loud(1)
r = loud(2) or loud(3)
print(r)
";
        assert_eq!(run(source).unwrap(), "loud 0\nloud 2\n2\n");
    }

    #[test]
    fn test_walrus_binds_in_scope() {
        let source = "if (n := 3) > 2:\n    print(n)\nprint((True, (m := n + 1))[0], m)\n";
        assert_eq!(run(source).unwrap(), "3\nTrue 4\n");
    }

    #[test]
    fn test_classes_and_methods() {
        let source = "\
class Point:
    __match_args__ = ('x', 'y')

    def __init__(self, x, y=0):
        self.x = x
        self.y = y

    def total(self):
        return self.x + self.y

class Point3(Point):
    pass

p = Point3(1, y=2)
print(p.total(), isinstance(p, Point), getattr(Point3, '__match_args__', None))
print(hasattr(p, 'x'), hasattr(p, 'z'), getattr(p, 'z', 'missing'))
";
        assert_eq!(
            run(source).unwrap(),
            "3 True ('x', 'y')\nTrue False missing\n"
        );
    }

    #[test]
    fn test_loops() {
        let source = "\
total = 0
for i in range(10):
    if i == 5:
        break
    if i % 2:
        continue
    total += i
while total > 0:
    total -= 4
print(total)
";
        assert_eq!(run(source).unwrap(), "-2\n");
    }

    #[test]
    fn test_unlowered_match_is_an_error() {
        let error = run("match 1:\n    case 1:\n        pass\n").unwrap_err();
        assert!(matches!(error, EvalError::UnloweredMatch { .. }));
    }

    #[test]
    fn test_runtime_errors() {
        assert!(matches!(run("print(x)\n"), Err(EvalError::NameError(_))));
        assert!(matches!(run("x = 1 // 0\n"), Err(EvalError::ZeroDivision)));
        assert!(matches!(run("x = (1, 2)[2]\n"), Err(EvalError::IndexError { index: 2, len: 2 })));
        assert!(matches!(run("import os\n"), Err(EvalError::Unsupported(_))));
        assert!(matches!(
            run("class A:\n    pass\nA().b\n"),
            Err(EvalError::AttributeError { .. })
        ));
    }
}
