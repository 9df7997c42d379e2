//! Builtin functions and types.
//!
//! These provide the class introspection the lowered code relies on:
//! `isinstance`, `getattr`, `hasattr` and `len`.

use crate::error::EvalError;
use crate::value::{Builtin, BuiltinType, Value};
use std::rc::Rc;

/// Resolves a builtin name
pub fn lookup(name: &str) -> Option<Value> {
    let builtin = match name {
        "print" => Builtin::Print,
        "isinstance" => Builtin::Isinstance,
        "getattr" => Builtin::Getattr,
        "hasattr" => Builtin::Hasattr,
        "len" => Builtin::Len,
        "range" => Builtin::Range,
        _ => {
            return BuiltinType::ALL
                .iter()
                .find(|ty| ty.name() == name)
                .map(|ty| Value::Type(*ty));
        }
    };
    Some(Value::Builtin(builtin))
}

fn expect_args(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), EvalError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(EvalError::type_error(format!(
            "{}() takes {} arguments ({} given)",
            name,
            expected,
            args.len()
        )));
    }
    Ok(())
}

/// Calls a builtin other than `print`, which needs the output buffer
pub fn call(builtin: Builtin, args: &[Value]) -> Result<Value, EvalError> {
    match builtin {
        Builtin::Print => Err(EvalError::type_error("print() needs an output buffer")),
        Builtin::Isinstance => {
            expect_args("isinstance", args, 2, 2)?;
            Ok(Value::Bool(isinstance(&args[0], &args[1])?))
        }
        Builtin::Getattr => {
            expect_args("getattr", args, 2, 3)?;
            let name = attribute_name(&args[1])?;
            match (getattr(&args[0], &name), args.get(2)) {
                (Some(value), _) => Ok(value),
                (None, Some(default)) => Ok(default.clone()),
                (None, None) => Err(EvalError::AttributeError {
                    ty: args[0].type_name(),
                    attr: name,
                }),
            }
        }
        Builtin::Hasattr => {
            expect_args("hasattr", args, 2, 2)?;
            let name = attribute_name(&args[1])?;
            Ok(Value::Bool(getattr(&args[0], &name).is_some()))
        }
        Builtin::Len => {
            expect_args("len", args, 1, 1)?;
            len(&args[0])
        }
        Builtin::Range => {
            expect_args("range", args, 1, 3)?;
            range(args)
        }
    }
}

fn attribute_name(value: &Value) -> Result<String, EvalError> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        other => Err(EvalError::type_error(format!(
            "attribute name must be string, not '{}'",
            other.type_name()
        ))),
    }
}

/// `isinstance(value, class_ref)`; `class_ref` may be a tuple of classes
pub fn isinstance(value: &Value, class_ref: &Value) -> Result<bool, EvalError> {
    match class_ref {
        Value::Type(ty) => Ok(value.is_instance_of_type(*ty)),
        Value::Class(class) => Ok(value.is_instance_of_class(class)),
        Value::Tuple(classes) => {
            for class in classes.iter() {
                if isinstance(value, class)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        other => Err(EvalError::type_error(format!(
            "isinstance() arg 2 must be a type or tuple of types, not '{}'",
            other.type_name()
        ))),
    }
}

/// Attribute lookup: instance attributes, then the class and its bases.
/// Functions found on the class of an instance come back bound.
pub fn getattr(value: &Value, name: &str) -> Option<Value> {
    match value {
        Value::Instance(instance) => {
            if let Some(attr) = instance.attrs.borrow().get(name) {
                return Some(attr.clone());
            }
            match instance.class.lookup(name)? {
                Value::Function(function) => Some(Value::BoundMethod {
                    receiver: Rc::clone(instance),
                    function,
                }),
                other => Some(other),
            }
        }
        Value::Class(class) => match name {
            "__name__" => Some(Value::str(&class.name)),
            _ => class.lookup(name),
        },
        Value::Type(ty) if name == "__name__" => Some(Value::str(ty.name())),
        Value::Function(function) if name == "__name__" => Some(Value::str(&function.def.name)),
        _ => None,
    }
}

pub fn len(value: &Value) -> Result<Value, EvalError> {
    let n = match value {
        Value::Str(s) => s.chars().count(),
        Value::Tuple(items) => items.len(),
        Value::List(items) => items.borrow().len(),
        other => {
            return Err(EvalError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(Value::Int(n as i64))
}

fn int_arg(value: &Value) -> Result<i64, EvalError> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Bool(b) => Ok(*b as i64),
        other => Err(EvalError::type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            other.type_name()
        ))),
    }
}

/// `range(stop)`, `range(start, stop[, step])`, materialised as a list
fn range(args: &[Value]) -> Result<Value, EvalError> {
    let (start, stop, step) = match args {
        [stop] => (0, int_arg(stop)?, 1),
        [start, stop] => (int_arg(start)?, int_arg(stop)?, 1),
        [start, stop, step] => (int_arg(start)?, int_arg(stop)?, int_arg(step)?),
        _ => return Err(EvalError::type_error("range() takes 1 to 3 arguments")),
    };

    if step == 0 {
        return Err(EvalError::type_error("range() arg 3 must not be zero"));
    }

    let mut items = Vec::new();
    let mut current = start;
    while (step > 0 && current < stop) || (step < 0 && current > stop) {
        items.push(Value::Int(current));
        current = current.checked_add(step).ok_or(EvalError::Overflow)?;
    }
    Ok(Value::list(items))
}

/// Elements of an iterable value
pub fn iterate(value: &Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::Tuple(items) => Ok(items.as_ref().clone()),
        Value::List(items) => Ok(items.borrow().clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::str(&c.to_string())).collect()),
        other => Err(EvalError::type_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

/// Calling a builtin type converts its argument
pub fn convert(ty: BuiltinType, args: &[Value]) -> Result<Value, EvalError> {
    expect_args(ty.name(), args, 0, 1)?;
    let arg = args.first();

    let value = match (ty, arg) {
        (BuiltinType::Bool, None) => Value::Bool(false),
        (BuiltinType::Bool, Some(v)) => Value::Bool(v.is_truthy()),
        (BuiltinType::Int, None) => Value::Int(0),
        (BuiltinType::Int, Some(Value::Float(n))) => {
            if !n.is_finite() {
                return Err(EvalError::type_error("cannot convert float to integer"));
            }
            Value::Int(n.trunc() as i64)
        }
        (BuiltinType::Int, Some(Value::Str(s))) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| EvalError::type_error(format!("invalid literal for int(): '{}'", s)))?,
        (BuiltinType::Int, Some(v)) => Value::Int(int_arg(v)?),
        (BuiltinType::Float, None) => Value::Float(0.0),
        (BuiltinType::Float, Some(Value::Str(s))) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| {
                EvalError::type_error(format!("could not convert string to float: '{}'", s))
            })?,
        (BuiltinType::Float, Some(v)) => match v.as_number() {
            Some(n) => Value::Float(n.as_f64()),
            None => {
                return Err(EvalError::type_error(format!(
                    "float() argument must be a string or a number, not '{}'",
                    v.type_name()
                )))
            }
        },
        (BuiltinType::Str, None) => Value::str(""),
        (BuiltinType::Str, Some(v)) => Value::str(&v.to_string()),
        (BuiltinType::Tuple, None) => Value::tuple(Vec::new()),
        (BuiltinType::Tuple, Some(v)) => Value::tuple(iterate(v)?),
        (BuiltinType::List, None) => Value::list(Vec::new()),
        (BuiltinType::List, Some(v)) => Value::list(iterate(v)?),
        (other, _) => {
            return Err(EvalError::type_error(format!(
                "{}() cannot be constructed by the evaluator",
                other.name()
            )))
        }
    };
    Ok(value)
}
