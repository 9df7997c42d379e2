//! Runtime values.

use pun_parser::FunctionDef;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A runtime value in the evaluator.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Tuple(Rc<Vec<Value>>),
    List(Rc<RefCell<Vec<Value>>>),
    /// User-defined class
    Class(Rc<Class>),
    /// Instance of a user-defined class
    Instance(Rc<Instance>),
    Function(Rc<Function>),
    /// Function looked up through an instance, `self` already bound
    BoundMethod {
        receiver: Rc<Instance>,
        function: Rc<Function>,
    },
    Builtin(Builtin),
    /// `int`, `str`, ... used as class references and conversions
    Type(BuiltinType),
}

pub struct Class {
    pub name: String,
    pub bases: Vec<Rc<Class>>,
    pub attrs: RefCell<HashMap<String, Value>>,
}

impl Class {
    /// Looks `name` up on the class, then its bases depth-first
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.attrs.borrow().get(name) {
            return Some(value.clone());
        }
        self.bases.iter().find_map(|base| base.lookup(name))
    }

    pub fn is_subclass_of(self: &Rc<Self>, other: &Rc<Class>) -> bool {
        Rc::ptr_eq(self, other) || self.bases.iter().any(|base| base.is_subclass_of(other))
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    pub attrs: RefCell<HashMap<String, Value>>,
}

pub struct Function {
    pub def: Rc<FunctionDef>,
    /// Default values evaluated at definition time, one per parameter
    pub defaults: Vec<Option<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Isinstance,
    Getattr,
    Hasattr,
    Len,
    Range,
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Isinstance => "isinstance",
            Builtin::Getattr => "getattr",
            Builtin::Hasattr => "hasattr",
            Builtin::Len => "len",
            Builtin::Range => "range",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinType {
    Object,
    Bool,
    Int,
    Float,
    Str,
    Tuple,
    List,
    Bytes,
    Bytearray,
    Dict,
    Set,
    Frozenset,
}

impl BuiltinType {
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinType::Object => "object",
            BuiltinType::Bool => "bool",
            BuiltinType::Int => "int",
            BuiltinType::Float => "float",
            BuiltinType::Str => "str",
            BuiltinType::Tuple => "tuple",
            BuiltinType::List => "list",
            BuiltinType::Bytes => "bytes",
            BuiltinType::Bytearray => "bytearray",
            BuiltinType::Dict => "dict",
            BuiltinType::Set => "set",
            BuiltinType::Frozenset => "frozenset",
        }
    }

    pub const ALL: [BuiltinType; 12] = [
        BuiltinType::Object,
        BuiltinType::Bool,
        BuiltinType::Int,
        BuiltinType::Float,
        BuiltinType::Str,
        BuiltinType::Tuple,
        BuiltinType::List,
        BuiltinType::Bytes,
        BuiltinType::Bytearray,
        BuiltinType::Dict,
        BuiltinType::Set,
        BuiltinType::Frozenset,
    ];

    /// Whether values of this type count as instances of `other`
    fn is_subtype_of(self, other: BuiltinType) -> bool {
        self == other
            || other == BuiltinType::Object
            || (self == BuiltinType::Bool && other == BuiltinType::Int)
    }
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(items))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// Builtin type of a non-class value
    pub fn builtin_type(&self) -> Option<BuiltinType> {
        let ty = match self {
            Value::Bool(_) => BuiltinType::Bool,
            Value::Int(_) => BuiltinType::Int,
            Value::Float(_) => BuiltinType::Float,
            Value::Str(_) => BuiltinType::Str,
            Value::Tuple(_) => BuiltinType::Tuple,
            Value::List(_) => BuiltinType::List,
            _ => return None,
        };
        Some(ty)
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".to_string(),
            Value::Class(_) | Value::Type(_) => "type".to_string(),
            Value::Instance(instance) => instance.class.name.clone(),
            Value::Function(_) => "function".to_string(),
            Value::BoundMethod { .. } => "method".to_string(),
            Value::Builtin(_) => "builtin_function_or_method".to_string(),
            other => other
                .builtin_type()
                .map(|ty| ty.name().to_string())
                .unwrap_or_default(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            _ => true,
        }
    }

    /// Numeric view used by arithmetic and comparisons; bools count as ints
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(*b as i64)),
            Value::Int(n) => Some(Number::Int(*n)),
            Value::Float(n) => Some(Number::Float(*n)),
            _ => None,
        }
    }

    /// `isinstance(self, ty)` for a builtin type
    pub fn is_instance_of_type(&self, ty: BuiltinType) -> bool {
        match self.builtin_type() {
            Some(own) => own.is_subtype_of(ty),
            None => ty == BuiltinType::Object,
        }
    }

    /// `isinstance(self, class)` for a user-defined class
    pub fn is_instance_of_class(&self, class: &Rc<Class>) -> bool {
        match self {
            Value::Instance(instance) => instance.class.is_subclass_of(class),
            _ => false,
        }
    }

    /// Value equality, `==`
    pub fn py_eq(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return match (a, b) {
                (Number::Int(x), Number::Int(y)) => x == y,
                _ => a.as_f64() == b.as_f64(),
            };
        }

        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => seq_eq(a, b),
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || seq_eq(&a.borrow(), &b.borrow())
            }
            _ => self.py_is(other),
        }
    }

    /// Identity, `is`. Equal small values of the same type are treated as
    /// the same object.
    pub fn py_is(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (
                Value::BoundMethod {
                    receiver: r1,
                    function: f1,
                },
                Value::BoundMethod {
                    receiver: r2,
                    function: f2,
                },
            ) => Rc::ptr_eq(r1, r2) && Rc::ptr_eq(f1, f2),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }

    /// Text used by `repr()` and inside containers
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => {
                let escaped = s.replace('\\', "\\\\").replace('\'', "\\'").replace('\n', "\\n");
                format!("'{}'", escaped)
            }
            other => other.to_string(),
        }
    }
}

fn seq_eq(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }
}

fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{:?}", value)
    }
}

/// `str()` of a value, what `print` writes
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", format_float(*n)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Tuple(items) => {
                let parts: Vec<String> = items.iter().map(Value::repr).collect();
                if parts.len() == 1 {
                    write!(f, "({},)", parts[0])
                } else {
                    write!(f, "({})", parts.join(", "))
                }
            }
            Value::List(items) => {
                let parts: Vec<String> = items.borrow().iter().map(Value::repr).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Class(class) => write!(f, "<class '{}'>", class.name),
            Value::Instance(instance) => write!(f, "<{} object>", instance.class.name),
            Value::Function(function) => write!(f, "<function {}>", function.def.name),
            Value::BoundMethod { receiver, function } => write!(
                f,
                "<bound method {}.{}>",
                receiver.class.name, function.def.name
            ),
            Value::Builtin(builtin) => write!(f, "<built-in function {}>", builtin.name()),
            Value::Type(ty) => write!(f, "<class '{}'>", ty.name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}
