//! AST - Syntax tree for the pun Python subset
//!
//! The same tree types describe both the parsed input (which may contain
//! `match` statements) and the lowered output (which must not).

use pun_error::Span;
use serde::Serialize;

/// Complete source file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Expression statement
    Expr(Expr),

    /// `a = b = value`
    Assign {
        targets: Vec<Expr>,
        value: Expr,
        span: Span,
    },

    /// `x += value`
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
        span: Span,
    },

    /// `x: int = value`
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
        span: Span,
    },

    /// `if test: ... else: ...`; `elif` chains nest in `orelse`
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        span: Span,
    },

    While {
        test: Expr,
        body: Vec<Stmt>,
        span: Span,
    },

    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        span: Span,
    },

    FunctionDef(FunctionDef),

    ClassDef(ClassDef),

    Return {
        value: Option<Expr>,
        span: Span,
    },

    Pass(Span),
    Break(Span),
    Continue(Span),

    /// `import a.b as c, d`
    Import {
        names: Vec<Alias>,
        span: Span,
    },

    /// `from ..pkg import a as b` or `from pkg import *` (empty `names`)
    ImportFrom {
        module: String,
        level: u32,
        names: Vec<Alias>,
        span: Span,
    },

    /// `match subject:` with its cases
    Match(MatchStmt),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub returns: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub annotation: Option<Expr>,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A pattern-matching construct
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStmt {
    pub subject: Expr,
    pub cases: Vec<MatchCase>,
    pub span: Span,
}

/// One `case pattern [if guard]: body`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Singleton {
    True,
    False,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Pattern {
    /// `_`
    Wildcard(Span),

    /// Bare name, binds the subject
    Capture { name: String, span: Span },

    /// Number, string or dotted-name value compared with `==`
    Literal(Expr),

    /// `True`, `False` or `None`, compared with `is`
    Singleton(Singleton, Span),

    /// `pattern as name`
    As {
        pattern: Box<Pattern>,
        name: String,
        span: Span,
    },

    /// `p1 | p2 | ...`
    Or(Vec<Pattern>, Span),

    /// `Cls(p1, p2, key=p3)`
    Class {
        cls: Expr,
        patterns: Vec<Pattern>,
        kwd_patterns: Vec<KeywordPattern>,
        span: Span,
    },

    /// `[p1, p2]`, `(p1, p2)` or `p1, p2`
    Sequence(Vec<Pattern>, Span),

    /// `{key: pattern, **rest}`
    Mapping {
        keys: Vec<Expr>,
        patterns: Vec<Pattern>,
        rest: Option<String>,
        span: Span,
    },

    /// `*name` or `*_` inside a sequence pattern
    Star { name: Option<String>, span: Span },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordPattern {
    pub key: String,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Name(String, Span),
    Int(i64, Span),
    Float(f64, Span),
    Str(String, Span),
    Bool(bool, Span),
    None(Span),

    Tuple(Vec<Expr>, Span),
    List(Vec<Expr>, Span),

    /// `value.attr`
    Attribute {
        value: Box<Expr>,
        attr: String,
        span: Span,
    },

    /// `value[index]`
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },

    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
        span: Span,
    },

    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        span: Span,
    },

    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },

    /// `a and b and c`, kept flat
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
        span: Span,
    },

    /// `a < b <= c`, kept as one chain
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
        span: Span,
    },

    /// `(target := value)`
    NamedExpr {
        target: String,
        value: Box<Expr>,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }
}

impl CmpOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }
}

// =========================================
// Builders for synthesized nodes
// =========================================

impl Expr {
    pub fn name(name: impl Into<String>) -> Self {
        Expr::Name(name.into(), Span::default())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Str(value.into(), Span::default())
    }

    pub fn int(value: i64) -> Self {
        Expr::Int(value, Span::default())
    }

    pub fn bool(value: bool) -> Self {
        Expr::Bool(value, Span::default())
    }

    pub fn none() -> Self {
        Expr::None(Span::default())
    }

    pub fn call(func: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            func: Box::new(func),
            args,
            keywords: Vec::new(),
            span: Span::default(),
        }
    }

    /// `left <op> right` as a single-link comparison chain
    pub fn compare(left: Expr, op: CmpOp, right: Expr) -> Self {
        Expr::Compare {
            left: Box::new(left),
            ops: vec![op],
            comparators: vec![right],
            span: Span::default(),
        }
    }

    pub fn subscript(value: Expr, index: Expr) -> Self {
        Expr::Subscript {
            value: Box::new(value),
            index: Box::new(index),
            span: Span::default(),
        }
    }

    pub fn named(target: impl Into<String>, value: Expr) -> Self {
        Expr::NamedExpr {
            target: target.into(),
            value: Box::new(value),
            span: Span::default(),
        }
    }

    pub fn not(operand: Expr) -> Self {
        Expr::UnaryOp {
            op: UnaryOp::Not,
            operand: Box::new(operand),
            span: Span::default(),
        }
    }

    /// Joins `values` with `op`, flattening nested chains of the same operator.
    /// A single value is returned unchanged.
    pub fn bool_op(op: BoolOp, values: Vec<Expr>) -> Self {
        let mut flat = Vec::with_capacity(values.len());
        for value in values {
            match value {
                Expr::BoolOp {
                    op: inner,
                    values: nested,
                    ..
                } if inner == op => flat.extend(nested),
                other => flat.push(other),
            }
        }

        if flat.len() == 1 {
            if let Some(only) = flat.pop() {
                return only;
            }
        }

        Expr::BoolOp {
            op,
            values: flat,
            span: Span::default(),
        }
    }
}

impl Stmt {
    /// `target = value` with a single name target
    pub fn assign(target: impl Into<String>, value: Expr) -> Self {
        Stmt::Assign {
            targets: vec![Expr::name(target)],
            value,
            span: Span::default(),
        }
    }

    pub fn if_(test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>) -> Self {
        Stmt::If {
            test,
            body,
            orelse,
            span: Span::default(),
        }
    }
}
