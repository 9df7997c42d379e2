//! Python Backend - Prints syntax trees as Python source

use crate::{CodeGen, EmitOptions};
use pun_parser::{
    BinOp, BoolOp, Expr, KeywordPattern, MatchStmt, Module, Param, Pattern, Singleton, Stmt,
    UnaryOp,
};

/// Binding strength of each expression form, weakest first
mod prec {
    pub const NAMED: u8 = 0;
    pub const OR: u8 = 1;
    pub const AND: u8 = 2;
    pub const NOT: u8 = 3;
    pub const COMPARE: u8 = 4;
    pub const ARITH: u8 = 5;
    pub const TERM: u8 = 6;
    pub const UNARY: u8 = 7;
    pub const POWER: u8 = 8;
    pub const ATOM: u8 = 9;
}

/// Python source backend
#[derive(Debug, Default)]
pub struct PythonBackend {
    options: EmitOptions,
}

impl PythonBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EmitOptions) -> Self {
        Self { options }
    }

    fn indent(&self, depth: usize) -> String {
        " ".repeat(depth * self.options.indent_width)
    }

    fn line(&self, output: &mut String, depth: usize, text: &str) {
        output.push_str(&self.indent(depth));
        output.push_str(text);
        output.push('\n');
    }

    // =========================================
    // Statements
    // =========================================

    fn emit_block(&self, stmts: &[Stmt], output: &mut String, depth: usize) {
        if stmts.is_empty() {
            self.line(output, depth, "pass");
            return;
        }

        for (index, stmt) in stmts.iter().enumerate() {
            let is_definition = matches!(stmt, Stmt::FunctionDef(_) | Stmt::ClassDef(_));
            if depth == 0 && is_definition && index > 0 {
                output.push('\n');
            }

            self.emit_stmt(stmt, output, depth);

            let next_is_plain = stmts
                .get(index + 1)
                .is_some_and(|next| !matches!(next, Stmt::FunctionDef(_) | Stmt::ClassDef(_)));
            if depth == 0 && is_definition && next_is_plain {
                output.push('\n');
            }
        }
    }

    fn emit_stmt(&self, stmt: &Stmt, output: &mut String, depth: usize) {
        match stmt {
            Stmt::Expr(expr) => self.line(output, depth, &self.expr(expr)),
            Stmt::Assign { targets, value, .. } => {
                let mut text = String::new();
                for target in targets {
                    text.push_str(&self.expr(target));
                    text.push_str(" = ");
                }
                text.push_str(&self.expr(value));
                self.line(output, depth, &text);
            }
            Stmt::AugAssign {
                target, op, value, ..
            } => {
                let text = format!("{} {}= {}", self.expr(target), op.as_str(), self.expr(value));
                self.line(output, depth, &text);
            }
            Stmt::AnnAssign {
                target,
                annotation,
                value,
                ..
            } => {
                let mut text = format!("{}: {}", self.expr(target), self.expr(annotation));
                if let Some(value) = value {
                    text.push_str(" = ");
                    text.push_str(&self.expr(value));
                }
                self.line(output, depth, &text);
            }
            Stmt::If {
                test, body, orelse, ..
            } => self.emit_if("if", test, body, orelse, output, depth),
            Stmt::While { test, body, .. } => {
                self.line(output, depth, &format!("while {}:", self.expr(test)));
                self.emit_block(body, output, depth + 1);
            }
            Stmt::For {
                target, iter, body, ..
            } => {
                let header = format!("for {} in {}:", self.expr(target), self.expr(iter));
                self.line(output, depth, &header);
                self.emit_block(body, output, depth + 1);
            }
            Stmt::FunctionDef(def) => {
                let params: Vec<String> = def.params.iter().map(|p| self.param(p)).collect();
                let mut header = format!("def {}({})", def.name, params.join(", "));
                if let Some(returns) = &def.returns {
                    header.push_str(" -> ");
                    header.push_str(&self.expr(returns));
                }
                header.push(':');
                self.line(output, depth, &header);
                self.emit_block(&def.body, output, depth + 1);
            }
            Stmt::ClassDef(def) => {
                let header = if def.bases.is_empty() {
                    format!("class {}:", def.name)
                } else {
                    format!("class {}({}):", def.name, self.expr_list(&def.bases))
                };
                self.line(output, depth, &header);
                self.emit_block(&def.body, output, depth + 1);
            }
            Stmt::Return { value, .. } => match value {
                Some(value) => self.line(output, depth, &format!("return {}", self.expr(value))),
                None => self.line(output, depth, "return"),
            },
            Stmt::Pass(_) => self.line(output, depth, "pass"),
            Stmt::Break(_) => self.line(output, depth, "break"),
            Stmt::Continue(_) => self.line(output, depth, "continue"),
            Stmt::Import { names, .. } => {
                let names: Vec<String> = names
                    .iter()
                    .map(|a| self.alias(&a.name, &a.asname))
                    .collect();
                self.line(output, depth, &format!("import {}", names.join(", ")));
            }
            Stmt::ImportFrom {
                module,
                level,
                names,
                ..
            } => {
                let names = if names.is_empty() {
                    "*".to_string()
                } else {
                    let names: Vec<String> =
                        names.iter().map(|a| self.alias(&a.name, &a.asname)).collect();
                    names.join(", ")
                };
                let dots = ".".repeat(*level as usize);
                self.line(output, depth, &format!("from {}{} import {}", dots, module, names));
            }
            Stmt::Match(stmt) => self.emit_match(stmt, output, depth),
        }
    }

    /// `elif` is used when the else branch is exactly one `if`
    fn emit_if(
        &self,
        keyword: &str,
        test: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
        output: &mut String,
        depth: usize,
    ) {
        self.line(output, depth, &format!("{} {}:", keyword, self.expr(test)));
        self.emit_block(body, output, depth + 1);

        match orelse {
            [] => {}
            [Stmt::If {
                test, body, orelse, ..
            }] => self.emit_if("elif", test, body, orelse, output, depth),
            _ => {
                self.line(output, depth, "else:");
                self.emit_block(orelse, output, depth + 1);
            }
        }
    }

    fn emit_match(&self, stmt: &MatchStmt, output: &mut String, depth: usize) {
        self.line(output, depth, &format!("match {}:", self.expr(&stmt.subject)));
        for case in &stmt.cases {
            let mut header = format!("case {}", self.pattern(&case.pattern));
            if let Some(guard) = &case.guard {
                header.push_str(" if ");
                header.push_str(&self.expr(guard));
            }
            header.push(':');
            self.line(output, depth + 1, &header);
            self.emit_block(&case.body, output, depth + 2);
        }
    }

    fn param(&self, param: &Param) -> String {
        let mut text = param.name.clone();
        if let Some(annotation) = &param.annotation {
            text.push_str(": ");
            text.push_str(&self.expr(annotation));
        }
        if let Some(default) = &param.default {
            text.push_str(if param.annotation.is_some() { " = " } else { "=" });
            text.push_str(&self.expr(default));
        }
        text
    }

    fn alias(&self, name: &str, asname: &Option<String>) -> String {
        match asname {
            Some(asname) => format!("{} as {}", name, asname),
            None => name.to_string(),
        }
    }

    // =========================================
    // Patterns
    // =========================================

    fn pattern(&self, pattern: &Pattern) -> String {
        match pattern {
            Pattern::Wildcard(_) => "_".to_string(),
            Pattern::Capture { name, .. } => name.clone(),
            Pattern::Literal(value) => self.expr(value),
            Pattern::Singleton(singleton, _) => match singleton {
                Singleton::True => "True",
                Singleton::False => "False",
                Singleton::None => "None",
            }
            .to_string(),
            Pattern::As { pattern, name, .. } => {
                let inner = self.pattern(pattern);
                if matches!(**pattern, Pattern::As { .. }) {
                    format!("({}) as {}", inner, name)
                } else {
                    format!("{} as {}", inner, name)
                }
            }
            Pattern::Or(alternatives, _) => alternatives
                .iter()
                .map(|alt| match alt {
                    Pattern::As { .. } | Pattern::Or(..) => format!("({})", self.pattern(alt)),
                    _ => self.pattern(alt),
                })
                .collect::<Vec<_>>()
                .join(" | "),
            Pattern::Class {
                cls,
                patterns,
                kwd_patterns,
                ..
            } => {
                let mut args: Vec<String> = patterns.iter().map(|p| self.pattern(p)).collect();
                args.extend(
                    kwd_patterns
                        .iter()
                        .map(|KeywordPattern { key, pattern }| {
                            format!("{}={}", key, self.pattern(pattern))
                        }),
                );
                format!("{}({})", self.expr(cls), args.join(", "))
            }
            Pattern::Sequence(items, _) => {
                let items: Vec<String> = items.iter().map(|p| self.pattern(p)).collect();
                format!("[{}]", items.join(", "))
            }
            Pattern::Mapping {
                keys,
                patterns,
                rest,
                ..
            } => {
                let mut items: Vec<String> = keys
                    .iter()
                    .zip(patterns)
                    .map(|(key, pattern)| format!("{}: {}", self.expr(key), self.pattern(pattern)))
                    .collect();
                if let Some(rest) = rest {
                    items.push(format!("**{}", rest));
                }
                format!("{{{}}}", items.join(", "))
            }
            Pattern::Star { name, .. } => format!("*{}", name.as_deref().unwrap_or("_")),
        }
    }

    // =========================================
    // Expressions
    // =========================================

    fn expr(&self, expr: &Expr) -> String {
        self.expr_prec(expr, prec::NAMED)
    }

    fn expr_list(&self, exprs: &[Expr]) -> String {
        exprs
            .iter()
            .map(|e| self.expr_prec(e, prec::OR))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn precedence(expr: &Expr) -> u8 {
        match expr {
            Expr::NamedExpr { .. } => prec::NAMED,
            Expr::BoolOp { op: BoolOp::Or, .. } => prec::OR,
            Expr::BoolOp { op: BoolOp::And, .. } => prec::AND,
            Expr::UnaryOp {
                op: UnaryOp::Not, ..
            } => prec::NOT,
            Expr::Compare { .. } => prec::COMPARE,
            Expr::BinOp {
                op: BinOp::Add | BinOp::Sub,
                ..
            } => prec::ARITH,
            Expr::BinOp { op: BinOp::Pow, .. } => prec::POWER,
            Expr::BinOp { .. } => prec::TERM,
            Expr::UnaryOp { .. } => prec::UNARY,
            Expr::Int(n, _) if *n < 0 => prec::UNARY,
            Expr::Float(n, _) if n.is_sign_negative() => prec::UNARY,
            _ => prec::ATOM,
        }
    }

    /// Prints `expr` in a position that needs at least `min` binding
    /// strength, parenthesising when it binds weaker
    fn expr_prec(&self, expr: &Expr, min: u8) -> String {
        let text = self.expr_raw(expr);
        let own = Self::precedence(expr);
        if own < min || own == prec::NAMED {
            format!("({})", text)
        } else {
            text
        }
    }

    fn expr_raw(&self, expr: &Expr) -> String {
        match expr {
            Expr::Name(name, _) => name.clone(),
            Expr::Int(n, _) => n.to_string(),
            Expr::Float(n, _) => float_literal(*n),
            Expr::Str(s, _) => string_literal(s),
            Expr::Bool(true, _) => "True".to_string(),
            Expr::Bool(false, _) => "False".to_string(),
            Expr::None(_) => "None".to_string(),
            Expr::Tuple(elements, _) => match elements.len() {
                0 => "()".to_string(),
                1 => format!("({},)", self.expr_list(elements)),
                _ => format!("({})", self.expr_list(elements)),
            },
            Expr::List(elements, _) => format!("[{}]", self.expr_list(elements)),
            Expr::Attribute { value, attr, .. } => {
                format!("{}.{}", self.expr_prec(value, prec::ATOM), attr)
            }
            Expr::Subscript { value, index, .. } => format!(
                "{}[{}]",
                self.expr_prec(value, prec::ATOM),
                self.expr(index)
            ),
            Expr::Call {
                func,
                args,
                keywords,
                ..
            } => {
                let mut parts: Vec<String> =
                    args.iter().map(|a| self.expr_prec(a, prec::OR)).collect();
                parts.extend(
                    keywords
                        .iter()
                        .map(|k| format!("{}={}", k.name, self.expr_prec(&k.value, prec::OR))),
                );
                format!("{}({})", self.expr_prec(func, prec::ATOM), parts.join(", "))
            }
            Expr::BinOp {
                left, op, right, ..
            } => {
                let own = Self::precedence(expr);
                // `**` groups to the right, everything else to the left
                let (left_min, right_min) = if *op == BinOp::Pow {
                    (prec::ATOM, prec::UNARY)
                } else {
                    (own, own + 1)
                };
                format!(
                    "{} {} {}",
                    self.expr_prec(left, left_min),
                    op.as_str(),
                    self.expr_prec(right, right_min)
                )
            }
            Expr::UnaryOp { op, operand, .. } => match op {
                UnaryOp::Not => format!("not {}", self.expr_prec(operand, prec::NOT)),
                UnaryOp::Neg => format!("-{}", self.expr_prec(operand, prec::UNARY)),
                UnaryOp::Pos => format!("+{}", self.expr_prec(operand, prec::UNARY)),
            },
            Expr::BoolOp { op, values, .. } => {
                let (keyword, own) = match op {
                    BoolOp::And => (" and ", prec::AND),
                    BoolOp::Or => (" or ", prec::OR),
                };
                values
                    .iter()
                    .map(|v| self.expr_prec(v, own + 1))
                    .collect::<Vec<_>>()
                    .join(keyword)
            }
            Expr::Compare {
                left,
                ops,
                comparators,
                ..
            } => {
                let mut text = self.expr_prec(left, prec::ARITH);
                for (op, comparator) in ops.iter().zip(comparators) {
                    text.push(' ');
                    text.push_str(op.as_str());
                    text.push(' ');
                    text.push_str(&self.expr_prec(comparator, prec::ARITH));
                }
                text
            }
            Expr::NamedExpr { target, value, .. } => {
                format!("{} := {}", target, self.expr_prec(value, prec::OR))
            }
        }
    }
}

impl CodeGen for PythonBackend {
    type Output = String;

    fn generate(&self, module: &Module) -> String {
        let mut output = String::new();
        if !module.body.is_empty() {
            self.emit_block(&module.body, &mut output, 0);
        }
        output
    }
}

/// Floats always keep a fraction or exponent so they read back as floats
fn float_literal(value: f64) -> String {
    if value.is_nan() {
        "float(\"nan\")".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "float(\"inf\")".to_string()
        } else {
            "float(\"-inf\")".to_string()
        }
    } else {
        format!("{:?}", value)
    }
}

fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pun_lexer::Lexer;
    use pun_parser::{parse, CmpOp};

    fn roundtrip(source: &str) -> String {
        let mut lexer = Lexer::new(source, 0);
        let (module, diags) = parse(lexer.tokenize());
        assert!(!diags.has_errors(), "{:?}", diags);
        PythonBackend::new().generate(&module)
    }

    fn emit_expr(expr: Expr) -> String {
        PythonBackend::new().expr(&expr)
    }

    #[test]
    fn test_bind_expression_shape() {
        let bind = Expr::subscript(
            Expr::Tuple(
                vec![Expr::bool(true), Expr::named("x", Expr::name("__match_subject"))],
                Default::default(),
            ),
            Expr::int(0),
        );
        assert_eq!(emit_expr(bind), "(True, (x := __match_subject))[0]");
    }

    #[test]
    fn test_or_inside_and_is_parenthesised() {
        let expr = Expr::bool_op(
            pun_parser::BoolOp::And,
            vec![
                Expr::name("a"),
                Expr::bool_op(pun_parser::BoolOp::Or, vec![Expr::name("b"), Expr::name("c")]),
            ],
        );
        assert_eq!(emit_expr(expr), "a and (b or c)");
    }

    #[test]
    fn test_comparison_operands() {
        let expr = Expr::compare(
            Expr::call(Expr::name("len"), vec![Expr::name("__match_args")]),
            CmpOp::GtE,
            Expr::int(2),
        );
        assert_eq!(emit_expr(expr), "len(__match_args) >= 2");

        let is_not = Expr::compare(Expr::name("m"), CmpOp::IsNot, Expr::none());
        assert_eq!(emit_expr(Expr::not(is_not)), "not m is not None");
    }

    #[test]
    fn test_arithmetic_grouping() {
        assert_eq!(roundtrip("x = (a - b) - c\n"), "x = a - b - c\n");
        assert_eq!(roundtrip("x = a - (b - c)\n"), "x = a - (b - c)\n");
        assert_eq!(roundtrip("x = (a + b) * c\n"), "x = (a + b) * c\n");
        assert_eq!(roundtrip("x = (-2) ** 2\n"), "x = (-2) ** 2\n");
        assert_eq!(roundtrip("x = 2 ** -1\n"), "x = 2 ** -1\n");
    }

    #[test]
    fn test_literals() {
        assert_eq!(roundtrip("x = 'say \"hi\"\\n'\n"), "x = \"say \\\"hi\\\"\\n\"\n");
        assert_eq!(roundtrip("x = 1.0\n"), "x = 1.0\n");
        assert_eq!(roundtrip("x = (1,)\n"), "x = (1,)\n");
        assert_eq!(roundtrip("x = 1, 2\n"), "x = (1, 2)\n");
    }

    #[test]
    fn test_elif_chain() {
        let source = "if a:\n    pass\nelif b:\n    x = 1\nelse:\n    x = 2\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_definitions() {
        let source = "\
class Point(Base):
    __match_args__ = (\"x\", \"y\")

    def __init__(self, x: int, y: int = 0) -> None:
        self.x = x
        self.y = y


p = Point(1)
";
        let expected = "\
class Point(Base):
    __match_args__ = (\"x\", \"y\")
    def __init__(self, x: int, y: int = 0) -> None:
        self.x = x
        self.y = y

p = Point(1)
";
        assert_eq!(roundtrip(source), expected);
    }

    #[test]
    fn test_imports_kept_verbatim() {
        let source = "import os.path as p\nfrom ..pkg import a as b, c\nfrom x import *\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_match_printed_back() {
        let source = "\
match command:
    case Point(0, y=1 | 2) as p if p:
        pass
    case [a, *rest]:
        pass
    case _:
        pass
";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_indent_width_option() {
        let module = Module {
            body: vec![Stmt::if_(Expr::name("a"), vec![Stmt::Pass(Default::default())], vec![])],
        };
        let backend = PythonBackend::with_options(EmitOptions { indent_width: 2 });
        assert_eq!(backend.generate(&module), "if a:\n  pass\n");
    }
}
