//! Pattern compiler
//!
//! Turns one case pattern into an ordered list of [`CompiledStep`]s that
//! test and destructure the current subject. Steps run left to right and
//! stop at the first failing test.

use crate::error::LowerError;
use crate::scope::SubjectScope;
use pun_error::{Span, Spanned};
use pun_parser::{CmpOp, Expr, KeywordPattern, Pattern, Singleton};
use tracing::trace;

/// Builtin types whose class pattern matches the subject itself
pub const SELF_MATCHING_BUILTINS: [&str; 11] = [
    "bool",
    "bytearray",
    "bytes",
    "dict",
    "float",
    "frozenset",
    "int",
    "list",
    "set",
    "str",
    "tuple",
];

#[derive(Debug, Clone, PartialEq)]
pub enum CompiledStep {
    /// Fails the case when the expression is false
    Test(Expr),

    /// Assigns `value` to `name`; always succeeds
    Bind { name: String, value: Expr },

    /// Or-pattern: the first alternative whose steps all succeed wins and
    /// later alternatives do not run
    Any(Vec<Vec<CompiledStep>>),
}

/// Compiles `pattern` against the current subject of `scope`
pub fn compile_pattern(
    pattern: &Pattern,
    scope: &mut SubjectScope,
) -> Result<Vec<CompiledStep>, LowerError> {
    let mut steps = Vec::new();
    compile_into(pattern, scope, &mut steps)?;
    Ok(steps)
}

fn compile_into(
    pattern: &Pattern,
    scope: &mut SubjectScope,
    steps: &mut Vec<CompiledStep>,
) -> Result<(), LowerError> {
    let subject = Expr::name(scope.subject());

    match pattern {
        Pattern::Wildcard(_) => {}

        Pattern::Capture { name, .. } => steps.push(CompiledStep::Bind {
            name: name.clone(),
            value: subject,
        }),

        Pattern::Literal(value) => {
            steps.push(CompiledStep::Test(Expr::compare(subject, CmpOp::Eq, value.clone())));
        }

        Pattern::Singleton(singleton, _) => {
            let value = match singleton {
                Singleton::True => Expr::bool(true),
                Singleton::False => Expr::bool(false),
                Singleton::None => Expr::none(),
            };
            steps.push(CompiledStep::Test(Expr::compare(subject, CmpOp::Is, value)));
        }

        Pattern::As { pattern, name, .. } => {
            compile_into(pattern, scope, steps)?;
            steps.push(CompiledStep::Bind {
                name: name.clone(),
                value: subject,
            });
        }

        Pattern::Or(alternatives, _) => {
            let mut compiled = Vec::with_capacity(alternatives.len());
            for alternative in alternatives {
                compiled.push(compile_pattern(alternative, scope)?);
            }
            steps.push(CompiledStep::Any(compiled));
        }

        Pattern::Class {
            cls,
            patterns,
            kwd_patterns,
            span,
        } => compile_class(cls, patterns, kwd_patterns, *span, scope, steps)?,

        Pattern::Sequence(_, span) => return Err(LowerError::unsupported("sequence", *span)),
        Pattern::Mapping { span, .. } => return Err(LowerError::unsupported("mapping", *span)),
        Pattern::Star { span, .. } => return Err(LowerError::unsupported("star", *span)),
    }

    Ok(())
}

fn self_matching_builtin(cls: &Expr) -> Option<&str> {
    match cls {
        Expr::Name(name, _) if SELF_MATCHING_BUILTINS.contains(&name.as_str()) => {
            Some(name.as_str())
        }
        _ => None,
    }
}

fn compile_class(
    cls: &Expr,
    patterns: &[Pattern],
    kwd_patterns: &[KeywordPattern],
    span: Span,
    scope: &mut SubjectScope,
    steps: &mut Vec<CompiledStep>,
) -> Result<(), LowerError> {
    let subject = Expr::name(scope.subject());

    steps.push(CompiledStep::Test(Expr::call(
        Expr::name("isinstance"),
        vec![subject, cls.clone()],
    )));

    if let Some(builtin) = self_matching_builtin(cls) {
        if patterns.len() > 1 {
            return Err(LowerError::structural(
                format!("{}() accepts at most one positional sub-pattern", builtin),
                span,
            ));
        }
        if let Some(first) = kwd_patterns.first() {
            return Err(LowerError::structural(
                format!("{}() does not accept keyword sub-patterns", builtin),
                first.pattern.span(),
            ));
        }

        trace!(builtin, "self-matching class pattern");
        if let Some(inner) = patterns.first() {
            compile_into(inner, scope, steps)?;
        }
        return Ok(());
    }

    if !patterns.is_empty() {
        let manifest = scope.manifest();

        steps.push(CompiledStep::Bind {
            name: manifest.clone(),
            value: Expr::call(
                Expr::name("getattr"),
                vec![cls.clone(), Expr::string("__match_args__"), Expr::none()],
            ),
        });
        steps.push(CompiledStep::Test(Expr::compare(
            Expr::name(&manifest),
            CmpOp::IsNot,
            Expr::none(),
        )));
        steps.push(CompiledStep::Test(Expr::call(
            Expr::name("isinstance"),
            vec![Expr::name(&manifest), Expr::name("tuple")],
        )));
        steps.push(CompiledStep::Test(Expr::compare(
            Expr::call(Expr::name("len"), vec![Expr::name(&manifest)]),
            CmpOp::GtE,
            Expr::int(patterns.len() as i64),
        )));

        for (index, pattern) in patterns.iter().enumerate() {
            let attr = Expr::subscript(Expr::name(&manifest), Expr::int(index as i64));
            compile_attribute(attr, pattern, scope, steps)?;
        }
    }

    for keyword in kwd_patterns {
        compile_attribute(Expr::string(&keyword.key), &keyword.pattern, scope, steps)?;
    }

    Ok(())
}

/// Extracts attribute `attr` of the current subject into a fresh temporary
/// and matches `pattern` against it
fn compile_attribute(
    attr: Expr,
    pattern: &Pattern,
    scope: &mut SubjectScope,
    steps: &mut Vec<CompiledStep>,
) -> Result<(), LowerError> {
    let parent = Expr::name(scope.subject());

    steps.push(CompiledStep::Test(Expr::call(
        Expr::name("hasattr"),
        vec![parent.clone(), attr.clone()],
    )));

    let temp = scope.push_temp();
    steps.push(CompiledStep::Bind {
        name: temp,
        value: Expr::call(Expr::name("getattr"), vec![parent, attr]),
    });

    let result = compile_into(pattern, scope, steps);
    scope.pop();
    result
}
