//! Rewrite driver
//!
//! Finds every match statement in a module and splices its lowering in
//! place. Case bodies are lowered before the statement that contains them,
//! so compiling a match never sees nested pattern syntax.

use crate::case::{assemble_case_statements, assemble_expression, assemble_statements, CompiledCase};
use crate::error::LowerError;
use crate::pattern::compile_pattern;
use crate::scope::{SubjectScope, SUBJECT};
use crate::{LowerOptions, Strategy};
use pun_parser::{ClassDef, FunctionDef, MatchStmt, Module, Stmt};
use tracing::{debug, trace};

/// Lowers every match statement of `module`. The first error aborts the
/// whole pass.
pub fn lower_module(module: &Module, options: &LowerOptions) -> Result<Module, LowerError> {
    let body = lower_block(&module.body, options)?;
    Ok(Module { body })
}

/// Lowers one match statement into the subject assignment followed by the
/// code selecting and running the matching case
pub fn lower_match(stmt: &MatchStmt, options: &LowerOptions) -> Result<Vec<Stmt>, LowerError> {
    if stmt.cases.is_empty() {
        return Err(LowerError::structural("match statement has no cases", stmt.span));
    }

    debug!(
        cases = stmt.cases.len(),
        strategy = ?options.strategy,
        line = stmt.span.start.line,
        "lowering match statement"
    );

    let mut scope = SubjectScope::new();
    let mut compiled = Vec::with_capacity(stmt.cases.len());

    for (index, case) in stmt.cases.iter().enumerate() {
        scope.reset();
        let steps = compile_pattern(&case.pattern, &mut scope)?;
        trace!(
            case = index + 1,
            steps = steps.len(),
            guard = case.guard.is_some(),
            "compiled case"
        );

        compiled.push(CompiledCase {
            steps,
            guard: case.guard.clone(),
            body: lower_block(&case.body, options)?,
        });
    }

    let mut stmts = vec![Stmt::assign(SUBJECT, stmt.subject.clone())];

    match options.strategy {
        Strategy::Expression => stmts.extend(assemble_expression(compiled)),
        Strategy::Statements => {
            let mut selections = Vec::with_capacity(compiled.len());
            let mut bodies = Vec::with_capacity(compiled.len());

            for (index, case) in compiled.into_iter().enumerate() {
                // flag names restart per case like temporaries
                scope.reset();
                selections.push(assemble_case_statements(
                    index as i64 + 1,
                    &case.steps,
                    case.guard.as_ref(),
                    &mut scope,
                ));
                bodies.push(case.body);
            }

            stmts.extend(assemble_statements(selections, bodies));
        }
    }

    Ok(stmts)
}

fn lower_block(stmts: &[Stmt], options: &LowerOptions) -> Result<Vec<Stmt>, LowerError> {
    let mut lowered = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        lower_stmt(stmt, options, &mut lowered)?;
    }
    Ok(lowered)
}

fn lower_stmt(stmt: &Stmt, options: &LowerOptions, out: &mut Vec<Stmt>) -> Result<(), LowerError> {
    let stmt = match stmt {
        Stmt::Match(match_stmt) => {
            out.extend(lower_match(match_stmt, options)?);
            return Ok(());
        }
        Stmt::If {
            test,
            body,
            orelse,
            span,
        } => Stmt::If {
            test: test.clone(),
            body: lower_block(body, options)?,
            orelse: lower_block(orelse, options)?,
            span: *span,
        },
        Stmt::While { test, body, span } => Stmt::While {
            test: test.clone(),
            body: lower_block(body, options)?,
            span: *span,
        },
        Stmt::For {
            target,
            iter,
            body,
            span,
        } => Stmt::For {
            target: target.clone(),
            iter: iter.clone(),
            body: lower_block(body, options)?,
            span: *span,
        },
        Stmt::FunctionDef(def) => Stmt::FunctionDef(FunctionDef {
            body: lower_block(&def.body, options)?,
            ..def.clone()
        }),
        Stmt::ClassDef(def) => Stmt::ClassDef(ClassDef {
            body: lower_block(&def.body, options)?,
            ..def.clone()
        }),
        other => other.clone(),
    };

    out.push(stmt);
    Ok(())
}
