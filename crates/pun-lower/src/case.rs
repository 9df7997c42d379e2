//! Case assembler
//!
//! Folds the compiled steps of each case into code. Two strategies exist:
//!
//! - [`Strategy::Expression`]: one boolean condition per case, binds are
//!   assignment expressions, cases form an `if`/`elif` chain.
//! - [`Strategy::Statements`]: each case is a nest of `if` statements and
//!   plain assignments that records the winning case in a selector
//!   variable; bodies are dispatched on the selector afterwards.
//!
//! [`Strategy::Expression`]: crate::Strategy::Expression
//! [`Strategy::Statements`]: crate::Strategy::Statements

use crate::pattern::CompiledStep;
use crate::scope::{SubjectScope, CASE_SELECTOR};
use pun_parser::{BoolOp, CmpOp, Expr, Stmt};

/// A case after pattern compilation
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCase {
    pub steps: Vec<CompiledStep>,
    pub guard: Option<Expr>,
    pub body: Vec<Stmt>,
}

// =========================================
// Expression strategy
// =========================================

/// `(True, (name := value))[0]`: assigns and evaluates to `True`
pub fn bind_expr(name: &str, value: Expr) -> Expr {
    Expr::subscript(
        Expr::Tuple(
            vec![Expr::bool(true), Expr::named(name, value)],
            Default::default(),
        ),
        Expr::int(0),
    )
}

fn step_expr(step: &CompiledStep) -> Expr {
    match step {
        CompiledStep::Test(test) => test.clone(),
        CompiledStep::Bind { name, value } => bind_expr(name, value.clone()),
        CompiledStep::Any(alternatives) => {
            Expr::bool_op(BoolOp::Or, alternatives.iter().map(|alt| conjunction(alt)).collect())
        }
    }
}

/// Steps joined with `and`; no steps at all is `True`
pub fn conjunction(steps: &[CompiledStep]) -> Expr {
    if steps.is_empty() {
        return Expr::bool(true);
    }
    Expr::bool_op(BoolOp::And, steps.iter().map(step_expr).collect())
}

/// Condition of one case: its steps, then the guard
pub fn case_condition(steps: &[CompiledStep], guard: Option<&Expr>) -> Expr {
    let mut values: Vec<Expr> = steps.iter().map(step_expr).collect();
    values.extend(guard.cloned());

    if values.is_empty() {
        return Expr::bool(true);
    }
    Expr::bool_op(BoolOp::And, values)
}

/// Chains the cases into `if c1: ... elif c2: ...` in source order. No final
/// `else` is added, so a subject matching no case runs nothing.
pub fn assemble_expression(cases: Vec<CompiledCase>) -> Vec<Stmt> {
    let mut orelse = Vec::new();

    for case in cases.into_iter().rev() {
        let test = case_condition(&case.steps, case.guard.as_ref());
        orelse = vec![Stmt::if_(test, non_empty(case.body), orelse)];
    }

    orelse
}

// =========================================
// Statements strategy
// =========================================

fn selector_is(value: i64) -> Expr {
    Expr::compare(Expr::name(CASE_SELECTOR), CmpOp::Eq, Expr::int(value))
}

/// Statements running `steps` in order. `tail` runs only when every test
/// passed.
fn nest_steps(steps: &[CompiledStep], tail: Vec<Stmt>, scope: &mut SubjectScope) -> Vec<Stmt> {
    let Some((first, rest)) = steps.split_first() else {
        return tail;
    };

    match first {
        CompiledStep::Test(test) => {
            vec![Stmt::if_(test.clone(), nest_steps(rest, tail, scope), Vec::new())]
        }
        CompiledStep::Bind { name, value } => {
            let mut stmts = vec![Stmt::assign(name.as_str(), value.clone())];
            stmts.extend(nest_steps(rest, tail, scope));
            stmts
        }
        CompiledStep::Any(alternatives) => {
            let flag = scope.next_flag();
            let mut stmts = vec![Stmt::assign(flag.as_str(), Expr::bool(false))];

            for (index, alternative) in alternatives.iter().enumerate() {
                let matched = vec![Stmt::assign(flag.as_str(), Expr::bool(true))];
                let attempt = nest_steps(alternative, matched, scope);
                if index == 0 {
                    stmts.extend(attempt);
                } else {
                    stmts.push(Stmt::if_(Expr::not(Expr::name(&flag)), attempt, Vec::new()));
                }
            }

            stmts.push(Stmt::if_(
                Expr::name(&flag),
                nest_steps(rest, tail, scope),
                Vec::new(),
            ));
            stmts
        }
    }
}

/// Statements that set the case selector to `number` when the case matches
pub fn assemble_case_statements(
    number: i64,
    steps: &[CompiledStep],
    guard: Option<&Expr>,
    scope: &mut SubjectScope,
) -> Vec<Stmt> {
    let mut tail = vec![Stmt::assign(CASE_SELECTOR, Expr::int(number))];
    if let Some(guard) = guard {
        tail = vec![Stmt::if_(guard.clone(), tail, Vec::new())];
    }

    let stmts = nest_steps(steps, tail, scope);
    if number == 1 {
        stmts
    } else {
        vec![Stmt::if_(selector_is(0), stmts, Vec::new())]
    }
}

/// Selector initialisation, the case selections, then the body dispatch
pub fn assemble_statements(selections: Vec<Vec<Stmt>>, bodies: Vec<Vec<Stmt>>) -> Vec<Stmt> {
    let mut stmts = vec![Stmt::assign(CASE_SELECTOR, Expr::int(0))];
    stmts.extend(selections.into_iter().flatten());

    let mut orelse = Vec::new();
    for (index, body) in bodies.into_iter().enumerate().rev() {
        orelse = vec![Stmt::if_(
            selector_is(index as i64 + 1),
            non_empty(body),
            orelse,
        )];
    }
    stmts.extend(orelse);

    stmts
}

fn non_empty(body: Vec<Stmt>) -> Vec<Stmt> {
    if body.is_empty() {
        vec![Stmt::Pass(Default::default())]
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test(name: &str) -> CompiledStep {
        CompiledStep::Test(Expr::name(name))
    }

    fn bind(name: &str, value: &str) -> CompiledStep {
        CompiledStep::Bind {
            name: name.into(),
            value: Expr::name(value),
        }
    }

    #[test]
    fn test_empty_case_is_true() {
        assert_eq!(case_condition(&[], None), Expr::bool(true));
    }

    #[test]
    fn test_guard_comes_last() {
        let guard = Expr::name("g");
        let condition = case_condition(&[test("a"), bind("x", "s")], Some(&guard));
        match condition {
            Expr::BoolOp {
                op: BoolOp::And,
                values,
                ..
            } => {
                assert_eq!(values.len(), 3);
                assert_eq!(values[0], Expr::name("a"));
                assert_eq!(values[1], bind_expr("x", Expr::name("s")));
                assert_eq!(values[2], guard);
            }
            other => panic!("expected and-chain, got {:?}", other),
        }
    }

    #[test]
    fn test_bind_is_true_tuple_subscript() {
        match bind_expr("x", Expr::name("s")) {
            Expr::Subscript { value, index, .. } => {
                assert_eq!(*index, Expr::int(0));
                match *value {
                    Expr::Tuple(items, _) => {
                        assert_eq!(items[0], Expr::bool(true));
                        assert!(matches!(
                            &items[1],
                            Expr::NamedExpr { target, value, .. }
                                if target == "x" && **value == Expr::name("s")
                        ));
                    }
                    other => panic!("expected tuple, got {:?}", other),
                }
            }
            other => panic!("expected subscript, got {:?}", other),
        }
    }

    #[test]
    fn test_guard_alone() {
        assert_eq!(case_condition(&[], Some(&Expr::name("g"))), Expr::name("g"));
    }

    #[test]
    fn test_any_folds_to_or() {
        let step = CompiledStep::Any(vec![
            vec![test("a"), bind("x", "s")],
            vec![],
            vec![test("b")],
        ]);
        match case_condition(&[step], None) {
            Expr::BoolOp {
                op: BoolOp::Or,
                values,
                ..
            } => {
                assert_eq!(values.len(), 3);
                assert_eq!(
                    values[0],
                    Expr::bool_op(
                        BoolOp::And,
                        vec![Expr::name("a"), bind_expr("x", Expr::name("s"))],
                    )
                );
                assert_eq!(values[1], Expr::bool(true));
                assert_eq!(values[2], Expr::name("b"));
            }
            other => panic!("expected or-chain, got {:?}", other),
        }
    }

    #[test]
    fn test_expression_chain_keeps_order() {
        let cases = vec![
            CompiledCase {
                steps: vec![test("a")],
                guard: None,
                body: vec![Stmt::Pass(Default::default())],
            },
            CompiledCase {
                steps: vec![test("b")],
                guard: None,
                body: vec![Stmt::Break(Default::default())],
            },
        ];

        let stmts = assemble_expression(cases);
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::If { test, orelse, .. } => {
                assert_eq!(test, &Expr::name("a"));
                match &orelse[..] {
                    [Stmt::If { test, body, orelse, .. }] => {
                        assert_eq!(test, &Expr::name("b"));
                        assert!(matches!(body[..], [Stmt::Break(_)]));
                        assert!(orelse.is_empty());
                    }
                    other => panic!("expected elif, got {:?}", other),
                }
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_later_case_waits_for_selector() {
        let mut scope = SubjectScope::new();
        let stmts = assemble_case_statements(2, &[bind("x", "s")], None, &mut scope);

        assert_eq!(
            stmts,
            vec![Stmt::if_(
                selector_is(0),
                vec![
                    Stmt::assign("x", Expr::name("s")),
                    Stmt::assign("__match_case", Expr::int(2)),
                ],
                vec![],
            )]
        );
    }

    #[test]
    fn test_tests_nest_and_guard_is_innermost() {
        let mut scope = SubjectScope::new();
        let guard = Expr::name("g");
        let stmts = assemble_case_statements(1, &[test("a")], Some(&guard), &mut scope);

        assert_eq!(
            stmts,
            vec![Stmt::if_(
                Expr::name("a"),
                vec![Stmt::if_(
                    guard,
                    vec![Stmt::assign("__match_case", Expr::int(1))],
                    vec![],
                )],
                vec![],
            )]
        );
    }

    #[test]
    fn test_alternatives_use_flag() {
        let mut scope = SubjectScope::new();
        let step = CompiledStep::Any(vec![vec![test("a")], vec![test("b")]]);
        let stmts = assemble_case_statements(1, &[step], None, &mut scope);

        let flag_set = || vec![Stmt::assign("__match_alt1", Expr::bool(true))];
        assert_eq!(
            stmts,
            vec![
                Stmt::assign("__match_alt1", Expr::bool(false)),
                Stmt::if_(Expr::name("a"), flag_set(), vec![]),
                Stmt::if_(
                    Expr::not(Expr::name("__match_alt1")),
                    vec![Stmt::if_(Expr::name("b"), flag_set(), vec![])],
                    vec![],
                ),
                Stmt::if_(
                    Expr::name("__match_alt1"),
                    vec![Stmt::assign("__match_case", Expr::int(1))],
                    vec![],
                ),
            ]
        );
    }

    #[test]
    fn test_dispatch_on_selector() {
        let stmts = assemble_statements(
            vec![vec![], vec![]],
            vec![vec![Stmt::Pass(Default::default())], vec![]],
        );

        assert_eq!(stmts[0], Stmt::assign("__match_case", Expr::int(0)));
        assert_eq!(
            stmts[1],
            Stmt::if_(
                selector_is(1),
                vec![Stmt::Pass(Default::default())],
                vec![Stmt::if_(
                    selector_is(2),
                    vec![Stmt::Pass(Default::default())],
                    vec![]
                )],
            )
        );
    }
}
