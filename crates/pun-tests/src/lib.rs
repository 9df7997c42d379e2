//! Integration tests for the pun lowering pipeline
//!
//! This crate drives complete runs of the pipeline:
//! Source → Lexer → Parser → Lowering → Emitter → (re-parse) → Evaluator
//!
//! Programs are evaluated from the *emitted* source, so every run also
//! checks that the printed output is valid input again.

use pun_codegen::{CodeGen, PythonBackend};
use pun_error::Diagnostics;
use pun_eval::{EvalError, Interpreter};
use pun_lexer::Lexer;
use pun_lower::{lower_module, LowerError, LowerOptions, Strategy};
use pun_parser::{parse, Module};

/// Result of lowering a source file
#[derive(Debug)]
pub struct LowerResult {
    /// Front-end diagnostics
    pub diagnostics: Diagnostics,
    /// Set when the lowering pass itself rejected the module
    pub error: Option<LowerError>,
    /// The lowered tree (if successful)
    pub lowered: Option<Module>,
    /// Emitted source of the lowered tree (if successful)
    pub code: Option<String>,
}

impl LowerResult {
    pub fn success(&self) -> bool {
        self.code.is_some()
    }
}

fn parse_source(source: &str) -> (Module, Diagnostics) {
    let mut lexer = Lexer::new(source, 0);
    let tokens = lexer.tokenize();
    let mut diagnostics = lexer.take_diagnostics();
    let (module, parse_diags) = parse(tokens);
    diagnostics.extend(parse_diags);
    (module, diagnostics)
}

/// Lowers source code with the given strategy and emits the result
pub fn lower(source: &str, strategy: Strategy) -> LowerResult {
    let (module, diagnostics) = parse_source(source);
    if diagnostics.has_errors() {
        return LowerResult {
            diagnostics,
            error: None,
            lowered: None,
            code: None,
        };
    }

    match lower_module(&module, &LowerOptions { strategy }) {
        Ok(lowered) => {
            let code = PythonBackend::new().generate(&lowered);
            LowerResult {
                diagnostics,
                error: None,
                lowered: Some(lowered),
                code: Some(code),
            }
        }
        Err(error) => LowerResult {
            diagnostics,
            error: Some(error),
            lowered: None,
            code: None,
        },
    }
}

/// Lowers, emits, re-parses the emitted source and evaluates it. Returns
/// the interpreter so tests can inspect module globals.
pub fn execute(source: &str, strategy: Strategy) -> (Interpreter, Result<(), EvalError>) {
    let code = lowered_code(source, strategy);
    let (module, diagnostics) = parse_source(&code);
    if diagnostics.has_errors() {
        panic!(
            "Emitted source does not parse:\n{:?}\n\nEmitted code:\n{}",
            diagnostics, code
        );
    }

    let mut interpreter = Interpreter::new();
    let result = interpreter.run(&module);
    (interpreter, result)
}

/// Output printed by the lowered program
pub fn run(source: &str, strategy: Strategy) -> String {
    let (mut interpreter, result) = execute(source, strategy);
    if let Err(e) = result {
        panic!(
            "Lowered program failed ({}): {}\n\nEmitted code:\n{}",
            strategy,
            e,
            lowered_code(source, strategy)
        );
    }
    interpreter.take_output()
}

/// Asserts the lowered program prints `expected` under both strategies
pub fn assert_output(source: &str, expected: &str) {
    for strategy in [Strategy::Expression, Strategy::Statements] {
        let output = run(source, strategy);
        if output != expected {
            panic!(
                "Output mismatch with the {} strategy.\n\n\
                 Expected:\n{}\nGot:\n{}\nEmitted code:\n{}",
                strategy,
                expected,
                output,
                lowered_code(source, strategy)
            );
        }
    }
}

/// Emitted source of the lowered module, panicking on any error
pub fn lowered_code(source: &str, strategy: Strategy) -> String {
    let result = lower(source, strategy);
    match result.code {
        Some(code) => code,
        None => panic!(
            "Expected source to lower, but got errors:\n{:?}\n{:?}",
            result.diagnostics, result.error
        ),
    }
}

/// Asserts that the lowering pass rejects the source
pub fn assert_lower_fails(source: &str) -> LowerError {
    let result = lower(source, Strategy::Expression);
    if result.diagnostics.has_errors() {
        panic!(
            "Expected a lowering error, but parsing failed:\n{:?}",
            result.diagnostics
        );
    }
    match result.error {
        Some(error) => error,
        None => panic!("Expected lowering to fail, but it succeeded"),
    }
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pun_eval::Value;

    const POINT: &str = "\
class Point:
    __match_args__ = ('x', 'y')

    def __init__(self, x, y):
        self.x = x
        self.y = y
";

    fn with_point(body: &str) -> String {
        format!("{}\n{}", POINT, body)
    }

    // =========================================
    // Emitted shape
    // =========================================

    #[test]
    fn test_emitted_expression_chain() {
        let source = "\
match 1:
    case True:
        pass
    case None:
        pass
    case int(x):
        pass
    case int():
        pass
    case int(x) if x % 2 == 0:
        pass
    case 1 as x:
        pass
    case C():
        pass
    case C(1):
        pass
    case C(1, 2):
        pass
    case C(x=1):
        pass
    case 1 | 2 | 3:
        pass
    case _:
        pass
";
        let expected = "\
__match_subject = 1
if __match_subject is True:
    pass
elif __match_subject is None:
    pass
elif isinstance(__match_subject, int) and (True, (x := __match_subject))[0]:
    pass
elif isinstance(__match_subject, int):
    pass
elif isinstance(__match_subject, int) and (True, (x := __match_subject))[0] and x % 2 == 0:
    pass
elif __match_subject == 1 and (True, (x := __match_subject))[0]:
    pass
elif isinstance(__match_subject, C):
    pass
elif isinstance(__match_subject, C) and (True, (__match_args := getattr(C, \"__match_args__\", None)))[0] and __match_args is not None and isinstance(__match_args, tuple) and len(__match_args) >= 1 and hasattr(__match_subject, __match_args[0]) and (True, (__match_subject1 := getattr(__match_subject, __match_args[0])))[0] and __match_subject1 == 1:
    pass
elif isinstance(__match_subject, C) and (True, (__match_args := getattr(C, \"__match_args__\", None)))[0] and __match_args is not None and isinstance(__match_args, tuple) and len(__match_args) >= 2 and hasattr(__match_subject, __match_args[0]) and (True, (__match_subject1 := getattr(__match_subject, __match_args[0])))[0] and __match_subject1 == 1 and hasattr(__match_subject, __match_args[1]) and (True, (__match_subject2 := getattr(__match_subject, __match_args[1])))[0] and __match_subject2 == 2:
    pass
elif isinstance(__match_subject, C) and hasattr(__match_subject, \"x\") and (True, (__match_subject1 := getattr(__match_subject, \"x\")))[0] and __match_subject1 == 1:
    pass
elif __match_subject == 1 or __match_subject == 2 or __match_subject == 3:
    pass
elif True:
    pass
";
        assert_eq!(lowered_code(source, Strategy::Expression), expected);
    }

    #[test]
    fn test_statements_strategy_has_no_assignment_expressions() {
        let source = with_point(
            "\
match Point(1, 2):
    case Point(0, y) | Point(y, 0):
        print(y)
    case Point(x, y) if x < y:
        print(x, y)
",
        );
        let code = lowered_code(&source, Strategy::Statements);
        assert!(!code.contains(":="), "{}", code);
        assert!(code.contains("__match_case = 0"));
        assert!(code.contains("__match_alt1 = False"));
        assert!(code.contains("if __match_case == 2:"));
    }

    #[test]
    fn test_generated_names_restart_per_case() {
        let source = with_point(
            "\
match Point(3, 0):
    case Point(1, y) | Point(y, 1):
        print(\"one\", y)
    case Point(3, y) | Point(y, 3):
        print(\"three\", y)
",
        );
        let code = lowered_code(&source, Strategy::Statements);

        assert_eq!(code.matches("__match_alt1 = False").count(), 2, "{}", code);
        assert!(!code.contains("__match_alt2"), "{}", code);
        assert!(code.contains("__match_subject4"), "{}", code);
        assert!(!code.contains("__match_subject5"), "{}", code);
        assert_output(&source, "three 0\n");
    }

    #[test]
    fn test_subject_is_evaluated_once() {
        let source = "\
class Counter:
    def __init__(self):
        self.n = 0

counter = Counter()

def subject():
    counter.n = counter.n + 1
    return 7

match subject():
    case 1:
        pass
    case 2 | 3:
        pass
    case int(x) if x > 100:
        pass
    case x:
        print('captured', x)
print(counter.n)
";
        assert_output(source, "captured 7\n1\n");
    }

    #[test]
    fn test_plain_code_is_unchanged() {
        let source = "match = 1\nmatch(2)\nx = match + 1\n";
        let code = lowered_code(source, Strategy::Expression);
        assert_eq!(code, "match = 1\nmatch(2)\nx = match + 1\n");
    }

    // =========================================
    // Behavioural properties
    // =========================================

    #[test]
    fn test_order_preservation() {
        let source = "\
for value in [1, 2, 3, 4]:
    match value:
        case 1:
            print('first')
        case 2:
            print('second')
        case 2 | 3:
            print('third')
        case 3:
            print('fourth')
";
        assert_output(source, "first\nsecond\nthird\n");
    }

    #[test]
    fn test_singleton_uses_identity() {
        let source = "\
match 1:
    case True:
        print('identity')
    case _:
        print('rejected')
match True:
    case 1:
        print('equal')
";
        assert_output(source, "rejected\nequal\n");
    }

    #[test]
    fn test_guard_sees_captures() {
        let source = "\
for value in [3, 4]:
    match value:
        case n if n % 2 == 0:
            print('even', n)
        case n:
            print('odd', n)
";
        assert_output(source, "odd 3\neven 4\n");
    }

    #[test]
    fn test_or_pattern_short_circuits() {
        let source = "\
match 1:
    case (1 as first) | (1 as second):
        print(first)
";
        for strategy in [Strategy::Expression, Strategy::Statements] {
            let (mut interpreter, result) = execute(source, strategy);
            assert!(result.is_ok());
            assert_eq!(interpreter.take_output(), "1\n");
            assert!(interpreter.global("first").is_some());
            assert!(interpreter.global("second").is_none(), "{} strategy", strategy);
        }
    }

    #[test]
    fn test_class_destructuring() {
        let source = "\
class C:
    __match_args__ = ('a', 'b')

    def __init__(self, a, b):
        self.a = a
        self.b = b

class Plain:
    def __init__(self, a, b):
        self.a = a
        self.b = b

for value in [C(1, 2), C(1, 3), C(0, 2), Plain(1, 2)]:
    match value:
        case C(1, 2):
            print('match')
        case Plain(1, 2):
            print('unreachable')
        case _:
            print('fallthrough')
";
        assert_output(source, "match\nfallthrough\nfallthrough\nfallthrough\n");
    }

    #[test]
    fn test_fallthrough_runs_nothing() {
        let source = "\
match 'x':
    case 1:
        print('int')
    case None:
        print('none')
print('after')
";
        assert_output(source, "after\n");
    }

    #[test]
    fn test_as_binds_original_subject() {
        let source = "\
match True:
    case 1 as x:
        print(x)
";
        assert_output(source, "True\n");

        let code = lowered_code(source, Strategy::Expression);
        assert!(code.contains("if __match_subject == 1 and (True, (x := __match_subject))[0]:"));
    }

    #[test]
    fn test_builtin_class_binds_whole_value() {
        let source = "\
for value in [42, 'no', True]:
    match value:
        case int(x):
            print('int', x)
        case str():
            print('str')
";
        assert_output(source, "int 42\nstr\nint True\n");

        let code = lowered_code(source, Strategy::Expression);
        assert!(!code.contains("__match_args"));
    }

    #[test]
    fn test_singleton_cases_against_none() {
        let source = "\
match None:
    case True:
        print('true')
    case False:
        print('false')
    case None:
        print('none')
    case _:
        print('wildcard')
";
        assert_output(source, "none\n");
    }

    #[test]
    fn test_partial_binds_remain_visible() {
        let source = with_point(
            "\
x = 'unset'
match Point(5, 2):
    case Point(x, 1):
        print('matched')
print(x)
",
        );
        assert_output(&source, "5\n");
    }

    #[test]
    fn test_nested_class_patterns() {
        let source = with_point(
            "\
class Line:
    __match_args__ = ('start', 'end')

    def __init__(self, start, end):
        self.start = start
        self.end = end

for line in [Line(Point(0, 1), Point(2, 3)), Line(Point(4, 5), 6)]:
    match line:
        case Line(Point(0, y), Point(x=ex)):
            print('from y axis', y, ex)
        case Line(Point(a, b), end=other):
            print('other line', a, b, other)
",
        );
        assert_output(&source, "from y axis 1 2\nother line 4 5 6\n");
    }

    #[test]
    fn test_nested_match_in_case_body() {
        let source = "\
def classify(a, b):
    match a:
        case 0:
            match b:
                case 0:
                    return 'both zero'
                case _:
                    return 'a zero'
        case _:
            return 'a nonzero'

print(classify(0, 0), classify(0, 1), classify(1, 0))
";
        assert_output(source, "both zero a zero a nonzero\n");
    }

    #[test]
    fn test_match_in_loop_with_break() {
        let source = "\
total = 0
for value in range(10):
    match value:
        case 5:
            break
        case n if n % 2 == 0:
            total += n
print(total)
";
        assert_output(source, "6\n");
    }

    #[test]
    fn test_match_args_from_base_class() {
        let source = with_point(
            "\
class Point3(Point):
    pass

match Point3(1, 2):
    case Point(x, y):
        print(x + y)
",
        );
        assert_output(&source, "3\n");
    }

    #[test]
    fn test_dotted_value_pattern() {
        let source = "\
class Color:
    RED = 1
    GREEN = 2

match 2:
    case Color.RED:
        print('red')
    case Color.GREEN:
        print('green')
";
        assert_output(source, "green\n");
    }

    #[test]
    fn test_case_bodies_leave_globals_in_place() {
        let (interpreter, result) = execute(
            "match (1, 2):\n    case x:\n        y = 3\n",
            Strategy::Expression,
        );
        assert!(result.is_ok());
        assert!(matches!(interpreter.global("y"), Some(Value::Int(3))));
        assert!(interpreter.global("__match_subject").is_some());
    }

    // =========================================
    // Errors
    // =========================================

    #[test]
    fn test_unsupported_patterns_fail() {
        let error = assert_lower_fails("match x:\n    case {'a': 1}:\n        pass\n");
        assert!(matches!(error, LowerError::UnsupportedPattern { kind: "mapping", .. }));

        let error = assert_lower_fails("match x:\n    case a, b:\n        pass\n");
        assert!(matches!(error, LowerError::UnsupportedPattern { kind: "sequence", .. }));
    }

    #[test]
    fn test_builtin_with_keyword_fails() {
        let error = assert_lower_fails("match x:\n    case int(real=1):\n        pass\n");
        assert!(matches!(error, LowerError::Structural { .. }));
    }

    #[test]
    fn test_nested_error_aborts_pass() {
        let source = "\
def f(x):
    match x:
        case 1:
            match x:
                case [y]:
                    pass
";
        let result = lower(source, Strategy::Statements);
        assert!(!result.success());
        assert!(result.lowered.is_none());
        assert!(result.error.is_some());
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let result = lower("match x:\n    case 1 as _:\n        pass\n", Strategy::Expression);
        assert!(!result.success());
        assert!(result.diagnostics.has_errors());
        assert!(result.error.is_none());
    }
}
