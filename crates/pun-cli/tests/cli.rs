//! End-to-end tests for the `pun` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const SHAPES: &str = "\
class Point:
    __match_args__ = ('x', 'y')

    def __init__(self, x, y):
        self.x = x
        self.y = y

def describe(value):
    match value:
        case Point(0, 0):
            return 'origin'
        case Point(x, 0) if x > 0:
            return 'positive x axis'
        case Point():
            return 'somewhere'
        case 1 | 2 | 3 as n:
            return 'small ' + str(n)
        case _:
            return 'other'

print(describe(Point(0, 0)))
print(describe(Point(5, 0)))
print(describe(Point(-5, 0)))
print(describe(2))
print(describe('x'))
";

const SHAPES_OUTPUT: &str = "origin\npositive x axis\nsomewhere\nsmall 2\nother\n";

fn pun_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pun"))
}

fn write_source(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, source).unwrap();
    path
}

fn pun(args: &[&str]) -> Output {
    Command::new(pun_bin())
        .args(args)
        .output()
        .expect("failed to run pun")
}

#[test]
fn test_lower_prints_conditional_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        dir.path(),
        "simple.py",
        "match x:\n    case 1:\n        print('one')\n    case _:\n        print('other')\n",
    );

    let output = pun(&["lower", path.to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("__match_subject = x\n"), "got:\n{}", stdout);
    assert!(stdout.contains("if __match_subject == 1:\n    print(\"one\")\n"));
    assert!(stdout.contains("elif True:\n    print(\"other\")\n"));
    assert!(!stdout.contains("match x"));
}

#[test]
fn test_lower_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_source(dir.path(), "shapes.py", SHAPES);
    let target = dir.path().join("lowered.py");

    let output = pun(&[
        "lower",
        input.to_str().unwrap(),
        "-o",
        target.to_str().unwrap(),
        "--strategy",
        "statements",
    ]);
    assert!(output.status.success());

    let lowered = std::fs::read_to_string(&target).unwrap();
    assert!(lowered.contains("__match_case = 0"));
    assert!(!lowered.contains(":="));
}

#[test]
fn test_run_in_both_strategies() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "shapes.py", SHAPES);

    for strategy in ["expression", "statements"] {
        let output = pun(&["run", path.to_str().unwrap(), "--strategy", strategy]);
        assert!(
            output.status.success(),
            "{} failed: {}",
            strategy,
            String::from_utf8_lossy(&output.stderr)
        );
        assert_eq!(String::from_utf8_lossy(&output.stdout), SHAPES_OUTPUT);
    }
}

#[test]
fn test_unsupported_pattern_reports_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        dir.path(),
        "seq.py",
        "match point:\n    case [x, y]:\n        pass\n",
    );

    let output = pun(&["check", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error[EM002]"), "got:\n{}", stderr);
    assert!(stderr.contains("sequence patterns cannot be lowered"));
    assert!(stderr.contains("seq.py:2:"));
    assert!(!stderr.contains("\x1b["));
}

#[test]
fn test_syntax_error_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        dir.path(),
        "bad.py",
        "match x:\n    case Point(x=1, 2):\n        pass\n",
    );

    let output = pun(&["lower", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("error[EP"));
}

#[test]
fn test_check_accepts_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "shapes.py", SHAPES);

    let output = pun(&["check", path.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(": ok"));
}

#[test]
fn test_ast_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "small.py", "match = 1\n");

    let output = pun(&["ast", "--json", path.to_str().unwrap()]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let body = json["body"].as_array().unwrap();
    assert_eq!(body.len(), 1);
    assert!(body[0].get("Assign").is_some());
}

#[test]
fn test_tokens_lists_soft_keywords_as_identifiers() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "small.py", "match x:\n    case _:\n        pass\n");

    let output = pun(&["tokens", path.to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Ident"));
    assert!(stdout.contains("Indent"));
    assert!(stdout.contains("Total:"));
}

#[test]
fn test_missing_file() {
    let output = pun(&["check", "/nonexistent/input.py"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error reading"));
}
