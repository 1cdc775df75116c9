//! Integration tests for the end-to-end pipeline.
//!
//! These tests run whole programs through tokenization, parsing, code
//! generation into the IR backend and evaluation.

use toy::{
    backend::{ir::IrBackend, Backend},
    config::Config,
    errors::errors::ErrorImpl,
    toplevel::{Outcome, Session},
};

fn run(source: &str) -> (Vec<Outcome>, IrBackend) {
    run_with(source, Config::default())
}

fn run_with(source: &str, config: Config) -> (Vec<Outcome>, IrBackend) {
    let backend = IrBackend::new(&config);
    let mut session = Session::from_source(source, Some(String::from("test.toy")), backend, config);

    let mut outcomes = vec![];
    while let Some(outcome) = session.step() {
        if !matches!(outcome, Outcome::Skipped) {
            outcomes.push(outcome);
        }
    }

    (outcomes, session.into_backend())
}

fn values(outcomes: &[Outcome]) -> Vec<f64> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            Outcome::Expression { value, .. } => *value,
            _ => None,
        })
        .collect()
}

fn errors(outcomes: &[Outcome]) -> Vec<ErrorImpl> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            Outcome::Failed(error) => Some(error.get_impl().clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_arithmetic_respects_precedence() {
    let (outcomes, _) = run("1 + 2 * 3; 1 * 2 + 3; (1 + 2) * 3; 10 - 4 - 3;");
    assert_eq!(values(&outcomes), vec![7.0, 5.0, 9.0, 3.0]);
}

#[test]
fn test_functions_and_calls() {
    let source = "
        # squares and sums
        def square(x) x * x;
        def sumsq(a b) square(a) + square(b);
        sumsq(3, 4);
    ";
    let (outcomes, backend) = run(source);

    assert_eq!(values(&outcomes), vec![25.0]);
    assert!(backend.lookup_function("square").is_some());
    assert!(backend.lookup_function("sumsq").is_some());
}

#[test]
fn test_less_than_yields_zero_or_one() {
    // Literals cannot be negative, so negated operands are built with `0 - n`.
    let pairs = [(1.0, 2.0), (2.0, 1.0), (3.5, 3.5), (0.0, 0.5), (0.25, 0.0)];

    for (x, y) in pairs {
        let source = format!("def lt(x y) x < y; lt({}, {}); lt(0 - {}, 0 - {});", x, y, x, y);
        let (outcomes, _) = run(&source);

        assert!(errors(&outcomes).is_empty());
        let results = values(&outcomes);
        assert_eq!(results.len(), 2);
        for value in results {
            assert!(value == 0.0 || value == 1.0, "lt produced {}", value);
        }
    }
}

#[test]
fn test_comparison_feeds_arithmetic() {
    let (outcomes, _) = run("def max(a b) a * (b < a) + b * (1 - (b < a)); max(3, 7); max(9, 2);");
    assert_eq!(values(&outcomes), vec![7.0, 9.0]);
}

#[test]
fn test_externs_call_host_functions() {
    let (outcomes, _) = run("extern sqrt(x); extern pow(x y); sqrt(pow(3, 2) + 16);");
    assert_eq!(values(&outcomes), vec![5.0]);
}

#[test]
fn test_putchard_output() {
    let (outcomes, _) = run("extern putchard(c); putchard(104) + putchard(105);");

    match &outcomes[1] {
        Outcome::Expression { output, value, .. } => {
            assert_eq!(output, "hi");
            assert_eq!(*value, Some(0.0));
        }
        other => panic!("expected an expression, got {:?}", other),
    }
}

#[test]
fn test_redefinition_and_extern_completion() {
    let source = "
        extern f(a);
        def f(x) x + 1;
        def f(x) x + 2;
        f(1);
    ";
    let (outcomes, _) = run(source);

    assert_eq!(
        errors(&outcomes),
        vec![ErrorImpl::FunctionRedefinition {
            function: String::from("f")
        }]
    );
    assert_eq!(values(&outcomes), vec![2.0]);
}

#[test]
fn test_arity_errors() {
    let (outcomes, _) = run("def f(a b) a; f(1); f(1, 2, 3); f(1, 2);");

    assert_eq!(
        errors(&outcomes),
        vec![
            ErrorImpl::IncorrectArgumentCount {
                function: String::from("f"),
                expected: 2,
                received: 1,
            },
            ErrorImpl::IncorrectArgumentCount {
                function: String::from("f"),
                expected: 2,
                received: 3,
            },
        ]
    );
    assert_eq!(values(&outcomes), vec![1.0]);
}

#[test]
fn test_failed_definition_leaves_no_function() {
    let (outcomes, backend) = run("def broken(x) x + y; broken(1);");

    assert_eq!(
        errors(&outcomes),
        vec![
            ErrorImpl::UnknownVariable {
                variable: String::from("y")
            },
            ErrorImpl::UnknownFunction {
                function: String::from("broken")
            },
        ]
    );
    assert_eq!(backend.functions().count(), 0);
}

#[test]
fn test_failed_definition_keeps_called_extern() {
    let source = "
        extern foo(a);
        def bar(x) foo(x);
        def foo(a) y;
        bar(1);
        def foo(a) a * 2;
        bar(1);
    ";
    let (outcomes, backend) = run(source);

    match errors(&outcomes).as_slice() {
        [ErrorImpl::UnknownVariable { variable }, ErrorImpl::Evaluation { message }] => {
            assert_eq!(variable, "y");
            assert!(message.contains("\"foo\""));
        }
        other => panic!("unexpected errors {:?}", other),
    }
    assert_eq!(values(&outcomes), vec![2.0]);

    let bar = backend.lookup_function("bar").unwrap();
    assert!(backend.verify_function(bar));
    assert!(backend.print_function(bar).contains("call double @foo(double %x)"));
}

#[test]
fn test_extra_operator_parses_but_does_not_generate() {
    let config = Config {
        operators: vec![('/', 40)],
        ..Config::default()
    };
    let (outcomes, _) = run_with("8 / 2;", config);

    assert_eq!(
        errors(&outcomes),
        vec![ErrorImpl::InvalidBinaryOperator { operator: '/' }]
    );
}

#[test]
fn test_unregistered_operator_stops_expression() {
    // Without a precedence `/` ends the expression after `8`, and `/`
    // itself cannot start one.
    let (outcomes, _) = run("8 / 2;");

    assert_eq!(values(&outcomes), vec![8.0, 2.0]);
    assert_eq!(errors(&outcomes).len(), 1);
}

#[test]
fn test_recovery_after_syntax_error() {
    let (outcomes, _) = run("def 1; 2 + 3;");

    let syntax_errors = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Outcome::Failed(error) if error.is_syntax()))
        .count();
    assert_eq!(syntax_errors, 1);
    assert_eq!(values(&outcomes), vec![5.0]);
}

#[test]
fn test_runaway_recursion_is_an_evaluation_error() {
    let config = Config {
        max_call_depth: 32,
        ..Config::default()
    };
    let (outcomes, backend) = run_with("def forever(x) forever(x + 1); forever(0);", config);

    match errors(&outcomes).as_slice() {
        [ErrorImpl::Evaluation { message }] => assert!(message.contains("call depth")),
        other => panic!("expected one evaluation error, got {:?}", other),
    }
    assert!(backend.lookup_function("forever").is_some());
}

#[test]
fn test_printed_ir() {
    let (outcomes, _) = run("def add1(x) x + 1;");

    match &outcomes[0] {
        Outcome::Definition { name, ir } => {
            assert_eq!(name, "add1");
            assert!(ir.starts_with("define double @add1(double %x) {\nentry:\n"));
            assert!(ir.contains("= fadd double %x, %"));
            assert!(ir.ends_with("}"));
        }
        other => panic!("expected a definition, got {:?}", other),
    }
}

#[test]
fn test_error_report_points_at_source() {
    let source = "def f(x)\n  x + y;\n";
    let mut session = Session::from_source(
        source,
        Some(String::from("test.toy")),
        IrBackend::default(),
        Config::default(),
    );

    let mut reports = vec![];
    let failures = session.run(|_, text| reports.push(String::from(text)));

    assert_eq!(failures, 1);
    let lines: Vec<&str> = reports[0].lines().collect();
    assert_eq!(lines[0], "Error: unknown variable \"y\" (Variable `y` is not bound in this function)");
    assert_eq!(lines[1], "-> test.toy");
    assert_eq!(lines[3], "2 | x + y;");
    assert_eq!(lines[4], "  | ----^");
}
