use crate::{
    ast::ast::Function,
    backend::{Backend, BackendError},
    errors::errors::ErrorImpl,
    parser::{
        parser::Parser,
        stmt::{parse_definition, parse_extern, parse_top_level_expr},
    },
};

use super::{
    compiler::Compiler,
    stmt::{gen_function, gen_prototype},
};

struct MockFunction {
    name: String,
    arity: usize,
    has_body: bool,
}

/// Records every capability call. Values are constant-folded numbers and
/// parameters evaluate to their index.
#[derive(Default)]
struct MockBackend {
    calls: Vec<String>,
    functions: Vec<Option<MockFunction>>,
    open: Option<usize>,
    fail_verify: bool,
}

impl MockBackend {
    fn open_body(&self) -> Result<(), BackendError> {
        self.open.map(|_| ()).ok_or(BackendError::NoInsertPoint)
    }

    fn function(&self, function: usize) -> Option<&MockFunction> {
        self.functions.get(function).and_then(|slot| slot.as_ref())
    }

    fn live_names(&self) -> Vec<String> {
        self.functions
            .iter()
            .flatten()
            .map(|f| f.name.clone())
            .collect()
    }
}

impl Backend for MockBackend {
    type Value = f64;
    type Function = usize;

    fn emit_literal(&mut self, value: f64) -> Result<f64, BackendError> {
        self.open_body()?;
        self.calls.push(format!("literal {}", value));
        Ok(value)
    }

    fn emit_add(&mut self, lhs: f64, rhs: f64) -> Result<f64, BackendError> {
        self.open_body()?;
        self.calls.push(String::from("add"));
        Ok(lhs + rhs)
    }

    fn emit_sub(&mut self, lhs: f64, rhs: f64) -> Result<f64, BackendError> {
        self.open_body()?;
        self.calls.push(String::from("sub"));
        Ok(lhs - rhs)
    }

    fn emit_mul(&mut self, lhs: f64, rhs: f64) -> Result<f64, BackendError> {
        self.open_body()?;
        self.calls.push(String::from("mul"));
        Ok(lhs * rhs)
    }

    fn emit_less_than_as_float(&mut self, lhs: f64, rhs: f64) -> Result<f64, BackendError> {
        self.open_body()?;
        self.calls.push(String::from("lt"));
        Ok(if lhs >= rhs { 0.0 } else { 1.0 })
    }

    fn declare_function(&mut self, name: &str, params: &[String]) -> Result<usize, BackendError> {
        self.calls.push(format!("declare {}/{}", name, params.len()));
        self.functions.push(Some(MockFunction {
            name: String::from(name),
            arity: params.len(),
            has_body: false,
        }));
        Ok(self.functions.len() - 1)
    }

    fn lookup_function(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }

        self.functions
            .iter()
            .position(|slot| slot.as_ref().map(|f| f.name == name).unwrap_or(false))
    }

    fn function_has_body(&self, function: usize) -> bool {
        self.function(function).map(|f| f.has_body).unwrap_or(false)
    }

    fn function_arity(&self, function: usize) -> usize {
        self.function(function).map(|f| f.arity).unwrap_or(0)
    }

    fn function_params(&self, function: usize) -> Vec<f64> {
        (0..self.function_arity(function)).map(|i| i as f64).collect()
    }

    fn begin_function_body(&mut self, function: usize) -> Result<(), BackendError> {
        let f = self
            .functions
            .get_mut(function)
            .and_then(|slot| slot.as_mut())
            .ok_or(BackendError::StaleFunction)?;
        f.has_body = true;
        self.calls.push(format!("begin {}", f.name));
        self.open = Some(function);
        Ok(())
    }

    fn emit_call(&mut self, function: usize, args: &[f64]) -> Result<f64, BackendError> {
        self.open_body()?;
        let name = self
            .function(function)
            .map(|f| f.name.clone())
            .ok_or(BackendError::StaleFunction)?;
        self.calls.push(format!("call {}/{}", name, args.len()));
        Ok(0.0)
    }

    fn emit_return(&mut self, value: f64) -> Result<(), BackendError> {
        self.open_body()?;
        self.calls.push(format!("return {}", value));
        Ok(())
    }

    fn abandon_function(&mut self, function: usize) {
        if let Some(f) = self.functions.get_mut(function).and_then(|slot| slot.take()) {
            self.calls.push(format!("abandon {}", f.name));
        }
        if self.open == Some(function) {
            self.open = None;
        }
    }

    fn discard_body(&mut self, function: usize) {
        if let Some(f) = self.functions.get_mut(function).and_then(|slot| slot.as_mut()) {
            f.has_body = false;
            self.calls.push(format!("discard {}", f.name));
        }
        if self.open == Some(function) {
            self.open = None;
        }
    }

    fn verify_function(&self, function: usize) -> bool {
        !self.fail_verify && self.function(function).is_some()
    }

    fn print_function(&self, function: usize) -> String {
        self.function(function)
            .map(|f| format!("fn {}", f.name))
            .unwrap_or_default()
    }
}

fn definition(source: &str) -> Function {
    parse_definition(&mut Parser::from_source(source, None)).unwrap()
}

fn top_level(source: &str) -> Function {
    parse_top_level_expr(&mut Parser::from_source(source, None)).unwrap()
}

fn extern_decl(compiler: &mut Compiler<MockBackend>, source: &str) -> usize {
    let proto = parse_extern(&mut Parser::from_source(source, None)).unwrap();
    gen_prototype(compiler, &proto).unwrap()
}

#[test]
fn test_generates_definition() {
    let mut compiler = Compiler::new(MockBackend::default());

    gen_function(&mut compiler, &definition("def f(a b) a + b * 2")).unwrap();

    assert_eq!(
        compiler.backend.calls,
        vec!["declare f/2", "begin f", "literal 2", "mul", "add", "return 2"]
    );
    assert!(compiler.named_values.is_empty());
}

#[test]
fn test_extern_declares_without_body() {
    let mut compiler = Compiler::new(MockBackend::default());

    let sin = extern_decl(&mut compiler, "extern sin(x)");

    assert!(!compiler.backend.function_has_body(sin));
    assert_eq!(compiler.backend.calls, vec!["declare sin/1"]);
}

#[test]
fn test_repeated_extern_reuses_declaration() {
    let mut compiler = Compiler::new(MockBackend::default());

    let first = extern_decl(&mut compiler, "extern sin(x)");
    let second = extern_decl(&mut compiler, "extern sin(y)");

    assert_eq!(first, second);
    assert_eq!(compiler.backend.calls, vec!["declare sin/1"]);
}

#[test]
fn test_definition_completes_extern() {
    let mut compiler = Compiler::new(MockBackend::default());
    let declared = extern_decl(&mut compiler, "extern f(x y)");

    let defined = gen_function(&mut compiler, &definition("def f(a b) b")).unwrap();

    assert_eq!(declared, defined);
    assert!(compiler.backend.function_has_body(defined));
    // `b` is bound to the second parameter.
    assert_eq!(compiler.backend.calls.last().unwrap(), "return 1");
}

#[test]
fn test_definition_must_match_extern_arity() {
    let mut compiler = Compiler::new(MockBackend::default());
    extern_decl(&mut compiler, "extern f(x y)");

    let error = gen_function(&mut compiler, &definition("def f(a) a")).unwrap_err();

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::PrototypeMismatch {
            function: String::from("f"),
            expected: 2,
            received: 1,
        }
    );
    assert_eq!(compiler.backend.live_names(), vec!["f"]);
}

#[test]
fn test_redefinition_is_rejected() {
    let mut compiler = Compiler::new(MockBackend::default());
    gen_function(&mut compiler, &definition("def f(x) x")).unwrap();

    let error = gen_function(&mut compiler, &definition("def f(x) x + 1")).unwrap_err();

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::FunctionRedefinition {
            function: String::from("f"),
        }
    );
    // The first definition survives untouched.
    assert_eq!(compiler.backend.live_names(), vec!["f"]);
    assert!(!compiler.backend.calls.iter().any(|call| call.starts_with("abandon")));
}

#[test]
fn test_unknown_variable_leaves_no_function() {
    let mut compiler = Compiler::new(MockBackend::default());

    let error = gen_function(&mut compiler, &definition("def f(x) x + y")).unwrap_err();

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::UnknownVariable {
            variable: String::from("y"),
        }
    );
    assert!(error.is_semantic());
    assert_eq!(compiler.backend.lookup_function("f"), None);
    assert!(compiler.backend.live_names().is_empty());
    assert!(!compiler.backend.calls.iter().any(|call| call == "add" || call.starts_with("return")));
    assert!(compiler.named_values.is_empty());
}

#[test]
fn test_failed_definition_keeps_extern() {
    let mut compiler = Compiler::new(MockBackend::default());
    let declared = extern_decl(&mut compiler, "extern f(x)");

    gen_function(&mut compiler, &definition("def f(x) z")).unwrap_err();

    assert_eq!(compiler.backend.lookup_function("f"), Some(declared));
    assert!(!compiler.backend.function_has_body(declared));
    assert_eq!(compiler.backend.calls.last().unwrap(), "discard f");
    assert!(!compiler.backend.calls.iter().any(|call| call.starts_with("abandon")));

    // The declaration can still be completed.
    gen_function(&mut compiler, &definition("def f(x) x")).unwrap();
    assert!(compiler.backend.function_has_body(declared));
}

#[test]
fn test_scope_does_not_leak_between_functions() {
    let mut compiler = Compiler::new(MockBackend::default());
    gen_function(&mut compiler, &definition("def f(x) x")).unwrap();

    let error = gen_function(&mut compiler, &definition("def g(y) x")).unwrap_err();

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::UnknownVariable {
            variable: String::from("x"),
        }
    );
}

#[test]
fn test_duplicate_parameters_last_wins() {
    let mut compiler = Compiler::new(MockBackend::default());

    gen_function(&mut compiler, &definition("def f(x x) x")).unwrap();

    assert_eq!(compiler.backend.calls.last().unwrap(), "return 1");
}

#[test]
fn test_invalid_operator_after_operands() {
    let mut compiler = Compiler::new(MockBackend::default());
    let mut parser = Parser::from_source("def f(a b) a / b", None);
    parser.get_precedence_mut().set('/', 40);
    let function = parse_definition(&mut parser).unwrap();

    let error = gen_function(&mut compiler, &function).unwrap_err();

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::InvalidBinaryOperator { operator: '/' }
    );
    assert_eq!(compiler.backend.lookup_function("f"), None);
}

#[test]
fn test_unknown_function() {
    let mut compiler = Compiler::new(MockBackend::default());

    let error = gen_function(&mut compiler, &top_level("foo(1)")).unwrap_err();

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::UnknownFunction {
            function: String::from("foo"),
        }
    );
    assert!(compiler.backend.live_names().is_empty());
}

#[test]
fn test_call_arity_mismatch_for_every_delta() {
    for arity in 0..4usize {
        let params: Vec<String> = (0..arity).map(|i| format!("p{}", i)).collect();
        let extern_source = format!("extern f({})", params.join(" "));

        for received in 0..=arity + 3 {
            if received == arity {
                continue;
            }

            let mut compiler = Compiler::new(MockBackend::default());
            extern_decl(&mut compiler, &extern_source);

            let args: Vec<String> = (0..received).map(|i| i.to_string()).collect();
            let call = format!("f({})", args.join(", "));
            let error = gen_function(&mut compiler, &top_level(&call)).unwrap_err();

            assert_eq!(
                error.get_impl(),
                &ErrorImpl::IncorrectArgumentCount {
                    function: String::from("f"),
                    expected: arity,
                    received,
                }
            );
            // Arguments are never generated for a rejected call.
            assert!(!compiler.backend.calls.iter().any(|c| c.starts_with("literal")));
        }
    }
}

#[test]
fn test_call_generates_arguments_in_order() {
    let mut compiler = Compiler::new(MockBackend::default());
    extern_decl(&mut compiler, "extern pow(x y)");

    gen_function(&mut compiler, &top_level("pow(2, 3)")).unwrap();

    assert_eq!(
        compiler.backend.calls,
        vec![
            "declare pow/2",
            "declare /0",
            "begin ",
            "literal 2",
            "literal 3",
            "call pow/2",
            "return 0"
        ]
    );
}

#[test]
fn test_less_than_is_zero_or_one() {
    for (source, expected) in [("1 < 2", 1.0), ("2 < 1", 0.0), ("2 < 2", 0.0)] {
        let mut compiler = Compiler::new(MockBackend::default());

        gen_function(&mut compiler, &top_level(source)).unwrap();

        assert!(compiler.backend.calls.contains(&String::from("lt")));
        assert_eq!(
            compiler.backend.calls.last().unwrap(),
            &format!("return {}", expected)
        );
    }
}

#[test]
fn test_failed_verification_abandons() {
    let mut compiler = Compiler::new(MockBackend {
        fail_verify: true,
        ..MockBackend::default()
    });

    let error = gen_function(&mut compiler, &definition("def f(x) x")).unwrap_err();

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::InvalidFunction {
            function: String::from("f"),
        }
    );
    assert_eq!(compiler.backend.calls.last().unwrap(), "abandon f");
}

#[test]
fn test_anonymous_functions_do_not_collide() {
    let mut compiler = Compiler::new(MockBackend::default());

    let first = gen_function(&mut compiler, &top_level("1")).unwrap();
    let second = gen_function(&mut compiler, &top_level("2")).unwrap();

    assert_ne!(first, second);
}
