#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use yajs::ast::{Expr, ExprId, Stmt};
use yajs::{Interpreter, RuntimeError, YajsError};

/// Output sink shared between a test and the interpreter writing to it.
#[derive(Clone, Default)]
pub struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl SharedSink {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn capturing_interpreter() -> (Interpreter, SharedSink) {
    let sink = SharedSink::default();
    let interpreter = Interpreter::with_output(Box::new(sink.clone()));
    (interpreter, sink)
}

/// Runs `source` on a fresh interpreter, returning what it printed and the
/// pipeline result.
pub fn run_capture(source: &str) -> (String, Result<(), Vec<YajsError>>) {
    let (mut interpreter, sink) = capturing_interpreter();
    let result = yajs::run(source, &mut interpreter);
    (sink.contents(), result)
}

/// Output of a program that must run cleanly.
pub fn output_of(source: &str) -> String {
    let (output, result) = run_capture(source);
    if let Err(errors) = result {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        panic!("program failed: {:?}\noutput so far: {}", messages, output);
    }
    output
}

/// Output lines of a program that must run cleanly.
pub fn lines_of(source: &str) -> Vec<String> {
    output_of(source).lines().map(str::to_string).collect()
}

/// The single runtime error a program must fail with, plus its output.
pub fn runtime_failure(source: &str) -> (String, RuntimeError) {
    let (output, result) = run_capture(source);
    let mut errors = match result {
        Ok(()) => panic!("program unexpectedly succeeded; output: {}", output),
        Err(errors) => errors,
    };
    assert_eq!(errors.len(), 1, "expected exactly one error");
    match errors.remove(0) {
        YajsError::Runtime(e) => (output, e),
        other => panic!("expected a runtime error, got: {}", other),
    }
}

/// Every `(name, id)` reference the resolver can annotate, in source order.
pub fn references(statements: &[Stmt]) -> Vec<(String, ExprId)> {
    let mut found = Vec::new();
    for stmt in statements {
        collect_stmt(stmt, &mut found);
    }
    found
}

fn collect_stmt(stmt: &Stmt, found: &mut Vec<(String, ExprId)>) {
    match stmt {
        Stmt::Expression(expr) | Stmt::Print(expr) => collect_expr(expr, found),
        Stmt::Let { initializer, .. } => {
            if let Some(expr) = initializer {
                collect_expr(expr, found);
            }
        }
        Stmt::Const { initializer, .. } => collect_expr(initializer, found),
        Stmt::Block(statements) => {
            for s in statements {
                collect_stmt(s, found);
            }
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            collect_expr(condition, found);
            collect_stmt(then_branch, found);
            if let Some(else_stmt) = else_branch {
                collect_stmt(else_stmt, found);
            }
        }
        Stmt::While { condition, body } => {
            collect_expr(condition, found);
            collect_stmt(body, found);
        }
        Stmt::Function(declaration) => {
            for s in &declaration.body {
                collect_stmt(s, found);
            }
        }
        Stmt::Return { value, .. } => {
            if let Some(expr) = value {
                collect_expr(expr, found);
            }
        }
        Stmt::Class {
            superclass,
            methods,
            static_methods,
            ..
        } => {
            if let Some(expr) = superclass {
                collect_expr(expr, found);
            }
            for method in methods.iter().chain(static_methods) {
                for s in &method.body {
                    collect_stmt(s, found);
                }
            }
        }
    }
}

fn collect_expr(expr: &Expr, found: &mut Vec<(String, ExprId)>) {
    match expr {
        Expr::Literal(_) => {}
        Expr::Variable { id, name } => found.push((name.lexeme.clone(), *id)),
        Expr::Assign { id, name, value } => {
            collect_expr(value, found);
            found.push((name.lexeme.clone(), *id));
        }
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            collect_expr(left, found);
            collect_expr(right, found);
        }
        Expr::Unary { right, .. } => collect_expr(right, found),
        Expr::Grouping(inner) => collect_expr(inner, found),
        Expr::Call {
            callee, arguments, ..
        } => {
            collect_expr(callee, found);
            for argument in arguments {
                collect_expr(argument, found);
            }
        }
        Expr::AccessProperty { object, .. } => collect_expr(object, found),
        Expr::SetProperty { object, value, .. } => {
            collect_expr(object, found);
            collect_expr(value, found);
        }
        Expr::This { id, .. } => found.push(("this".to_string(), *id)),
        Expr::Super { id, .. } => found.push(("super".to_string(), *id)),
    }
}
