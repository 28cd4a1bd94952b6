use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::token::{Token, TokenType};
use crate::value::{Class, Function, Instance, Value};

/// Convenient alias for interpreter results.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// How a statement finished.  `return` travels up as a value, never as an
/// error, until the enclosing call consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter whose `print` output goes to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Interpreter whose `print` output goes to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));
        let environment = Environment::child_of(&globals);

        Self {
            globals,
            environment,
            locals: HashMap::new(),
            output,
        }
    }

    pub fn globals(&self) -> &Rc<RefCell<Environment>> {
        &self.globals
    }

    /// Called by the resolver for every reference bound in a tracked scope.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Expression {} resolved at depth {}", id, depth);
        self.locals.insert(id, depth);
    }

    pub fn resolved_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error aborts everything after it.
    pub fn interpret(&mut self, statements: &[Stmt]) -> RuntimeResult<()> {
        debug!("Interpreting {} statements", statements.len());

        let result = self.run_top_level(statements);
        let flushed = self.output.flush();

        match &result {
            Ok(()) => info!("Interpretation completed successfully"),
            Err(e) => info!("Interpretation aborted: {}", e),
        }

        // A runtime error outranks a failed flush.
        result?;
        flushed?;
        Ok(())
    }

    fn run_top_level(&mut self, statements: &[Stmt]) -> RuntimeResult<()> {
        for stmt in statements {
            if let Signal::Return(value) = self.execute(stmt)? {
                warn!("Top-level return ({}) ends the program", value);
                break;
            }
        }

        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<Signal> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                let rendered = serde_json::to_string_pretty(&value)?;
                writeln!(self.output, "{}", rendered)?;
                debug!("Printed value: {}", value);
            }

            Stmt::Let { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, value, false, name.line)?;
            }

            Stmt::Const { name, initializer } => {
                let value = self.evaluate(initializer)?;
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, value, true, name.line)?;
            }

            Stmt::Block(statements) => {
                let scope = Environment::child_of(&self.environment);
                return self.execute_block(statements, scope);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_stmt) = else_branch {
                    return self.execute(else_stmt);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Signal::Return(value) = self.execute(body)? {
                        return Ok(Signal::Return(value));
                    }
                }
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                let function = Function::new(Rc::clone(declaration), Rc::clone(&self.environment));
                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Function(Rc::new(function)),
                    false,
                    declaration.name.line,
                )?;
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                debug!("Returning value: {}", value);
                return Ok(Signal::Return(value));
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                static_methods,
            } => {
                self.declare_class(name, superclass.as_ref(), methods, static_methods)?;
            }
        }

        Ok(Signal::Normal)
    }

    /// Runs `statements` with `scope` as the current environment.  The
    /// previous environment is restored whether the block completes, returns
    /// or fails.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        scope: Rc<RefCell<Environment>>,
    ) -> RuntimeResult<Signal> {
        let previous = mem::replace(&mut self.environment, scope);
        let result = self.execute_statements(statements);
        self.environment = previous;

        result
    }

    fn execute_statements(&mut self, statements: &[Stmt]) -> RuntimeResult<Signal> {
        for stmt in statements {
            if let Signal::Return(value) = self.execute(stmt)? {
                return Ok(Signal::Return(value));
            }
        }

        Ok(Signal::Normal)
    }

    fn declare_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
        static_methods: &[Rc<FunctionDecl>],
    ) -> RuntimeResult<()> {
        debug!("Declaring class '{}'", name.lexeme);

        // Bound first so method closures capturing this scope see the name.
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Null, false, name.line)?;

        let superclass: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                other => {
                    let label = match expr {
                        Expr::Variable { name, .. } => name.lexeme.clone(),
                        _ => other.to_string(),
                    };
                    return Err(RuntimeError::NotAClass {
                        name: label,
                        line: expr.line(),
                    });
                }
            },
            None => None,
        };

        let class = Class::new(
            name.lexeme.clone(),
            superclass,
            self.method_table(methods),
            self.method_table(static_methods),
        );

        self.environment.borrow_mut().assign(
            &name.lexeme,
            Value::Class(Rc::new(class)),
            name.line,
        )?;

        info!("Class '{}' declared", name.lexeme);
        Ok(())
    }

    fn method_table(&self, declarations: &[Rc<FunctionDecl>]) -> HashMap<String, Rc<Function>> {
        declarations
            .iter()
            .map(|declaration| {
                let method = Function::new(Rc::clone(declaration), Rc::clone(&self.environment));
                (declaration.name.lexeme.clone(), Rc::new(method))
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Null => Value::Null,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Variable { id, name } => self.lookup_variable(*id, &name.lexeme, name.line),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at_scope(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                    None => self.environment.borrow_mut().assign(
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                }

                Ok(value)
            }

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::AccessProperty { object, name } => {
                let object = self.evaluate(object)?;

                let found = match &object {
                    Value::Instance(instance) => Instance::get(instance, &name.lexeme)?,
                    Value::Class(class) => Class::get_static(class, &name.lexeme)?,
                    other => {
                        return Err(RuntimeError::InvalidPropertyTarget {
                            target: other.to_string(),
                            line: name.line,
                        })
                    }
                };

                found.ok_or_else(|| RuntimeError::UndefinedProperty {
                    target: object.to_string(),
                    name: name.lexeme.clone(),
                    line: name.line,
                })
            }

            Expr::SetProperty {
                object,
                name,
                value,
            } => {
                let instance = match self.evaluate(object)? {
                    Value::Instance(instance) => instance,
                    other => {
                        return Err(RuntimeError::InvalidPropertyTarget {
                            target: other.to_string(),
                            line: name.line,
                        })
                    }
                };

                let value = self.evaluate(value)?;
                instance.set(&name.lexeme, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.lookup_variable(*id, "this", keyword.line),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn lookup_variable(&self, id: ExprId, name: &str, line: usize) -> RuntimeResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at_scope(&self.environment, distance, name, line),
            None => self.environment.borrow().get(name, line),
        }
    }

    /// `super.method`: looked up on the superclass of the class that defines
    /// the running method, then bound to the current `this`.
    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> RuntimeResult<Value> {
        let superclass = self.lookup_variable(id, "super", keyword.line)?;
        let receiver = self.lookup_variable(id, "this", keyword.line)?;

        let Value::Class(superclass) = superclass else {
            return Err(RuntimeError::NotAClass {
                name: superclass.to_string(),
                line: keyword.line,
            });
        };

        let lookup = match receiver {
            Value::Class(_) => superclass.find_static(&method.lexeme),
            _ => superclass.find_method(&method.lexeme),
        };

        let Some((function, defining_super)) = lookup else {
            return Err(RuntimeError::UndefinedProperty {
                target: superclass.name.clone(),
                name: method.lexeme.clone(),
                line: method.line,
            });
        };

        let bound = function.bind(receiver, defining_super)?;

        Ok(Value::Function(Rc::new(bound)))
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> RuntimeResult<Value> {
        let callee = self.evaluate(callee)?;

        let Some(callable) = callee.as_callable() else {
            return Err(RuntimeError::NotCallable {
                value: callee.to_string(),
                line: paren.line,
            });
        };

        let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(self.evaluate(argument)?);
        }

        if values.len() != callable.arity() {
            return Err(RuntimeError::ArityMismatch {
                callee: callable.name().to_string(),
                expected: callable.arity(),
                got: values.len(),
                line: paren.line,
            });
        }

        callable.call(self, values, paren.line)
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> RuntimeResult<Value> {
        let right = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(RuntimeError::InvalidOperand {
                    message: format!("Operand of '-' must be a number, got {}", other.type_name()),
                    line: op.line,
                }),
            },
            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
            TokenType::DOUBLE_BANG => Ok(Value::Bool(right.is_truthy())),
            _ => Err(RuntimeError::InvalidOperand {
                message: format!("Invalid unary operator '{}'", op.lexeme),
                line: op.line,
            }),
        }
    }

    /// Evaluates a binary expression.
    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> RuntimeResult<Value> {
        if op.token_type == TokenType::NULL_COALESCING {
            let left = self.evaluate(left)?;
            if left != Value::Null {
                return Ok(left);
            }
            return self.evaluate(right);
        }

        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;
        debug!("Binary '{}' on {} and {}", op.lexeme, left, right);

        match op.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (a @ Value::String(_), b) | (a, b @ Value::String(_)) => {
                    Ok(Value::String(format!("{}{}", a, b)))
                }
                (a, b) => Err(RuntimeError::InvalidOperand {
                    message: format!(
                        "Cannot add {} and {}; operands must be numbers or include a string",
                        a.type_name(),
                        b.type_name()
                    ),
                    line: op.line,
                }),
            },

            TokenType::MINUS => {
                let (a, b) = numbers(op, &left, &right)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = numbers(op, &left, &right)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = numbers(op, &left, &right)?;
                if b == 0.0 {
                    return Err(RuntimeError::DivisionByZero { line: op.line });
                }
                Ok(Value::Number(a / b))
            }

            TokenType::MOD => {
                let (a, b) = numbers(op, &left, &right)?;
                if b == 0.0 {
                    return Err(RuntimeError::DivisionByZero { line: op.line });
                }
                Ok(Value::Number(a % b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            TokenType::GREATER
            | TokenType::GREATER_EQUAL
            | TokenType::LESS
            | TokenType::LESS_EQUAL => {
                let ordering = compare(op, &left, &right)?;

                let result = match op.token_type {
                    TokenType::GREATER => ordering.is_some_and(Ordering::is_gt),
                    TokenType::GREATER_EQUAL => ordering.is_some_and(Ordering::is_ge),
                    TokenType::LESS => ordering.is_some_and(Ordering::is_lt),
                    _ => ordering.is_some_and(Ordering::is_le),
                };

                Ok(Value::Bool(result))
            }

            _ => Err(RuntimeError::InvalidOperand {
                message: format!("Invalid binary operator '{}'", op.lexeme),
                line: op.line,
            }),
        }
    }
}

fn numbers(op: &Token, left: &Value, right: &Value) -> RuntimeResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        (a, b) => Err(RuntimeError::InvalidOperand {
            message: format!(
                "Operands of '{}' must be numbers, got {} and {}",
                op.lexeme,
                a.type_name(),
                b.type_name()
            ),
            line: op.line,
        }),
    }
}

/// `None` when the operands are unordered (NaN).
fn compare(op: &Token, left: &Value, right: &Value) -> RuntimeResult<Option<Ordering>> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        (a, b) => Err(RuntimeError::InvalidOperand {
            message: format!(
                "Operands of '{}' must be two numbers or two strings, got {} and {}",
                op.lexeme,
                a.type_name(),
                b.type_name()
            ),
            line: op.line,
        }),
    }
}
