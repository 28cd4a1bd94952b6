//! Static resolver pass.
//!
//! One walk over the AST that:
//! 1. builds lexical scopes (a stack of `HashMap<&str, bool>`; `false` =
//!    declared, `true` = defined) laid out exactly like the environments the
//!    interpreter will create at runtime,
//! 2. collects static errors (redeclaration, reading a variable in its own
//!    initializer, misplaced `return` / `this` / `super`),
//! 3. tells the interpreter, for every tracked reference, how many scopes up
//!    its binding lives.  References found in no tracked scope are left for
//!    the runtime chain search (top-level and global names).
//!
//! Errors never stop the pass.  A statement that fails is abandoned, the scope
//! stack and context are rolled back to where they were before it, and the
//! next sibling statement is resolved.

use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::error::StaticError;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::CONSTRUCTOR;

type ResolveResult<T> = Result<T, StaticError>;

/// What kind of callable body are we in?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
    Method,
    Constructor,
}

/// Are we inside a class body?  Used to validate `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules and records binding
/// distances by calling back into the interpreter.
pub struct Resolver<'a, 'interp> {
    interpreter: &'interp mut Interpreter,
    scopes: Vec<HashMap<&'a str, bool>>,
    current_function: FunctionKind,
    current_class: ClassKind,
    errors: Vec<StaticError>,
}

impl<'a, 'interp> Resolver<'a, 'interp> {
    pub fn new(interpreter: &'interp mut Interpreter) -> Self {
        info!("Resolver instantiated");

        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
            errors: Vec::new(),
        }
    }

    /// Resolve a whole program.  Returns every diagnostic found; an empty
    /// vector means the program may be interpreted.
    pub fn resolve(&mut self, statements: &'a [Stmt]) -> Vec<StaticError> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_statements(statements);

        info!("Resolve pass finished with {} error(s)", self.errors.len());

        mem::take(&mut self.errors)
    }

    /// Resolve a statement list, isolating each statement's failure.
    fn resolve_statements(&mut self, statements: &'a [Stmt]) {
        for stmt in statements {
            let depth: usize = self.scopes.len();
            let function: FunctionKind = self.current_function;
            let class: ClassKind = self.current_class;

            if let Err(e) = self.resolve_stmt(stmt) {
                self.scopes.truncate(depth);
                self.current_function = function;
                self.current_class = class;
                self.report(e);
            }
        }
    }

    /// Record a diagnostic without abandoning the current statement.
    fn report(&mut self, error: StaticError) {
        warn!("{}", error);
        self.errors.push(error);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &'a Stmt) -> ResolveResult<()> {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr)?;
            }

            Stmt::Let { name, initializer } => {
                self.declare(name)?;
                let resolved = match initializer {
                    Some(expr) => self.resolve_expr(expr),
                    None => Ok(()),
                };
                // Defined even on failure so siblings don't inherit the error.
                self.define(name);
                resolved?;
            }

            Stmt::Const { name, initializer } => {
                self.declare(name)?;
                let resolved = self.resolve_expr(initializer);
                self.define(name);
                resolved?;
            }

            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_statements(statements);
                self.end_scope();
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(then_branch)?;
                if let Some(else_stmt) = else_branch.as_deref() {
                    self.resolve_stmt(else_stmt)?;
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(body)?;
            }

            Stmt::Function(declaration) => {
                // The name is visible inside its own body (recursion).
                self.declare(&declaration.name)?;
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionKind::Function)?;
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    return Err(StaticError::UnexpectedReturn { line: keyword.line });
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionKind::Constructor {
                        self.report(StaticError::InvalidConstructorReturn { line: keyword.line });
                    }
                    self.resolve_expr(expr)?;
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                static_methods,
            } => {
                self.resolve_class(name, superclass.as_ref(), methods, static_methods)?;
            }
        }

        Ok(())
    }

    fn resolve_class(
        &mut self,
        name: &'a Token,
        superclass: Option<&'a Expr>,
        methods: &'a [Rc<FunctionDecl>],
        static_methods: &'a [Rc<FunctionDecl>],
    ) -> ResolveResult<()> {
        debug!("Resolving class '{}'", name.lexeme);

        let enclosing_class: ClassKind = self.current_class;

        self.declare(name)?;
        self.define(name);

        self.current_class = ClassKind::Class;

        if let Some(superclass) = superclass {
            if let Expr::Variable { name: super_name, .. } = superclass {
                if super_name.lexeme == name.lexeme {
                    self.report(StaticError::ClassInheritsFromItself {
                        name: name.lexeme.clone(),
                        line: super_name.line,
                    });
                }
            }

            self.current_class = ClassKind::Subclass;
            self.resolve_expr(superclass)?;
        }

        for method in methods {
            let kind = if method.name.lexeme == CONSTRUCTOR {
                FunctionKind::Constructor
            } else {
                FunctionKind::Method
            };
            self.resolve_method(method, kind)?;
        }

        for method in static_methods {
            self.resolve_method(method, FunctionKind::Method)?;
        }

        self.current_class = enclosing_class;
        Ok(())
    }

    /// A bound method runs one scope below the scope holding `this` (and
    /// `super` for subclasses).
    fn resolve_method(&mut self, method: &'a FunctionDecl, kind: FunctionKind) -> ResolveResult<()> {
        self.begin_scope();

        if let Some(scope) = self.scopes.last_mut() {
            scope.insert("this", true);
            if self.current_class == ClassKind::Subclass {
                scope.insert("super", true);
            }
        }

        self.resolve_function(method, kind)?;
        self.end_scope();

        Ok(())
    }

    /// Parameters and body share one fresh scope, as in a call frame.
    fn resolve_function(&mut self, declaration: &'a FunctionDecl, kind: FunctionKind) -> ResolveResult<()> {
        let enclosing: FunctionKind = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &declaration.params {
            self.declare(param)?;
            self.define(param);
        }
        self.resolve_statements(&declaration.body);
        self.end_scope();

        self.current_function = enclosing;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &'a Expr) -> ResolveResult<()> {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner)?,

            Expr::Unary { right, .. } => self.resolve_expr(right)?,

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)?;
            }

            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(name.lexeme.as_str()) == Some(&false) {
                        return Err(StaticError::SelfReferentialInitializer {
                            name: name.lexeme.clone(),
                            line: name.line,
                        });
                    }
                }
                self.resolve_local(*id, &name.lexeme);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value)?;
                self.resolve_local(*id, &name.lexeme);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee)?;
                for argument in arguments {
                    self.resolve_expr(argument)?;
                }
            }

            Expr::AccessProperty { object, .. } => self.resolve_expr(object)?,

            Expr::SetProperty { object, value, .. } => {
                self.resolve_expr(value)?;
                self.resolve_expr(object)?;
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassKind::None {
                    self.report(StaticError::InvalidThisOrSuperUsage {
                        keyword: keyword.lexeme.clone(),
                        line: keyword.line,
                    });
                } else {
                    self.resolve_local(*id, "this");
                }
            }

            Expr::Super { id, keyword, .. } => {
                if self.current_class == ClassKind::Subclass {
                    self.resolve_local(*id, "super");
                } else {
                    self.report(StaticError::InvalidThisOrSuperUsage {
                        keyword: keyword.lexeme.clone(),
                        line: keyword.line,
                    });
                }
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &'a Token) -> ResolveResult<()> {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(name.lexeme.as_str()) {
                return Err(StaticError::DuplicateDeclaration {
                    name: name.lexeme.clone(),
                    line: name.line,
                });
            }
            scope.insert(&name.lexeme, false);
        }
        Ok(())
    }

    fn define(&mut self, name: &'a Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(&name.lexeme, true);
        }
    }

    /// Innermost to outermost; the first hit fixes the distance.
    fn resolve_local(&mut self, id: ExprId, name: &str) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name) {
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("'{}' ({}) left to runtime lookup", name, id);
    }
}
