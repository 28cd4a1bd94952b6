//! Centralised error hierarchy for the **yajs interpreter**.
//!
//! Three layers report failures:
//! * the scanner and parser produce [`YajsError::Lex`] / [`YajsError::Parse`],
//! * the resolver collects [`StaticError`]s,
//! * the interpreter unwinds with a [`RuntimeError`].
//!
//! Everything converts into [`YajsError`] so the CLI can report diagnostics
//! uniformly. The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used at the crate boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum YajsError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Resolve-time diagnostic.
    #[error(transparent)]
    Static(#[from] StaticError),

    /// Unrecovered runtime failure.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl YajsError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        YajsError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        YajsError::Parse { message, line }
    }
}

/// Diagnostics found by the resolver before any code runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StaticError {
    #[error("[line {line}] Error: '{name}' is already declared in this scope")]
    DuplicateDeclaration { name: String, line: usize },

    #[error("[line {line}] Error: cannot read '{name}' in its own initializer")]
    SelfReferentialInitializer { name: String, line: usize },

    #[error("[line {line}] Error: 'return' outside of a function")]
    UnexpectedReturn { line: usize },

    #[error("[line {line}] Error: cannot return a value from a class constructor")]
    InvalidConstructorReturn { line: usize },

    #[error("[line {line}] Error: invalid use of '{keyword}' here")]
    InvalidThisOrSuperUsage { keyword: String, line: usize },

    #[error("[line {line}] Error: class '{name}' cannot extend itself")]
    ClassInheritsFromItself { name: String, line: usize },
}

impl StaticError {
    pub fn line(&self) -> usize {
        match self {
            StaticError::DuplicateDeclaration { line, .. }
            | StaticError::SelfReferentialInitializer { line, .. }
            | StaticError::UnexpectedReturn { line }
            | StaticError::InvalidConstructorReturn { line }
            | StaticError::InvalidThisOrSuperUsage { line, .. }
            | StaticError::ClassInheritsFromItself { line, .. } => *line,
        }
    }
}

/// Failures raised while executing a program.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("[line {line}] Runtime error: {value} is not callable")]
    NotCallable { value: String, line: usize },

    #[error("[line {line}] Runtime error: <{callee}> expected {expected} arguments, got {got}")]
    ArityMismatch {
        callee: String,
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("[line {line}] Runtime error: undefined variable '{name}'")]
    UndefinedVariable { name: String, line: usize },

    #[error("[line {line}] Runtime error: assignment to constant variable '{name}'")]
    AssignToConst { name: String, line: usize },

    #[error("[line {line}] Runtime error: identifier '{name}' has already been declared")]
    DuplicateDeclaration { name: String, line: usize },

    #[error("[line {line}] Runtime error: superclass '{name}' is not a class")]
    NotAClass { name: String, line: usize },

    #[error("[line {line}] Runtime error: {target} has no property called '{name}'")]
    UndefinedProperty {
        target: String,
        name: String,
        line: usize,
    },

    #[error("[line {line}] Runtime error: {target} is not a class instance")]
    InvalidPropertyTarget { target: String, line: usize },

    #[error("[line {line}] Runtime error: {message}")]
    InvalidOperand { message: String, line: usize },

    #[error("[line {line}] Runtime error: division by zero")]
    DivisionByZero { line: usize },

    #[error("Runtime error: failed to write program output: {0}")]
    Output(#[from] io::Error),

    #[error("Runtime error: failed to render value: {0}")]
    Render(#[from] serde_json::Error),
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, YajsError>;
