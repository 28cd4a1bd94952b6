//! yajs: a tree-walking interpreter for a small class-based scripting
//! language.
//!
//! The pipeline is scanner → parser → resolver → interpreter.  The helpers
//! below run the front half of it and collect every diagnostic on the way, so
//! callers (the CLI, tests) only deal with one error type.

pub mod ast;
pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use log::info;

pub use error::{RuntimeError, StaticError, YajsError};
pub use interpreter::Interpreter;
pub use value::Value;

use ast::Stmt;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;
use token::Token;

/// Tokenize `source`.  Every lex error is reported, not just the first.
pub fn scan(source: &str) -> Result<Vec<Token>, Vec<YajsError>> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<YajsError> = Vec::new();

    for result in Scanner::new(source.as_bytes()) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

/// Tokenize and parse `source` into a program.
pub fn parse(source: &str) -> Result<Vec<Stmt>, Vec<YajsError>> {
    let tokens: Vec<Token> = scan(source)?;

    Parser::new(&tokens).parse()
}

/// Scan, parse, resolve and interpret `source` on `interpreter`.
///
/// Static diagnostics stop the run before any statement executes.  Expression
/// ids restart at zero for every parse, so use a fresh interpreter per source.
pub fn run(source: &str, interpreter: &mut Interpreter) -> Result<(), Vec<YajsError>> {
    let statements: Vec<Stmt> = parse(source)?;

    let diagnostics: Vec<StaticError> = Resolver::new(interpreter).resolve(&statements);

    if !diagnostics.is_empty() {
        info!("Not running: {} static error(s)", diagnostics.len());
        return Err(diagnostics.into_iter().map(YajsError::from).collect());
    }

    interpreter
        .interpret(&statements)
        .map_err(|e| vec![YajsError::from(e)])
}
