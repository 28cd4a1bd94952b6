//! Lexical scopes.
//!
//! Environments form a tree through one-directional `enclosing` links; a
//! closure keeps its defining scope (and transitively every ancestor) alive
//! by holding an `Rc` to it. Mutable and constant bindings live in separate
//! maps, and a name may appear in only one of them per scope.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::RuntimeError;
use crate::value::Value;

type EnvResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    constants: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// A root scope (the interpreter's globals).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            constants: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Convenience for the common `Rc<RefCell<..>>` child construction.
    pub fn child_of(enclosing: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            enclosing,
        ))))
    }

    pub fn enclosing(&self) -> Option<&Rc<RefCell<Environment>>> {
        self.enclosing.as_ref()
    }

    /// Bind `name` in this scope only.
    pub fn define(&mut self, name: &str, value: Value, is_const: bool, line: usize) -> EnvResult<()> {
        if self.contains(name) {
            return Err(RuntimeError::DuplicateDeclaration {
                name: name.to_string(),
                line,
            });
        }

        debug!("define '{}' (const={}) = {}", name, is_const, value);

        if is_const {
            self.constants.insert(name.to_string(), value);
        } else {
            self.values.insert(name.to_string(), value);
        }

        Ok(())
    }

    /// Look `name` up here, then in every ancestor up to the root.
    pub fn get(&self, name: &str, line: usize) -> EnvResult<Value> {
        if let Some(value) = self.lookup_here(name) {
            Ok(value)
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Update the nearest binding of `name` along the chain.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> EnvResult<()> {
        if self.contains(name) {
            self.assign_here(name, value, line)
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// `distance` parent hops from `env`, then a lookup in that scope only.
    pub fn get_at_scope(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> EnvResult<Value> {
        let scope = Self::ancestor(env, distance).ok_or_else(|| undefined(name, line))?;
        let value = scope.borrow().lookup_here(name);

        value.ok_or_else(|| undefined(name, line))
    }

    /// `distance` parent hops from `env`, then an update in that scope only.
    pub fn assign_at_scope(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> EnvResult<()> {
        let scope = Self::ancestor(env, distance).ok_or_else(|| undefined(name, line))?;
        let result = scope.borrow_mut().assign_here(name, value, line);

        result
    }

    /// The scope `distance` hops up from `env` (`0` is `env` itself).
    pub fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut scope: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let parent = scope.borrow().enclosing.clone()?;
            scope = parent;
        }

        Some(scope)
    }

    fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name) || self.constants.contains_key(name)
    }

    fn lookup_here(&self, name: &str) -> Option<Value> {
        self.values
            .get(name)
            .or_else(|| self.constants.get(name))
            .cloned()
    }

    fn assign_here(&mut self, name: &str, value: Value, line: usize) -> EnvResult<()> {
        if let Some(slot) = self.values.get_mut(name) {
            debug!("assign '{}' = {}", name, value);
            *slot = value;
            Ok(())
        } else if self.constants.contains_key(name) {
            Err(RuntimeError::AssignToConst {
                name: name.to_string(),
                line,
            })
        } else {
            Err(undefined(name, line))
        }
    }
}

fn undefined(name: &str, line: usize) -> RuntimeError {
    RuntimeError::UndefinedVariable {
        name: name.to_string(),
        line,
    }
}
