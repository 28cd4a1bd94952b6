//! Runtime values and the callable/class object model.
//!
//! Functions are immutable `(declaration, closure)` pairs. Classes own two
//! method tables (instance and static) and an optional superclass; instances
//! point at their class and own a property map. Method lookup walks the
//! superclass chain in both cases, and every successful lookup binds the
//! method to its receiver through a fresh scope holding `this` and `super`.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::ast::FunctionDecl;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{Interpreter, RuntimeResult, Signal};

/// Name of the method run when a class is called.
pub const CONSTRUCTOR: &str = "constructor";

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Function(Rc<Function>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

impl Value {
    /// Only `null` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// The callable capability: functions and classes expose it.
    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match self {
            Value::Function(function) => Some(function.as_ref() as &dyn Callable),
            Value::Class(class) => Some(class as &dyn Callable),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }
}

/// Strict equality: primitives by value, objects by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Function(function) => write!(f, "<fn {}>", function.name()),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "<{} instance>", instance.class.name),
        }
    }
}

/// Structured rendering used by `print` (via `serde_json`).
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),

            Value::Bool(b) => serializer.serialize_bool(*b),

            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                serializer.serialize_i64(*n as i64)
            }

            Value::Number(n) => serializer.serialize_f64(*n),

            Value::String(s) => serializer.serialize_str(s),

            Value::Function(function) => {
                serializer.serialize_str(&format!("<fn {}>", function.name()))
            }

            Value::Class(class) => serializer.serialize_str(&format!("<class {}>", class.name)),

            Value::Instance(instance) => instance.serialize(serializer),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Callable capability
// ─────────────────────────────────────────────────────────────────────────────

pub trait Callable {
    fn name(&self) -> &str;

    fn arity(&self) -> usize;

    /// Invoke with arguments already checked against [`Callable::arity`].
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> RuntimeResult<Value>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Functions
// ─────────────────────────────────────────────────────────────────────────────

pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<RefCell<Environment>>) -> Self {
        Self {
            declaration,
            closure,
        }
    }

    pub fn declaration(&self) -> &FunctionDecl {
        &self.declaration
    }

    /// Same declaration, closed over a fresh scope holding `this` (and
    /// `super` when the defining class has a superclass).
    pub fn bind(&self, receiver: Value, superclass: Option<Rc<Class>>) -> RuntimeResult<Function> {
        let line: usize = self.declaration.name.line;
        let mut scope = Environment::with_enclosing(Rc::clone(&self.closure));

        scope.define("this", receiver, true, line)?;

        if let Some(superclass) = superclass {
            scope.define("super", Value::Class(superclass), true, line)?;
        }

        Ok(Function {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(scope)),
        })
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> RuntimeResult<Value> {
        debug!("Calling '{}' from line {}", self.name(), line);

        let scope = Environment::child_of(&self.closure);

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            scope
                .borrow_mut()
                .define(&param.lexeme, argument, false, param.line)?;
        }

        match interpreter.execute_block(&self.declaration.body, scope)? {
            Signal::Return(value) => Ok(value),
            Signal::Normal => Ok(Value::Null),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}/{}>", self.name(), self.arity())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes
// ─────────────────────────────────────────────────────────────────────────────

pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
    static_methods: HashMap<String, Rc<Function>>,
}

/// A method found on the chain together with the superclass of the class
/// that defines it, which is what `super` must refer to inside it.
type MethodLookup = (Rc<Function>, Option<Rc<Class>>);

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
        static_methods: HashMap<String, Rc<Function>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
            static_methods,
        }
    }

    /// Instance method lookup: this class first, then ancestors in order.
    pub fn find_method(&self, name: &str) -> Option<MethodLookup> {
        match self.methods.get(name) {
            Some(method) => Some((Rc::clone(method), self.superclass.clone())),
            None => self.superclass.as_ref()?.find_method(name),
        }
    }

    /// Static method lookup over the same chain.
    pub fn find_static(&self, name: &str) -> Option<MethodLookup> {
        match self.static_methods.get(name) {
            Some(method) => Some((Rc::clone(method), self.superclass.clone())),
            None => self.superclass.as_ref()?.find_static(name),
        }
    }

    /// `Class.name`: a static method bound with `this` = the class itself.
    pub fn get_static(class: &Rc<Class>, name: &str) -> RuntimeResult<Option<Value>> {
        match class.find_static(name) {
            Some((method, superclass)) => {
                let bound = method.bind(Value::Class(Rc::clone(class)), superclass)?;
                Ok(Some(Value::Function(Rc::new(bound))))
            }
            None => Ok(None),
        }
    }
}

impl Callable for Rc<Class> {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.find_method(CONSTRUCTOR)
            .map_or(0, |(constructor, _)| constructor.arity())
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> RuntimeResult<Value> {
        debug!("Instantiating '{}' at line {}", self.name, line);

        let instance = Rc::new(Instance::new(Rc::clone(self)));

        if let Some((constructor, superclass)) = self.find_method(CONSTRUCTOR) {
            constructor
                .bind(Value::Instance(Rc::clone(&instance)), superclass)?
                .call(interpreter, arguments, line)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|s| &s.name))
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Instances
// ─────────────────────────────────────────────────────────────────────────────

pub struct Instance {
    class: Rc<Class>,
    fields: RefCell<HashMap<String, Value>>,
    rendering: Cell<bool>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
            rendering: Cell::new(false),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Own property first, then a method bound to this instance.
    pub fn get(instance: &Rc<Instance>, name: &str) -> RuntimeResult<Option<Value>> {
        if let Some(value) = instance.fields.borrow().get(name) {
            return Ok(Some(value.clone()));
        }

        match instance.class.find_method(name) {
            Some((method, superclass)) => {
                let bound = method.bind(Value::Instance(Rc::clone(instance)), superclass)?;
                Ok(Some(Value::Function(Rc::new(bound))))
            }
            None => Ok(None),
        }
    }

    pub fn set(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.rendering.replace(true) {
            return serializer.serialize_str("[Circular]");
        }

        let fields = self.fields.borrow();
        let sorted: BTreeMap<&String, &Value> = fields.iter().collect();

        let result = (|| {
            let mut map = serializer.serialize_map(Some(sorted.len()))?;
            for (key, value) in &sorted {
                map.serialize_entry(key, value)?;
            }
            map.end()
        })();

        self.rendering.set(false);
        result
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}
