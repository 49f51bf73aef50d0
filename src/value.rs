//! Runtime values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::stmt::Stmt;
use crate::token::Token;

/// A user-defined function value: its declaration plus the frame that was
/// current when the declaration executed.  Two closures created from the
/// same declaration at different times are distinct values with distinct
/// captured environments.
#[derive(Debug)]
pub struct LoxFunction {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Rc<[Stmt]>,

    /// The defining environment — captured at declaration, not at call time.
    /// This is what makes scoping lexical rather than dynamic.
    pub closure: Rc<RefCell<Environment>>,
}

impl LoxFunction {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Signature of a host-provided native function.
pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Bool(bool),
    Nil,

    /// A user function with its captured environment.
    Function(Rc<LoxFunction>),

    /// A host-provided callable.  The interpreter performs the arity check
    /// and dispatch; the native's internals are opaque to it.
    Native {
        name: &'static str,
        arity: usize,
        func: NativeFn,
    },
}

impl PartialEq for Value {
    /// Value equality with no implicit coercion between kinds.  Functions
    /// compare by closure identity: each declaration execution produces a
    /// distinct value.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (
                Value::Native {
                    name: a, arity: m, ..
                },
                Value::Native {
                    name: b, arity: n, ..
                },
            ) => a == b && m == n,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Nil => write!(f, "nil"),

            Value::Function(fun) => write!(f, "<fn '{}'>", fun.name.lexeme),

            Value::Native { name, .. } => write!(f, "<native fn {}>", name),
        }
    }
}
