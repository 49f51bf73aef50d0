//! Scope frames and the enclosing-frame chain.
//!
//! A frame is created per block entry and per function call.  Frames are
//! shared: the interpreter's current-scope pointer and any closure created
//! while the frame was current all hold it, so frames are reference-counted
//! and interior-mutable — a mutation through one holder is visible through
//! every other, which is how mutable captured state works.
//!
//! Reads of an undeclared name yield `nil`; only *assignment* to an
//! undeclared name is an error.  This asymmetry is the language's design,
//! not an oversight: there is no implicit declaration, but there is an
//! implicit read-as-nil.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::value::Value;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    pub enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// The outermost (global) frame.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// A child frame of `enclosing`.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Insert or overwrite in this frame's own mapping.  Redefinition
    /// silently shadows; this never errors.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Raw chain lookup: own mapping, else the enclosing frame, else `nil`.
    pub fn get(&self, name: &str) -> Value {
        if let Some(value) = self.values.get(name) {
            value.clone()
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Value::Nil
        }
    }

    /// Raw chain assignment: overwrite the nearest existing binding.
    /// Unlike declaration, assignment to a name bound nowhere is an error.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undeclared variable '{}'.", name),
            ))
        }
    }

    /// Walk exactly `distance` enclosing links.  The resolver guarantees the
    /// chain is at least that deep at every resolved access.
    pub fn ancestor(env: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut frame: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let next = frame
                .borrow()
                .enclosing
                .clone()
                .expect("resolved distance exceeds environment depth");
            frame = next;
        }

        frame
    }

    /// Resolved lookup: read directly from the frame `distance` hops out,
    /// with no fallback walk.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Value {
        Self::ancestor(env, distance)
            .borrow()
            .values
            .get(name)
            .cloned()
            .unwrap_or(Value::Nil)
    }

    /// Resolved assignment: write directly into the frame `distance` hops
    /// out.
    pub fn assign_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str, value: Value) {
        Self::ancestor(env, distance)
            .borrow_mut()
            .values
            .insert(name.to_string(), value);
    }
}
