//! Tree-walking interpreter: statement execution, expression evaluation,
//! call dispatch, and control-flow signals.
//!
//! Non-local control flow is not implemented by unwinding.  Every
//! statement-executing function returns a [`Flow`]: either the statement
//! completed normally, or a `return`/`break`/`continue` signal is
//! propagating.  Each call site forwards the signal unchanged unless it is
//! the absorbing context — a loop for break/continue, a call frame for
//! return — which makes the control-flow contract visible at every site.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId};
use crate::resolver::Bindings;
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::{LoxFunction, Value};

/// How a statement finished executing.
///
/// Anything but `Normal` propagates upward through enclosing statements
/// until absorbed by the nearest loop (break/continue) or call frame
/// (return).
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

pub struct Interpreter {
    /// The global frame.  Lives for the whole program; shared across REPL
    /// lines.
    globals: Rc<RefCell<Environment>>,

    /// The lexically current frame.
    environment: Rc<RefCell<Environment>>,

    /// The resolver's side-table, accumulated across runs so closures from
    /// earlier REPL lines keep their resolutions.
    locals: Bindings,

    /// Where `print` writes.  Stdout by default; tests inject a buffer.
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create a new Interpreter and define the native functions.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Create an Interpreter whose `print` output goes to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native functions 'clock' and 'str'");

        globals.borrow_mut().define(
            "clock",
            Value::Native {
                name: "clock",
                arity: 0,
                func: |_args: &[Value]| {
                    let timestamp: f64 = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map_err(|e| format!("Clock error: {}", e))?
                        .as_secs_f64();
                    Ok(Value::Number(timestamp))
                },
            },
        );

        globals.borrow_mut().define(
            "str",
            Value::Native {
                name: "str",
                arity: 1,
                func: |args: &[Value]| Ok(Value::String(args[0].to_string())),
            },
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Bindings::default(),
            output,
        }
    }

    /// Absorb a resolver-produced binding table.  Must be called before
    /// interpreting the statements it was built from.
    pub fn add_bindings(&mut self, bindings: Bindings) {
        debug!("Absorbing {} resolved binding(s)", bindings.len());

        self.locals.merge(bindings);
    }

    /// Interprets a list of statements (a "program").
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}

                // Parser and resolver reject break/continue outside loops
                // and return outside functions, so no signal can reach
                // the top level.
                flow => unreachable!("control signal {:?} escaped to top level", flow),
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                let _ = self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let frame = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, frame)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While {
                condition,
                body,
                increment,
            } => {
                while is_truthy(&self.evaluate(condition)?) {
                    match self.execute(body)? {
                        // `continue` is absorbed here; the increment (for a
                        // desugared for-loop) still runs before the next
                        // condition check.
                        Flow::Normal | Flow::Continue => {}

                        // `break` ends the loop without running the
                        // increment.
                        Flow::Break => return Ok(Flow::Normal),

                        // `return` is not ours to absorb.
                        ret @ Flow::Return(_) => return Ok(ret),
                    }

                    if let Some(inc) = increment {
                        self.evaluate(inc)?;
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function { name, params, body } => {
                debug!("Defining function '{}'", name.lexeme);

                let function = Value::Function(Rc::new(LoxFunction {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    closure: Rc::clone(&self.environment),
                }));

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, function);
                Ok(Flow::Normal)
            }

            Stmt::Control { keyword, value } => match keyword.token_type {
                TokenType::RETURN => {
                    let value = match value {
                        Some(expr) => self.evaluate(expr)?,
                        None => Value::Nil,
                    };

                    debug!("Raising return signal with {}", value);
                    Ok(Flow::Return(value))
                }

                TokenType::BREAK => Ok(Flow::Break),

                TokenType::CONTINUE => Ok(Flow::Continue),

                _ => unreachable!("non-control keyword in control statement"),
            },
        }
    }

    /// Execute `statements` with `frame` as the current environment,
    /// restoring the previous frame on *every* exit path — normal
    /// completion, control-flow signal, or error.
    fn execute_block(&mut self, statements: &[Stmt], frame: Rc<RefCell<Environment>>) -> Result<Flow> {
        let previous = std::mem::replace(&mut self.environment, frame);

        let mut flow = Flow::Normal;

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}

                Ok(signal) => {
                    flow = signal;
                    break;
                }

                Err(e) => {
                    self.environment = previous;
                    return Err(e);
                }
            }
        }

        self.environment = previous;
        Ok(flow)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Variable { id, name } => Ok(self.look_up_variable(*id, name)),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.distance(*id) {
                    Some(distance) => {
                        Environment::assign_at(
                            &self.environment,
                            distance,
                            &name.lexeme,
                            value.clone(),
                        );
                    }

                    None => {
                        self.globals
                            .borrow_mut()
                            .assign(&name.lexeme, value.clone(), name.line)?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut args = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.invoke_callable(&callee_val, paren, args)
            }
        }
    }

    /// Evaluates a literal token.
    fn evaluate_literal(&self, token: &Token) -> Result<Value> {
        let value = match &token.token_type {
            TokenType::NUMBER(n) => Value::Number(*n),
            TokenType::STRING(s) => Value::String(s.clone()),
            TokenType::TRUE => Value::Bool(true),
            TokenType::FALSE => Value::Bool(false),
            TokenType::NIL => Value::Nil,
            _ => {
                return Err(LoxError::runtime(token.line, "Invalid literal"));
            }
        };

        Ok(value)
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right_val = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(operator.line, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right_val))),

            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator")),
        }
    }

    /// Evaluates a binary expression.  Logical `and`/`or` short-circuit:
    /// the right operand is evaluated only if needed, and the value
    /// returned is whichever original operand decided the result — not a
    /// coerced boolean.
    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        if operator.token_type == TokenType::OR {
            let left_val = self.evaluate(left)?;
            if is_truthy(&left_val) {
                return Ok(left_val);
            }
            return self.evaluate(right);
        }

        if operator.token_type == TokenType::AND {
            let left_val = self.evaluate(left)?;
            if !is_truthy(&left_val) {
                return Ok(left_val);
            }
            return self.evaluate(right);
        }

        // Strictly left-to-right for everything else.
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be both numbers or both strings.",
                )),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            // Division by zero is not special-cased: IEEE-754 gives the
            // answer (inf, -inf, or NaN).
            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),
                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            _ => Err(LoxError::runtime(operator.line, "Invalid binary operator")),
        }
    }

    /// Variable lookup through the binding table: resolved entries read at
    /// the recorded distance against the lexically current chain;
    /// unresolved ones go to the global frame, where a never-declared name
    /// reads as nil.
    fn look_up_variable(&self, id: ExprId, name: &Token) -> Value {
        match self.locals.distance(id) {
            Some(distance) => Environment::get_at(&self.environment, distance, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        }
    }

    /// Invokes a callable (native or user-defined function).  The arity
    /// check is the caller's job, performed here before dispatch.
    fn invoke_callable(&mut self, callee: &Value, paren: &Token, args: Vec<Value>) -> Result<Value> {
        match callee {
            Value::Native { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                self.check_arity(*arity, args.len(), paren)?;

                func(&args).map_err(|msg| LoxError::runtime(paren.line, msg))
            }

            Value::Function(function) => {
                debug!("Calling user-defined function '{}'", function.name.lexeme);

                self.check_arity(function.arity(), args.len(), paren)?;

                // The call frame is parented at the *captured* environment,
                // not the caller's; the body runs in that frame directly.
                let mut frame = Environment::with_enclosing(Rc::clone(&function.closure));
                for (param, arg) in function.params.iter().zip(args) {
                    frame.define(&param.lexeme, arg);
                }

                let flow = self.execute_block(&function.body, Rc::new(RefCell::new(frame)))?;

                match flow {
                    Flow::Return(value) => Ok(value),
                    Flow::Normal => Ok(Value::Nil),
                    // Statically impossible: loop depth resets across
                    // function bodies in the parser.
                    Flow::Break | Flow::Continue => {
                        unreachable!("loop signal escaped a function body")
                    }
                }
            }

            _ => Err(LoxError::runtime(paren.line, "Can only call functions.")),
        }
    }

    fn check_arity(&self, arity: usize, got: usize, paren: &Token) -> Result<()> {
        if got != arity {
            return Err(LoxError::runtime(
                paren.line,
                format!("Expected {} arguments but got {}.", arity, got),
            ));
        }

        Ok(())
    }
}

/// Only `nil` and `false` are falsy; everything else — including `0` — is
/// truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}
