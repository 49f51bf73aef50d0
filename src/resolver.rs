//! Static resolver pass.
//!
//! One AST walk that does three things:
//! 1. Build lexical scopes (stack of `HashMap<String, bool>` tracking
//!    declared/defined).
//! 2. Report static errors (`return` outside a function).
//! 3. Record, for *each* variable occurrence, whether it is a local (and at
//!    what scope distance) or a global — into a [`Bindings`] side-table the
//!    interpreter consumes, so runtime lookup never walks further than the
//!    resolver computed.
//!
//! Shadowing is always allowed, including `var a = a;` reading an outer `a`:
//! initializers are resolved *before* the variable's own name is declared,
//! and redeclaration in the same scope is not an error.

use std::collections::HashMap;
use std::mem;

use log::{debug, info};

use crate::error::LoxError;
use crate::expr::{Expr, ExprId};
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};

/// Lexical resolution side-table: node identity → scope distance.
///
/// 0 is the innermost scope active at the use site, increasing outward.
/// A node with no entry resolves to the global frame at run time.
/// Built once before execution; read-only thereafter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    locals: HashMap<ExprId, usize>,
}

impl Bindings {
    /// Scope distance for a resolved local, or `None` for a global.
    pub fn distance(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Fold another table into this one.  Ids are globally unique per
    /// session, so entries never collide.
    pub fn merge(&mut self, other: Bindings) {
        self.locals.extend(other.locals);
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }
}

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances into an externally-owned [`Bindings`] table.
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    bindings: Bindings,
    errors: Vec<LoxError>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            bindings: Bindings::default(),
            errors: Vec::new(),
        }
    }

    /// Walk all top-level statements.  Static errors do not abort the walk;
    /// the table is only handed out when the whole program resolved cleanly.
    pub fn resolve(&mut self, statements: &[Stmt]) -> Result<Bindings, Vec<LoxError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        if self.errors.is_empty() {
            Ok(mem::take(&mut self.bindings))
        } else {
            Err(mem::take(&mut self.errors))
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // Initializer first: `var a = a;` reads the *outer* a.
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.declare(name);
                self.define(name);
            }

            Stmt::Function { name, params, body } => {
                // The name is visible inside its own body (recursion).
                self.declare(name);
                self.define(name);
                self.resolve_function(params, body);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While {
                condition,
                body,
                increment,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
                if let Some(inc) = increment {
                    self.resolve_expr(inc);
                }
            }

            Stmt::Control { keyword, value } => {
                if keyword.token_type == TokenType::RETURN {
                    if self.current_function == FunctionType::None {
                        self.errors.push(LoxError::resolve(
                            keyword.line,
                            "Can't return from top-level code",
                        ));
                    }

                    if let Some(expr) = value {
                        self.resolve_expr(expr);
                    }
                }
                // break/continue placement was already checked by the parser.
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        debug!("Resolving expr: {:?}", expr);

        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS.
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.  The body
    /// statements share the parameter scope; the interpreter mirrors this by
    /// running the body directly in the call frame, not a nested child.
    fn resolve_function(&mut self, params: &[Token], body: &[Stmt]) {
        let enclosing = self.current_function;
        self.current_function = FunctionType::Function;

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }
        for stmt in body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Mark a name present-but-not-yet-initialized in the innermost scope.
    /// Redefinition silently shadows.  No-op at global scope.
    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), false);
        }
    }

    /// Mark a name ready for use in the innermost scope.
    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as either a local at some depth, or
    /// a global when no enclosing scope declares it (no table entry).
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                self.bindings.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
