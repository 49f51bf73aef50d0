//! Expression AST.
//!
//! Nodes are a closed tagged enum so every pass (resolver, interpreter,
//! printer) is an exhaustive match.  Variable references and assignment
//! targets carry an [`ExprId`]: a unique integer tag the resolver's binding
//! table is keyed by.  Identity — not structural equality — matters there,
//! because two syntactically identical references at different points in the
//! program must resolve independently.

use crate::token::Token;

/// Stable identity of a variable-reference or assignment-target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

/// Monotonic [`ExprId`] allocator.
///
/// Owned by the session, not the parser: ids must stay unique across every
/// parse fed to the same interpreter, or a closure built on one REPL line
/// would look up its bindings under another line's ids.
#[derive(Debug, Default)]
pub struct IdGen {
    next: u32,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> ExprId {
        let id = ExprId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant token: number, string, `true`, `false`, or `nil`.
    Literal(Token),

    /// Parenthesised sub-expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Prefix unary operator expression: `!isReady`, `-42`.
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix binary operator expression: `a + b`, `x <= y`.
    ///
    /// Also covers logical `and` / `or`; those operator tokens get
    /// short-circuit evaluation in the interpreter but are ordinary binary
    /// nodes here.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Variable access — resolves to the identifier's current value.
    Variable { id: ExprId, name: Token },

    /// Assignment expression: `identifier "=" expression`.
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Function-call expression: `clock()`, `add(1, 2)`.
    Call {
        /// Expression that evaluates to a callable.
        callee: Box<Expr>,
        /// The closing `)` token — retained for error reporting.
        paren: Token,
        /// Argument list (may be empty).
        arguments: Vec<Expr>,
    },
}

impl Expr {
    /// Source line of the node, for diagnostics.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(token) => token.line,
            Expr::Grouping(inner) => inner.line(),
            Expr::Unary { operator, .. } => operator.line,
            Expr::Binary { operator, .. } => operator.line,
            Expr::Variable { name, .. } => name.line,
            Expr::Assign { name, .. } => name.line,
            Expr::Call { paren, .. } => paren.line,
        }
    }
}
