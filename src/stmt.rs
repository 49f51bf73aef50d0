//! Statement AST.  A program is an ordered `Vec<Stmt>`.

use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand-alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    /// One syntactic block == exactly one runtime frame.
    Block(Vec<Stmt>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop.  `increment` is only ever present for desugared
    /// `for`-loops; it runs after each body iteration, is skipped by
    /// `break`, and still runs after a `continue`.
    While {
        condition: Expr,
        body: Box<Stmt>,
        increment: Option<Expr>,
    },

    /// Function declaration — becomes a first-class callable value.
    /// The body is shared (`Rc`) so defining the function does not deep-copy
    /// its statements into the closure value.
    Function {
        name: Token,

        /// Parameter name tokens (arity <= 255).
        params: Vec<Token>,

        /// Body executed when the function is called.
        body: Rc<[Stmt]>,
    },

    /// `return`, `break`, or `continue`.  The keyword token says which;
    /// `value` is only meaningful for `return`.
    Control {
        keyword: Token,
        value: Option<Expr>,
    },
}
