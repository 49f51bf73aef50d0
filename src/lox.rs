//! The `Lox` session: orchestrates scan → parse → resolve → interpret and
//! carries the per-session state the driver needs.
//!
//! Error flags live on the session value, not in process-wide statics: the
//! driver constructs one `Lox`, feeds it whole programs (file mode) or
//! independent lines (interactive mode), and inspects the flags after each
//! run.  A program with any static error never reaches execution; a runtime
//! error aborts the rest of the current run but leaves the session usable
//! for the next one.

use std::io::Write;

use log::{debug, info};

use crate::error::LoxError;
use crate::expr::IdGen;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;

pub struct Lox {
    interpreter: Interpreter,

    /// Node-identity allocator.  Never resets: ids must stay unique across
    /// every line fed to the same interpreter.
    ids: IdGen,

    /// A lex, parse, or resolve error occurred.  Cleared between
    /// interactive lines.
    pub had_error: bool,

    /// A runtime error occurred.
    pub had_runtime_error: bool,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// A session printing to stdout.
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
            ids: IdGen::new(),
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// A session whose `print` output goes to `output` (tests).
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(output),
            ids: IdGen::new(),
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Run a whole program (or one interactive line) through the pipeline.
    /// Every error is reported to stderr with its source line.
    pub fn run(&mut self, source: &str) {
        info!("Running {} byte(s) of source", source.len());

        // ── scan ────────────────────────────────────────────────────────
        let mut tokens: Vec<Token> = Vec::new();

        for result in Scanner::new(source.as_bytes()) {
            match result {
                Ok(token) => tokens.push(token),
                Err(e) => self.report(&e),
            }
        }

        if self.had_error {
            return;
        }

        // ── parse ───────────────────────────────────────────────────────
        let mut parser = Parser::new(tokens, &mut self.ids);

        let statements: Vec<Stmt> = match parser.parse() {
            Ok(statements) => statements,
            Err(errors) => {
                for e in &errors {
                    self.report(e);
                }
                return;
            }
        };

        // ── resolve ─────────────────────────────────────────────────────
        let mut resolver = Resolver::new();

        let bindings = match resolver.resolve(&statements) {
            Ok(bindings) => bindings,
            Err(errors) => {
                for e in &errors {
                    self.report(e);
                }
                return;
            }
        };

        debug!("Resolved {} local binding(s)", bindings.len());

        // ── interpret ───────────────────────────────────────────────────
        self.interpreter.add_bindings(bindings);

        if let Err(e) = self.interpreter.interpret(&statements) {
            eprintln!("{}", e);
            self.had_runtime_error = true;
        }
    }

    /// Clear the static-error flag between interactive lines.  The runtime
    /// flag is left alone; it only decides the process exit code in file
    /// mode.
    pub fn clear_error(&mut self) {
        self.had_error = false;
    }

    fn report(&mut self, error: &LoxError) {
        eprintln!("{}", error);
        self.had_error = true;
    }
}
