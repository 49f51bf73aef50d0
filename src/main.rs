use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use treelox::ast_printer::AstPrinter;
use treelox::expr::IdGen;
use treelox::lox::Lox;
use treelox::parser::Parser;
use treelox::scanner::Scanner;
use treelox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for a Lox dialect", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: Option<PathBuf> },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Runs input from a file as a program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive prompt
    Repl,
}

/// Reads the contents of a file into a String.
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module path and source line
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("treelox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// EX_USAGE: the command was used incorrectly.
const EXIT_USAGE: i32 = 64;
/// EX_DATAERR: the input program had a static (lex/parse/resolve) error.
const EXIT_STATIC_ERROR: i32 = 65;
/// EX_SOFTWARE: the program failed at run time.
const EXIT_RUNTIME_ERROR: i32 = 70;

fn require_filename(filename: Option<PathBuf>, subcommand: &str) -> PathBuf {
    match filename {
        Some(filename) => filename,
        None => {
            eprintln!("Usage: treelox {} <file>", subcommand);
            std::process::exit(EXIT_USAGE);
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename } => {
            let filename = require_filename(filename, "tokenize");

            info!("Running Tokenize subcommand");

            let buf = read_file(filename)?;
            let mut tokenized = true;

            for token in Scanner::new(buf.as_bytes()) {
                match token {
                    Ok(token) => {
                        debug!("Scanned token: {}", token);

                        println!("{}", token);
                    }

                    Err(e) => {
                        tokenized = false;

                        eprintln!("{}", e);
                    }
                }
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code 65");

                std::process::exit(EXIT_STATIC_ERROR);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename } => {
            let filename = require_filename(filename, "parse");

            info!("Running Parse subcommand");

            let buf = read_file(filename)?;

            let mut tokens: Vec<Token> = Vec::new();
            let mut scanned = true;

            for token in Scanner::new(buf.as_bytes()) {
                match token {
                    Ok(token) => tokens.push(token),
                    Err(e) => {
                        scanned = false;
                        eprintln!("{}", e);
                    }
                }
            }

            if !scanned {
                std::process::exit(EXIT_STATIC_ERROR);
            }

            let mut ids = IdGen::new();
            let mut parser = Parser::new(tokens, &mut ids);

            match parser.parse_expression() {
                Ok(expr) => {
                    info!("Expression parsed successfully");

                    println!("{}", AstPrinter::print(&expr));
                }

                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(EXIT_STATIC_ERROR);
                }
            }
        }

        Commands::Run { filename } => {
            let filename = require_filename(filename, "run");

            info!("Running Run subcommand");

            let buf = read_file(filename)?;
            let mut lox = Lox::new();

            lox.run(&buf);

            if lox.had_error {
                std::process::exit(EXIT_STATIC_ERROR);
            }
            if lox.had_runtime_error {
                std::process::exit(EXIT_RUNTIME_ERROR);
            }

            info!("Program executed successfully");
        }

        Commands::Repl => {
            info!("Starting REPL");

            let mut lox = Lox::new();

            let stdin = io::stdin();
            let mut stdout = io::stdout();

            loop {
                print!("> ");
                stdout.flush()?;

                let mut line = String::new();
                // EOF (Ctrl+D) ends the session with a clean exit.
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }

                lox.run(&line);

                // Each line is an independent run against the shared
                // interpreter state; only the static-error flag resets.
                lox.clear_error();
            }
        }
    }

    Ok(())
}
