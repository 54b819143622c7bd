use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use tree_lox as lox;

use lox::ast_printer::AstPrinter;
use lox::error::{location, LoxError};
use lox::report::Reporter;
use lox::session::{Mode, Session};
use lox::stmt::Stmt;
use lox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for a small Lox-family language", long_about = None)]
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
    Tokenize {
        filename: Option<PathBuf>,

        /// Print one JSON object per token
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints its syntax tree
    Parse { filename: Option<PathBuf> },

    /// Runs a program from a file, or starts an interactive session
    Run { filename: Option<PathBuf> },
}

/// Prints diagnostics to stderr as they are reported.
struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn lex_error(&mut self, line: usize, message: &str) {
        eprintln!("[line {}] Error: {}", line, message);
    }

    fn token_error(&mut self, token: &Token, message: &str) {
        eprintln!("[line {}] Error{}: {}", token.line, location(token), message);
    }
}

/// Reads the contents of a file as UTF‑8 text
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn required(filename: Option<PathBuf>) -> Result<PathBuf> {
    match filename {
        Some(filename) => Ok(filename),
        None => bail!("No input filepath was provided."),
    }
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("tree_lox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(filename: PathBuf, json: bool) -> Result<()> {
    let source = read_file(filename)?;
    let mut session = Session::new(Mode::Batch);

    let tokens: Vec<Token> = session.tokenize(&source, &mut ConsoleReporter);

    for token in &tokens {
        if json {
            println!("{}", serde_json::to_string(token)?);
        } else {
            println!("{}", token);
        }
    }

    if session.had_error() {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(65);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: PathBuf) -> Result<()> {
    let source = read_file(filename)?;
    let mut session = Session::new(Mode::Batch);

    let statements: Vec<Stmt> = session.parse(&source, &mut ConsoleReporter);
    print!("{}", AstPrinter::print(&statements));

    if session.had_error() {
        debug!("Parse failed, exiting with code 65");
        std::process::exit(65);
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn run_file(filename: PathBuf) -> Result<()> {
    let source = read_file(filename)?;
    let mut session = Session::new(Mode::Batch);

    match session.run(&source, &mut ConsoleReporter) {
        Ok(_) => info!("Program executed successfully"),

        Err(LoxError::Runtime(e)) => {
            debug!("Runtime debug: {}", e);
            std::process::exit(70);
        }

        Err(e) => {
            debug!("Static debug: {}", e);
            std::process::exit(65);
        }
    }

    Ok(())
}

fn repl() -> Result<()> {
    info!("Starting interactive session");

    let mut session = Session::new(Mode::Interactive);
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            println!();
            break;
        }

        if let Ok(Some(value)) = session.run(&line, &mut ConsoleReporter) {
            println!("{}", value.printed());
        }

        // errors never end the session
        session.reset_errors();
    }

    info!("Interactive session ended");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        Builder::new()
            .filter_level(log::LevelFilter::Off)
            .parse_default_env()
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(required(filename)?, json),

        Commands::Parse { filename } => parse(required(filename)?),

        Commands::Run { filename } => match filename {
            Some(filename) => run_file(filename),
            None => repl(),
        },
    }
}
