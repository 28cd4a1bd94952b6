use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use yajs::ast_printer::AstPrinter;
use yajs::interpreter::Interpreter;
use yajs::parser::Parser;
use yajs::scanner::Scanner;
use yajs::YajsError;

/// Exit status for lex, parse and static errors.
const EXIT_DATA_ERR: i32 = 65;

/// Exit status for runtime errors.
const EXIT_SOFTWARE: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "yajs language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable debug logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// File that receives the log when --log is set
    #[arg(long, global = true, default_value = "yajs.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: Option<PathBuf> },

    /// Parses input from a file as a program and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a yajs program
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file into a String
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf)
        .map_err(YajsError::from)
        .context(format!("{:?} is not valid UTF-8", filename))
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("yajs::").unwrap_or(module);
            writeln!(
                buf,
                "[{}][{}:{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn report_all(errors: &[YajsError]) {
    for e in errors {
        debug!("Diagnostic: {}", e);
        eprintln!("{}", e);
    }
}

fn exit_code(errors: &[YajsError]) -> i32 {
    if errors.iter().any(|e| matches!(e, YajsError::Runtime(_))) {
        EXIT_SOFTWARE
    } else {
        EXIT_DATA_ERR
    }
}

fn tokenize(source: &str) {
    let mut tokenized = true;

    for result in Scanner::new(source.as_bytes()) {
        match result {
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_DATA_ERR);
        process::exit(EXIT_DATA_ERR);
    }

    info!("Tokenization completed successfully");
}

fn parse(source: &str) {
    match yajs::parse(source) {
        Ok(statements) => {
            for stmt in &statements {
                println!("{}", AstPrinter::print_stmt(stmt));
            }
            info!("Parsed {} statement(s)", statements.len());
        }
        Err(errors) => {
            report_all(&errors);
            process::exit(EXIT_DATA_ERR);
        }
    }
}

fn evaluate(source: &str) {
    let tokens = match yajs::scan(source) {
        Ok(tokens) => tokens,
        Err(errors) => {
            report_all(&errors);
            process::exit(EXIT_DATA_ERR);
        }
    };

    let expr = match Parser::new(&tokens).parse_expression() {
        Ok(expr) => expr,
        Err(e) => {
            report_all(&[e]);
            process::exit(EXIT_DATA_ERR);
        }
    };

    let mut interpreter = Interpreter::new();

    match interpreter.evaluate(&expr) {
        Ok(value) => {
            debug!("Evaluated to: {}", value);
            println!("{}", value);
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(EXIT_SOFTWARE);
        }
    }
}

fn run(source: &str) {
    let mut interpreter = Interpreter::new();

    if let Err(errors) = yajs::run(source, &mut interpreter) {
        report_all(&errors);
        process::exit(exit_code(&errors));
    }

    info!("Program executed successfully");
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    let (filename, command): (Option<PathBuf>, fn(&str)) = match args.commands {
        Commands::Tokenize { filename } => (filename, tokenize),
        Commands::Parse { filename } => (filename, parse),
        Commands::Evaluate { filename } => (filename, evaluate),
        Commands::Run { filename } => (filename, run),
    };

    let Some(filename) = filename else {
        info!("No filepath provided");
        println!("No input filepath was provided. Exiting...");
        return Ok(());
    };

    let source = read_file(&filename)?;
    command(&source);

    Ok(())
}
