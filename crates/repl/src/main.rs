//! `radb`: interactive shell for the relational query engine.

use anyhow::Result;
use clap::Parser;
use common::Config;
use executor::{execute, ExecutionContext};
use parser::ParsedQuery;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Parser, Debug)]
#[command(name = "radb", about = "Disk-oriented relational query engine shell")]
struct Args {
    /// Directory containing CSV files; pages live under its temp/ subdirectory
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    /// Page capacity in bytes
    #[arg(long, default_value_t = 1000)]
    block_size: usize,
    /// Pages the buffer pool keeps resident
    #[arg(long, default_value_t = 10)]
    pool_capacity: usize,
    /// Rows shown by PRINT
    #[arg(long, default_value_t = 20)]
    print_count: usize,
    /// Execute the provided command and exit instead of starting the shell
    #[arg(short = 'e', long = "execute")]
    execute: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::builder()
        .data_dir(args.data_dir)
        .block_size(args.block_size)
        .pool_capacity(args.pool_capacity)
        .print_count(args.print_count)
        .build();
    let mut ctx = ExecutionContext::new(config)?;

    if let Some(line) = args.execute {
        let query = parser::parse(&line)?;
        if let Some(output) = execute(&mut ctx, query)? {
            println!("{output}");
        }
        return Ok(());
    }

    repl(&mut ctx)
}

fn repl(ctx: &mut ExecutionContext) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("radb> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                match run_line(ctx, line) {
                    Ok(Outcome::Quit) => break,
                    Ok(Outcome::Output(Some(output))) => println!("{output}"),
                    Ok(Outcome::Output(None)) => {}
                    Err(err) => eprintln!("{err}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

enum Outcome {
    Output(Option<String>),
    Quit,
}

fn run_line(ctx: &mut ExecutionContext, line: &str) -> common::DbResult<Outcome> {
    let query = parser::parse(line)?;
    if query == ParsedQuery::Quit {
        return Ok(Outcome::Quit);
    }
    execute(ctx, query).map(Outcome::Output)
}
