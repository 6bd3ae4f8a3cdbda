mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{apply, locate, text, ApplyArgs, LocateArgs, TextArgs};
use tracing::level_filters::LevelFilter;

/// Redline - tracked-change patching for word-processing documents
#[derive(Parser, Debug)]
#[command(name = "redline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log every locate decision
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log warnings and errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply edits to a document package as tracked changes
    Apply(ApplyArgs),

    /// Check whether text can be located in a document package
    Locate(LocateArgs),

    /// Print the plain text of a document package
    Text(TextArgs),
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else if cli.quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir()
        .expect("Cannot get current directory")
        .display()
        .to_string();

    let result = match cli.command {
        Command::Apply(args) => apply(args, &cwd),
        Command::Locate(args) => locate(args, &cwd),
        Command::Text(args) => text(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
