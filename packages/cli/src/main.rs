mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    export, extract, init, inspect, set_cells, ExportArgs, ExtractArgs, InitArgs, InspectArgs,
    SetCellsArgs,
};
use tracing_subscriber::EnvFilter;

/// Tabula CLI - spreadsheets embedded in rich-text documents
#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a tabula.config.json
    Init(InitArgs),

    /// List the spreadsheets of a document
    Inspect(InspectArgs),

    /// Print the cell data of every spreadsheet, keyed by id
    Extract(ExtractArgs),

    /// Replace the cells of one spreadsheet
    SetCells(SetCellsArgs),

    /// Save documents with static markup and table data
    Export(ExportArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| {
            let cwd = cwd.display().to_string();
            match cli.command {
                Command::Init(args) => init(args, &cwd),
                Command::Inspect(args) => inspect(args, &cwd),
                Command::Extract(args) => extract(args, &cwd),
                Command::SetCells(args) => set_cells(args, &cwd),
                Command::Export(args) => export(args, &cwd),
            }
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
