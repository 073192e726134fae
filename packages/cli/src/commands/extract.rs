use super::{read_document, resolve, write_output};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tabula_document::{extract_all, extract_payloads, ContentNode};

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Document JSON file
    pub input: PathBuf,

    /// Include formulas, named expressions and config, not only cell data
    #[arg(long)]
    pub full: bool,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Pretty JSON object of every spreadsheet, keyed by id
pub fn render_tables(tree: &ContentNode, full: bool) -> Result<String> {
    let json = if full {
        serde_json::to_string_pretty(&extract_payloads(tree))?
    } else {
        serde_json::to_string_pretty(&extract_all(tree))?
    };
    Ok(json)
}

pub fn extract(args: ExtractArgs, cwd: &str) -> Result<()> {
    let tree = read_document(&resolve(cwd, &args.input))?;
    let json = render_tables(&tree, args.full)?;

    let output = args.output.as_ref().map(|path| resolve(cwd, path));
    write_output(output.as_deref(), &json)?;

    if let Some(path) = &args.output {
        println!("  {} {}", "✓".green(), path.display());
    }
    Ok(())
}
