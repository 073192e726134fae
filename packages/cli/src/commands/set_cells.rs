use super::{read_document, resolve};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tabula_document::{find_by_id, update_by_id, CellMatrix, ContentNode};

#[derive(Debug, Args)]
pub struct SetCellsArgs {
    /// Document JSON file
    pub input: PathBuf,

    /// Id of the spreadsheet to rewrite
    #[arg(long)]
    pub id: String,

    /// New cell data, e.g. '[["a", 1], ["b", 2]]'
    #[arg(long)]
    pub data: String,

    /// Write the updated document here instead of overwriting the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Copy of `tree` with the spreadsheet `id` holding `data`
pub fn apply_cells(tree: &ContentNode, id: &str, data: &str) -> Result<ContentNode> {
    let value: Value = serde_json::from_str(data)?;
    let matrix = CellMatrix::from_json(&value).ok_or_else(|| {
        anyhow!("Cell data must be an array of equally long rows of strings, numbers or nulls")
    })?;

    if find_by_id(tree, id).is_none() {
        return Err(anyhow!("No spreadsheet with id {}", id));
    }
    Ok(update_by_id(tree, id, &matrix))
}

pub fn set_cells(args: SetCellsArgs, cwd: &str) -> Result<()> {
    let input = resolve(cwd, &args.input);
    let tree = read_document(&input)?;
    let updated = apply_cells(&tree, &args.id, &args.data)?;

    let output = args
        .output
        .as_ref()
        .map(|path| resolve(cwd, path))
        .unwrap_or(input);
    fs::write(&output, serde_json::to_string_pretty(&updated)?)?;

    let shape = find_by_id(&updated, &args.id)
        .and_then(|node| node.attr("data"))
        .and_then(CellMatrix::from_json)
        .map(|matrix| matrix.shape_label())
        .unwrap_or_default();
    println!(
        "  {} {} [{}] → {}",
        "✓".green(),
        args.id.bright_white(),
        shape,
        output.display()
    );
    Ok(())
}
