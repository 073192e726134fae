use super::{read_document, resolve};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tabula_document::{duplicate_ids, find_all, ContentNode, WidgetAttrs};

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Document JSON file
    pub input: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// One line of the inspect report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSummary {
    pub id: Option<String>,
    pub title: String,
    pub shape: String,
    pub has_data: bool,
    pub formulas: usize,
    pub named_expressions: usize,
}

pub fn summarize(tree: &ContentNode) -> Vec<WidgetSummary> {
    find_all(tree)
        .into_iter()
        .map(|node| {
            let attrs = WidgetAttrs::from_node(node);
            WidgetSummary {
                title: attrs.title_or_default().to_string(),
                shape: attrs.data_or_default().shape_label(),
                has_data: attrs.has_data(),
                formulas: attrs.formulas.len(),
                named_expressions: attrs.named_expressions.len(),
                id: attrs.id,
            }
        })
        .collect()
}

pub fn inspect(args: InspectArgs, cwd: &str) -> Result<()> {
    let path = resolve(cwd, &args.input);
    let tree = read_document(&path)?;
    let summaries = summarize(&tree);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("{}", "No spreadsheets found".yellow());
        return Ok(());
    }

    println!(
        "{} {} spreadsheet(s) in {}",
        "📊".bright_blue(),
        summaries.len(),
        args.input.display()
    );
    for summary in &summaries {
        let id = match &summary.id {
            Some(id) => id.bright_white(),
            None => "(no id)".dimmed(),
        };
        let data = if summary.has_data { "" } else { " (default grid)" };
        println!(
            "  {} {} {} [{}{}]",
            "•".green(),
            id,
            summary.title,
            summary.shape,
            data.dimmed()
        );
        if summary.formulas > 0 || summary.named_expressions > 0 {
            println!(
                "      {} formula(s), {} named expression(s)",
                summary.formulas, summary.named_expressions
            );
        }
    }

    for id in duplicate_ids(&tree) {
        println!(
            "{} id {} is used by more than one spreadsheet",
            "⚠️".yellow(),
            id.bright_white()
        );
    }

    Ok(())
}
