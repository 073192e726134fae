pub mod export;
pub mod extract;
pub mod init;
pub mod inspect;
pub mod set_cells;

pub use export::{export, ExportArgs};
pub use extract::{extract, ExtractArgs};
pub use init::{init, InitArgs};
pub use inspect::{inspect, InspectArgs};
pub use set_cells::{set_cells, SetCellsArgs};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tabula_document::ContentNode;

/// Resolve a path argument against the working directory
pub(crate) fn resolve(cwd: &str, path: &Path) -> PathBuf {
    PathBuf::from(cwd).join(path)
}

pub(crate) fn read_document(path: &Path) -> Result<ContentNode> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read document {}", path.display()))?;
    ContentNode::from_json(&json)
        .with_context(|| format!("{} is not a content tree", path.display()))
}

pub(crate) fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, text)?;
        }
        None => println!("{}", text),
    }
    Ok(())
}
