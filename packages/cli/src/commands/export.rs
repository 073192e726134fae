use super::{read_document, resolve};
use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tabula_document::schema::render_html;
use tabula_document::{find_all, ContentNode, WidgetAttrs};
use tabula_editor::{export as export_bundle, storage_key, ContentStore, EditorError, SaveStatus};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Document JSON file, or a directory of them
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Editor markup to export alongside a single document
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Editor instance id, appended to the storage key
    #[arg(long)]
    pub editor_id: Option<String>,

    /// Output directory (overrides config)
    #[arg(short, long)]
    pub out_dir: Option<String>,
}

/// Stores each entry as a file named after its key
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ContentStore for FileStore {
    fn put(&mut self, key: &str, value: &str) -> Result<(), EditorError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(key), value)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, EditorError> {
        let path = self.dir.join(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }
}

/// Placeholder markup for a document exported without editor markup
pub fn placeholder_markup(tree: &ContentNode) -> String {
    find_all(tree)
        .into_iter()
        .map(|node| render_html(&WidgetAttrs::from_node(node)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn export(args: ExportArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let out_dir = match &args.out_dir {
        Some(dir) => PathBuf::from(cwd).join(dir),
        None => config.get_out_dir(cwd),
    };
    let mut store = FileStore::new(&out_dir);

    let path = resolve(cwd, &args.path);
    if !path.exists() {
        return Err(anyhow!("Path does not exist: {}", path.display()));
    }

    println!("{}", "📦 Exporting documents...".bright_blue().bold());

    if path.is_file() {
        let key = storage_key(&config.storage_key, args.editor_id.as_deref());
        let html = args.html.as_ref().map(|html| resolve(cwd, html));
        let count = export_file(&mut store, &key, &path, html.as_deref())?;
        println!("  {} {} → {} ({} spreadsheet(s))", "✓".green(), path.display(), key, count);
    } else {
        // one editor per document, named after the file
        let documents = find_documents(&path, &out_dir);
        if documents.is_empty() {
            println!("{}", "⚠️  No documents found".yellow());
            return Ok(());
        }

        let mut error_count = 0;
        for document in &documents {
            let stem = document
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default();
            let key = storage_key(&config.storage_key, Some(stem));
            let relative = document.strip_prefix(&path).unwrap_or(document);
            match export_file(&mut store, &key, document, None) {
                Ok(count) => println!(
                    "  {} {} → {} ({} spreadsheet(s))",
                    "✓".green(),
                    relative.display(),
                    key,
                    count
                ),
                Err(e) => {
                    error_count += 1;
                    eprintln!(
                        "  {} {} - {}",
                        "✗".red(),
                        relative.display(),
                        e.to_string().red()
                    );
                }
            }
        }

        if error_count > 0 {
            return Err(anyhow!("{} of {} documents failed to export", error_count, documents.len()));
        }
    }

    println!();
    println!("{} Output in {}", "✅".green(), out_dir.display());
    Ok(())
}

/// Export one document; an `.html` file next to it is used as its markup
fn export_file(
    store: &mut FileStore,
    key: &str,
    path: &Path,
    html: Option<&Path>,
) -> Result<usize> {
    let tree = read_document(path)?;
    debug!(key, path = %path.display(), "Exporting document");

    let sibling = path.with_extension("html");
    let markup = match html {
        Some(html) => fs::read_to_string(html)?,
        None if sibling.exists() => fs::read_to_string(&sibling)?,
        None => placeholder_markup(&tree),
    };

    match export_bundle(store, key, &tree, &markup) {
        SaveStatus::Saved => Ok(find_all(&tree).len()),
        status => Err(anyhow!("{}", status)),
    }
}

fn find_documents(dir: &Path, out_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension().and_then(|s| s.to_str()) == Some("json")
                && !path.starts_with(out_dir)
                && path.file_name().and_then(|s| s.to_str()) != Some(DEFAULT_CONFIG_NAME)
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{write_sample, SAMPLE};
    use serde_json::{json, Value};
    use tabula_editor::load_content;

    #[test]
    fn test_placeholder_markup() {
        let tree = ContentNode::from_json(SAMPLE).unwrap();
        let html = placeholder_markup(&tree);

        assert_eq!(html.matches(r#"data-type="spreadsheet""#).count(), 2);
        assert!(html.contains(r#"data-id="t1""#));
        assert!(html.contains(r#"data-title="Costs""#));
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("k-json").unwrap(), None);
        store.put("k-json", "{}").unwrap();
        assert_eq!(store.get("k-json").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_export_single_document() {
        let dir = tempfile::tempdir().unwrap();
        write_sample(dir.path(), "doc.json");
        let cwd = dir.path().to_str().unwrap();

        let args = ExportArgs {
            path: PathBuf::from("doc.json"),
            html: None,
            editor_id: Some("e1".to_string()),
            out_dir: None,
        };
        export(args, cwd).unwrap();

        let out = dir.path().join("export");
        let html = fs::read_to_string(out.join("tiptap-e1-html")).unwrap();
        assert_eq!(html.matches(r#"class="spreadsheet-static""#).count(), 2);

        let tables: Value =
            serde_json::from_str(&fs::read_to_string(out.join("tiptap-e1-tables")).unwrap()).unwrap();
        assert_eq!(tables["t1"], json!([["rent", 900], ["food", 300]]));

        let store = FileStore::new(&out);
        let restored = load_content(&store, "tiptap-e1").unwrap().unwrap();
        assert_eq!(restored, ContentNode::from_json(SAMPLE).unwrap());
    }

    #[test]
    fn test_export_uses_given_markup() {
        let dir = tempfile::tempdir().unwrap();
        write_sample(dir.path(), "doc.json");
        fs::write(
            dir.path().join("editor.html"),
            r#"<h1>Budget</h1><div data-type="spreadsheet" data-id="t1"></div>"#,
        )
        .unwrap();

        let args = ExportArgs {
            path: PathBuf::from("doc.json"),
            html: Some(PathBuf::from("editor.html")),
            editor_id: None,
            out_dir: Some("dist".to_string()),
        };
        export(args, dir.path().to_str().unwrap()).unwrap();

        let html = fs::read_to_string(dir.path().join("dist/tiptap-html")).unwrap();
        assert!(html.starts_with("<h1>Budget</h1>"));
        assert_eq!(html.matches(r#"class="spreadsheet-static""#).count(), 1);
    }

    #[test]
    fn test_export_directory_keys_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        write_sample(&docs, "a.json");
        write_sample(&docs, "b.json");
        let cwd = dir.path().to_str().unwrap();

        let args = ExportArgs {
            path: PathBuf::from("docs"),
            html: None,
            editor_id: None,
            out_dir: None,
        };
        export(args, cwd).unwrap();

        let out = dir.path().join("export");
        assert!(out.join("tiptap-a-json").exists());
        assert!(out.join("tiptap-b-json").exists());
    }

    #[test]
    fn test_export_directory_reports_bad_documents() {
        let dir = tempfile::tempdir().unwrap();
        write_sample(dir.path(), "good.json");
        fs::write(dir.path().join("bad.json"), "[1, 2").unwrap();

        let args = ExportArgs {
            path: PathBuf::from("."),
            html: None,
            editor_id: None,
            out_dir: None,
        };
        let err = export(args, dir.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
        assert!(dir.path().join("export/tiptap-good-json").exists());
    }
}
