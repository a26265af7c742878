use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdf_drawer_core::{total_strokes, DocumentIdentity};
use pdf_drawer_export::{annotated_file_name, export_pdf_with_summary};
use pdf_drawer_render::{encode_png, render_preview, PreviewConfig};
use pdf_drawer_storage::{
    delete_entry, find_entry, list_entries, AnnotationPersistence, CodecConfig, FsBlobStore,
};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "pdf-drawer-cli")]
#[command(about = "Inspect, preview and export saved PDF annotations")]
pub struct Cli {
    /// Annotation store directory (defaults to PDF_DRAWER_STORE_DIR, then the
    /// platform data directory)
    #[arg(long, global = true, value_name = "DIR")]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List every saved document.
    List,
    /// Print the annotations saved for a PDF.
    Dump {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print compression statistics for a PDF's saved annotations.
    Stats {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Delete a saved entry by storage key.
    Delete {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Delete the saved annotations of a PDF.
    Clear {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Render a PNG preview of a saved entry.
    Preview {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(long, default_value_t = 200)]
        width: u32,
        #[arg(long, default_value_t = 150)]
        height: u32,
        #[arg(long)]
        output: PathBuf,
    },
    /// Write a copy of a PDF with its saved annotations drawn in.
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    key: String,
    deleted: bool,
}

#[derive(Debug, Serialize)]
struct ExportOutput {
    output: String,
    pages_written: usize,
    strokes_written: usize,
    strokes_skipped: usize,
    pages_skipped: usize,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let store = open_store(cli.store_dir)?;

    match cli.command {
        Commands::List => run_list(&store),
        Commands::Dump { file } => run_dump(store, &file),
        Commands::Stats { file } => run_stats(store, &file),
        Commands::Delete { key } => run_delete(store, key),
        Commands::Clear { file } => run_clear(store, &file),
        Commands::Preview { key, width, height, output } => {
            run_preview(&store, &key, width, height, &output)
        }
        Commands::Export { file, output } => run_export(store, &file, output.as_deref()),
    }
}

fn open_store(store_dir: Option<PathBuf>) -> Result<FsBlobStore> {
    let store = match store_dir {
        Some(dir) => FsBlobStore::with_root(dir),
        None => FsBlobStore::from_env().context("failed to locate annotation store")?,
    };
    tracing::debug!(root = %store.root().display(), "using annotation store");
    Ok(store)
}

fn print_json<T: Serialize>(payload: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(payload)?;
    println!("{json}");
    Ok(())
}

fn run_list(store: &FsBlobStore) -> Result<()> {
    let entries = list_entries(store).context("failed to list saved annotations")?;
    print_json(&entries)
}

fn run_dump(store: FsBlobStore, file: &Path) -> Result<()> {
    let persistence = persistence_for(store, file)?;
    let dump = persistence
        .dump_state()
        .context("failed to read saved annotations")?;
    print_json(&dump)
}

fn run_stats(store: FsBlobStore, file: &Path) -> Result<()> {
    let persistence = persistence_for(store, file)?;
    let stats = persistence
        .storage_stats()
        .context("failed to read saved annotations")?;
    print_json(&stats)
}

fn run_delete(mut store: FsBlobStore, key: String) -> Result<()> {
    let deleted = delete_entry(&mut store, &key)
        .with_context(|| format!("failed to delete entry {key}"))?;
    print_json(&DeleteOutput { key, deleted })
}

fn run_clear(store: FsBlobStore, file: &Path) -> Result<()> {
    let mut persistence = persistence_for(store, file)?;
    let deleted = persistence
        .clear_persisted()
        .context("failed to delete saved annotations")?;
    print_json(&DeleteOutput {
        key: persistence.key().to_string(),
        deleted,
    })
}

fn run_preview(
    store: &FsBlobStore,
    key: &str,
    width: u32,
    height: u32,
    output: &Path,
) -> Result<()> {
    let entry = find_entry(store, key)
        .context("failed to read saved annotations")?
        .with_context(|| format!("no saved entry for key {key}"))?;
    let annotations = entry
        .annotations
        .with_context(|| format!("saved entry {key} is unreadable"))?;

    let config = PreviewConfig::default().with_size(width, height);
    let pixmap = render_preview(&annotations, &config).context("failed to render preview")?;
    let png = encode_png(&pixmap)?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, png)
        .with_context(|| format!("failed to write image to {}", output.display()))?;

    println!("{}", output.display());
    Ok(())
}

fn run_export(store: FsBlobStore, file: &Path, output: Option<&Path>) -> Result<()> {
    let source =
        fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let persistence = persistence_for(store, file)?;
    let annotations = persistence
        .load()
        .with_context(|| format!("no saved annotations for {}", file.display()))?;

    let (bytes, summary) =
        export_pdf_with_summary(&source, &annotations).context("failed to export PDF")?;

    let output = output
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| default_export_output(file));
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!(
        strokes = total_strokes(&annotations),
        output = %output.display(),
        "exported annotated PDF"
    );
    print_json(&ExportOutput {
        output: output.display().to_string(),
        pages_written: summary.pages_written,
        strokes_written: summary.strokes_written,
        strokes_skipped: summary.strokes_skipped,
        pages_skipped: summary.pages_skipped,
    })
}

fn persistence_for(store: FsBlobStore, file: &Path) -> Result<AnnotationPersistence<FsBlobStore>> {
    let identity = document_identity(file)?;
    Ok(AnnotationPersistence::new(
        store,
        &identity,
        CodecConfig::default(),
    ))
}

/// Identity the drawing session uses for `file`: its name and byte size
fn document_identity(file: &Path) -> Result<DocumentIdentity> {
    ensure_file_exists(file)?;
    let metadata = fs::metadata(file)?;
    let name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("path has no file name: {}", file.display()))?;
    Ok(DocumentIdentity::new(name, metadata.len()))
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn default_export_output(file: &Path) -> PathBuf {
    let name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    file.with_file_name(annotated_file_name(&name))
}
