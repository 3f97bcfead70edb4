//! Main entry point for the sketchfile CLI application.
//!
//! Loads a package from a local path or an HTTP URL and prints pages,
//! document or page JSON, or the text of text layers.

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sketchfile::{Cli, HttpRangeReader, LocalFileReader, Package, ReadAt, ZipExtractor};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    if cli.is_http_url() {
        let reader = Arc::new(HttpRangeReader::new(cli.file.clone()).await?);
        run(Arc::clone(&reader), &cli).await?;

        if !cli.is_quiet() {
            eprintln!("\nTotal bytes transferred: {}", format_size(reader.transferred_bytes()));
        }
    } else {
        let reader = Arc::new(LocalFileReader::new(Path::new(&cli.file))?);
        run(reader, &cli).await?;
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli) -> Result<()> {
    if cli.verbose {
        list_entries(Arc::clone(&reader)).await?;
    }

    let package = Package::from_reader(reader, &cli.load_options()).await?;

    if cli.document {
        match &package.document {
            Some(document) => print_json(document)?,
            None => bail!("{} has no document.json", cli.file),
        }
    }

    if let Some(name) = &cli.page {
        let page = package
            .page(name)
            .with_context(|| format!("no page named {:?}", name))?;
        print_json(page)?;
    }

    if cli.text {
        print_text(&package);
    }

    if cli.list || !(cli.document || cli.page.is_some() || cli.text) {
        list_pages(&package);
    }

    Ok(())
}

/// Archive entries with their sizes, the way `unzip -v` shows them.
async fn list_entries<R: ReadAt + 'static>(reader: Arc<R>) -> Result<()> {
    let entries = ZipExtractor::new(reader).list_files().await?;

    println!("{:>10}  {:>10}  {:>5}  {:>8}  Name", "Length", "Size", "Cmpr", "Method");
    println!("{}", "-".repeat(60));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    for entry in entries.iter().filter(|e| !e.is_directory) {
        println!(
            "{:>10}  {:>10}  {}  {:>8}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            entry.compression_method.to_string(),
            entry.file_name
        );
        total_uncompressed = total_uncompressed.saturating_add(entry.uncompressed_size);
        total_compressed = total_compressed.saturating_add(entry.compressed_size);
    }

    println!("{}", "-".repeat(60));
    println!(
        "{:>10}  {:>10}  {}  {:>8}  {} files\n",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        entries.iter().filter(|e| !e.is_directory).count()
    );
    Ok(())
}

fn list_pages(package: &Package) {
    if let Some(meta) = &package.meta {
        println!(
            "{} {}",
            meta.app.as_deref().unwrap_or("unknown app"),
            meta.app_version.as_deref().unwrap_or("")
        );
    }

    let mut total = 0;
    for page in package.ordered_pages() {
        let count = page.layer_count();
        total += count;
        println!(
            "{:>8}  {}",
            count,
            page.name.as_deref().unwrap_or("<unnamed>")
        );
    }
    println!("{:>8}  {} pages", total, package.pages.len());
}

fn print_text(package: &Package) {
    for page in package.ordered_pages() {
        let page_name = page.name.as_deref().unwrap_or("<unnamed>");
        for root in page.layers() {
            root.walk(&mut |layer, _| {
                if let Some(text) = layer.text() {
                    println!(
                        "{} / {}: {}",
                        page_name,
                        layer.name.as_deref().unwrap_or("<unnamed>"),
                        text.replace('\n', " ")
                    );
                }
            });
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Space saved, as `unzip -v` prints it. Sizes come from the archive and
/// may be forged, so the arithmetic is done in u128.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        let kept = u128::from(compressed) * 100 / u128::from(uncompressed);
        format!("{:>4}%", 100 - kept)
    } else {
        "  0%".to_string()
    }
}

fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
