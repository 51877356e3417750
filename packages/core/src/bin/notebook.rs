//! Notebook command line
//!
//! Imports one or more files into an in-memory notebook, prints the resulting
//! tree and optionally writes an HTML export.
//!
//! # Usage
//!
//! ```bash
//! # Import a markdown outline and an earlier export, print the tree
//! cargo run --bin notebook -- notes.md backup.html
//!
//! # Mark documents matching a query and export everything
//! cargo run --bin notebook -- --search budget --export all.html notes.md
//! ```
//!
//! # Environment Variables
//!
//! - `NOTEBOOK_MAX_IMPORT_RECORDS`: records accepted per import (default: 1000)
//! - `NOTEBOOK_DELETE_CASCADE`: `store` or `engine` (default: store)
//! - `NOTEBOOK_DEFAULT_TITLE`: title for untitled records (default: Untitled)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use notebook_core::services::{export_all_to_html, DocumentService, ImportSource, SearchView};
use notebook_core::{NotebookConfig, TreeItem};

#[derive(Parser, Debug)]
#[command(name = "notebook")]
#[command(author, version, about = "Import files into a notebook and print its tree", long_about = None)]
struct Cli {
    /// Files to import (.md, .html, .json)
    #[arg(required = true, value_name = "SOURCE")]
    sources: Vec<PathBuf>,

    /// Write an HTML export of the whole notebook
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Only print documents matching this query and their ancestors
    #[arg(long, value_name = "QUERY")]
    search: Option<String>,
}

fn print_tree(items: &[TreeItem], depth: usize, view: &SearchView) {
    for item in items {
        if !view.is_visible(item.id) {
            continue;
        }
        let marker = if view.is_match(item.id) { " *" } else { "" };
        println!("{}{} [{}]{}", "  ".repeat(depth), item.title, item.id, marker);
        print_tree(&item.children, depth + 1, view);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();

    let config = NotebookConfig::default().with_env_overrides();
    let service = DocumentService::in_memory(config).context("Failed to start notebook")?;

    for path in &args.sources {
        let source = ImportSource::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let report = service
            .import(source, None)
            .await
            .with_context(|| format!("Failed to import {}", path.display()))?;

        tracing::info!(
            "{}: {} created, {} orphaned, {} failed",
            path.display(),
            report.created(),
            report.orphaned.len(),
            report.failed()
        );
        for failure in &report.failures {
            tracing::warn!("{}: {}", path.display(), failure.error);
        }
    }

    let view = match &args.search {
        Some(query) => service.search(query).await?,
        None => SearchView::unfiltered(),
    };
    print_tree(&service.get_tree().await?, 0, &view);

    if let Some(export_path) = &args.export {
        let html = export_all_to_html(&service).await?;
        tokio::fs::write(export_path, html)
            .await
            .with_context(|| format!("Failed to write {}", export_path.display()))?;
        tracing::info!("Exported notebook to {}", export_path.display());
    }

    Ok(())
}
