//! # sheetmerge-cli
//!
//! Command-line interface for combining columns from several spreadsheets.

mod render;
mod repl;

use anyhow::{bail, Context, Result};
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::Colorize;
use render::{render_page, OutputFormat};
use sheetmerge_core::{MergeOptions, Session};
use sheetmerge_sheet::{FilePayload, Loader};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// sheetmerge - Combine selected columns from many spreadsheets into one
#[derive(Parser)]
#[command(name = "sheetmerge")]
#[command(author, version, about = "Combine selected spreadsheet columns", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON file with merge options
    #[arg(long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Set option (key=value)
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", global = true)]
    options: Vec<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Merge columns from the given files in one go
    Merge {
        /// Spreadsheet files (.xlsx or .xls)
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Select a column of one file (FILE:COLUMN), in output order
        #[arg(short = 'c', long = "column", value_name = "FILE:COLUMN")]
        columns: Vec<String>,

        /// Select a column in every file, in output order
        #[arg(short = 's', long = "shared", value_name = "COLUMN")]
        shared: Vec<String>,

        /// Select every column shared by all files, at this point in the order
        #[arg(long = "all-shared")]
        all_shared: bool,

        /// Write the combined workbook here
        #[arg(short = 'o', long = "output", value_name = "PATH")]
        output: Option<PathBuf>,

        /// Preview page to print
        #[arg(short = 'p', long = "page", default_value_t = 1)]
        page: usize,

        /// Output format (table, json, csv)
        #[arg(short = 'f', long = "format", default_value = "table")]
        format: OutputFormat,
    },

    /// Start an interactive session
    Repl {
        /// Files to load on start
        #[arg(value_name = "FILES")]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    // Initialize logging
    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = load_options(cli.config.as_deref(), &cli.options)?;
    let loader = Loader::new(Session::with_options(options)?);

    match cli.command {
        Command::Merge {
            files,
            columns,
            shared,
            all_shared,
            output,
            page,
            format,
        } => {
            let picks = matches
                .subcommand_matches("merge")
                .map(|m| pick_order(m, columns, shared, all_shared))
                .unwrap_or_default();
            let request = MergeRequest {
                files,
                picks,
                output,
                page,
                format,
            };
            run_merge(&loader, request).await
        }
        Command::Repl { files } => repl::run_repl(&loader, files).await,
    }
}

/// Read options from an optional JSON file, then apply `KEY=VALUE` overrides.
fn load_options(config: Option<&Path>, overrides: &[String]) -> Result<MergeOptions> {
    let mut options = match config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str::<MergeOptions>(&text)
                .with_context(|| format!("Invalid config: {}", path.display()))?
        }
        None => MergeOptions::default(),
    };

    for entry in overrides {
        let (key, value) = entry.split_once('=').with_context(|| {
            format!("Invalid option format: '{entry}'. Expected KEY=VALUE format")
        })?;
        options.set(key.trim(), value.trim())?;
    }

    options.validate()?;
    Ok(options)
}

/// Only Excel workbooks are accepted.
pub(crate) fn check_file_type(path: &Path) -> Result<()> {
    let supported = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx") || e.eq_ignore_ascii_case("xls"));

    if !supported {
        bail!(
            "Please upload only Excel files (.xlsx or .xls): {}",
            path.display()
        );
    }
    Ok(())
}

/// Gate and read files from disk.
pub(crate) fn read_payloads(paths: &[PathBuf]) -> Result<Vec<FilePayload>> {
    paths
        .iter()
        .map(|path| {
            check_file_type(path)?;
            FilePayload::from_path(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))
        })
        .collect()
}

/// One selection flag of the `merge` command.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pick {
    /// `--column FILE:COLUMN`
    Column(String),
    /// `--shared COLUMN`
    Shared(String),
    /// `--all-shared`
    AllShared,
}

/// Interleave selection flags in the order they were given.
fn pick_order(
    matches: &ArgMatches,
    columns: Vec<String>,
    shared: Vec<String>,
    all_shared: bool,
) -> Vec<Pick> {
    let indices = |id: &str| -> Vec<usize> {
        matches
            .indices_of(id)
            .map(Iterator::collect)
            .unwrap_or_default()
    };

    let mut picks: Vec<(usize, Pick)> = Vec::new();
    picks.extend(indices("columns").into_iter().zip(columns.into_iter().map(Pick::Column)));
    picks.extend(indices("shared").into_iter().zip(shared.into_iter().map(Pick::Shared)));
    if all_shared {
        let at = indices("all_shared").first().copied().unwrap_or(usize::MAX);
        picks.push((at, Pick::AllShared));
    }

    picks.sort_by_key(|(index, _)| *index);
    picks.into_iter().map(|(_, pick)| pick).collect()
}

struct MergeRequest {
    files: Vec<PathBuf>,
    picks: Vec<Pick>,
    output: Option<PathBuf>,
    page: usize,
    format: OutputFormat,
}

/// Load, select, preview and optionally export in one pass.
async fn run_merge(loader: &Loader, request: MergeRequest) -> Result<()> {
    let payloads = read_payloads(&request.files)?;
    let report = loader.add_sources(payloads).await;
    if let Some(message) = report.error_message() {
        eprintln!("{} {message}", "Error:".red().bold());
    }
    if report.added.is_empty() {
        bail!("No files could be loaded");
    }
    tracing::info!(loaded = report.added.len(), failed = report.failed.len(), "sources loaded");

    for pick in &request.picks {
        match pick {
            Pick::Column(spec) => {
                let (source, column) = spec
                    .split_once(':')
                    .with_context(|| format!("Invalid column '{spec}'. Expected FILE:COLUMN"))?;
                if !loader.lock().await.is_selected(source, column) {
                    loader.toggle_column(source, column).await?;
                }
            }
            Pick::Shared(column) => select_shared(loader, column).await?,
            Pick::AllShared => {
                for column in loader.shared_columns().await {
                    select_shared(loader, &column).await?;
                }
            }
        }
    }

    let page = loader.preview(request.page).await?;
    println!("{}", render_page(page, request.format)?);

    if let Some(path) = request.output {
        let exported = loader.export_all().await?;
        std::fs::write(&path, &exported.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("{} {}", "Saved".green().bold(), path.display());
    }

    Ok(())
}

/// Make sure a shared column ends up selected in every source.
async fn select_shared(loader: &Loader, column: &str) -> Result<()> {
    if !loader.lock().await.is_shared_selected(column) {
        loader.toggle_shared_column(column).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_gate() {
        assert!(check_file_type(Path::new("a.xlsx")).is_ok());
        assert!(check_file_type(Path::new("b.XLS")).is_ok());
        let err = check_file_type(Path::new("c.csv")).unwrap_err();
        assert!(err.to_string().contains("Please upload only Excel files"));
        assert!(check_file_type(Path::new("noext")).is_err());
    }

    fn merge_picks(args: &[&str]) -> Vec<Pick> {
        let matches = Cli::command().try_get_matches_from(args).unwrap();
        let Command::Merge {
            columns,
            shared,
            all_shared,
            ..
        } = Cli::from_arg_matches(&matches).unwrap().command
        else {
            panic!("expected merge");
        };
        pick_order(
            matches.subcommand_matches("merge").unwrap(),
            columns,
            shared,
            all_shared,
        )
    }

    #[test]
    fn test_picks_follow_command_line_order() {
        let picks = merge_picks(&[
            "sheetmerge", "merge", "a.xlsx", "b.xlsx", "--column", "a.xlsx:Name", "--shared", "ID",
            "--all-shared", "-c", "b.xlsx:Total",
        ]);
        assert_eq!(
            picks,
            vec![
                Pick::Column("a.xlsx:Name".to_string()),
                Pick::Shared("ID".to_string()),
                Pick::AllShared,
                Pick::Column("b.xlsx:Total".to_string()),
            ]
        );
    }

    #[test]
    fn test_load_options_overrides() {
        let options =
            load_options(None, &["page_size=25".to_string(), "decode_dates = false".to_string()])
                .unwrap();
        assert_eq!(options.page_size, 25);
        assert!(!options.decode_dates);

        assert!(load_options(None, &["page_size".to_string()]).is_err());
    }

    #[test]
    fn test_load_options_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"export_file_name": "all.xlsx"}"#).unwrap();

        let options = load_options(Some(&path), &["page_size=5".to_string()]).unwrap();
        assert_eq!(options.export_file_name, "all.xlsx");
        assert_eq!(options.page_size, 5);
    }
}
