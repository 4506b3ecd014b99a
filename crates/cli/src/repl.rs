//! Interactive session over a [`Loader`].

use crate::read_payloads;
use crate::render::{render_page, render_table, OutputFormat};
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use sheetmerge_sheet::Loader;
use std::path::{Path, PathBuf};

/// One parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Add(Vec<PathBuf>),
    Delete(String),
    Replace { source: String, file: PathBuf },
    Toggle { source: String, column: String },
    Shared(Option<String>),
    Sources,
    Columns,
    Show(String),
    Preview(Option<usize>),
    Next,
    Previous,
    Export(Option<PathBuf>),
    Set { key: String, value: String },
    Format(OutputFormat),
    Help,
    Quit,
}

/// Split a line on whitespace, keeping quoted runs together.
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for ch in line.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(ch);
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        bail!("Unterminated quote");
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_command(line: &str) -> Result<ReplCommand> {
    let tokens = tokenize(line)?;
    let Some((head, args)) = tokens.split_first() else {
        bail!("Empty command");
    };
    let head = head.trim_start_matches(':').to_ascii_lowercase();

    let command = match (head.as_str(), args) {
        ("add", files) if !files.is_empty() => {
            ReplCommand::Add(files.iter().map(PathBuf::from).collect())
        }
        ("delete" | "rm", [source]) => ReplCommand::Delete(source.clone()),
        ("replace", [source, file]) => ReplCommand::Replace {
            source: source.clone(),
            file: PathBuf::from(file),
        },
        ("toggle", [source, column]) => ReplCommand::Toggle {
            source: source.clone(),
            column: column.clone(),
        },
        ("shared", []) => ReplCommand::Shared(None),
        ("shared", [column]) => ReplCommand::Shared(Some(column.clone())),
        ("sources" | "ls", []) => ReplCommand::Sources,
        ("columns", []) => ReplCommand::Columns,
        ("show", [source]) => ReplCommand::Show(source.clone()),
        ("preview", []) => ReplCommand::Preview(None),
        ("preview", [page]) => ReplCommand::Preview(Some(
            page.parse()
                .with_context(|| format!("Invalid page number: '{page}'"))?,
        )),
        ("next" | "n", []) => ReplCommand::Next,
        ("prev" | "p", []) => ReplCommand::Previous,
        ("export", []) => ReplCommand::Export(None),
        ("export", [path]) => ReplCommand::Export(Some(PathBuf::from(path))),
        ("set", [pair]) => {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("Invalid option format: '{pair}'. Expected KEY=VALUE"))?;
            ReplCommand::Set {
                key: key.to_string(),
                value: value.to_string(),
            }
        }
        ("set", [key, value]) => ReplCommand::Set {
            key: key.clone(),
            value: value.clone(),
        },
        ("format", [name]) => ReplCommand::Format(
            OutputFormat::from_str(name, true).map_err(|e| anyhow::anyhow!(e))?,
        ),
        ("help" | "h" | "?", _) => ReplCommand::Help,
        ("quit" | "q" | "exit", _) => ReplCommand::Quit,
        (other, _) => bail!("Unknown command or wrong arguments: {other} (try 'help')"),
    };
    Ok(command)
}

/// Mutable view state the REPL keeps between commands.
struct ReplState {
    page: usize,
    format: OutputFormat,
}

/// Run the REPL, loading `files` first.
pub async fn run_repl(loader: &Loader, files: Vec<PathBuf>) -> Result<()> {
    println!(
        "{} {} - Interactive Mode",
        "sheetmerge".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "Type {} for help, {} to exit\n",
        "help".yellow(),
        "quit".yellow()
    );

    let mut state = ReplState {
        page: 1,
        format: OutputFormat::Table,
    };

    if !files.is_empty() {
        if let Err(e) = execute(loader, ReplCommand::Add(files), &mut state).await {
            println!("{} {e}", "Error:".red().bold());
        }
    }

    let mut rl = DefaultEditor::new()?;
    let history_path = dirs_history_path();

    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = "merge> ".green().bold().to_string();

        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                let command = match parse_command(line) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{} {e}", "Error:".red().bold());
                        continue;
                    }
                };
                if command == ReplCommand::Quit {
                    break;
                }
                if let Err(e) = execute(loader, command, &mut state).await {
                    println!("{} {e}", "Error:".red().bold());
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                println!("{} {e}", "Error:".red().bold());
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}

async fn execute(loader: &Loader, command: ReplCommand, state: &mut ReplState) -> Result<()> {
    match command {
        ReplCommand::Add(files) => {
            let report = loader.add_sources(read_payloads(&files)?).await;
            for name in &report.added {
                println!("{} {name}", "Loaded".green());
            }
            if let Some(message) = report.error_message() {
                println!("{} {message}", "Error:".red().bold());
            }
        }
        ReplCommand::Delete(source) => {
            loader.delete_source(&source).await?;
            println!("{} {source}", "Removed".green());
        }
        ReplCommand::Replace { source, file } => {
            let payload = read_payloads(std::slice::from_ref(&file))?
                .pop()
                .context("No file to read")?;
            let name = loader.replace_source(&source, payload).await?;
            println!("{} {source} with {name}", "Replaced".green());
        }
        ReplCommand::Toggle { source, column } => {
            let selected = loader.toggle_column(&source, &column).await?;
            print_toggle(&format!("{source}:{column}"), selected);
        }
        ReplCommand::Shared(Some(column)) => {
            let selected = loader.toggle_shared_column(&column).await?;
            print_toggle(&column, selected);
        }
        ReplCommand::Shared(None) => {
            let session = loader.lock().await;
            let shared = session.shared_columns();
            if shared.is_empty() {
                println!("{}", "No shared columns".yellow());
            }
            for column in &shared {
                println!("  {} {column}", mark(session.is_shared_selected(column)));
            }
        }
        ReplCommand::Sources => {
            let session = loader.lock().await;
            if session.source_count() == 0 {
                println!("{}", "No files loaded".yellow());
            }
            for source in session.sources() {
                println!(
                    "  {} ({} columns, {} rows)",
                    source.name().cyan(),
                    source.headers().len(),
                    source.row_count()
                );
            }
        }
        ReplCommand::Columns => {
            let session = loader.lock().await;
            for (source, headers) in session.columns_of() {
                println!("{}", source.cyan().bold());
                for header in &headers {
                    println!("  {} {header}", mark(session.is_selected(&source, header)));
                }
            }
        }
        ReplCommand::Show(source) => {
            let table = loader.lock().await.source_table(&source)?;
            println!("{}", render_table(&table, state.format)?);
        }
        ReplCommand::Preview(page) => {
            if let Some(page) = page {
                state.page = page;
            }
            show_page(loader, state).await?;
        }
        ReplCommand::Next => {
            state.page += 1;
            show_page(loader, state).await?;
        }
        ReplCommand::Previous => {
            state.page = state.page.saturating_sub(1).max(1);
            show_page(loader, state).await?;
        }
        ReplCommand::Export(target) => {
            let exported = loader.export_all().await?;
            let path = match target {
                Some(path) if path.is_dir() => exported.save_in(&path)?,
                Some(path) => {
                    std::fs::write(&path, &exported.bytes)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    path
                }
                None => exported.save_in(Path::new("."))?,
            };
            println!("{} {}", "Saved".green().bold(), path.display());
        }
        ReplCommand::Set { key, value } => {
            let mut session = loader.lock().await;
            let mut options = session.options().clone();
            options.set(&key, &value)?;
            session.set_options(options)?;
            println!("{key} = {value}");
        }
        ReplCommand::Format(format) => state.format = format,
        ReplCommand::Help => print_help(),
        ReplCommand::Quit => {}
    }
    Ok(())
}

/// Print the current page, pulling the stored page number back into range.
async fn show_page(loader: &Loader, state: &mut ReplState) -> Result<()> {
    let page = loader.preview(state.page).await?;
    state.page = page.number;
    println!("{}", render_page(page, state.format)?);
    Ok(())
}

fn mark(selected: bool) -> String {
    if selected {
        "[x]".green().to_string()
    } else {
        "[ ]".dimmed().to_string()
    }
}

fn print_toggle(what: &str, selected: bool) {
    if selected {
        println!("{} {what}", "Selected".green());
    } else {
        println!("{} {what}", "Deselected".yellow());
    }
}

/// Get the history file path.
fn dirs_history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|mut p| {
        p.push("sheetmerge");
        let _ = std::fs::create_dir_all(&p);
        p.push("history.txt");
        p
    })
}

fn print_help() {
    println!("{}", "sheetmerge REPL Commands:".cyan().bold());
    println!("  {}  Load spreadsheet files", "add FILE...".yellow());
    println!("  {}  Remove a loaded file", "delete SOURCE".yellow());
    println!("  {}  Re-load a file in place", "replace SOURCE FILE".yellow());
    println!("  {}  Select or deselect one column", "toggle SOURCE COLUMN".yellow());
    println!("  {}  List shared columns or toggle one everywhere", "shared [COLUMN]".yellow());
    println!("  {}  List loaded files", "sources".yellow());
    println!("  {}  List columns with selection marks", "columns".yellow());
    println!("  {}  Show one file's own data", "show SOURCE".yellow());
    println!("  {}  Show a page of the combined data", "preview [PAGE]".yellow());
    println!("  {}  Move between pages", "next, prev".yellow());
    println!("  {}  Write the combined workbook", "export [PATH]".yellow());
    println!("  {}  Change an option", "set KEY=VALUE".yellow());
    println!("  {}  Output format (table, json, csv)", "format NAME".yellow());
    println!("  {}  Exit the REPL", "quit, q, exit".yellow());
    println!();
    println!("{}", "Examples:".cyan().bold());
    println!("  add q1.xlsx \"q2 sales.xlsx\"");
    println!("  shared ID");
    println!("  toggle q1.xlsx Name");
    println!("  export combined.xlsx");
}
