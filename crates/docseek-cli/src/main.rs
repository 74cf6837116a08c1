//! docseek CLI: Resumable local document search

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docseek_core::{
    Config, DocseekError, Embedder, IndexBuilder, SearchResult, Searcher, Storage, VectorIndex,
    discover, pending_files, scan::Scanner,
};
use indicatif::{ProgressBar, ProgressStyle};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::{LinesWithEndings, as_24_bit_terminal_escaped};

/// Resolution of the progress bar driven by fractional progress
const PROGRESS_STEPS: u64 = 1000;

#[derive(Parser)]
#[command(name = "docseek")]
#[command(about = "Resumable local document search", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Search query (when no subcommand is given)
    #[arg(trailing_var_arg = true)]
    query: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new .docseek repository
    Init,

    /// List the files that would be indexed
    Scan {
        /// Directory to scan (default: repository root)
        path: Option<PathBuf>,
    },

    /// Add new files to the index
    Index {
        /// Directory to index (default: repository root)
        path: Option<PathBuf>,

        /// Discard the existing index and embed every file again
        #[arg(long)]
        rebuild: bool,
    },

    /// Show index status and statistics
    Status,

    /// Search indexed documents
    Search {
        /// Search query
        query: Vec<String>,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => cmd_init()?,
        Some(Commands::Scan { path }) => cmd_scan(path)?,
        Some(Commands::Index { path, rebuild }) => cmd_index(path, rebuild)?,
        Some(Commands::Status) => cmd_status()?,
        Some(Commands::Search { query, limit }) => cmd_search(&query.join(" "), limit)?,
        None => {
            if cli.query.is_empty() {
                println!("Usage: docseek <query> or docseek <command>");
                println!("Run 'docseek --help' for more information.");
            } else {
                cmd_search(&cli.query.join(" "), None)?;
            }
        }
    }

    Ok(())
}

fn repo_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    discover::find_root(&cwd).context("Not in a docseek repository. Run 'docseek init' first.")
}

fn scanner(config: &Config) -> Scanner {
    Scanner::new(config.max_file_size).with_excluded_dirs(config.exclude_dirs.iter().cloned())
}

fn cmd_init() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let dir = discover::init(&cwd)?;

    Config::default().save(&cwd)?;

    println!("Initialized docseek repository in {}", dir.display());
    println!("Run 'docseek index' to index files.");

    Ok(())
}

fn cmd_scan(path: Option<PathBuf>) -> Result<()> {
    let root = repo_root()?;
    let config = Config::load(&root)?;
    let target = path.unwrap_or_else(|| root.clone());

    let files = scanner(&config)
        .scan(&target)
        .with_context(|| format!("Failed to scan {}", target.display()))?;

    for file in &files {
        println!("{}", file.display());
    }
    println!("\n{} document(s) found.", files.len());

    Ok(())
}

fn cmd_index(path: Option<PathBuf>, rebuild: bool) -> Result<()> {
    let root = repo_root()?;
    let config = Config::load(&root)?;
    let target = path.unwrap_or_else(|| root.clone());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Scanning files...");

    let files = scanner(&config)
        .scan(&target)
        .with_context(|| format!("Failed to scan {}", target.display()))?;
    pb.set_message(format!("Found {} documents, loading model...", files.len()));

    let embedder = Embedder::new(&config)?;
    let mut builder = IndexBuilder::from_config(&root, &config, &embedder);

    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {percent:>3}% {msg}")?
            .progress_chars("█▓░"),
    );
    pb.set_length(PROGRESS_STEPS);

    builder.set_progress_callback(Box::new({
        let pb = pb.clone();
        move |fraction, message| {
            pb.set_position((fraction.clamp(0.0, 1.0) * PROGRESS_STEPS as f32) as u64);
            pb.set_message(message.to_string());
        }
    }));

    let stats = if rebuild {
        builder.rebuild(&files)?
    } else {
        builder.build(&files)?
    };

    pb.finish_and_clear();

    println!("✓ Indexing complete:");
    println!("  Files scanned:   {}", stats.candidates);
    println!("  New files:       {}", stats.new_files);
    println!("  Files indexed:   {}", stats.files_indexed);
    println!("  Files skipped:   {}", stats.files_skipped);
    println!("  Chunks embedded: {}", stats.chunks_embedded);
    println!("  Total documents: {}", stats.total_documents);

    Ok(())
}

fn cmd_status() -> Result<()> {
    let root = repo_root()?;
    let config = Config::load(&root)?;

    println!("docseek repository: {}", root.display());
    println!();
    println!("Configuration:");
    println!("  Model: {}", config.model);
    println!("  Chunk size: {} chars", config.chunk_size);
    println!("  Max file size: {} bytes", config.max_file_size);
    println!("  Index: {}", config.index_file(&root).display());
    println!("  Metadata: {}", config.metadata_file(&root).display());
    println!();
    println!("Index:");

    let loaded: docseek_core::Result<Storage> =
        Storage::load(&config.index_file(&root), &config.metadata_file(&root));
    let indexed = match loaded {
        Ok(storage) => {
            println!("  Documents indexed: {}", storage.len());
            println!("  Vectors: {}", storage.index.len());
            println!("  Dimension: {}", storage.index.dimension());
            storage.metadata
        }
        Err(DocseekError::IndexNotFound(_)) => {
            println!("  Not built yet. Run 'docseek index'.");
            Vec::new()
        }
        Err(e) => {
            println!("  Unreadable ({}); the next 'docseek index' rebuilds it.", e);
            Vec::new()
        }
    };

    let files = scanner(&config)
        .scan(&root)
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    let pending = pending_files(&files, &indexed).len();
    if pending > 0 {
        println!();
        println!(
            "There are {} new files that can be added to your existing index.",
            pending
        );
        println!("Run 'docseek index' to add them.");
    }

    Ok(())
}

fn cmd_search(query: &str, limit: Option<usize>) -> Result<()> {
    let root = repo_root()?;
    let config = Config::load(&root)?;
    let limit = limit.unwrap_or(config.top_k);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Searching...");

    let embedder = Embedder::new(&config)?;
    let searcher: Searcher = Searcher::from_config(&root, &config, &embedder)
        .context("No index found. Run 'docseek index' first.")?;
    let results = searcher.search(query, limit)?;

    pb.finish_and_clear();

    if results.is_empty() {
        println!("No results found for: {}", query);
        return Ok(());
    }

    let highlighter = SyntaxHighlighter::new();

    println!("Results for: {}\n", query);

    for (i, result) in results.iter().enumerate() {
        print_result(i + 1, result, &highlighter);
    }

    Ok(())
}

/// Pretty-print a search result with a highlighted snippet preview.
fn print_result(rank: usize, result: &SearchResult, highlighter: &SyntaxHighlighter) {
    const MAX_PREVIEW_LINES: usize = 8;

    let score_color = if result.score > 0.7 {
        "\x1b[32m" // Green for high scores
    } else if result.score > 0.5 {
        "\x1b[33m" // Yellow for medium scores
    } else {
        "\x1b[31m" // Red for low scores
    };

    let name = Path::new(&result.record.path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| result.record.path.clone());

    println!(
        "\x1b[1;36m[{}]\x1b[0m {}{:.4}\x1b[0m  \x1b[1m{}\x1b[0m",
        rank, score_color, result.score, name
    );
    println!("    📄 {}", result.record.path);
    println!("    📁 {}", result.record.folder);

    let lines: Vec<&str> = result.record.snippet.lines().collect();
    let mut preview = String::new();
    for line in lines.iter().take(MAX_PREVIEW_LINES) {
        preview.push_str(&format!("│ {}\n", line));
    }
    if lines.len() > MAX_PREVIEW_LINES {
        preview.push_str(&format!(
            "\x1b[2m┊  ... {} more lines ...\x1b[0m\n",
            lines.len() - MAX_PREVIEW_LINES
        ));
    }

    let extension = Path::new(&result.record.path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("txt");

    println!("{}", highlighter.highlight(&preview, extension));
}

/// Wrapper around syntect for syntax highlighting.
struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl SyntaxHighlighter {
    fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    fn highlight(&self, text: &str, extension: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_extension(extension)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = &self.theme_set.themes["base16-ocean.dark"];
        let mut highlighter = HighlightLines::new(syntax, theme);

        let mut output = String::new();
        for line in LinesWithEndings::from(text) {
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => {
                    output.push_str(&as_24_bit_terminal_escaped(&ranges[..], false));
                }
                Err(_) => {
                    output.push_str(line);
                }
            }
        }
        output.push_str("\x1b[0m"); // Reset colors

        output
    }
}
