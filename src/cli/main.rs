use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

use exif_scrub::{Extraction, config, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "exif-scrub",
    version,
    about = "Strip EXIF metadata from JPEG and PNG files without re-encoding them"
)]
struct Cli {
    /// Image files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Report what would be removed without writing to files
    #[arg(long)]
    dry_run: bool,

    /// Do not create .bak copies of modified files
    #[arg(long)]
    no_backup: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Display all EXIF metadata and exit
    #[arg(long = "show-exif")]
    show_exif: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    let images = pipeline::collect_images(&cli.paths);
    if images.is_empty() {
        anyhow::bail!("No JPEG or PNG files found in the specified paths.");
    }

    // Handle --show-exif
    if cli.show_exif {
        let mut extractions = Vec::new();
        for image_path in &images {
            match pipeline::inspect_file(image_path) {
                Ok(extraction) if cli.json => extractions.push(serde_json::json!({
                    "path": image_path.display().to_string(),
                    "metadata": extraction,
                })),
                Ok(extraction) => print_full_exif(image_path, &extraction),
                Err(e) => log::error!("{e:#}"),
            }
        }
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&extractions)?);
        }
        return Ok(());
    }

    // Load config
    let mut config = config::Config::load(cli.config.as_deref())?;

    // Override from CLI flags
    if cli.dry_run {
        config.output.dry_run = true;
    }
    if cli.no_backup {
        config.output.backup_originals = false;
    }

    log::info!("Found {} image(s) to process", images.len());
    if config.output.dry_run {
        log::info!("DRY RUN — no files will be modified");
    }

    // Process each image
    let mut results = Vec::new();
    let total = images.len();

    for (i, image_path) in images.iter().enumerate() {
        log::info!(
            "[{}/{}] Processing: {}",
            i + 1,
            total,
            image_path.display()
        );

        let result = pipeline::scrub_file(image_path, &config);

        if let Some(ref err) = result.error {
            log::error!("  Error: {err}");
        } else if let Some(ref reason) = result.skipped {
            log::warn!("  Skipped: {reason}");
        } else if let Some(ref backup) = result.backup_path {
            log::debug!("  Backup: {}", backup.display());
        }

        results.push(result);
    }

    // JSON output
    if cli.json {
        let json_results: Vec<serde_json::Value> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "path": r.path.display().to_string(),
                    "kind": r.kind,
                    "entries_found": r.entries_found,
                    "bytes_removed": r.bytes_removed,
                    "changed": r.changed,
                    "backup_path": r.backup_path.as_ref().map(|p| p.display().to_string()),
                    "skipped": r.skipped,
                    "error": r.error,
                })
            })
            .collect();

        println!("{}", serde_json::to_string_pretty(&json_results)?);
    }

    // Summary
    let changed = results.iter().filter(|r| r.changed).count();
    let failed = results.iter().filter(|r| r.error.is_some()).count();
    let removed: usize = results.iter().map(|r| r.bytes_removed).sum();
    log::info!(
        "Done: {changed} scrubbed, {failed} failed out of {total} images ({removed} bytes of EXIF)"
    );

    Ok(())
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const YELLOW: &str = "\x1b[33m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 35 chars + 2 leading spaces).
const INDENT: &str = "                                     ";

/// Print every EXIF entry of a file, one section per directory.
fn print_full_exif(path: &Path, extraction: &Extraction) {
    println!();
    println!("{BOLD}File:{RESET} {} ({})", path.display(), extraction.kind);
    println!("{DIM}{}{RESET}", "═".repeat(84));

    let mut current_dir: Option<&str> = None;
    for entry in &extraction.entries {
        if current_dir != Some(entry.fq_ifd_path.as_str()) {
            if current_dir.is_some() {
                println!();
            }
            println!("  {BOLD}{}{RESET}", entry.fq_ifd_path);
            println!("  {DIM}{}{RESET}", "─".repeat(82));
            current_dir = Some(entry.fq_ifd_path.as_str());
        }
        let tag = format!("{} (0x{:04x})", entry.tag_name, entry.tag_id);
        print_row(&tag, &entry.value_string);
    }

    if extraction.entries.is_empty() {
        println!("  {DIM}(no EXIF metadata found){RESET}");
    }

    if !extraction.warnings.is_empty() {
        println!();
        for warning in &extraction.warnings {
            println!("  {YELLOW}warning:{RESET} {DIM}{warning}{RESET}");
        }
    }
    println!();
}

/// Print a single row in the EXIF display table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<32}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
