//! # CLI Module
//!
//! Command-line interface for the duplicate finder.
//!
//! ## Usage
//! ```bash
//! # Check a set of files for duplicates
//! dupe-scan scan ~/Photos/*.jpg
//!
//! # With a stricter similarity threshold
//! dupe-scan scan ~/Photos/*.jpg --threshold 5
//!
//! # Paths from another tool, JSON output
//! find ~/Photos -type f | dupe-scan scan - --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use duplicate_finder::core::comparator::{DuplicateGroup, GroupKind};
use duplicate_finder::core::pipeline::{
    CancellationToken, DuplicatePipeline, ScanOptions, ScanOutcome, ScanReport,
};
use duplicate_finder::error::{DuplicateFinderError, Result};
use duplicate_finder::events::{Event, EventChannel, PipelineEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread;

/// Duplicate Finder - identical files and look-alike images
#[derive(Parser, Debug)]
#[command(name = "dupe-scan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check files for duplicates
    Scan {
        /// Files to check; `-` reads newline-separated paths from stdin
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Similarity threshold in bits (lower = stricter, 0-64)
        #[arg(short, long, default_value = "8")]
        threshold: u32,

        /// Skip the identical-content check
        #[arg(long)]
        no_hash: bool,

        /// Skip the similar-image check
        #[arg(long)]
        no_images: bool,

        /// Ignore files smaller than this many bytes in the identical-content check
        #[arg(long, default_value = "0")]
        min_size: u64,

        /// Worker threads (default: one per core)
        #[arg(long)]
        threads: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (removable paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            paths,
            threshold,
            no_hash,
            no_images,
            min_size,
            threads,
            output,
            verbose,
        } => {
            duplicate_finder::init_tracing(if verbose { "debug" } else { "warn" });

            let mut options = ScanOptions::new()
                .threshold(threshold)
                .hash_scan(!no_hash)
                .image_scan(!no_images)
                .min_size(min_size);
            options.threads = threads;

            run_scan(paths, options, output, verbose)
        }
    }
}

fn run_scan(
    paths: Vec<PathBuf>,
    options: ScanOptions,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    // Print header
    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Duplicate Finder").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let pipeline = DuplicatePipeline::builder().options(options).build()?;
    let files = resolve_paths(paths, &term)?;

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .map_err(|e| DuplicateFinderError::Config(format!("Ctrl+C handler: {e}")))?;

    // Set up event handling
    let (sender, receiver) = EventChannel::bounded(1024);

    // Progress bar for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_position(0);
                    pb.set_message(phase.to_string());
                }
                Event::Progress(p) => {
                    pb.set_length(p.total as u64);
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(format!(
                            "{} {}",
                            p.phase,
                            p.current_path.file_name().unwrap_or_default().to_string_lossy()
                        ));
                    }
                }
                Event::Skipped(skipped) if verbose => {
                    pb.println(format!(
                        "  {} {}",
                        style("skipped").yellow(),
                        skipped.message
                    ));
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Cancelled) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    // Run the pipeline
    let outcome = pipeline.scan(&files, &sender, &cancel)?;

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let report = match outcome {
        ScanOutcome::Completed(report) => report,
        ScanOutcome::Cancelled => {
            term.write_line(&format!("{} Scan cancelled", style("✗").red().bold()))
                .ok();
            return Ok(());
        }
    };

    // Output results
    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &report, verbose),
        OutputFormat::Json => print_json_results(&report),
        OutputFormat::Minimal => print_minimal_results(&report),
    }

    Ok(())
}

/// Expand `-` into stdin lines and drop directories.
fn resolve_paths(paths: Vec<PathBuf>, term: &Term) -> Result<Vec<PathBuf>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        if path.as_os_str() == "-" {
            for line in std::io::stdin().lock().lines() {
                let line = line?;
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    files.push(PathBuf::from(trimmed));
                }
            }
        } else {
            files.push(path);
        }
    }

    files.retain(|path| {
        if path.is_dir() {
            tracing::warn!("Skipping directory {}", path.display());
            term.write_line(&format!(
                "  {} {} is a directory; pass its files instead",
                style("!").yellow().bold(),
                path.display()
            ))
            .ok();
            false
        } else {
            true
        }
    });

    Ok(files)
}

fn print_pretty_results(term: &Term, report: &ScanReport, verbose: bool) {
    let stats = &report.stats;

    term.write_line("").ok();
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} files checked in {:.1}s",
        style(stats.files_considered).cyan(),
        stats.duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} identical groups, {} similar groups",
        style(report.hash_groups().count()).cyan(),
        style(report.similar_groups().count()).cyan()
    ))
    .ok();

    term.write_line(&format!(
        "  {} potential space savings",
        style(format_bytes(report.reclaimable_bytes())).yellow()
    ))
    .ok();

    if !stats.skipped.is_empty() {
        term.write_line(&format!(
            "  {} files skipped",
            style(stats.skipped.len()).dim()
        ))
        .ok();
        if verbose {
            for message in &stats.skipped {
                term.write_line(&format!("    {}", style(message).dim())).ok();
            }
        }
    }

    term.write_line("").ok();

    // Show groups
    if report.groups.is_empty() {
        term.write_line(&format!("  {} No duplicates found", style("✓").green()))
            .ok();
        return;
    }

    term.write_line(&format!("{}", style("Duplicate Groups:").bold().underlined()))
        .ok();
    term.write_line("").ok();

    let home = dirs::home_dir();
    for (i, group) in report.groups.iter().enumerate() {
        let detail = match group.distance() {
            Some(distance) => format!("{} bits apart", distance),
            None => format_bytes(group.files()[0].size()),
        };
        term.write_line(&format!(
            "  {} {} ({} files, {})",
            style(format!("Group {}:", i + 1)).bold(),
            style(group.kind()).yellow(),
            group.len(),
            detail
        ))
        .ok();

        let keep = keeper_index(group);
        for (idx, file) in group.files().iter().enumerate() {
            let marker = if idx == keep {
                style("★").green().to_string()
            } else {
                style("○").dim().to_string()
            };
            term.write_line(&format!(
                "    {} {}",
                marker,
                display_path(file.path(), home.as_deref())
            ))
            .ok();
        }

        if verbose {
            if let Some(digest) = group.digest() {
                term.write_line(&format!("    {} {}", style("sha256").dim(), style(digest).dim()))
                    .ok();
            }
        }

        term.write_line("").ok();
    }

    // Footer
    term.write_line(&format!(
        "{}",
        style("No files were changed. Review carefully before taking action.").dim()
    ))
    .ok();
}

fn print_json_results(report: &ScanReport) {
    let output = serde_json::json!({
        "scanned_at": chrono::Utc::now().to_rfc3339(),
        "files_considered": report.stats.files_considered,
        "files_hashed": report.stats.files_hashed,
        "images_fingerprinted": report.stats.images_fingerprinted,
        "reclaimable_bytes": report.reclaimable_bytes(),
        "duration_ms": report.stats.duration_ms,
        "skipped": report.stats.skipped,
        "groups": report.groups.iter().map(|g| {
            serde_json::json!({
                "id": g.id().to_string(),
                "kind": match g.kind() {
                    GroupKind::Hash => "hash",
                    GroupKind::Similar => "similar",
                },
                "files": g.files().iter().map(|f| f.path()).collect::<Vec<_>>(),
                "total_size": g.total_size(),
                "distance": g.distance(),
                "digest": g.digest(),
            })
        }).collect::<Vec<_>>()
    });

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to serialize report: {}", e),
    }
}

fn print_minimal_results(report: &ScanReport) {
    for group in &report.groups {
        let keep = keeper_index(group);
        for (idx, file) in group.files().iter().enumerate() {
            if idx != keep {
                println!("{}", file.path().display());
            }
        }
    }
}

/// Index of the file a cleanup would keep: the largest, first on ties
fn keeper_index(group: &DuplicateGroup) -> usize {
    let mut keep = 0;
    for (idx, file) in group.files().iter().enumerate() {
        if file.size() > group.files()[keep].size() {
            keep = idx;
        }
    }
    keep
}

fn display_path(path: &Path, home: Option<&Path>) -> String {
    match home.and_then(|home| path.strip_prefix(home).ok()) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
