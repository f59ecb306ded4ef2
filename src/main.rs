use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use scriptlens::metrics::stats::drift;
use scriptlens::report::{MovieReport, Summary};
use scriptlens::session::format_label;
use scriptlens::{Movie, PairwiseOutcome, Rgb, Session, Settings};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "scriptlens")]
#[command(author, version, about = "Explore character sentiment and interactions in analyzed movie scripts")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Script document or directory of documents (optional in GUI mode)
    path: Option<PathBuf>,

    /// Launch GUI file picker (auto-enabled when double-clicked)
    #[arg(long)]
    gui: bool,

    /// Output report file (.html, .json, .csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for auto-generated reports
    #[arg(long, default_value = "scriptlens-reports")]
    report_dir: PathBuf,

    /// Don't auto-generate a report
    #[arg(long)]
    no_report: bool,

    /// Don't prompt to open report
    #[arg(long)]
    no_open: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Settings file (JSON) with display thresholds
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Hide characters with this many lines or fewer from tables (default: 10)
    #[arg(long, global = true)]
    min_lines: Option<u32>,

    /// Hide characters with this many lines or fewer from the graph (default: 20)
    #[arg(long, global = true)]
    min_lines_graph: Option<u32>,

    /// Show detailed analysis
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show summary
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start interactive web UI
    Serve {
        /// Document to open (upload one from the page otherwise)
        path: Option<PathBuf>,

        /// Port to listen on
        #[arg(short, long, default_value = "3002")]
        port: u16,
    },

    /// Sentiment of every line one character speaks
    Character {
        path: PathBuf,
        name: String,

        /// Print the breakdown as JSON
        #[arg(long)]
        json: bool,
    },

    /// Conversation between two characters
    Interactions {
        path: PathBuf,
        a: String,
        b: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the social graph as JSON
    Graph { path: PathBuf },

    /// Compare stored statistics with values recomputed from the entries
    Check {
        path: PathBuf,

        /// Largest accepted difference for averages
        #[arg(long, default_value = "0.000001")]
        tolerance: f64,
    },
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    let settings = match resolve_settings(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read settings: {}", e);
            std::process::exit(1);
        }
    };
    log::debug!("settings: {:?}", settings);

    // Handle subcommands first
    if let Some(cmd) = args.command {
        match cmd {
            Command::Serve { path, port } => {
                if let Err(e) = scriptlens::serve::start(port, path, settings) {
                    eprintln!("Server error: {}", e);
                    std::process::exit(1);
                }
            }
            Command::Character { path, name, json } => {
                show_character(&open_session(&path, settings), &name, json)
            }
            Command::Interactions { path, a, b, json } => {
                show_interactions(&open_session(&path, settings), &a, &b, json)
            }
            Command::Graph { path } => {
                print_json(&open_session(&path, settings).social_graph());
            }
            Command::Check { path, tolerance } => check(&path, tolerance),
        }
        return;
    }

    // Determine if we should use GUI mode
    // With GUI feature: launch GUI if --gui flag OR no path provided
    #[cfg(feature = "gui")]
    let use_gui = args.gui || args.path.is_none();

    #[cfg(not(feature = "gui"))]
    let use_gui = {
        if args.gui {
            eprintln!("Note: GUI mode not available in this build.");
        }
        false
    };

    let path = match args.path.clone() {
        Some(p) if !use_gui => p,
        _ => match pick_path(use_gui) {
            Some(p) => p,
            None => std::process::exit(if use_gui { 0 } else { 1 }),
        },
    };

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let files = collect_documents(&path);
    if files.is_empty() {
        eprintln!("No script documents found (expected .json files)");
        std::process::exit(1);
    }

    if !args.quiet {
        eprintln!("\x1b[1mScriptlens - Movie Script Sentiment\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Found {} document(s)\n", files.len());
    }

    // Set up progress bar
    let pb = if !args.quiet && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    // Analyze documents in parallel
    let reports: Vec<MovieReport> = files
        .par_iter()
        .map(|path| {
            let report = MovieReport::analyze(path, settings);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(report.file_name.clone());
            }
            report
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if !args.quiet {
        for r in &reports {
            print_report(r, args.verbose);
        }
    }

    let summary = Summary::from_reports(&reports);
    if !args.quiet {
        eprintln!("\n{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m");
        eprintln!("  \x1b[32m✓ Analyzed:\x1b[0m   {}", summary.loaded);
        eprintln!("  Characters:   {}", summary.characters);
        if summary.failed > 0 {
            eprintln!("  \x1b[31m✗ Failed:\x1b[0m     {}", summary.failed);
        }
    }

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if !args.no_report {
        std::fs::create_dir_all(&args.report_dir).ok();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("scriptlens_report_{}.html", timestamp);
        Some(args.report_dir.join(filename))
    } else {
        None
    };

    if let Some(ref output_path) = report_path {
        if let Err(e) = scriptlens::report::generate(output_path, &reports) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }

        if !args.no_open {
            if use_gui {
                // In GUI mode, auto-open the report (no prompt)
                let _ = open::that(output_path);
            } else if !args.quiet && confirm("\nOpen report in browser? [Y/n] ") {
                if let Err(e) = open::that(output_path) {
                    eprintln!("Failed to open report: {}", e);
                }
            }
        }
    }

    if !args.quiet {
        eprintln!("\n\x1b[90mAnalysis complete.\x1b[0m");
    }

    if summary.failed > 0 {
        std::process::exit(1);
    }
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Settings file first, then individual flags on top
fn resolve_settings(args: &Args) -> scriptlens::movie::Result<Settings> {
    let mut settings = match args.settings {
        Some(ref path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(n) = args.min_lines {
        settings.min_lines_threshold = n;
    }
    if let Some(n) = args.min_lines_graph {
        settings.min_lines_threshold_graph = n;
    }
    Ok(settings)
}

fn collect_documents(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

#[cfg(feature = "gui")]
fn pick_path(use_gui: bool) -> Option<PathBuf> {
    if !use_gui {
        return usage();
    }
    // First try folder picker
    if let Some(folder) = rfd::FileDialog::new()
        .set_title("Select folder of scripts (or Cancel for single file)")
        .pick_folder()
    {
        return Some(folder);
    }

    // If cancelled, offer file picker
    let file = rfd::FileDialog::new()
        .set_title("Select analyzed script")
        .add_filter("Script documents", &["json"])
        .pick_file();
    if file.is_none() {
        eprintln!("No file or folder selected.");
    }
    file
}

#[cfg(not(feature = "gui"))]
fn pick_path(_use_gui: bool) -> Option<PathBuf> {
    usage()
}

fn usage() -> Option<PathBuf> {
    eprintln!("Usage: scriptlens <PATH>");
    eprintln!("Run 'scriptlens --help' for more options.");
    None
}

fn confirm(prompt: &str) -> bool {
    eprint!("{}", prompt);
    io::stderr().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    let input = input.trim().to_lowercase();
    input.is_empty() || input == "y" || input == "yes"
}

fn open_session(path: &Path, settings: Settings) -> Session {
    match Session::load(path, settings) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_report(r: &MovieReport, verbose: bool) {
    let Some(ref analysis) = r.analysis else {
        println!(
            "\x1b[90m{:<10}\x1b[0m {}  {}",
            "[ERROR]",
            r.file_name,
            r.error.as_deref().unwrap_or("")
        );
        return;
    };

    let summary = &analysis.summary;
    println!(
        "\x1b[1m{}\x1b[0m  \x1b[90m{} entries, {} scenes, {} characters\x1b[0m",
        r.title(),
        summary.entries,
        summary.scenes,
        summary.characters
    );
    for row in &analysis.characters {
        println!(
            "  {:>3}  {:<24} {:>5}  {}",
            row.rank,
            truncate(&row.name, 24),
            row.line_count,
            paint(row.color, &format!("{:>7.3}", row.avg_cs_rounded))
        );
    }

    if verbose {
        for (kind, count) in &summary.entry_counts {
            eprintln!("    {:<10} {}", kind, count);
        }
        eprintln!(
            "    Directions: {} lines, average {}",
            analysis.directions.timeline.scores.len(),
            score(analysis.directions.average)
        );
        if let Some(ref pair) = analysis.featured_pair {
            eprintln!(
                "    {} / {}: {} exchanges, average {}",
                pair.a,
                pair.b,
                pair.exchanges,
                pair.average_score.map(score).unwrap_or_else(|| "-".to_string())
            );
        }
    }
    println!();
}

fn show_character(session: &Session, name: &str, json: bool) {
    let Some(b) = session.breakdown(name) else {
        eprintln!("Unknown character: {}", name);
        std::process::exit(1);
    };
    if json {
        print_json(&b);
        return;
    }

    println!(
        "\x1b[1m{}\x1b[0m  {} lines, average {}",
        b.character.name,
        b.character.line_count,
        paint(b.color, &score(b.character.avg_cs))
    );
    println!("{:>6}  {:>7}  {:>8}  {:>7}  LINE", "INDEX", "SCORE", "SMOOTHED", "SCENE");
    println!("{}", "-".repeat(70));
    let t = &b.timeline;
    for i in 0..t.len() {
        println!(
            "{:>6}  {:>7}  {:>8}  {:>7}  {}",
            t.line_indices[i],
            score(t.scores[i]),
            score(b.smoothed[i]),
            score(t.line_scene_averages[i]),
            truncate(&format_label(&t.lines[i]), 60)
        );
    }
}

fn show_interactions(session: &Session, a: &str, b: &str, json: bool) {
    let report = session.interactions(a, b);
    if json {
        print_json(&report);
        return;
    }

    let PairwiseOutcome::Interactions(ref t) = report.result else {
        println!("No interactions.");
        return;
    };

    let color = report.color.unwrap_or(scriptlens::metrics::series::NEUTRAL);
    println!(
        "\x1b[1m{} / {}\x1b[0m  {} adjacent dialogue lines, average {}",
        a,
        b,
        report.exchanges,
        paint(color, &score(t.average_score))
    );
    println!("{:>6}  {:>7}  {:>7}  LINE", "INDEX", truncate(a, 7), truncate(b, 7));
    println!("{}", "-".repeat(70));
    for i in 0..t.lines.len() {
        println!(
            "{:>6}  {:>7}  {:>7}  {}",
            t.line_indices[i],
            score(t.scores_a[i]),
            score(t.scores_b[i]),
            truncate(&t.lines[i], 60)
        );
    }
}

fn check(path: &Path, tolerance: f64) {
    let movie = match Movie::load(path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    let found = drift(&movie, tolerance);
    if found.is_empty() {
        println!("\x1b[32m✓ Statistics match the entries\x1b[0m");
        return;
    }

    println!("{:<30} {:<12} {:>10} {:>10}", "SUBJECT", "FIELD", "STORED", "COMPUTED");
    println!("{}", "-".repeat(65));
    for d in &found {
        println!(
            "{:<30} {:<12} {:>10.4} {:>10.4}",
            truncate(&d.subject, 30),
            d.field,
            d.stored,
            d.computed
        );
    }
    eprintln!("\n\x1b[31m✗ {} difference(s)\x1b[0m", found.len());
    std::process::exit(1);
}

/// Foreground truecolor escape around `text`
fn paint(color: Rgb, text: &str) -> String {
    format!("\x1b[38;2;{};{};{}m{}\x1b[0m", color.0, color.1, color.2, text)
}

/// Three decimals, `-` for gaps
fn score(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{:.3}", value)
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
