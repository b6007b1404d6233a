//! journal-digest CLI: month-by-month journal summaries with a local model.
//!
//! Usage:
//!   journal-digest <INPUT_DIR> [OUTPUT_DIR] [-p N] [--dry-run | --concat-only]

use clap::Parser;
use journal_digest::digest::{MonthStatus, ProgressEvent, ProgressReporter, Sizing};
use journal_digest::estimate::{estimate_tokens, format_duration};
use journal_digest::{
    DigestConfig, DigestPipeline, DryRunReport, OllamaClient, Prompts, RunReport, Summarizer,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "journal-digest",
    version,
    about = "Summarize journal notes month by month with a local language model"
)]
struct Cli {
    /// Directory containing the note files
    input_dir: PathBuf,
    /// Where summaries are written (default: <INPUT_DIR><output_suffix>)
    output_dir: Option<PathBuf>,
    /// Number of months summarized at the same time
    #[arg(short = 'p', long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: u16,
    /// Plan the run and estimate its duration without calling the model
    #[arg(long)]
    dry_run: bool,
    /// Only merge the cleaned notes into one file, no summarization
    #[arg(long, conflicts_with = "dry_run")]
    concat_only: bool,
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Model identifier
    #[arg(long)]
    model: Option<String>,
    /// Generate endpoint URL
    #[arg(long)]
    endpoint: Option<String>,
    /// Year every date heading is forced into
    #[arg(long)]
    year: Option<i32>,
    /// Largest text, in characters, summarized in one call
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_chunk_size: Option<u64>,
    /// File with custom month summary instructions
    #[arg(long)]
    prompt_file: Option<PathBuf>,
    /// Save every raw prompt under <OUTPUT_DIR>/debug_prompts
    #[arg(long)]
    save_prompts: bool,
    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
    /// Warnings and errors only
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file first, then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<DigestConfig, String> {
    let mut config = DigestConfig::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(year) = cli.year {
        config.expected_year = year;
    }
    if let Some(size) = cli.max_chunk_size {
        config.max_chunk_size = usize::try_from(size).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &cli.prompt_file {
        config.prompt_file = Some(path.clone());
    }
    if cli.save_prompts {
        config.save_debug_prompts = true;
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Render progress events on stderr.
///
/// With `spinner` (one month at a time) the running call gets a live
/// elapsed-time line; otherwise only batch and month completions print,
/// since concurrent calls cannot share one spinner line.
async fn render_progress(mut rx: UnboundedReceiver<ProgressEvent>, spinner: bool) {
    let mut ticker = tokio::time::interval(Duration::from_millis(120));
    let mut active: Option<(String, Instant)> = None;
    let mut frame = 0usize;

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                if spinner && active.is_some() {
                    eprint!("\r\x1b[2K");
                }
                match event {
                    ProgressEvent::BatchStarted { index, total, months } if total > 1 => {
                        eprintln!("Batch {}/{}: {}", index, total, months.join(", "));
                    }
                    ProgressEvent::CallStarted { month, kind, prompt_chars } if spinner => {
                        active = Some((
                            format!("{} {} (~{} tokens)", month, kind, estimate_tokens(prompt_chars)),
                            Instant::now(),
                        ));
                    }
                    ProgressEvent::CallFinished { month, kind, elapsed, ok } if spinner => {
                        active = None;
                        let mark = if ok { "✓" } else { "✗" };
                        eprintln!("{} {} {} in {}", mark, month, kind, format_duration(elapsed));
                    }
                    ProgressEvent::MonthFinished { label, status, .. } if !spinner => {
                        eprintln!("{}: {}", label, status);
                    }
                    ProgressEvent::AggregateStarted { months } => {
                        eprintln!("Writing year review from {} months...", months);
                    }
                    ProgressEvent::AggregateFinished { elapsed, ok } => {
                        let outcome = if ok { "done" } else { "failed" };
                        eprintln!("Year review {} after {}", outcome, format_duration(elapsed));
                    }
                    _ => {}
                }
            }
            _ = ticker.tick(), if spinner => {
                if let Some((what, started)) = &active {
                    eprint!(
                        "\r\x1b[2K{} {} {}s",
                        SPINNER[frame % SPINNER.len()],
                        what,
                        started.elapsed().as_secs()
                    );
                    let _ = std::io::stderr().flush();
                    frame += 1;
                }
            }
        }
    }
}

fn print_run_report(report: &RunReport) {
    if report.notes == 0 {
        println!("No note files found.");
        println!("{}", report.summary_line());
        return;
    }

    println!();
    println!(
        "Processed {} notes in {} months: {} succeeded, {} failed, {} empty",
        report.notes,
        report.months.len(),
        report.succeeded(),
        report.failed(),
        report.skipped()
    );
    for month in report.months.iter().filter(|m| m.status() == MonthStatus::Failure) {
        if let Some(error) = month.error() {
            println!("  failed: {}: {}", month.label, error);
        }
    }
    if let Some(aggregate) = &report.aggregate {
        if aggregate.is_degraded() {
            println!("  year review failed; month summaries were combined instead");
        }
    }
    if let Some(dir) = &report.output_dir {
        println!("Output: {}", dir.display());
    }
    println!("{}", report.summary_line());
}

fn print_dry_run(report: &DryRunReport) {
    println!(
        "Dry run: {} notes in {} months (concurrency {})",
        report.notes,
        report.plans.len(),
        report.concurrency
    );
    println!(
        "{:<8}  {:<15}  {:>5}  {:>9}  {:>8}  {:<28}  {:>9}",
        "MONTH", "LABEL", "NOTES", "CHARS", "TOKENS", "PLAN", "EST"
    );
    println!("{}", "-".repeat(96));
    for plan in &report.plans {
        let sizing = match &plan.sizing {
            Sizing::Empty => "skip (empty)".to_string(),
            Sizing::Direct { .. } => "direct, 1 call".to_string(),
            Sizing::Chunked { chunk_sizes } => {
                format!("{} parts + merge", chunk_sizes.len())
            }
        };
        println!(
            "{:<8}  {:<15}  {:>5}  {:>9}  {:>8}  {:<28}  {:>9}",
            plan.key.to_string(),
            plan.label,
            plan.note_count,
            plan.combined_chars,
            plan.estimated_tokens(),
            sizing,
            format_duration(plan.estimated)
        );
    }
    println!("{}", "-".repeat(96));
    println!(
        "Total: {} calls, ~{} input tokens, estimated {}",
        report.total_calls(),
        estimate_tokens(report.total_chars()),
        format_duration(report.estimated)
    );
    println!("No backend calls were made and no files were written.");
}

fn cmd_concat(pipeline: &DigestPipeline, input: &Path, output: &Path) -> i32 {
    match pipeline.concatenate(input, output) {
        Ok(report) => {
            let stats = report.stats;
            println!("Files:          {}", stats.files);
            println!("Months:         {}", stats.months);
            println!("Raw chars:      {}", stats.raw_chars);
            println!("Cleaned chars:  {}", stats.cleaned_chars);
            println!("Reduction:      {:.1}%", stats.reduction_percent());
            println!("Est. tokens:    {}", stats.estimated_tokens);
            match report.artifact {
                Some(path) => println!("Wrote {}", path.display()),
                None => println!("No note content found; nothing written."),
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_dry_run(pipeline: &DigestPipeline, input: &Path, concurrency: usize) -> i32 {
    match pipeline.dry_run(input, concurrency) {
        Ok(report) => {
            print_dry_run(&report);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_run(
    config: Arc<DigestConfig>,
    prompts: Arc<Prompts>,
    client: Arc<OllamaClient>,
    input: &Path,
    output: &Path,
    concurrency: usize,
) -> i32 {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        if !client.is_available().await {
            tracing::warn!(
                endpoint = %client.endpoint(),
                "backend is not responding; months will fail until it is up"
            );
        }

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let renderer = tokio::spawn(render_progress(rx, concurrency == 1));
        let pipeline = DigestPipeline::new(config, prompts, client)
            .with_progress(ProgressReporter::new(tx));

        let result = pipeline.run(input, output, concurrency).await;
        drop(pipeline);
        let _ = renderer.await;

        match result {
            Ok(report) => {
                print_run_report(&report);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        }
    })
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if !cli.input_dir.is_dir() {
        eprintln!(
            "Error: input directory not found or not a directory: {}",
            cli.input_dir.display()
        );
        std::process::exit(1);
    }

    let config = match resolve_config(&cli) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let prompts = Arc::new(Prompts::load(config.prompt_file.as_deref()));
    let output = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| config.default_output_dir(&cli.input_dir));
    let concurrency = usize::from(cli.concurrency);
    let client = Arc::new(OllamaClient::new(config.endpoint.clone(), config.model.clone()));

    let code = if cli.concat_only {
        let pipeline = DigestPipeline::new(config, prompts, client);
        cmd_concat(&pipeline, &cli.input_dir, &output)
    } else if cli.dry_run {
        let pipeline = DigestPipeline::new(config, prompts, client);
        cmd_dry_run(&pipeline, &cli.input_dir, concurrency)
    } else {
        tracing::info!(model = %client.model(), endpoint = %client.endpoint(), "using backend");
        cmd_run(config, prompts, client, &cli.input_dir, &output, concurrency)
    };
    std::process::exit(code);
}
