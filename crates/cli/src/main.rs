use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use lenio_core::calibrate::{load_profile_from, profile_path, save_profile_to};
use lenio_core::{
    Calibration, ChunkStatus, Document, FetchConfig, HttpGenerator, HttpGeneratorConfig, ReaderProfile, ReadingLevel,
    SimplifyConfig, Simplifier, read_input,
};
use owo_colors::OwoColorize;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the rewritten document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Html,
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(format!("Invalid format: {}. Valid options: html, text", s)),
        }
    }
}

/// Rewrite the article content of a web page into easier-to-read text
#[derive(Parser, Debug)]
#[command(name = "lenio")]
#[command(author = "Lenio Contributors")]
#[command(version = "1.0.0")]
#[command(about = "Rewrite article content for easier reading", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT", required_unless_present = "calibrate")]
    input: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (html, text)
    #[arg(short, long, default_value = "html", value_name = "FORMAT")]
    format: OutputFormat,

    /// Generation service endpoint
    #[arg(long, default_value = "http://127.0.0.1:8787", value_name = "URL")]
    endpoint: String,

    /// Reading level 1-4, strongest simplification last (overrides the
    /// calibrated profile)
    #[arg(short = 'l', long, value_name = "LEVEL")]
    reading_level: Option<u8>,

    /// Estimated-token budget per chunk
    #[arg(long, default_value = "800", value_name = "NUM")]
    token_budget: f64,

    /// Retry ceiling per chunk
    #[arg(long, default_value = "20", value_name = "NUM")]
    max_attempts: usize,

    /// Delay between retry attempts in milliseconds
    #[arg(long, default_value = "500", value_name = "MS")]
    retry_delay: u64,

    /// Minimum character length for content paragraphs
    #[arg(long, default_value = "50", value_name = "NUM")]
    min_content_len: usize,

    /// HTTP timeout for fetching the input in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Run the interactive reading-level calibration first
    #[arg(long)]
    calibrate: bool,

    /// Custom profile file location
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Walk the calibration passages interactively and persist the result.
fn run_calibration(profile: &Path) -> anyhow::Result<ReadingLevel> {
    let mut walk = Calibration::new();
    let stdin = io::stdin();

    echo::print_info("Answer 'c' if the passage reads comfortably, 'e' to see an easier one.");

    while let Some(passage) = walk.current_passage() {
        if let Some(name) = walk.current_set() {
            eprintln!("\n{}", name.bold());
        }
        eprintln!("{}", passage);
        eprintln!("{}", "comfortable or easier? [c/e]:".dimmed());

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            anyhow::bail!("calibration aborted: end of input");
        }

        match line.trim().to_lowercase().as_str() {
            "c" | "comfortable" => walk.comfortable(),
            "e" | "easier" => walk.prefer_easier(),
            _ => echo::print_warning("please answer 'c' or 'e'"),
        }
    }

    let level = walk.result().context("calibration produced no result")?;
    save_profile_to(profile, &ReaderProfile { reading_level: level })?;
    echo::print_success(&format!(
        "Reading level {} saved to {}",
        level.as_score(),
        profile.display()
    ));

    Ok(level)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        echo::print_banner();
    }

    let profile_file = args.profile.clone().or_else(profile_path);

    let mut calibrated = None;
    if args.calibrate {
        let path = profile_file
            .clone()
            .context("no config directory available for the profile")?;
        calibrated = Some(run_calibration(&path)?);
        if args.input.is_none() {
            return Ok(());
        }
    }

    let input = args.input.clone().context("INPUT is required")?;

    if args.verbose {
        echo::print_step(1, 3, "Reading input");
    }

    let fetch_config = FetchConfig {
        timeout: args.timeout,
        user_agent: args
            .user_agent
            .clone()
            .unwrap_or_else(|| FetchConfig::default().user_agent),
    };
    let html = read_input(&input, &fetch_config).await.context("Failed to read input")?;

    if args.verbose
        && let Ok(doc) = Document::parse(&html)
        && let Some(title) = doc.title()
    {
        echo::print_detail("Title", title.trim());
    }

    let reading_level = match args.reading_level {
        Some(score) => ReadingLevel::from_score(score)
            .with_context(|| format!("invalid reading level: {} (expected 1-4)", score))?,
        None => calibrated
            .or_else(|| {
                profile_file
                    .as_deref()
                    .and_then(load_profile_from)
                    .map(|profile| profile.reading_level)
            })
            .unwrap_or_default(),
    };

    let config = SimplifyConfig::builder()
        .reading_level(reading_level)
        .token_budget(args.token_budget)
        .max_attempts(args.max_attempts)
        .retry_delay_ms(args.retry_delay)
        .min_content_len(args.min_content_len)
        .build();

    if args.verbose {
        echo::print_step(2, 3, "Simplifying content");
        echo::print_detail("Level", &reading_level.as_score().to_string());
        echo::print_detail("Endpoint", &args.endpoint);
    }

    let generator = HttpGenerator::new(HttpGeneratorConfig { endpoint: args.endpoint.clone(), ..Default::default() })
        .context("Failed to build generation backend")?;

    let mut simplifier = Simplifier::new(generator, config);
    if args.verbose {
        simplifier = simplifier.with_progress(Box::new(|index, total, status| {
            let status = match status {
                ChunkStatus::Rewritten => "rewritten",
                ChunkStatus::Failed => "failed, left unchanged",
                ChunkStatus::SkippedHeader => "heading, skipped",
            };
            eprintln!("  {} {}", format!("[chunk {}/{}]", index + 1, total).dimmed(), status);
        }));
    }

    let report = simplifier.run(&html).await.context("Simplification failed")?;

    if args.verbose {
        echo::print_step(3, 3, "Writing output");
    }

    let output = match args.format {
        OutputFormat::Html => report.html,
        OutputFormat::Text => Document::parse(&report.html)
            .context("Failed to parse rewritten HTML")?
            .text_content(),
    };

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display()));
        }
        None => {
            print!("{}", output);
        }
    }

    let outcome = report.outcome;
    let rewritable = outcome.total_chunks - outcome.skipped_headers;
    if outcome.is_complete() {
        echo::print_success(&format!("{}/{} chunks rewritten", outcome.rewritten, rewritable));
    } else {
        echo::print_warning(&format!(
            "{}/{} chunks rewritten, {} left unchanged",
            outcome.rewritten, rewritable, outcome.failed
        ));
    }

    Ok(())
}
