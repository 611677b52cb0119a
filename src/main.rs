use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use dotenv::dotenv;
use tracing::debug;

use chudnovsky_pi::{
    config::PiConfig,
    errors::PiError,
    pi::{chudnovsky::series_plan, compute_pi, PiComputation, Verification},
    utils::{
        file::{default_output_dir, save_pi_to_file, save_summary_json},
        memory::{check_memory, threshold_for, MemoryStatus},
        prompt::{check_precision, confirm, read_precision, PrecisionCheck},
    },
};

/// Compute decimal digits of pi with the Chudnovsky series.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Number of decimal digits; prompts interactively when omitted
    digits: Option<usize>,

    /// Worker threads for the series phase (default: available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Directory for the result file (default: next to the executable)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Print the result without writing any file
    #[arg(long)]
    no_save: bool,

    /// Also write a JSON summary with a SHA-256 of the digits
    #[arg(long)]
    json: bool,
}

fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chudnovsky_pi=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = PiConfig::from_env();
    if cli.workers.is_some() {
        config.workers = cli.workers;
    }
    if cli.output_dir.is_some() {
        config.output_dir = cli.output_dir.clone();
    }
    debug!(?config, "configuration loaded");

    let started = Instant::now();
    match run(&cli, &config) {
        Ok(()) => {}
        Err(PiError::Cancelled) => println!("\nCalculation cancelled"),
        Err(e) => {
            eprintln!("\n❌ Calculation failed: {}", e);
            eprintln!("Elapsed time: {:.2} seconds", started.elapsed().as_secs_f64());
            if e.is_resource_exhaustion() {
                eprintln!("Try fewer digits or close other programs");
            }
            process::exit(1);
        }
    }
}

fn run(cli: &Cli, config: &PiConfig) -> Result<(), PiError> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let precision = match cli.digits {
        Some(digits) => match check_precision(digits, config)? {
            PrecisionCheck::Accepted(d) => d,
            PrecisionCheck::NeedsConfirmation(d) => {
                println!("Warning: more than {} digits may make the machine unresponsive!", config.soft_limit);
                if !cli.yes && !confirm(&mut input, &mut output, "Continue? (y/N): ")? {
                    return Err(PiError::Cancelled);
                }
                d
            }
        },
        None => read_precision(&mut input, &mut output, config)?,
    };

    let (terms, workers) = series_plan(config, precision);
    println!("\nComputing pi to {} decimal places", precision);
    println!("Using {} worker threads for {} series terms", workers, terms);

    if !memory_ok(precision, config, cli.yes, &mut input, &mut output)? {
        return Err(PiError::Cancelled);
    }

    let result = compute_pi(config, precision)?;
    println!("Series terms: {} across {} workers", result.terms, result.workers);
    report(&result);

    if !cli.no_save {
        let dir = config.output_dir.clone().unwrap_or_else(default_output_dir);
        match save_pi_to_file(&result, &dir, None) {
            Ok(path) => println!("✓ Result saved to: {}", path.display()),
            Err(e) => println!("⚠ Could not save result: {}", e),
        }
        if cli.json {
            match save_summary_json(&result, &dir) {
                Ok(path) => println!("✓ Summary saved to: {}", path.display()),
                Err(e) => println!("⚠ Could not save summary: {}", e),
            }
        }
    }

    Ok(())
}

fn memory_ok<R: BufRead, W: Write>(
    precision: usize,
    config: &PiConfig,
    assume_yes: bool,
    input: &mut R,
    output: &mut W,
) -> Result<bool, PiError> {
    let threshold = threshold_for(precision, config.memory_warn_gb);
    match check_memory(threshold) {
        MemoryStatus::Low { available_gb } => {
            println!("Warning: only {:.2} GB of memory available, consider closing other programs", available_gb);
            if assume_yes {
                return Ok(true);
            }
            confirm(input, output, "Memory may be insufficient, continue? (y/n): ")
        }
        MemoryStatus::Sufficient { .. } | MemoryStatus::Unknown => Ok(true),
    }
}

fn report(result: &PiComputation) {
    println!("\nFirst {} decimal places of pi:", result.precision);
    println!("{}", result.decimal_string());
    println!("\nComputation time: {:.2} seconds", result.computation_seconds());

    match &result.verification {
        Verification::Verified => println!("✓ Verified: leading digits match"),
        Verification::Mismatch { expected, actual } => {
            println!("⚠ Verification failed: expected {}, got {}", expected, actual)
        }
    }
}
