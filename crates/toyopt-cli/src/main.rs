use anyhow::{bail, Context};
use clap::Parser;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use toyopt_core::config::{CliOverrides, OptimizationLevel, OptimizerConfig, CONFIG_FILE_NAME};
use toyopt_core::di::Container;
use toyopt_core::optimizer::{OptimizationOutcome, Stage};
use toyopt_core::pipeline::Pipeline;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Toyopt - constant folding and loop-invariant hoisting for toy programs
#[derive(Parser, Debug, Clone)]
#[command(name = "toyopt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input programs to optimize
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Output file (single input only)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory for optimized programs
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Path to a toyopt.json configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Optimization level (0, 1, 2)
    #[arg(long, value_name = "LEVEL")]
    level: Option<String>,

    /// Keep constant assignments inside loops
    #[arg(long)]
    no_hoist_scalars: bool,

    /// Keep array index expressions inside loops
    #[arg(long)]
    no_hoist_indices: bool,

    /// Name prefix for index temporaries
    #[arg(long, value_name = "NAME")]
    temp_prefix: Option<String>,

    /// Upper bound on constant folding rounds
    #[arg(long, value_name = "N")]
    max_fold_iterations: Option<usize>,

    /// Print the program after every stage
    #[arg(long)]
    stages: bool,

    /// Print optimization statistics as JSON
    #[arg(long)]
    stats: bool,

    /// Print optimized programs instead of writing files
    #[arg(long)]
    stdout: bool,

    /// Write a default toyopt.json to the working directory
    #[arg(long)]
    init: bool,

    /// Plain diagnostics without colors
    #[arg(long)]
    no_pretty: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG, when set, replaces the level chosen by -v/-q
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else if cli.quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if cli.init {
        OptimizerConfig::init_file(Path::new(CONFIG_FILE_NAME))
            .with_context(|| format!("Failed to create {}", CONFIG_FILE_NAME))?;
        println!("Created {}", CONFIG_FILE_NAME);
        return Ok(());
    }

    let config = load_config(&cli)?;

    if cli.files.is_empty() {
        eprintln!("Error: No input files specified. Use --help for usage information.");
        std::process::exit(1);
    }
    if cli.output.is_some() && cli.files.len() > 1 {
        bail!("--output can only be used with a single input file");
    }

    info!(
        level = %config.level,
        files = cli.files.len(),
        "optimizing"
    );

    if !optimize_files(&cli, config)? {
        std::process::exit(1);
    }
    Ok(())
}

/// Load the configuration file (explicit, or toyopt.json when present) and
/// apply command line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<OptimizerConfig> {
    let mut config = if let Some(ref path) = cli.config {
        OptimizerConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?
    } else {
        let default_path = PathBuf::from(CONFIG_FILE_NAME);
        if default_path.exists() {
            debug!(path = %default_path.display(), "using configuration file");
            OptimizerConfig::from_file(&default_path)
                .with_context(|| format!("Failed to load {}", CONFIG_FILE_NAME))?
        } else {
            OptimizerConfig::default()
        }
    };

    let mut overrides = CliOverrides::default();
    if let Some(ref level) = cli.level {
        overrides.level = Some(level.parse::<OptimizationLevel>()?);
    }
    if cli.no_hoist_scalars {
        overrides.hoist_scalars = Some(false);
    }
    if cli.no_hoist_indices {
        overrides.hoist_array_indices = Some(false);
    }
    if let Some(ref prefix) = cli.temp_prefix {
        overrides.temp_prefix = Some(prefix.clone());
    }
    overrides.max_fold_iterations = cli.max_fold_iterations;
    if cli.no_pretty {
        overrides.pretty = Some(false);
    }

    config.merge(&overrides);
    config.validate()?;
    Ok(config)
}

/// Where the optimized program for `input` goes, or `None` for stdout
fn determine_output_path(cli: &Cli, input: &Path) -> Option<PathBuf> {
    if cli.stdout {
        return None;
    }
    if let Some(ref output) = cli.output {
        return Some(output.clone());
    }

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let file_name = format!("{}.opt.txt", stem);

    match cli.out_dir {
        Some(ref dir) => Some(dir.join(file_name)),
        None => Some(input.with_file_name(file_name)),
    }
}

struct FileResult {
    file_path: PathBuf,
    result: toyopt_core::errors::Result<Option<OptimizationOutcome>>,
}

/// Optimize every input in parallel, then report in input order.
/// Returns false when any file failed.
fn optimize_files(cli: &Cli, config: OptimizerConfig) -> anyhow::Result<bool> {
    let container = Container::new(config);

    let results: Vec<FileResult> = cli
        .files
        .par_iter()
        .map(|file_path| {
            let pipeline = Pipeline::new(container.clone());
            let output = determine_output_path(cli, file_path);
            FileResult {
                file_path: file_path.clone(),
                result: pipeline.run(file_path, output.as_deref()),
            }
        })
        .collect();

    let mut failed = 0;
    let mut stats = Vec::new();
    for FileResult { file_path, result } in results {
        let outcome = match result {
            Ok(Some(outcome)) => outcome,
            // missing input, already reported as a diagnostic
            Ok(None) => {
                failed += 1;
                continue;
            }
            Err(e) => {
                eprintln!("error: {}", e);
                failed += 1;
                continue;
            }
        };

        if cli.stages {
            for stage in Stage::ALL {
                println!("=== {} ({}) ===", stage.title(), file_path.display());
                println!("{}", outcome.stage(stage));
            }
        } else if cli.stdout {
            println!("{}", outcome.output());
        }

        if cli.stats {
            stats.push(serde_json::json!({
                "file": file_path.display().to_string(),
                "stats": outcome.stats,
            }));
        }
    }

    if cli.stats {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    if failed > 0 || container.has_errors() {
        eprintln!("{} of {} file(s) failed", failed, cli.files.len());
        return Ok(false);
    }
    info!(files = cli.files.len(), "done");
    Ok(true)
}
