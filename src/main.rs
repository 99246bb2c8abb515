//! # tagmerge CLI
//!
//! Finds and folds duplicate tags in a media-archive host.
//!
//! ## Usage
//!
//! ```bash
//! tagmerge --config ./config/tagmerge.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tagmerge plan` | Compute the merge plan without touching the host |
//! | `tagmerge apply` | Compute the plan and execute it |
//! | `tagmerge run` | Dry run or apply depending on `merge.dry_run` |
//!
//! When `[host].transport = "stdio"`, requests to the host go out on stdout
//! and the final result is printed there as a single JSON line.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use tagmerge::config::{self, Config, HostTransport, MAX_PAGE_SIZE};
use tagmerge::export;
use tagmerge::host;
use tagmerge::pipeline::{self, MergeReport, RunOutcome};
use tagmerge::progress::ProgressMode;

/// tagmerge: duplicate-tag resolution for a media-archive host.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means "all defaults" (dry run, HTTP host on
/// localhost).
#[derive(Parser)]
#[command(name = "tagmerge", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tagmerge.toml")]
    config: PathBuf,

    /// Progress output on stderr. Defaults to `human` on a TTY, else `off`.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the merge plan only. Never calls `tags.merge`.
    Plan {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Compute the merge plan and apply it.
    Apply {
        #[command(flatten)]
        run: RunArgs,

        /// Keep source tags after merging instead of deleting them.
        #[arg(long)]
        keep_source: bool,

        /// Apply at most this many merges (0 = all).
        #[arg(long)]
        max_merges: Option<usize>,
    },

    /// Dry run or apply, as configured by `merge.dry_run`.
    Run {
        #[command(flatten)]
        run: RunArgs,
    },
}

/// Options shared by every command.
#[derive(Args)]
struct RunArgs {
    /// Translation language requested from the host (e.g. `zh`, `en`).
    #[arg(long)]
    language: Option<String>,

    /// Tags per `tags.list` page (1 to 2000).
    #[arg(long)]
    page_size: Option<u64>,

    /// Write the full plan as JSON to this path.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Result format on stdout. Defaults to `json` for the stdio transport.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl RunArgs {
    fn apply_to(&self, cfg: &mut Config) {
        if let Some(language) = &self.language {
            cfg.merge.language = language.clone();
        }
        if let Some(page_size) = self.page_size {
            cfg.merge.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        }
    }
}

impl Commands {
    fn run_args(&self) -> &RunArgs {
        match self {
            Commands::Plan { run } | Commands::Apply { run, .. } | Commands::Run { run } => run,
        }
    }

    /// Apply command-line overrides on top of the loaded configuration.
    fn configure(&self, cfg: &mut Config) {
        match self {
            Commands::Plan { .. } => cfg.merge.dry_run = true,
            Commands::Apply {
                keep_source,
                max_merges,
                ..
            } => {
                cfg.merge.dry_run = false;
                if *keep_source {
                    cfg.merge.delete_source = false;
                }
                if let Some(max) = max_merges {
                    cfg.merge.max_merges = *max;
                }
            }
            Commands::Run { .. } => {}
        }
        self.run_args().apply_to(cfg);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let run = cli.command.run_args();

    let mut cfg = match config::load_config_or_default(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) if run.format == Some(OutputFormat::Json) => emit_json(&Err(e)),
        Err(e) => return Err(e),
    };
    cli.command.configure(&mut cfg);

    let format = run.format.unwrap_or(match cfg.host.transport {
        HostTransport::Stdio => OutputFormat::Json,
        HostTransport::Http => OutputFormat::Text,
    });

    let result = execute(&cfg, run, cli.progress).await;

    match format {
        OutputFormat::Json => emit_json(&result),
        OutputFormat::Text => print_summary(&result?, &cfg),
    }

    Ok(())
}

/// Validate, connect, run the pipeline and export. Every error here ends up
/// in the final outcome.
async fn execute(
    cfg: &Config,
    run: &RunArgs,
    progress: Option<ProgressMode>,
) -> anyhow::Result<MergeReport> {
    config::validate(cfg)?;
    let reporter = progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();

    let tag_host = host::create_host(cfg)?;
    let report = pipeline::run_merge(cfg, tag_host.as_ref(), reporter.as_ref()).await?;

    if let Some(path) = &run.export {
        export::write_plan(&report, &cfg.merge.language, path)?;
    }
    Ok(report)
}

/// Print the single-line JSON outcome and exit non-zero on failure.
fn emit_json(result: &anyhow::Result<MergeReport>) -> ! {
    let outcome = RunOutcome::from_result(result);
    match serde_json::to_string(&outcome) {
        Ok(line) => println!("{}", line),
        Err(e) => eprintln!("Error: failed to encode result: {}", e),
    }
    if let RunOutcome::Failure { message, .. } = &outcome {
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }
    std::process::exit(0);
}

fn print_summary(report: &MergeReport, cfg: &Config) {
    if report.applied_merges.is_none() {
        println!("tagmerge (dry-run)");
    } else {
        println!("tagmerge");
    }
    println!("  language: {}", cfg.merge.language);
    println!("  tags loaded: {}", report.total_tags);
    if report.skipped_records > 0 {
        println!("  records skipped: {}", report.skipped_records);
    }
    println!("  planned merges: {}", report.planned_merges);
    if let Some(applied) = report.applied_merges {
        println!("  applied merges: {}", applied);
        println!("  sources deleted: {}", cfg.merge.delete_source);
    }
    println!("ok");
}
