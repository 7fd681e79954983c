//! Talking-face evaluation CLI.
//!
//! Single-pair mode evaluates one generated video (optionally against a
//! reference); batch mode pairs files from two directories by stem and
//! evaluates them sequentially. Exit status is 0 when at least one
//! evaluation succeeded and 1 otherwise; an interrupt terminates with the
//! conventional SIGINT status.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;

use tfe_core::config::{load_settings, Settings};
use tfe_core::logging::{init_tracing, LogLevel};
use tfe_core::metrics::{Direction, MetricKind};
use tfe_core::session::{run_batch, EvaluationOrchestrator};

#[derive(Parser, Debug)]
#[command(
    name = "tfe",
    version,
    about = "Talking-face generation evaluation tool",
    long_about = "Evaluates talking-face-generation output against a reference video across \
                  perceptual, distributional, identity and lip-sync metrics, and aggregates \
                  them into a single weighted score."
)]
struct Args {
    /// Generated video path (single-pair mode)
    #[arg(long)]
    generated: Option<PathBuf>,

    /// Reference video path (optional; reference-based metrics are skipped
    /// without it)
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Identity source image (defaults to a frame of the reference video)
    #[arg(long)]
    source_image: Option<PathBuf>,

    /// Batch mode: pair videos from --reference-dir and --generated-dir by
    /// file stem
    #[arg(long)]
    batch: bool,

    /// Reference video directory (batch mode)
    #[arg(long)]
    reference_dir: Option<PathBuf>,

    /// Generated video directory (batch mode)
    #[arg(long)]
    generated_dir: Option<PathBuf>,

    /// Settings file (TOML); command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Metric preset: full, basic, sync or quality
    #[arg(long)]
    preset: Option<String>,

    /// Explicit metric list (overrides the preset)
    #[arg(long, num_args = 1..)]
    metrics: Vec<String>,

    /// Number of frames to sample per video
    #[arg(long)]
    num_frames: Option<usize>,

    /// Target frame resolution as WIDTH HEIGHT
    #[arg(long, num_args = 2)]
    resolution: Vec<u32>,

    /// Compute device for the model sidecar (cuda or cpu)
    #[arg(long)]
    device: Option<String>,

    /// Report output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_tracing(if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the requested mode; returns whether at least one evaluation succeeded.
fn run(args: Args) -> Result<bool> {
    let settings = build_settings(&args)?;

    if args.batch {
        let (Some(reference_dir), Some(generated_dir)) =
            (args.reference_dir.as_ref(), args.generated_dir.as_ref())
        else {
            bail!("batch mode requires --reference-dir and --generated-dir");
        };

        let summary = run_batch(&settings, reference_dir, generated_dir)?;
        println!(
            "Batch complete: {}/{} pair(s) evaluated successfully, {} failed",
            summary.successful, summary.total_pairs, summary.failed
        );
        Ok(summary.successful > 0)
    } else {
        let Some(generated) = args.generated.as_ref() else {
            bail!("single-pair mode requires --generated (or use --batch)");
        };

        let mut orchestrator = EvaluationOrchestrator::new(settings);
        orchestrator.bind_media(
            generated,
            args.reference.as_deref(),
            args.source_image.as_deref(),
        )?;
        let session = orchestrator.evaluate()?;

        println!("Evaluation of '{}'", session.video_info.video_name);
        for (name, result) in &session.metrics {
            let direction = match MetricKind::parse(name).map(|k| k.direction()) {
                Some(Direction::LowerBetter) => " (lower is better)",
                Some(Direction::HigherBetter) => " (higher is better)",
                None => "",
            };
            if result.is_success() {
                println!("  {:>10}: {:.4}{}", name, result.value, direction);
            } else {
                println!(
                    "  {:>10}: error ({})",
                    name,
                    result.message.as_deref().unwrap_or("unknown")
                );
            }
        }
        println!(
            "Overall score: {:.4} ({})",
            session.summary.overall_score, session.summary.interpretation
        );

        Ok(session.metrics.values().any(|r| r.is_success()))
    }
}

/// Assemble settings: file (when given), then command-line overrides.
fn build_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => load_settings(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    if let Some(preset) = &args.preset {
        settings.metrics.preset = preset.clone();
    }
    if !args.metrics.is_empty() {
        settings.metrics.metrics = args.metrics.clone();
    }
    if let Some(num_frames) = args.num_frames {
        settings.video.num_frames = num_frames;
    }
    if args.resolution.len() == 2 {
        settings.video.width = args.resolution[0];
        settings.video.height = args.resolution[1];
    }
    if let Some(device) = &args.device {
        settings.models.device = device.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        settings.output.output_dir = output_dir.display().to_string();
    }

    Ok(settings)
}
