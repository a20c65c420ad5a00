//! tseg-run - automated brain tumour segmentation with variable MRI
//! sequence availability
//!
//! Iterates a subject list, picks the pre-trained model matching each
//! patient's available sequences and runs the external predictor on it.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tseg_common::config::{
    load_config, resolve_patient_root, resolve_predictor, resolve_subjects_file, ConfigLocator,
    TomlConfig,
};
use tseg_run::models::{InferenceMode, UnrecognisedPolicy};
use tseg_run::services::{load_subjects, NnUnetPredictor};
use tseg_run::workflow::{BatchRunner, BatchSettings};

/// Command-line arguments for tseg-run
#[derive(Parser, Debug)]
#[command(name = "tseg-run")]
#[command(about = "Brain tumour segmentation with incomplete MRI sequences")]
#[command(version)]
struct Args {
    /// Directory holding one sub-directory per patient
    #[arg(long)]
    path: Option<PathBuf>,

    /// Subject list, one identifier per line (relative to --path) [default: subs.txt]
    #[arg(long)]
    subs: Option<PathBuf>,

    /// Multiclass tissue segmentation or general abnormality detection
    #[arg(long, value_enum, default_value_t = InferenceMode::Tissue)]
    mode: InferenceMode,

    /// Keep temporary staged files
    #[arg(long)]
    nocleanup: bool,

    /// Config file (defaults to $TSEG_CONFIG, then the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fold selector passed to the predictor (env TSEG_FOLD) [default: all]
    #[arg(long)]
    fold: Option<String>,

    /// Predictor executable (env TSEG_PREDICTOR) [default: nnUNet_predict]
    #[arg(long)]
    predictor: Option<String>,

    /// Ignore volumes that are not FLAIR/T1/T1CE/T2 instead of rejecting the patient
    #[arg(long, alias = "ignore-unrecognized")]
    ignore_unrecognised: bool,

    /// Write a JSON run report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Resolve models and print commands without staging or running anything
    #[arg(long)]
    dry_run: bool,

    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let locator = ConfigLocator::new(args.config.clone());
    let config = load_config(&locator);

    init_tracing(&args, config.as_ref().ok());
    let config = config.context("Failed to load configuration")?;

    info!("Starting tseg-run v{}", env!("CARGO_PKG_VERSION"));
    // load_config ran before the subscriber existed
    match locator.locate() {
        Some(path) if path.exists() => info!("Config: {}", path.display()),
        Some(path) => warn!("Config file {} not found, using defaults", path.display()),
        None => info!("No config file, using defaults"),
    }

    let patient_root = resolve_patient_root(args.path.as_deref(), &config);
    if !patient_root.is_dir() {
        bail!("Patient root is not a directory: {}", patient_root.display());
    }
    info!("Patient root: {}", patient_root.display());

    let subjects_file = resolve_subjects_file(args.subs.as_deref(), &config, &patient_root);
    let subjects = load_subjects(&subjects_file)
        .with_context(|| format!("Failed to read subject list {}", subjects_file.display()))?;
    info!("Subject list: {}", subjects_file.display());

    let predictor_config =
        resolve_predictor(args.predictor.as_deref(), args.fold.as_deref(), &config);
    let predictor = NnUnetPredictor::new(predictor_config.binary);
    if !args.dry_run && !predictor.is_available().await {
        bail!(
            "Predictor '{}' could not be started; check it is installed and on PATH",
            predictor.binary()
        );
    }

    let settings = BatchSettings {
        patient_root,
        mode: args.mode,
        fold: predictor_config.fold,
        keep_staging: args.nocleanup,
        unrecognised: if args.ignore_unrecognised {
            UnrecognisedPolicy::Ignore
        } else {
            UnrecognisedPolicy::Strict
        },
        dry_run: args.dry_run,
    };

    let cancel = CancellationToken::new();
    tokio::spawn(interrupt_listener(cancel.clone()));

    let runner = BatchRunner::new(settings, predictor);
    let summary = runner.run(&subjects, &cancel).await;

    if let Some(report_path) = &args.report {
        summary
            .write_json(report_path)
            .with_context(|| format!("Failed to write report {}", report_path.display()))?;
        info!("Report written to {}", report_path.display());
    }

    info!(
        "Completed: {}, skipped: {}, failed: {}",
        summary.completed(),
        summary.skipped(),
        summary.failed()
    );

    let code = summary.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// RUST_LOG wins; otherwise --verbose, then the configured level
fn init_tracing(args: &Args, config: Option<&TomlConfig>) {
    let level = if args.verbose {
        "debug".to_string()
    } else {
        config
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|| "info".to_string())
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tseg_run={level},tseg_common={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Stop the batch before the next patient on Ctrl+C
async fn interrupt_listener(cancel: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            warn!("Received Ctrl+C, finishing current patient then stopping");
            cancel.cancel();
        }
        Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
    }
}
