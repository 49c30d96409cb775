//! Cassava leaf disease inference CLI
//!
//! Takes one base64-encoded image, prints exactly one JSON object on stdout
//! and always exits with status 0. Failures are reported in-band through
//! `isPytorchResult: false` and the `error` field.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{error, info};

use cassava_inference::backend::{backend_name, ComputeDevice, InferenceBackend};
use cassava_inference::utils::logging::{install_panic_hook, panic_message};
use cassava_inference::utils::{init_logging, LogConfig, LogLevel};
use cassava_inference::{DiagnosisReport, DiseaseCatalog, InferenceRunner, ModelConfig};

const NO_IMAGE_PROVIDED: &str = "No image data provided";

/// Cassava leaf disease classification
///
/// Prints a JSON diagnosis for a base64-encoded leaf image.
#[derive(Parser, Debug)]
#[command(name = "cassava_inference")]
#[command(version)]
#[command(about = "Classify a cassava leaf image and print a JSON diagnosis", long_about = None)]
struct Cli {
    /// Base64-encoded leaf image (a data URL prefix is accepted)
    image: Option<String>,

    /// Local path of the model artifact
    #[arg(long, env = "CASSAVA_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// URL the artifact is downloaded from when missing
    #[arg(long, env = "CASSAVA_MODEL_URL")]
    model_url: Option<String>,

    /// JSON file with model configuration
    #[arg(long, env = "CASSAVA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level written to stderr
    #[arg(long, env = "CASSAVA_LOG", default_value = "warn")]
    log_level: String,

    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

fn main() {
    let report = match Cli::try_parse() {
        Ok(cli) => {
            let log_config = if cli.verbose {
                LogConfig::verbose()
            } else {
                LogConfig::default().with_level(LogLevel::parse(&cli.log_level))
            };
            let _ = init_logging(&log_config);
            install_panic_hook();

            run_guarded(&cli)
        }
        Err(e) => parse_failure(e),
    };

    emit(&report);
}

/// Help and version exit through clap; every other parse error is reported as JSON
fn parse_failure(e: clap::Error) -> DiagnosisReport {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
        ErrorKind::MissingRequiredArgument => DiagnosisReport::fallback(NO_IMAGE_PROVIDED),
        _ => {
            let rendered = e.to_string();
            let message = rendered.lines().next().unwrap_or("invalid arguments");
            DiagnosisReport::fallback(message.trim_start_matches("error: "))
        }
    }
}

fn run_guarded(cli: &Cli) -> DiagnosisReport {
    guarded(|| run(cli))
}

/// Outermost boundary: anything that escapes here becomes the fatal report
fn guarded(f: impl FnOnce() -> Result<DiagnosisReport>) -> DiagnosisReport {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(report)) => report,
        Ok(Err(err)) => {
            error!("{:#}", err);
            DiagnosisReport::fatal(format!("{:#}", err))
        }
        Err(payload) => DiagnosisReport::fatal(panic_message(payload.as_ref())),
    }
}

fn run(cli: &Cli) -> Result<DiagnosisReport> {
    let Some(image) = cli.image.as_deref().filter(|s| !s.trim().is_empty()) else {
        return Ok(DiagnosisReport::fallback(NO_IMAGE_PROVIDED));
    };

    let config = build_config(cli)?;
    let device = ComputeDevice::detect();

    info!("Model: {}", config.model_path.display());
    info!("Backend: {} ({})", backend_name(), device);

    let mut runner = match InferenceRunner::<InferenceBackend>::new(
        config,
        DiseaseCatalog::cassava(),
        device.device(),
    ) {
        Ok(runner) => runner,
        Err(err) => return Ok(DiagnosisReport::from(&err)),
    };

    Ok(runner.predict(image))
}

/// Defaults, then the config file, then flags and environment variables
fn build_config(cli: &Cli) -> Result<ModelConfig> {
    let mut config = match &cli.config {
        Some(path) => ModelConfig::load(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => ModelConfig::default(),
    };

    if let Some(path) = &cli.model_path {
        config.model_path = path.clone();
    }

    if let Some(url) = &cli.model_url {
        config.model_url = url.clone();
    }

    Ok(config)
}

fn emit(report: &DiagnosisReport) {
    match report.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize report: {}", e);
            println!(
                r#"{{"diseaseName":"System Error","severity":"Unknown","confidence":0,"symptoms":"System error occurred during analysis.","treatment":"Please try again or contact technical support.","isPytorchResult":false,"error":"Fatal error: failed to serialize result"}}"#
            );
        }
    }
}
