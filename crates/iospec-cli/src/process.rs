//! # Process Subcommands
//!
//! `iospec --config manager.yaml process-input <document>` and its output
//! counterpart. The processed document is printed as JSON; a rejected
//! document prints the failure summary and one line per violation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde_json::json;

use iospec_core::{Direction, Manager, ManagerConfig, Value, VerificationFailure};
use iospec_web::WebPresets;

use crate::read_document;

/// How a rejected document is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// Summary line followed by `  path: message` lines.
    #[default]
    Text,
    /// A JSON object with `summary` and `violations`.
    Json,
}

/// Arguments shared by `process-input` and `process-output`.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Document to process (YAML or JSON; `-` reads stdin).
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Pretty-print the processed document.
    #[arg(long)]
    pub pretty: bool,

    /// Format of the violation report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,
}

/// Result of running a document through a pipeline.
#[derive(Debug)]
pub enum Outcome {
    Accepted(Value),
    Rejected(VerificationFailure),
}

/// Load a manager configuration file and build it with the web presets.
pub fn load_manager(config: &Path) -> Result<Manager> {
    let document = read_document(config)?;
    let config_doc: ManagerConfig = serde_json::from_value(document)
        .with_context(|| format!("invalid manager configuration in {}", config.display()))?;
    let manager = config_doc
        .build(&WebPresets)
        .with_context(|| format!("cannot build manager from {}", config.display()))?;
    tracing::info!(config = %config.display(), "loaded manager configuration");
    Ok(manager)
}

/// Run `document` through the `direction` pipeline of `manager`.
pub fn process_document(manager: &Manager, direction: Direction, document: &Value) -> Outcome {
    let result = match direction {
        Direction::Input => manager.process_input(document),
        Direction::Output => manager.process_output(document),
    };
    match result {
        Ok(value) => Outcome::Accepted(value),
        Err(failure) => Outcome::Rejected(failure),
    }
}

/// Render a rejection report.
pub fn render_failure(failure: &VerificationFailure, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(failure.to_string()),
        ReportFormat::Json => {
            let body = json!({
                "direction": failure.direction(),
                "summary": failure.summary(),
                "violations": failure.violations(),
            });
            serde_json::to_string_pretty(&body).context("failed to serialize report")
        }
    }
}

/// Execute `process-input` / `process-output`.
///
/// Returns exit code: 0 when the document is accepted, 1 when it is
/// rejected.
pub fn run_process(direction: Direction, args: &ProcessArgs, config: Option<&Path>) -> Result<u8> {
    let config = config.context("--config <FILE> is required for process commands")?;
    let manager = load_manager(config)?;
    let document = Value::from(read_document(&args.document)?);

    match process_document(&manager, direction, &document) {
        Outcome::Accepted(value) => {
            let json = value.to_json();
            let text = if args.pretty {
                serde_json::to_string_pretty(&json)
            } else {
                serde_json::to_string(&json)
            }
            .context("failed to serialize processed document")?;
            println!("{text}");
            Ok(0)
        }
        Outcome::Rejected(failure) => {
            tracing::info!(
                %direction,
                violations = failure.violations().len(),
                "document rejected"
            );
            println!("{}", render_failure(&failure, args.report)?);
            Ok(1)
        }
    }
}
