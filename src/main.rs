use anyhow::Context;
use firmlens::adapters::outbound::{InMemoryReportStore, NvdClient, SpdxFormatter};
use firmlens::analysis::domain::{format_size, AnalysisReport, Severity};
use firmlens::analysis::services::total_storage;
use firmlens::application::dto::{AnalysisRequest, AnalysisResponse};
use firmlens::application::use_cases::{AnalyzeFirmwareUseCase, CorrelateVulnerabilitiesUseCase};
use firmlens::application::CorrelationCache;
use firmlens::cli::{Args, OutputFormat};
use firmlens::config::{self, ConfigFile};
use firmlens::ports::outbound::BomFormatter;
use firmlens::shared::{ExitCode, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use std::process;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse_args();

    match run(args).await {
        Ok(code) => process::exit(code.as_i32()),
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = match args.config {
        Some(ref path) => config::load_config_from_path(path)?,
        None => config::discover_config(Path::new("."))?.unwrap_or_default(),
    };
    let format = resolve_format(&args, &config)?;

    let filename = args
        .image
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("Invalid firmware path: {}", args.image.display()))?;
    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read firmware image: {}", args.image.display()))?;

    // Dependency injection
    let source = Arc::new(
        match config.nvd_endpoint {
            Some(ref endpoint) => NvdClient::with_endpoint(endpoint.clone()),
            None => NvdClient::new(),
        }
        .context("Failed to create NVD client")?,
    );
    let (positive_ttl, negative_ttl) = config.cache_ttls();
    let cache = Arc::new(CorrelationCache::new(positive_ttl, negative_ttl));
    let correlator =
        CorrelateVulnerabilitiesUseCase::new(source, cache, config.correlation_settings());
    let store = Arc::new(InMemoryReportStore::new());
    let use_case = AnalyzeFirmwareUseCase::new(correlator, store, config.pipeline_settings());

    // Ctrl-C degrades the run instead of killing it mid-pipeline.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted; finishing with the lookups already in flight...");
            signal_cancel.cancel();
        }
    });

    let mut request = AnalysisRequest::new(filename, bytes);
    if args.offline {
        request = request.offline();
    }
    let report = use_case.execute(request, &cancel).await?;

    let output = match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&AnalysisResponse::from_report(&report))?
        }
        OutputFormat::Spdx => SpdxFormatter::new().format(&report)?,
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{}", output),
    }

    print_summary(&report);

    if report.vulnerabilities.is_empty() {
        Ok(ExitCode::Success)
    } else {
        Ok(ExitCode::VulnerabilitiesDetected)
    }
}

/// CLI flag wins over the config file; the fallback is JSON.
fn resolve_format(args: &Args, config: &ConfigFile) -> Result<OutputFormat> {
    if let Some(format) = args.format {
        return Ok(format);
    }
    match config.format {
        Some(ref name) => OutputFormat::from_str(name).map_err(|e| anyhow::anyhow!(e)),
        None => Ok(OutputFormat::Json),
    }
}

fn print_summary(report: &AnalysisReport) {
    eprintln!(
        "\n{} component(s) extracted, {} of storage inventoried",
        report.components.len(),
        format_size(total_storage(&report.components) as u64)
    );

    let count = |severity: Severity| {
        report
            .vulnerabilities
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    };
    let (critical, high, medium, low) = (
        count(Severity::Critical),
        count(Severity::High),
        count(Severity::Medium),
        count(Severity::Low),
    );

    if report.vulnerabilities.is_empty() {
        eprintln!("{}", "No known vulnerabilities matched".green());
    } else {
        eprintln!(
            "{}: {} {}, {} {}, {} {}, {} {}",
            "Vulnerabilities".bold(),
            critical,
            "critical".red().bold(),
            high,
            "high".red(),
            medium,
            "medium".yellow(),
            low,
            "low".green(),
        );
    }

    if report.degraded {
        eprintln!(
            "{}",
            format!(
                "Report is degraded: {} entr(ies) with insufficient data",
                report.unresolved.len()
            )
            .yellow()
        );
        for unresolved in &report.unresolved {
            eprintln!("  - {} ({})", unresolved.entry, unresolved.reason);
        }
    }
}
