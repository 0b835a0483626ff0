use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Spdx,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "spdx" => Ok(OutputFormat::Spdx),
            _ => Err(format!(
                "Invalid format: {}. Please specify 'json' or 'spdx'",
                s
            )),
        }
    }
}

/// Analyze firmware images for embedded components and known vulnerabilities
#[derive(Parser, Debug)]
#[command(name = "firmlens")]
#[command(version)]
#[command(about = "Analyze firmware images for embedded components and known vulnerabilities", long_about = None)]
pub struct Args {
    /// Path to the firmware image file
    pub image: PathBuf,

    /// Output format: json or spdx (defaults to the config file's choice,
    /// then json)
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip vulnerability correlation (no network access)
    #[arg(long)]
    pub offline: bool,

    /// Path to a config file (defaults to ./firmlens.config.yml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
