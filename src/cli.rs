//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::RiskLevel;
use clap::Parser;
use std::path::PathBuf;

/// WardWatch - election-day ward monitoring rollups
///
/// Turns raw ward submissions (logistics, staffing, integrity checklists,
/// vote counts, incidents) into turnout, compliance and risk summaries for
/// each ward, each area council and the whole territory.
///
/// Examples:
///   wardwatch --snapshot export.json
///   wardwatch --snapshot export.json --view councils --format json
///   wardwatch --snapshot export.json --view council --council amac
///   wardwatch --snapshot export.json --view wards --council amac --ward-risk
///   wardwatch --snapshot export.json --view ward --ward amac-03 --ward-risk
///   wardwatch --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON snapshot export to read records from
    ///
    /// Can also be set in .wardwatch.toml under [source].
    #[arg(short, long, value_name = "FILE", env = "WARDWATCH_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Which view to produce
    #[arg(long, default_value = "dashboard", value_name = "VIEW")]
    pub view: ViewKind,

    /// Area council id (for --view council and --view wards)
    #[arg(long, value_name = "ID")]
    pub council: Option<String>,

    /// Ward id (for --view ward)
    #[arg(long, value_name = "ID")]
    pub ward: Option<String>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .wardwatch.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of area councils loaded concurrently
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Request deadline in seconds (0 disables it)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Classify risk per ward from its own incident count
    #[arg(long)]
    pub ward_risk: bool,

    /// Exit with code 2 if any council or ward in the view is at or above
    /// this risk level
    ///
    /// Values: low, medium, high. Not accepted with --view dashboard, which
    /// carries no risk level.
    #[arg(long, value_name = "LEVEL")]
    pub fail_on_risk: Option<RiskThreshold>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .wardwatch.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Views the tool can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ViewKind {
    /// Global dashboard statistics (default)
    #[default]
    Dashboard,
    /// Summary of every area council
    Councils,
    /// One area council with its wards
    Council,
    /// Ward summaries of one area council
    Wards,
    /// One ward
    Ward,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }

    /// Parse the format named in a config file.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Risk level for --fail-on-risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum RiskThreshold {
    Low,
    Medium,
    High,
}

impl From<RiskThreshold> for RiskLevel {
    fn from(threshold: RiskThreshold) -> Self {
        match threshold {
            RiskThreshold::Low => RiskLevel::Low,
            RiskThreshold::Medium => RiskLevel::Medium,
            RiskThreshold::High => RiskLevel::High,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.view {
            ViewKind::Council | ViewKind::Wards if self.council.is_none() => {
                return Err("--view council and --view wards require --council <ID>".to_string());
            }
            ViewKind::Ward if self.ward.is_none() => {
                return Err("--view ward requires --ward <ID>".to_string());
            }
            _ => {}
        }

        if self.view == ViewKind::Dashboard && self.fail_on_risk.is_some() {
            return Err("--fail-on-risk needs a view with risk levels, not dashboard".to_string());
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref snapshot) = self.snapshot {
            if !snapshot.is_file() {
                return Err(format!("Snapshot file does not exist: {}", snapshot.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
