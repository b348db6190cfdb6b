//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::report::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// Profile Quality - completeness auditor for paginated profile APIs
///
/// Fetches every profile page from the service, measures how often each
/// field is missing per role, and writes a static HTML report.
///
/// Examples:
///   profile-quality --endpoint https://host/talent/get-profiles --token TOKEN
///   profile-quality --fields name,email,skills --format json
///   profile-quality --output-dir reports --max-pages 5
///   profile-quality --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Profile endpoint URL
    #[arg(long, value_name = "URL", env = "PROFILE_QUALITY_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bearer token for the profile service
    #[arg(long, value_name = "TOKEN", env = "PROFILE_QUALITY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Records requested per page (default 500)
    #[arg(long, value_name = "COUNT")]
    pub page_size: Option<usize>,

    /// Maximum number of pages to request (default 20)
    #[arg(long, value_name = "COUNT")]
    pub max_pages: Option<usize>,

    /// Request timeout in seconds (default 60)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Fields to check for missing values (comma-separated)
    ///
    /// Example: --fields name,email,skills
    #[arg(long, value_name = "FIELDS", value_delimiter = ',')]
    pub fields: Option<Vec<String>>,

    /// Field used to group profiles
    #[arg(long, value_name = "FIELD")]
    pub category_field: Option<String>,

    /// Directory the report is written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format (html, json)
    #[arg(long, default_value = "html", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .profile-quality.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .profile-quality.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref endpoint) = self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err("Endpoint must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.page_size == Some(0) {
            return Err("Page size must be at least 1".to_string());
        }

        if self.max_pages == Some(0) {
            return Err("Max pages must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref fields) = self.fields {
            if fields.is_empty() || fields.iter().any(|f| f.trim().is_empty()) {
                return Err("Field names must not be empty".to_string());
            }
            let mut seen = std::collections::HashSet::new();
            if let Some(dup) = fields.iter().find(|f| !seen.insert(f.as_str())) {
                return Err(format!("Field '{}' is listed more than once", dup));
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
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
