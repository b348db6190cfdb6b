//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.profile-quality.toml` files.

use crate::analysis::AnalysisSettings;
use crate::fetch::FetchConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".profile-quality.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Profile service settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Profile service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the paginated profile endpoint.
    #[serde(default)]
    pub endpoint: String,

    /// Bearer token sent with every request.
    #[serde(default)]
    pub token: String,

    /// Records requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum number of pages to request.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: String::new(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_page_size() -> usize {
    500
}

fn default_max_pages() -> usize {
    20
}

fn default_timeout() -> u64 {
    60
}

/// Record aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Key of the nested object holding profile fields.
    #[serde(default = "default_data_key")]
    pub data_key: String,

    /// Field used to group records.
    #[serde(default = "default_category_field")]
    pub category_field: String,

    /// Group label for records without a category.
    #[serde(default = "default_fallback_category")]
    pub fallback_category: String,

    /// Fields checked for missing values.
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_key: default_data_key(),
            category_field: default_category_field(),
            fallback_category: default_fallback_category(),
            fields: default_fields(),
        }
    }
}

fn default_data_key() -> String {
    "json_structure".to_string()
}

fn default_category_field() -> String {
    "current_role".to_string()
}

fn default_fallback_category() -> String {
    "Unknown Role".to_string()
}

fn default_fields() -> Vec<String> {
    vec![
        "name",
        "email",
        "phone",
        "experience_years",
        "domain",
        "summary",
        "country",
        "skills",
        "current_role",
        "current_company",
        "current_location",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory the report is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Title shown in the report header.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            title: default_title(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_title() -> String {
    "Talent Data Quality Analysis Report".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line (or through their
    /// environment variables) override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref endpoint) = args.endpoint {
            self.source.endpoint = endpoint.clone();
        }
        if let Some(ref token) = args.token {
            self.source.token = token.clone();
        }
        if let Some(page_size) = args.page_size {
            self.source.page_size = page_size;
        }
        if let Some(max_pages) = args.max_pages {
            self.source.max_pages = max_pages;
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }

        if let Some(ref fields) = args.fields {
            self.analysis.fields = fields.clone();
        }
        if let Some(ref category_field) = args.category_field {
            self.analysis.category_field = category_field.clone();
        }

        if let Some(ref output_dir) = args.output_dir {
            self.report.output_dir = output_dir.clone();
        }
    }

    /// Check that the merged configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.source.endpoint.trim().is_empty() {
            bail!(
                "No endpoint configured. Use --endpoint, PROFILE_QUALITY_ENDPOINT or [source] endpoint in {}",
                DEFAULT_CONFIG_FILE
            );
        }
        if !self.source.endpoint.starts_with("http://")
            && !self.source.endpoint.starts_with("https://")
        {
            bail!("Endpoint must start with 'http://' or 'https://'");
        }
        if self.source.token.trim().is_empty() {
            bail!(
                "No API token configured. Use --token, PROFILE_QUALITY_TOKEN or [source] token in {}",
                DEFAULT_CONFIG_FILE
            );
        }
        if self.source.page_size == 0 || self.source.max_pages == 0 {
            bail!("Page size and max pages must be at least 1");
        }
        if self.source.timeout_seconds == 0 {
            bail!("Timeout must be at least 1 second");
        }
        if self.analysis.fields.is_empty() {
            bail!("At least one field must be checked");
        }
        let mut seen = HashSet::new();
        for field in &self.analysis.fields {
            if field.trim().is_empty() {
                bail!("Field names must not be empty");
            }
            if !seen.insert(field.as_str()) {
                bail!("Field '{}' is listed more than once", field);
            }
        }
        Ok(())
    }

    /// Build the fetcher settings.
    pub fn fetch_config(&self, show_progress: bool) -> FetchConfig {
        FetchConfig {
            endpoint: self.source.endpoint.clone(),
            token: self.source.token.clone(),
            page_size: self.source.page_size,
            max_pages: self.source.max_pages,
            timeout_seconds: self.source.timeout_seconds,
            show_progress,
        }
    }

    /// Build the aggregation settings.
    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            data_key: self.analysis.data_key.clone(),
            category_field: self.analysis.category_field.clone(),
            fallback_category: self.analysis.fallback_category.clone(),
            fields: self.analysis.fields.clone(),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.source.endpoint = "https://profiles.example.com/get-profiles".to_string();
        config.source.token = "token".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source.page_size, 500);
        assert_eq!(config.source.max_pages, 20);
        assert_eq!(config.analysis.fields.len(), 11);
        assert_eq!(config.analysis.fallback_category, "Unknown Role");
        assert_eq!(config.analysis.data_key, "json_structure");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[source]
endpoint = "https://profiles.example.com/get-profiles"
token = "abc"
max_pages = 5

[analysis]
fields = ["name", "email"]

[report]
output_dir = "reports"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.source.endpoint, "https://profiles.example.com/get-profiles");
        assert_eq!(config.source.max_pages, 5);
        assert_eq!(config.source.page_size, 500);
        assert_eq!(config.analysis.fields, vec!["name", "email"]);
        assert_eq!(config.analysis.category_field, "current_role");
        assert_eq!(config.report.output_dir, PathBuf::from("reports"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[analysis]"));
        assert!(toml_str.contains("[report]"));

        let round: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(round.analysis.fields.len(), 11);
    }

    #[test]
    fn test_merge_with_args_overrides_only_given_values() {
        let mut config = valid_config();
        config.source.max_pages = 7;

        let args = Args::try_parse_from([
            "profile-quality",
            "--token",
            "from-cli",
            "--fields",
            "name,skills",
        ])
        .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.source.token, "from-cli");
        assert_eq!(config.source.max_pages, 7);
        assert_eq!(config.analysis.fields, vec!["name", "skills"]);
        assert_eq!(
            config.source.endpoint,
            "https://profiles.example.com/get-profiles"
        );
    }

    #[test]
    fn test_validate() {
        assert!(valid_config().validate().is_ok());

        let mut missing_token = valid_config();
        missing_token.source.token = String::new();
        assert!(missing_token.validate().is_err());

        let mut missing_endpoint = valid_config();
        missing_endpoint.source.endpoint = String::new();
        assert!(missing_endpoint.validate().is_err());

        let mut bad_scheme = valid_config();
        bad_scheme.source.endpoint = "ftp://example.com".to_string();
        assert!(bad_scheme.validate().is_err());

        let mut no_fields = valid_config();
        no_fields.analysis.fields.clear();
        assert!(no_fields.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_and_blank_fields() {
        let mut duplicate = valid_config();
        duplicate.analysis.fields = vec!["name".to_string(), "email".to_string(), "name".to_string()];
        let err = duplicate.validate().unwrap_err();
        assert!(err.to_string().contains("'name'"));

        let toml_content = r#"
[source]
endpoint = "https://profiles.example.com/get-profiles"
token = "abc"

[analysis]
fields = ["name", ""]
"#;
        let blank: Config = toml::from_str(toml_content).unwrap();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_settings_builders() {
        let config = valid_config();
        let fetch = config.fetch_config(false);
        assert_eq!(fetch.page_size, 500);
        assert!(!fetch.show_progress);

        let settings = config.analysis_settings();
        assert_eq!(settings.category_field, "current_role");
        assert_eq!(settings.fields.len(), 11);
    }
}
