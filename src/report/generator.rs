//! HTML and JSON report generation.
//!
//! Rendering is a pure function of the report value; only `write_report`
//! touches the filesystem.

use crate::models::{AnalysisResult, CategorySummary, FieldSummary, Report, ReportMetadata};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Static HTML document (default)
    #[default]
    Html,
    /// JSON document
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

/// File name for a report generated at `generated_at`.
pub fn report_filename(generated_at: &DateTime<Local>, format: OutputFormat) -> String {
    format!(
        "data_quality_report_{}.{}",
        generated_at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Escape text for inclusion in HTML content or attribute values.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Generate the complete HTML report.
pub fn generate_html_report(report: &Report) -> String {
    let metadata = &report.metadata;
    let analysis = &report.analysis;

    let mut output = String::new();
    output.push_str(&generate_head(&metadata.title));
    output.push_str("<body>\n    <div class=\"container\">\n");
    output.push_str(&generate_header(metadata));
    output.push_str(&generate_stats_grid(metadata.total_records, analysis));
    output.push_str(&generate_category_table(&analysis.categories));
    output.push_str(&generate_field_cards(&analysis.fields));
    output.push_str("    </div>\n</body>\n</html>\n");
    output
}

fn generate_head(title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    <link href="https://fonts.googleapis.com/css2?family=DM+Sans:wght@400;500;700&family=JetBrains+Mono:wght@400;600&display=swap" rel="stylesheet">
    <style>
{}    </style>
</head>
"#,
        escape_html(title),
        STYLESHEET
    )
}

fn generate_header(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("        <header>\n");
    section.push_str(&format!(
        "            <h1>📊 {}</h1>\n",
        escape_html(&metadata.title)
    ));
    section.push_str(
        "            <p>Comprehensive analysis of profile data quality across roles</p>\n",
    );
    section.push_str(&format!(
        "            <div class=\"meta\">\n                Generated on: {}\n",
        metadata.generated_at.format("%B %d, %Y at %I:%M %p")
    ));
    if let Some(ref cause) = metadata.partial_cause {
        section.push_str(&format!(
            "                <div class=\"partial\">Partial data: fetching stopped early ({})</div>\n",
            escape_html(cause)
        ));
    }
    section.push_str("            </div>\n        </header>\n\n");

    section
}

fn stat_card(label: &str, value: &str) -> String {
    format!(
        r#"            <div class="stat-card">
                <div class="stat-label">{}</div>
                <div class="stat-value">{}</div>
            </div>
"#,
        label, value
    )
}

fn generate_stats_grid(total_records: usize, analysis: &AnalysisResult) -> String {
    let mut section = String::new();

    section.push_str("        <div class=\"stats-grid\">\n");
    section.push_str(&stat_card("Total Profiles", &total_records.to_string()));
    section.push_str(&stat_card(
        "Unique Roles",
        &analysis.categories.len().to_string(),
    ));
    section.push_str(&stat_card(
        "Avg Data Quality",
        &format!("{:.1}%", analysis.average_quality()),
    ));
    section.push_str(&stat_card(
        "Fields Analyzed",
        &analysis.fields.len().to_string(),
    ));
    section.push_str("        </div>\n\n");

    section
}

fn generate_category_row(category: &CategorySummary) -> String {
    let class = category.tier();
    format!(
        r#"                    <tr>
                        <td><span class="role-badge">{name}</span></td>
                        <td>{count}</td>
                        <td><span class="percentage {class}">{missing:.1}%</span></td>
                        <td><span class="percentage {class}">{quality:.1}%</span></td>
                        <td>
                            <div class="progress-bar">
                                <div class="progress-fill {class}" style="width: {quality:.1}%"></div>
                            </div>
                        </td>
                    </tr>
"#,
        name = escape_html(&category.category),
        count = category.count,
        class = class,
        missing = category.missing_percentage,
        quality = category.quality_score,
    )
}

fn generate_category_table(categories: &[CategorySummary]) -> String {
    let mut section = String::new();

    section.push_str(
        r#"        <div class="results-table">
            <div class="table-header">
                📊 Data Quality by Role
            </div>
            <table>
                <thead>
                    <tr>
                        <th>Role</th>
                        <th>Profiles</th>
                        <th>Missing %</th>
                        <th>Quality Score</th>
                        <th>Visual</th>
                    </tr>
                </thead>
                <tbody>
"#,
    );
    for category in categories {
        section.push_str(&generate_category_row(category));
    }
    section.push_str("                </tbody>\n            </table>\n        </div>\n\n");

    section
}

fn generate_field_card(field: &FieldSummary) -> String {
    let class = field.tier();
    format!(
        r#"                <div class="field-card">
                    <div class="field-name">{name}</div>
                    <div class="field-stats">
                        <span>Missing: {missing} / {total}</span>
                        <span class="percentage {class}">{pct:.1}%</span>
                    </div>
                    <div class="progress-bar">
                        <div class="progress-fill {class}" style="width: {pct:.1}%"></div>
                    </div>
                </div>
"#,
        name = escape_html(&field.field),
        missing = field.missing,
        total = field.total,
        class = class,
        pct = field.missing_percentage,
    )
}

fn generate_field_cards(fields: &[FieldSummary]) -> String {
    let mut section = String::new();

    section.push_str(
        r#"        <div class="results-table">
            <div class="table-header">
                🔍 Field-Level Analysis
            </div>
            <div class="field-details">
"#,
    );
    for field in fields {
        section.push_str(&generate_field_card(field));
    }
    section.push_str("            </div>\n        </div>\n");

    section
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Render the report and write it into `output_dir`.
///
/// The content is written to a temporary file in the same directory and
/// then moved over the target name, replacing any existing file.
pub fn write_report(report: &Report, output_dir: &Path, format: OutputFormat) -> Result<PathBuf> {
    let content = match format {
        OutputFormat::Html => generate_html_report(report),
        OutputFormat::Json => generate_json_report(report)?,
    };

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let target = output_dir.join(report_filename(&report.metadata.generated_at, format));
    debug!("Writing report to {}", target.display());

    let mut file = NamedTempFile::new_in(output_dir)
        .with_context(|| format!("Failed to create temporary file in {}", output_dir.display()))?;
    file.write_all(content.as_bytes())
        .context("Failed to write report contents")?;
    file.persist(&target)
        .with_context(|| format!("Failed to write report to {}", target.display()))?;

    Ok(target)
}

const STYLESHEET: &str = r#"        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        :root {
            --primary: #0F172A;
            --secondary: #1E293B;
            --accent: #10B981;
            --accent-dark: #059669;
            --danger: #EF4444;
            --warning: #F59E0B;
            --bg: #F8FAFC;
            --card: #FFFFFF;
            --text: #0F172A;
            --text-muted: #64748B;
            --border: #E2E8F0;
            --shadow: rgba(15, 23, 42, 0.08);
        }

        body {
            font-family: 'DM Sans', sans-serif;
            background: var(--bg);
            color: var(--text);
            line-height: 1.6;
            padding: 40px 20px;
        }

        .container {
            max-width: 1400px;
            margin: 0 auto;
        }

        header {
            background: linear-gradient(135deg, var(--primary) 0%, var(--secondary) 100%);
            color: white;
            padding: 60px 40px;
            border-radius: 16px;
            margin-bottom: 40px;
            box-shadow: 0 20px 40px var(--shadow);
            position: relative;
            overflow: hidden;
        }

        header::before {
            content: '';
            position: absolute;
            top: -50%;
            right: -10%;
            width: 500px;
            height: 500px;
            background: radial-gradient(circle, rgba(16, 185, 129, 0.15) 0%, transparent 70%);
            border-radius: 50%;
        }

        header h1 {
            font-size: 42px;
            font-weight: 700;
            margin-bottom: 12px;
            position: relative;
            z-index: 1;
        }

        header p {
            font-size: 18px;
            opacity: 0.85;
            position: relative;
            z-index: 1;
        }

        .meta {
            background: rgba(255, 255, 255, 0.1);
            padding: 16px 20px;
            border-radius: 8px;
            margin-top: 20px;
            font-size: 14px;
            position: relative;
            z-index: 1;
        }

        .meta .partial {
            margin-top: 8px;
            color: var(--warning);
            font-weight: 600;
        }

        .stats-grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(240px, 1fr));
            gap: 20px;
            margin-bottom: 32px;
        }

        .stat-card {
            background: var(--card);
            padding: 24px;
            border-radius: 12px;
            box-shadow: 0 4px 16px var(--shadow);
            border: 1px solid var(--border);
        }

        .stat-label {
            font-size: 13px;
            color: var(--text-muted);
            font-weight: 600;
            text-transform: uppercase;
            letter-spacing: 0.5px;
            margin-bottom: 8px;
        }

        .stat-value {
            font-size: 36px;
            font-weight: 700;
            color: var(--text);
        }

        .results-table {
            background: var(--card);
            border-radius: 12px;
            overflow: hidden;
            box-shadow: 0 4px 16px var(--shadow);
            border: 1px solid var(--border);
            margin-bottom: 32px;
        }

        .table-header {
            background: var(--primary);
            color: white;
            padding: 20px 24px;
            font-weight: 700;
            font-size: 18px;
        }

        table {
            width: 100%;
            border-collapse: collapse;
        }

        thead {
            background: var(--bg);
        }

        th {
            padding: 16px 24px;
            text-align: left;
            font-weight: 700;
            color: var(--text);
            font-size: 13px;
            text-transform: uppercase;
            letter-spacing: 0.5px;
            border-bottom: 2px solid var(--border);
        }

        td {
            padding: 16px 24px;
            border-bottom: 1px solid var(--border);
            font-size: 15px;
        }

        tr:last-child td {
            border-bottom: none;
        }

        tbody tr:hover {
            background: var(--bg);
        }

        .role-badge {
            display: inline-block;
            padding: 6px 14px;
            background: var(--primary);
            color: white;
            border-radius: 20px;
            font-size: 13px;
            font-weight: 600;
        }

        .percentage {
            font-family: 'JetBrains Mono', monospace;
            font-weight: 600;
            font-size: 16px;
        }

        .percentage.good { color: var(--accent); }
        .percentage.warning { color: var(--warning); }
        .percentage.bad { color: var(--danger); }

        .progress-bar {
            height: 8px;
            background: var(--border);
            border-radius: 4px;
            overflow: hidden;
        }

        .progress-fill {
            height: 100%;
            border-radius: 4px;
        }

        .progress-fill.good { background: linear-gradient(90deg, var(--accent), var(--accent-dark)); }
        .progress-fill.warning { background: linear-gradient(90deg, var(--warning), #D97706); }
        .progress-fill.bad { background: linear-gradient(90deg, var(--danger), #DC2626); }

        .field-details {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(300px, 1fr));
            gap: 20px;
            padding: 24px;
        }

        .field-card {
            background: var(--bg);
            padding: 20px;
            border-radius: 8px;
            border-left: 4px solid var(--accent);
        }

        .field-name {
            font-weight: 700;
            color: var(--text);
            margin-bottom: 12px;
            font-size: 14px;
        }

        .field-stats {
            display: flex;
            justify-content: space-between;
            margin-bottom: 8px;
            font-size: 14px;
        }

        @media print {
            body { padding: 20px; }
            .stat-card, .results-table { break-inside: avoid; }
        }
"#;
