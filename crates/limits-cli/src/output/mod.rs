//! Output formatting module
//!
//! Renders quota reports and service listings as table, CSV, markdown or JSON.

use colored::Colorize;
use limits_core::{ResultRecord, ServiceInfo};
use std::fmt::Display;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Markdown,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Invalid format: {}. Use 'table', 'csv', 'markdown' or 'json'",
                s
            )),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

const QUOTA_HEADER: [&str; 7] = [
    "Account ID",
    "Region",
    "Service Code",
    "Quota Name",
    "Value",
    "Usage",
    "Global",
];

const SERVICE_HEADER: [&str; 2] = ["Service Code", "Service Name"];

/// Quota row for table display
#[derive(Debug, Tabled)]
struct QuotaRow {
    #[tabled(rename = "Account ID")]
    account_id: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Service Code")]
    service_code: String,
    #[tabled(rename = "Quota Name")]
    quota_name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Usage")]
    usage: String,
    #[tabled(rename = "Global")]
    global: String,
}

impl QuotaRow {
    fn new(record: &ResultRecord, highlight: bool) -> Self {
        let paint = |s: &str| -> String {
            if highlight && !record.has_usage() {
                s.yellow().to_string()
            } else {
                s.to_string()
            }
        };
        Self {
            account_id: paint(&record.account_id),
            region: paint(&record.region),
            service_code: paint(&record.service_code),
            quota_name: paint(&record.quota_name),
            value: paint(&record.value),
            usage: paint(&record.usage),
            global: paint(&record.global_quota.to_string()),
        }
    }
}

fn quota_fields(record: &ResultRecord) -> [String; 7] {
    [
        record.account_id.clone(),
        record.region.clone(),
        record.service_code.clone(),
        record.quota_name.clone(),
        record.value.clone(),
        record.usage.clone(),
        record.global_quota.to_string(),
    ]
}

/// Render a finalized quota report.
///
/// `highlight` paints rows without usage yellow in table output.
pub fn render_quotas(
    records: &[ResultRecord],
    format: OutputFormat,
    highlight: bool,
) -> anyhow::Result<String> {
    let out = match format {
        OutputFormat::Table => {
            if records.is_empty() {
                "No quotas found.".to_string()
            } else {
                let rows: Vec<QuotaRow> =
                    records.iter().map(|r| QuotaRow::new(r, highlight)).collect();
                Table::new(rows).with(Style::rounded()).to_string()
            }
        }
        OutputFormat::Csv => render_csv(&QUOTA_HEADER, records.iter().map(quota_fields)),
        OutputFormat::Markdown => {
            render_markdown(&QUOTA_HEADER, records.iter().map(quota_fields))
        }
        OutputFormat::Json => serde_json::to_string_pretty(records)?,
    };
    Ok(out)
}

/// Render the supported service listing.
///
/// Table output is one `Name (code)` line per service.
pub fn render_services(services: &[ServiceInfo], format: OutputFormat) -> anyhow::Result<String> {
    let fields = |s: &ServiceInfo| [s.service_code.clone(), s.service_name.clone()];
    let out = match format {
        OutputFormat::Table => services
            .iter()
            .map(|s| format!("{} ({})", s.service_name, s.service_code))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Csv => render_csv(&SERVICE_HEADER, services.iter().map(fields)),
        OutputFormat::Markdown => render_markdown(&SERVICE_HEADER, services.iter().map(fields)),
        OutputFormat::Json => serde_json::to_string_pretty(services)?,
    };
    Ok(out)
}

fn render_csv<const N: usize>(
    header: &[&str; N],
    rows: impl Iterator<Item = [String; N]>,
) -> String {
    let mut lines = vec![header.iter().map(|h| csv_field(h)).collect::<Vec<_>>().join(",")];
    lines.extend(rows.map(|row| row.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",")));
    lines.join("\n")
}

/// Quote a CSV field when it contains a delimiter, quote or line break
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn render_markdown<const N: usize>(
    header: &[&str; N],
    rows: impl Iterator<Item = [String; N]>,
) -> String {
    let mut lines = vec![
        format!("| {} |", header.join(" | ")),
        format!("|{}", "---|".repeat(N)),
    ];
    lines.extend(rows.map(|row| {
        let cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
        format!("| {} |", cells.join(" | "))
    }));
    lines.join("\n")
}

/// Print a success message (respects quiet mode)
pub fn print_success(message: &str, quiet: bool) {
    if !quiet {
        println!("{}", message.green());
    }
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{}", message.red());
}
