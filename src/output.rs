// 🖨️ Output Formatting - text table, CSV and JSON rendering of reports

use crate::catalog::Report;
use crate::value::Value;
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Map};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(anyhow!("unknown output format '{}' (expected table, csv or json)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        })
    }
}

/// Display text of one cell. `null` is what NULL prints as.
pub fn format_cell(value: &Value, currency: bool, null: &str) -> String {
    match value {
        Value::Null => null.to_string(),
        _ if currency => value.as_f64().map(|x| format!("{:.2}", x)).unwrap_or_else(|| value.to_string()),
        _ => value.to_string(),
    }
}

pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(report)),
        OutputFormat::Csv => render_csv(report),
        OutputFormat::Json => render_json(report),
    }
}

/// Render several reports; JSON becomes one array, the others are
/// separated by blank lines.
pub fn render_all(reports: &[Report], format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        let docs = reports.iter().map(report_json).collect::<Vec<_>>();
        return serde_json::to_string_pretty(&docs).context("Failed to serialize reports");
    }

    let parts = reports
        .iter()
        .map(|report| render(report, format))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("\n"))
}

// ============================================================================
// TABLE
// ============================================================================

pub fn render_table(report: &Report) -> String {
    let cells: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&report.columns)
                .map(|(value, column)| format_cell(value, column.currency, "NULL"))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = report.columns.iter().map(|c| c.name.len()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    // Numbers right-aligned, everything else left-aligned
    let numeric: Vec<bool> = (0..report.columns.len())
        .map(|i| {
            report.rows.iter().any(|r| r[i].as_f64().is_some())
                && report.rows.iter().all(|r| r[i].is_null() || r[i].as_f64().is_some())
        })
        .collect();

    let line = |values: &[String]| -> String {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if numeric[i] {
                    format!("{:>width$}", v, width = widths[i])
                } else {
                    format!("{:<width$}", v, width = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = report.columns.iter().map(|c| c.name.clone()).collect();
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-");

    let mut out = format!("📊 {} ({})\n", report.title(), report.kind.name());
    out.push_str(&line(&header));
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row));
        out.push('\n');
    }
    out.push_str(&format!("({} rows)\n", report.len()));
    out
}

// ============================================================================
// CSV
// ============================================================================

pub fn render_csv(report: &Report) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(report.columns.iter().map(|c| c.name.as_str()))?;

    for row in &report.rows {
        wtr.write_record(
            row.iter()
                .zip(&report.columns)
                .map(|(value, column)| format_cell(value, column.currency, "")),
        )?;
    }

    let bytes = wtr.into_inner().map_err(|e| anyhow!("Failed to flush CSV output: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

// ============================================================================
// JSON
// ============================================================================

/// `{ report, title, columns, rows: [ {column: value} ] }`
pub fn report_json(report: &Report) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = report
        .rows
        .iter()
        .map(|row| {
            let mut object = Map::new();
            for (value, column) in row.iter().zip(&report.columns) {
                let cell = match (column.currency, value.as_f64()) {
                    (true, Some(amount)) => json!(crate::value::round_currency(amount)),
                    _ => serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
                };
                object.insert(column.name.clone(), cell);
            }
            serde_json::Value::Object(object)
        })
        .collect();

    json!({
        "report": report.kind.name(),
        "title": report.title(),
        "columns": report.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        "rows": rows,
    })
}

pub fn render_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(&report_json(report)).context("Failed to serialize report")
}
