//! Anomaly list export, format selected by file extension.

use crate::detect::Anomaly;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export format: {0} (expected .json or .csv)")]
    UnsupportedFormat(String),

    #[error("failed to serialize anomalies")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

const CSV_HEADER: &str = "检测维度,严重程度,对象,日期,指标值,阈值,说明,明细";

/// Serialize the anomaly list to `path`. `.json` gets a pretty-printed
/// array, `.csv` a BOM-prefixed localized table. The format check runs
/// before anything touches the filesystem.
pub fn export_anomalies(anomalies: &[Anomaly], path: &Path) -> Result<(), ExportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let payload = match ext.as_str() {
        "json" => {
            let mut body = serde_json::to_string_pretty(anomalies)?;
            body.push('\n');
            body
        }
        "csv" => to_csv(anomalies)?,
        _ => return Err(ExportError::UnsupportedFormat(path.display().to_string())),
    };

    std::fs::write(path, payload).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn to_csv(anomalies: &[Anomaly]) -> Result<String, ExportError> {
    // BOM keeps spreadsheet apps from garbling the Chinese text
    let mut out = String::from("\u{feff}");
    out.push_str(CSV_HEADER);
    out.push('\n');

    for anomaly in anomalies {
        let details = serde_json::to_string(&anomaly.details)?;
        let fields = [
            anomaly.dimension.key().to_string(),
            anomaly.severity.label().to_string(),
            anomaly.subject.clone(),
            anomaly.date.to_string(),
            format!("{:.2}", anomaly.value),
            anomaly.threshold.to_string(),
            anomaly.description.clone(),
            details,
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    Ok(out)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
