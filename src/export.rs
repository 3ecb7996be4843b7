use crate::error::ServiceError;
use crate::record::Dataset;
use csv::{Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Name under which exported datasets are offered for download.
pub const EXPORT_FILE_NAME: &str = "anonymized_dataset.csv";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// Standard CSV quoting, only where a cell needs it.
    #[default]
    Rfc4180,
    /// Every cell written as a JSON string literal, as the dashboard download did.
    JsonQuoted,
}

impl FromStr for ExportFormat {
    type Err = ServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rfc4180" | "csv" => Ok(ExportFormat::Rfc4180),
            "json-quoted" | "json" => Ok(ExportFormat::JsonQuoted),
            other => Err(ServiceError::internal_server_error(format!(
                "Unknown export format '{}'",
                other
            ))),
        }
    }
}

///
/// Serializes a dataset to CSV text.
///
/// The header is the key order of the first record. Cells missing from a later
/// record are written empty. Fails when there is nothing to export.
///
pub fn to_csv(dataset: &Dataset, format: ExportFormat) -> Result<String, ServiceError> {
    let first = dataset
        .rows()
        .first()
        .ok_or_else(|| ServiceError::export("No anonymized data to download."))?;
    let headers: Vec<&str> = first.columns().collect();
    match format {
        ExportFormat::Rfc4180 => write_rfc4180(dataset, &headers),
        ExportFormat::JsonQuoted => write_json_quoted(dataset, &headers),
    }
}

fn write_rfc4180(dataset: &Dataset, headers: &[&str]) -> Result<String, ServiceError> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(vec![]);
    writer
        .write_record(headers)
        .map_err(ServiceError::export)?;
    for row in dataset.rows() {
        writer
            .write_record(headers.iter().map(|column| row.get(column).unwrap_or_default()))
            .map_err(ServiceError::export)?;
    }
    let bytes = writer.into_inner().map_err(ServiceError::export)?;
    String::from_utf8(bytes).map_err(ServiceError::export)
}

fn write_json_quoted(dataset: &Dataset, headers: &[&str]) -> Result<String, ServiceError> {
    let mut lines = Vec::with_capacity(dataset.len() + 1);
    lines.push(headers.join(","));
    for row in dataset.rows() {
        let cells = headers
            .iter()
            .map(|column| serde_json::to_string(row.get(column).unwrap_or_default()))
            .collect::<Result<Vec<String>, _>>()
            .map_err(ServiceError::export)?;
        lines.push(cells.join(","));
    }
    Ok(lines.join("\n"))
}
