use crate::error::ServiceError;
use crate::record::{Dataset, RowRecord};
use crate::request::{sensitive_columns, ColumnMetadata};
use serde_json::Value;
use std::collections::HashSet;

///
/// Decodes the service's matrix (header row first) into row records.
///
/// Rows are zipped against the header positionally: short rows are padded with
/// empty cells and surplus cells are dropped. `null` becomes the empty string,
/// other non-string cells keep their JSON text.
///
pub fn decode_matrix(raw: &str) -> Result<Dataset, ServiceError> {
    let matrix: Value = serde_json::from_str(raw).map_err(ServiceError::malformed_response)?;
    let mut rows = match matrix {
        Value::Array(rows) => rows.into_iter(),
        _ => return Err(ServiceError::malformed_response("dataset is not an array")),
    };
    let headers = match rows.next() {
        Some(Value::Array(cells)) => cells
            .into_iter()
            .map(|cell| match cell {
                Value::String(name) => Ok(name),
                other => Err(ServiceError::malformed_response(format!(
                    "header cell {} is not a string",
                    other
                ))),
            })
            .collect::<Result<Vec<String>, ServiceError>>()?,
        Some(_) => return Err(ServiceError::malformed_response("header row is not an array")),
        None => return Err(ServiceError::malformed_response("dataset has no header row")),
    };
    let mut seen = HashSet::with_capacity(headers.len());
    if let Some(duplicate) = headers.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(ServiceError::malformed_response(format!(
            "duplicate header '{}'",
            duplicate
        )));
    }
    let records = rows
        .enumerate()
        .map(|(idx, row)| match row {
            Value::Array(cells) => {
                let mut cells = cells.into_iter().map(cell_text);
                Ok(RowRecord::from_pairs(headers.iter().map(|column| {
                    (column.as_str(), cells.next().unwrap_or_default())
                })))
            }
            _ => Err(ServiceError::malformed_response(format!(
                "row {} is not an array",
                idx + 1
            ))),
        })
        .collect::<Result<Vec<RowRecord>, ServiceError>>()?;
    Ok(Dataset::new(headers, records))
}

fn cell_text(cell: Value) -> String {
    match cell {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

///
/// Puts the original value back into every sensitive column, row by row.
///
/// Correspondence is positional. Anonymized rows past the end of the original
/// dataset are passed through, and surplus original rows are dropped. A sensitive
/// column the service left out is appended to every row, empty where no original
/// row exists.
///
/// ## Arguments
///
/// * `original` - The dataset that was sent to the service.
/// * `anonymized` - The decoded service result.
/// * `metadata` - The metadata of the request; columns with IDType `s` are restored.
///
pub fn merge_sensitive(
    original: &Dataset,
    anonymized: Dataset,
    metadata: &[ColumnMetadata],
) -> Dataset {
    let sensitive = sensitive_columns(metadata);
    let mut headers = anonymized.headers().to_vec();
    let mut appended = Vec::new();
    if !anonymized.is_empty() {
        for column in &sensitive {
            if !headers.iter().any(|name| name == column) {
                headers.push(column.to_string());
                appended.push(*column);
            }
        }
    }
    let rows = anonymized
        .into_rows()
        .into_iter()
        .enumerate()
        .map(|(idx, mut row)| {
            match original.get(idx) {
                Some(original_row) => {
                    for column in &sensitive {
                        row.set(*column, original_row.get(column).unwrap_or_default());
                    }
                }
                None => {
                    for column in &appended {
                        row.set(*column, "");
                    }
                }
            }
            row
        })
        .collect();
    Dataset::new(headers, rows)
}
