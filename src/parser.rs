use crate::error::ServiceError;
use crate::record::{Dataset, RowRecord};
use csv::Reader;
use std::collections::HashSet;

pub const CSV_MEDIA_TYPE: &str = "text/csv";

///
/// Accepts an upload when its name ends in `.csv` or its media type is `text/csv`.
///
/// ## Arguments
///
/// * `name` - File name or object key of the upload.
/// * `content_type` - Declared media type, parameters such as `charset` are ignored.
///
pub fn check_file_type(name: &str, content_type: Option<&str>) -> Result<(), ServiceError> {
    let has_csv_extension = name.to_ascii_lowercase().ends_with(".csv");
    let has_csv_type = content_type
        .and_then(|value| value.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case(CSV_MEDIA_TYPE))
        .unwrap_or(false);
    if has_csv_extension || has_csv_type {
        Ok(())
    } else {
        Err(ServiceError::file_type(format!(
            "Please upload a CSV file ('{}' is not one)",
            name
        )))
    }
}

///
/// Reads CSV text into a dataset, using the first line as the header.
///
/// Every cell stays a string and empty lines are skipped. Any error reported by the
/// CSV reader, including rows whose length differs from the header, aborts the parse.
///
pub fn parse_csv(text: &str) -> Result<Dataset, ServiceError> {
    let mut reader = Reader::from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| ServiceError::parse(format!("Error parsing CSV: {}", err)))?
        .iter()
        .map(String::from)
        .collect();
    if headers.is_empty() {
        return Err(ServiceError::parse("Error parsing CSV: no header row"));
    }
    let mut seen = HashSet::with_capacity(headers.len());
    if let Some(duplicate) = headers.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(ServiceError::parse(format!(
            "Error parsing CSV: duplicate column '{}'",
            duplicate
        )));
    }
    let rows = reader
        .records()
        .map(|record| match record {
            Ok(rec) => Ok(RowRecord::from_pairs(
                headers.iter().map(String::as_str).zip(rec.iter()),
            )),
            Err(err) => Err(ServiceError::parse(format!("Error parsing CSV: {}", err))),
        })
        .collect::<Result<Vec<RowRecord>, ServiceError>>()?;
    tracing::debug!(rows = rows.len(), columns = headers.len(), "parsed csv");
    Ok(Dataset::new(headers, rows))
}
