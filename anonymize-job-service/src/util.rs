use anonymizer_service::dto::{ColumnSpec, DataFile, JobResult};
use anonymizer_service::error::ServiceError;
use anonymizer_service::export::EXPORT_FILE_NAME;
use anonymizer_service::parser::check_file_type;
use anonymizer_service::record::Dataset;
use anonymizer_service::session::Session;
use anonymizer_service::util::{download_object_from_s3, upload_object_to_s3};
use rusoto_s3::S3Client;

/// Fetches the CSV object, refusing anything that is not a CSV upload.
pub async fn pull_data_file(client: &S3Client, data: &DataFile) -> Result<String, ServiceError> {
    let object = download_object_from_s3(client, data.bucket.clone(), data.key.clone()).await?;
    check_file_type(&data.key, object.content_type.as_deref())?;
    String::from_utf8(object.body)
        .map_err(|err| ServiceError::parse(format!("Error parsing CSV: {}", err)))
}

/// Replays the event's classifications through the session, one column at a time.
pub fn apply_columns(session: &mut Session, columns: &[ColumnSpec]) -> Result<(), ServiceError> {
    for column in columns {
        session.set_active_column(&column.name)?;
        session.set_role(column.role)?;
        if let Some(semantic_type) = column.semantic_type {
            session.set_semantic_type(semantic_type)?;
        }
    }
    session.commit()
}

/// `<dir>/people.csv` in `bucket/input` becomes `<dir>/anonymized_dataset.csv` in `bucket/output`.
pub fn output_location(data: &DataFile) -> (String, String) {
    let bucket = data.bucket.replace("/input", "/output");
    let key = match data.key.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, EXPORT_FILE_NAME),
        None => EXPORT_FILE_NAME.to_string(),
    };
    (bucket, key)
}

pub async fn push_result_file(
    client: &S3Client,
    data: &DataFile,
    dataset: &Dataset,
    csv: String,
) -> Result<JobResult, ServiceError> {
    let (bucket, key) = output_location(data);
    upload_object_to_s3(
        client,
        csv.into_bytes(),
        bucket.clone(),
        key.clone(),
        "text/csv;charset=utf-8",
    )
    .await?;
    Ok(JobResult {
        bucket,
        key,
        rows: dataset.len(),
        columns: dataset.headers().len(),
    })
}
