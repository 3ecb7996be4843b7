mod util;

use anonymizer_service::client::AnonymizerClient;
use anonymizer_service::config::ServiceConfig;
use anonymizer_service::dto::AnonymizeJob;
use anonymizer_service::error::ServiceError;
use anonymizer_service::response::make_response_payload;
use anonymizer_service::session::{Session, View};
use anonymizer_service::util::get_region;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use lazy_static::lazy_static;
use rusoto_core::{Client, Region};
use rusoto_s3::S3Client;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

lazy_static! {
    // AWS Region
    static ref REGION: Region = get_region().unwrap();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(ServiceConfig::log_filter()))
        .with_ansi(false)
        .without_time()
        .init();

    let config = ServiceConfig::from_env()?;
    let anonymizer = AnonymizerClient::new(&config.endpoint, config.timeout)?;
    let config = &config;
    let anonymizer = &anonymizer;
    run(service_fn(move |event: LambdaEvent<AnonymizeJob>| async move {
        process(event, config, anonymizer).await
    }))
    .await?;
    Ok(())
}

async fn process(
    event: LambdaEvent<AnonymizeJob>,
    config: &ServiceConfig,
    anonymizer: &AnonymizerClient,
) -> Result<Value, Error> {
    let (job, _context) = event.into_parts();
    let result = anonymize(job, config, anonymizer).await;
    if let Err(err) = &result {
        tracing::error!(kind = ?err.kind, msg = %err.msg, "job failed");
    }
    make_response_payload(result)
}

async fn anonymize(
    job: AnonymizeJob,
    config: &ServiceConfig,
    anonymizer: &AnonymizerClient,
) -> Result<Value, ServiceError> {
    let start = std::time::Instant::now();
    let client = S3Client::new_with_client(Client::shared(), REGION.clone());
    let text = util::pull_data_file(&client, &job.data).await?;
    tracing::info!(
        key = %job.data.key,
        secs = start.elapsed().as_secs_f64(),
        "file downloaded"
    );

    let mut session = Session::new();
    session.load_csv(&text)?;
    util::apply_columns(&mut session, &job.columns)?;

    let start = std::time::Instant::now();
    session.anonymize(anonymizer).await?;
    tracing::info!(secs = start.elapsed().as_secs_f64(), "anonymization completed");

    session.show_anonymized(job.view == View::Anonymized)?;
    let csv = session.export_current(config.export_format)?;
    let dataset = session
        .current_view()
        .ok_or_else(|| ServiceError::export("No anonymized data to download."))?;
    let result = util::push_result_file(&client, &job.data, dataset, csv).await?;
    serde_json::to_value(result).map_err(ServiceError::internal_server_error)
}
