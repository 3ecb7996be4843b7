use crate::error::ServiceError;
use futures::stream::TryStreamExt;
use rusoto_core::Region;
use rusoto_s3::{GetObjectRequest, PutObjectRequest, S3Client, S3};
use std::env;
use std::str::FromStr;

pub fn get_region() -> Result<Region, ServiceError> {
    let val = get_env_var("REGION")?;
    Region::from_str(val.as_str())
        .map_err(|_| ServiceError::internal_server_error(format!("Unable to parse region {}", val)))
}

pub fn get_env_var(name: &str) -> Result<String, ServiceError> {
    env::var(name).map_err(|_| {
        ServiceError::internal_server_error(format!("Environment variable '{}' not found", name))
    })
}

/// Like `get_env_var`, with a fallback when the variable is unset.
pub fn get_env_var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

pub struct S3Object {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

pub async fn download_object_from_s3(
    client: &S3Client,
    bucket: String,
    key: String,
) -> Result<S3Object, ServiceError> {
    let request = GetObjectRequest {
        bucket,
        key,
        ..Default::default()
    };
    let mut object = client
        .get_object(request)
        .await
        .map_err(ServiceError::internal_server_error)?;
    let body = object
        .body
        .take()
        .ok_or(ServiceError::internal_server_error(
            "Unable to extract body",
        ))?;
    let body = body
        .map_ok(|b| b.to_vec())
        .try_concat()
        .await
        .map_err(ServiceError::internal_server_error)?;
    Ok(S3Object {
        body,
        content_type: object.content_type,
    })
}

pub async fn upload_object_to_s3(
    client: &S3Client,
    object: Vec<u8>,
    bucket: String,
    key: String,
    content_type: &str,
) -> Result<(), ServiceError> {
    let file_name = key.rsplit('/').next().unwrap_or(key.as_str()).to_string();
    let request = PutObjectRequest {
        bucket,
        key,
        body: Some(object.into()),
        content_type: Some(content_type.to_string()),
        content_disposition: Some(format!("attachment; filename=\"{}\"", file_name)),
        ..Default::default()
    };
    client
        .put_object(request)
        .await
        .map(|_| ())
        .map_err(ServiceError::internal_server_error)
}
