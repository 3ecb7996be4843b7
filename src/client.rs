use crate::error::ServiceError;
use crate::request::{AnonymizationRequest, AnonymizationResponse};
use std::time::Duration;

/// Client for the external anonymization service.
#[derive(Clone, Debug)]
pub struct AnonymizerClient {
    client: reqwest::Client,
    endpoint: String,
}

impl AnonymizerClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ServiceError::internal_server_error)?;
        Ok(AnonymizerClient {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Posts the payload and returns the raw response body. Non-2xx answers are errors.
    pub async fn anonymize(
        &self,
        request: &AnonymizationRequest,
    ) -> Result<AnonymizationResponse, ServiceError> {
        tracing::info!(
            endpoint = %self.endpoint,
            rows = request.dataset.len(),
            columns = request.metadata.len(),
            "sending dataset to anonymizer"
        );
        self.client
            .post(self.endpoint.as_str())
            .header("CONTENT-TYPE", "application/json")
            .json(request)
            .send()
            .await
            .map_err(ServiceError::network)?
            .error_for_status()
            .map_err(ServiceError::network)?
            .json::<AnonymizationResponse>()
            .await
            .map_err(ServiceError::malformed_response)
    }
}
