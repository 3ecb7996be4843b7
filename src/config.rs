use crate::error::ServiceError;
use crate::export::ExportFormat;
use crate::util::get_env_var_or;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api/anonymize";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Settings read from the Lambda environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub export_format: ExportFormat,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; unset variables take their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup("ANONYMIZER_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let timeout = match lookup("ANONYMIZER_TIMEOUT_SECS") {
            Some(val) => val.trim().parse::<u64>().map_err(|_| {
                ServiceError::internal_server_error(format!(
                    "Unable to parse ANONYMIZER_TIMEOUT_SECS {}",
                    val
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let export_format = match lookup("EXPORT_FORMAT") {
            Some(val) => val.parse::<ExportFormat>()?,
            None => ExportFormat::default(),
        };
        Ok(ServiceConfig {
            endpoint,
            timeout: Duration::from_secs(timeout),
            export_format,
        })
    }

    /// Log filter directive, `info` unless `RUST_LOG` says otherwise.
    pub fn log_filter() -> String {
        get_env_var_or("RUST_LOG", "info")
    }
}
