use crate::response::Status;
use serde::{Deserialize, Serialize};
use serde_json;
use std::error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Upload is not a CSV document
    FileType,
    /// The CSV reader rejected the input
    Parse,
    /// Classification is incomplete or an edit was not allowed
    Validation,
    /// Transport failure or non-2xx answer from the anonymization service
    Network,
    /// The service answered but its `dataset` could not be decoded
    MalformedResponse,
    /// Nothing to export, or the CSV writer failed
    Export,
    /// An anonymization request is already running for this session
    InFlight,
    Internal,
}

impl ErrorKind {
    fn status(&self) -> Status {
        match self {
            ErrorKind::FileType => Status::UnsupportedMediaType,
            ErrorKind::Parse | ErrorKind::Validation | ErrorKind::Export => Status::BadRequest,
            ErrorKind::InFlight => Status::Conflict,
            ErrorKind::Network | ErrorKind::MalformedResponse => Status::BadGateway,
            ErrorKind::Internal => Status::InternalServerError,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub msg: String,
    pub status: Status,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let json = serde_json::to_string_pretty(&self).map_err(|_| fmt::Error)?;
        write!(f, "{}", json)
    }
}

impl error::Error for ServiceError {}

impl ServiceError {
    pub fn new<T: fmt::Display>(kind: ErrorKind, msg: T) -> ServiceError {
        ServiceError {
            kind,
            msg: msg.to_string(),
            status: kind.status(),
        }
    }

    pub fn file_type<T: fmt::Display>(msg: T) -> ServiceError {
        Self::new(ErrorKind::FileType, msg)
    }

    pub fn parse<T: fmt::Display>(msg: T) -> ServiceError {
        Self::new(ErrorKind::Parse, msg)
    }

    pub fn validation<T: fmt::Display>(msg: T) -> ServiceError {
        Self::new(ErrorKind::Validation, msg)
    }

    pub fn network<T: fmt::Display>(msg: T) -> ServiceError {
        Self::new(ErrorKind::Network, msg)
    }

    pub fn malformed_response<T: fmt::Display>(msg: T) -> ServiceError {
        Self::new(ErrorKind::MalformedResponse, msg)
    }

    pub fn export<T: fmt::Display>(msg: T) -> ServiceError {
        Self::new(ErrorKind::Export, msg)
    }

    pub fn in_flight<T: fmt::Display>(msg: T) -> ServiceError {
        Self::new(ErrorKind::InFlight, msg)
    }

    pub fn internal_server_error<T: fmt::Display>(msg: T) -> ServiceError {
        Self::new(ErrorKind::Internal, msg)
    }
}
