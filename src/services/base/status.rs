pub mod object_details;

use crate::services::base::status::object_details::ObjectDetails;
use kube::core::ErrorResponse;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// The error type shared by storage backends and registries.
/// Registries return storage errors unchanged; only `ExportNotSupported` originates in a registry.
#[derive(Debug)]
pub enum Status {
    NotFound(ObjectDetails),
    AlreadyExists(ObjectDetails),
    Conflict(String),
    Invalid(String),
    Timeout(String),
    ExportNotSupported,
    Other(kube::Error),
    Internal(anyhow::Error),
}

impl Status {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Status::NotFound(_))
    }

    /// Maps an API server error for the object identified by `details`
    pub fn from_api_error(error: kube::Error, details: ObjectDetails) -> Self {
        match error {
            kube::Error::Api(ErrorResponse { code: 404, .. }) => Status::NotFound(details),
            kube::Error::Api(ErrorResponse { code: 409, ref reason, .. }) if reason == "AlreadyExists" => {
                Status::AlreadyExists(details)
            }
            kube::Error::Api(ErrorResponse { code: 409, message, .. }) => Status::Conflict(message),
            kube::Error::Api(ErrorResponse { code: 422, message, .. }) => Status::Invalid(message),
            _ => Status::Other(error),
        }
    }
}

impl From<kube::Error> for Status {
    fn from(error: kube::Error) -> Self {
        Status::Other(error)
    }
}

impl From<anyhow::Error> for Status {
    fn from(error: anyhow::Error) -> Self {
        Status::Internal(error)
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::NotFound(details) => write!(f, "Resource not found: {}", details),
            Status::AlreadyExists(details) => write!(f, "Resource already exists: {}", details),
            Status::Conflict(message) => write!(f, "Conflict error occurred: {}", message),
            Status::Invalid(message) => write!(f, "Invalid request: {}", message),
            Status::Timeout(message) => write!(f, "Operation timed out: {}", message),
            Status::ExportNotSupported => write!(f, "export is not supported"),
            Status::Other(e) => write!(f, "An error occurred: {}", e),
            Status::Internal(cause) => write!(f, "Internal error occurred: {}", cause),
        }
    }
}

impl Error for Status {}
