use thiserror::Error;

use crate::domain::validation::{FieldError, ValidationErrors};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid input data: {0}")]
    Validation(#[from] ValidationErrors),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("dependency unavailable: {0}")]
    Unavailable(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, details: Vec<FieldError>, correlation_id: String },
    #[error("bad gateway: {message}")]
    BadGateway { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "Invalid input data",
            Self::BadGateway { .. } => "Measurement service request failed",
            Self::ServiceUnavailable { .. } => "Service temporarily unavailable",
            Self::Internal { .. } => "Internal server error",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::BadGateway { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::BadGateway { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ValidationErrors> for ApplicationError {
    fn from(value: ValidationErrors) -> Self {
        Self::Domain(DomainError::Validation(value))
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(DomainError::Validation(errors)) => Self::BadRequest {
                message: errors.to_string(),
                details: errors.errors,
                correlation_id,
            },
            ApplicationError::Persistence(message) => Self::Internal { message, correlation_id },
            ApplicationError::Integration(message) => Self::BadGateway { message, correlation_id },
            ApplicationError::Unavailable(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
        }
    }
}
