use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

use crate::address::AddressError;
use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    #[error("Invalid input provided")]
    InvalidInput,
    #[error("Resource not found")]
    NotFound,
    #[error("Operation not authorized")]
    Unauthorized,
    #[error("Resource already exists")]
    AlreadyExists,
    #[error("Poll is not open")]
    NotOpen,
    #[error("Internal system error")]
    SystemError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(details) = &self.details {
            write!(f, "{}: {} ({})", self.code, self.message, details)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details.into()),
        }
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SystemError, message)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::new(ErrorCode::InvalidInput, err.to_string())
    }
}

impl From<AddressError> for Error {
    fn from(err: AddressError) -> Self {
        Self::new(ErrorCode::InvalidInput, err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::with_details(ErrorCode::SystemError, "Malformed record data", err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
