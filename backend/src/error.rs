use poll_core::{ErrorCode, Key};
use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing candidate parameter")]
    MissingCandidate,
    #[error("Invalid candidate parameter")]
    InvalidCandidate,
    #[error("Candidate name too long")]
    CandidateNameTooLong,
    #[error("Invalid account parameter")]
    InvalidAccount,
    #[error("Poll not found. Initialize the poll before voting.")]
    PollNotFound { poll_key: Key },
    #[error("Candidate not found. Initialize the candidate before voting.")]
    CandidateNotFound { candidate_key: Key, candidate: String },
    #[error("Record not found")]
    NotFound,
    #[error("Failed to build vote transaction")]
    Build(String),
    #[error("{}", .0.message)]
    Ledger(#[from] poll_core::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::NotFound => Status::NotFound,
            ApiError::Build(_) => Status::InternalServerError,
            ApiError::Ledger(e) => match e.code {
                ErrorCode::Unauthorized => Status::Forbidden,
                ErrorCode::SystemError => Status::InternalServerError,
                _ => Status::BadRequest,
            },
            _ => Status::BadRequest,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (message, details) = match self {
            ApiError::PollNotFound { poll_key } => (None, Some(json!({ "pollKey": poll_key }))),
            ApiError::CandidateNotFound { candidate_key, candidate } => (
                None,
                Some(json!({ "candidateKey": candidate_key, "candidate": candidate })),
            ),
            ApiError::Build(message) => (Some(message.clone()), None),
            ApiError::Ledger(e) => (e.details.clone(), Some(json!({ "code": e.code }))),
            _ => (None, None),
        };
        ErrorBody {
            error: self.to_string(),
            message,
            details,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();

        rocket::Response::build_from(Json(self.body()).respond_to(req)?)
            .status(status)
            .ok()
    }
}
