use crate::error::ApiError;
use poll_core::CallerIdentity;
use rocket::http::RawStr;

pub fn parse_account(account: &str) -> Result<CallerIdentity, ApiError> {
    account.parse().map_err(|_| ApiError::InvalidAccount)
}

pub fn candidate_href(name: &str) -> String {
    format!("/api/vote?candidate={}", RawStr::new(name).percent_encode().as_str())
}
