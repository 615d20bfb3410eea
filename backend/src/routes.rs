use std::sync::Arc;

use poll_core::{CandidateRecord, PollRecord};
use rocket::{State, get, post, serde::json::Json};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
   actions::{ActionGetResponse, ActionPostRequest, ActionPostResponse},
   assembly::build_vote_transaction,
   config::ActionsConfig,
   error::ApiError,
   store::{fetch_candidate, fetch_poll, AccountReader},
};

pub struct AppState {
    pub config: ActionsConfig,
    pub reader: Arc<dyn AccountReader>,
}

impl AppState {
    pub fn new(config: ActionsConfig, reader: Arc<dyn AccountReader>) -> Self {
        Self { config, reader }
    }
}

#[get("/vote")]
pub fn action_metadata(state: &State<AppState>) -> Json<ActionGetResponse> {
    Json(ActionGetResponse::for_config(&state.config))
}

#[rocket::options("/vote")]
pub fn action_options(state: &State<AppState>) -> Json<ActionGetResponse> {
    Json(ActionGetResponse::for_config(&state.config))
}

#[instrument(skip(state, request), fields(request_id = %Uuid::new_v4()))]
#[post("/vote?<candidate>", format = "json", data = "<request>")]
pub async fn vote(
    state: &State<AppState>,
    candidate: Option<&str>,
    request: Json<ActionPostRequest>,
) -> Result<Json<ActionPostResponse>, ApiError> {
    let request = request.into_inner();
    debug!("Assembling vote transaction: account length={}", request.account.len());

    build_vote_transaction(&state.config, &*state.reader, candidate, &request.account)
        .await
        .map(Json)
}

#[get("/polls/<poll_id>")]
pub async fn get_poll(state: &State<AppState>, poll_id: u64) -> Result<Json<PollRecord>, ApiError> {
    fetch_poll(&*state.reader, poll_id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

#[get("/polls/<poll_id>/candidates/<name>")]
pub async fn get_candidate(state: &State<AppState>, poll_id: u64, name: &str) -> Result<Json<CandidateRecord>, ApiError> {
    fetch_candidate(&*state.reader, poll_id, name)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}
