pub mod actions;
pub mod assembly;
pub mod bootstrap;
pub mod catchers;
pub mod config;
pub mod cors;
pub mod error;
pub mod routes;
pub mod store;
pub mod utils;

use rocket::{catchers, routes, Build, Rocket};

use crate::catchers::{bad_request, internal_error, not_found, unprocessable_entity};
use crate::cors::CORS;
use crate::routes::{action_metadata, action_options, get_candidate, get_poll, vote, AppState};

pub fn build_rocket(state: AppState) -> Rocket<Build> {
    let cors = CORS::new(state.config.cluster);

    rocket::build()
        .attach(cors)
        .manage(state)
        .mount(
            "/api",
            routes![
                action_metadata,
                action_options,
                vote,
                get_poll,
                get_candidate
            ],
        )
        .register(
            "/",
            catchers![
                bad_request,
                not_found,
                unprocessable_entity,
                internal_error
            ],
        )
}
